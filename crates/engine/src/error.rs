//! The module contains the error the engine can throw.
//!
//! The errors are:
//!
//! - [`Validation`] thrown when an input field is missing or invalid.
//! - [`Forbidden`] thrown when the actor lacks authority over the target.
//! - [`KeyNotFound`] thrown when an item is not found.
//! - [`Conflict`] thrown when a guarded state transition finds a stale status.
//! - [`InvalidRole`] thrown when a role string is outside the fixed set.
//!
//!  [`Validation`]: EngineError::Validation
//!  [`Forbidden`]: EngineError::Forbidden
//!  [`KeyNotFound`]: EngineError::KeyNotFound
//!  [`Conflict`]: EngineError::Conflict
//!  [`InvalidRole`]: EngineError::InvalidRole
use sea_orm::{DbErr, SqlErr};
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Invalid role: {0}")]
    InvalidRole(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl EngineError {
    /// Maps a unique-constraint violation to [`EngineError::Conflict`], any
    /// other database error stays a [`EngineError::Database`].
    pub(crate) fn from_write(err: DbErr, conflict: &str) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => Self::Conflict(conflict.to_string()),
            _ => Self::Database(err),
        }
    }
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Validation(a), Self::Validation(b)) => a == b,
            (Self::Forbidden(a), Self::Forbidden(b)) => a == b,
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::Conflict(a), Self::Conflict(b)) => a == b,
            (Self::InvalidRole(a), Self::InvalidRole(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
