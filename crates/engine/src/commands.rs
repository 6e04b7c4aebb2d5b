//! Command structs for engine operations.
//!
//! These types group parameters for write operations (create, edit, request)
//! and list filters, keeping call sites readable and avoiding long argument
//! lists.

use serde::{Deserialize, Serialize};

use crate::{
    ChangeRequestStatus, EngineError, ResultEngine, TransactionKind, TransactionStatus,
};

/// Create a transaction owned by the calling actor.
#[derive(Clone, Debug)]
pub struct NewTransactionCmd {
    pub kind: TransactionKind,
    pub amount_minor: i64,
    pub category: String,
    pub note: Option<String>,
}

impl NewTransactionCmd {
    #[must_use]
    pub fn new(kind: TransactionKind, amount_minor: i64, category: impl Into<String>) -> Self {
        Self {
            kind,
            amount_minor,
            category: category.into(),
            note: None,
        }
    }

    #[must_use]
    pub fn income(amount_minor: i64, category: impl Into<String>) -> Self {
        Self::new(TransactionKind::Income, amount_minor, category)
    }

    #[must_use]
    pub fn expense(amount_minor: i64, category: impl Into<String>) -> Self {
        Self::new(TransactionKind::Expense, amount_minor, category)
    }

    #[must_use]
    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

/// Patch applied to a transaction, either directly by its owner or through
/// an approved edit request.
///
/// `None` leaves a field untouched. An empty `note` clears the note.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionChanges {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount_minor: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<TransactionKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl TransactionChanges {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn amount_minor(mut self, amount_minor: i64) -> Self {
        self.amount_minor = Some(amount_minor);
        self
    }

    #[must_use]
    pub fn kind(mut self, kind: TransactionKind) -> Self {
        self.kind = Some(kind);
        self
    }

    #[must_use]
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    #[must_use]
    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.amount_minor.is_none()
            && self.kind.is_none()
            && self.category.is_none()
            && self.note.is_none()
    }

    pub(crate) fn validate(&self) -> ResultEngine<()> {
        if self.is_empty() {
            return Err(EngineError::Validation(
                "changes must not be empty".to_string(),
            ));
        }
        if let Some(amount_minor) = self.amount_minor
            && amount_minor <= 0
        {
            return Err(EngineError::Validation(
                "amount_minor must be > 0".to_string(),
            ));
        }
        if self
            .category
            .as_deref()
            .is_some_and(|c| c.trim().is_empty())
        {
            return Err(EngineError::Validation(
                "category must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Filters for listing transactions. Every field narrows the result.
#[derive(Clone, Debug, Default)]
pub struct TransactionListFilter {
    pub owner_user_id: Option<String>,
    pub kind: Option<TransactionKind>,
    pub status: Option<TransactionStatus>,
}

/// Which side of a change request the caller is looking from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeRequestScope {
    /// Requests against transactions the caller owns.
    Incoming,
    /// Requests the caller raised.
    Outgoing,
    /// Every request of the team.
    #[default]
    All,
}

#[derive(Clone, Debug, Default)]
pub struct ChangeRequestFilter {
    pub scope: ChangeRequestScope,
    pub status: Option<ChangeRequestStatus>,
}

impl ChangeRequestFilter {
    #[must_use]
    pub fn incoming() -> Self {
        Self {
            scope: ChangeRequestScope::Incoming,
            status: None,
        }
    }

    #[must_use]
    pub fn outgoing() -> Self {
        Self {
            scope: ChangeRequestScope::Outgoing,
            status: None,
        }
    }

    #[must_use]
    pub fn status(mut self, status: ChangeRequestStatus) -> Self {
        self.status = Some(status);
        self
    }
}
