use chrono::Duration;
use sea_orm::DatabaseConnection;

use crate::ResultEngine;

mod access;
mod change_requests;
mod guards;
mod teams;
mod transactions;

/// Run a block inside a DB transaction, committing on success and rolling back on error.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
    request_ttl: Option<Duration>,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    /// How long a change request may stay pending before
    /// [`Engine::expire_change_requests`] expires it.
    pub fn request_ttl(&self) -> Option<Duration> {
        self.request_ttl
    }
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
    request_ttl: Option<Duration>,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Pending change requests older than `ttl` become expirable.
    pub fn request_ttl(mut self, ttl: Duration) -> EngineBuilder {
        self.request_ttl = Some(ttl);
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        if let Some(ttl) = self.request_ttl
            && ttl <= Duration::zero()
        {
            return Err(crate::EngineError::Validation(
                "request ttl must be > 0".to_string(),
            ));
        }
        Ok(Engine {
            database: self.database,
            request_ttl: self.request_ttl,
        })
    }
}
