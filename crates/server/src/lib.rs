use axum::{Json, http::StatusCode, response::IntoResponse};
use engine::EngineError;

use serde::Serialize;
pub use server::{ServerState, router, run, run_with_listener};

mod change_requests;
mod memberships;
mod server;
mod teams;
mod transactions;
mod user;
mod view_mode;

pub mod types {
    pub mod team {
        pub use api_types::team::{TeamNew, TeamView, TeamsResponse};
    }

    pub mod membership {
        pub use api_types::membership::{
            MemberNew, MemberView, MembersResponse, RoleUpdate, TeamRole,
        };
    }

    pub mod view_mode {
        pub use api_types::view_mode::{ViewModeSelect, ViewModeView};
    }

    pub mod transaction {
        pub use api_types::transaction::{
            TransactionChanges, TransactionKind, TransactionList, TransactionListResponse,
            TransactionNew, TransactionStatus, TransactionView,
        };
    }

    pub mod change_request {
        pub use api_types::change_request::{
            ChangeRequestKind, ChangeRequestList, ChangeRequestListResponse, ChangeRequestScope,
            ChangeRequestStatus, ChangeRequestView, DeleteRequestNew, EditRequestNew,
            ResolutionView, Resolve, ResolveAction,
        };
    }
}

pub enum ServerError {
    Engine(EngineError),
}

#[derive(Serialize)]
struct Error {
    error: String,
}

fn status_for_engine_error(err: &EngineError) -> StatusCode {
    match err {
        EngineError::Forbidden(_) => StatusCode::FORBIDDEN,
        EngineError::KeyNotFound(_) => StatusCode::NOT_FOUND,
        EngineError::Conflict(_) => StatusCode::CONFLICT,
        EngineError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        EngineError::Validation(_) | EngineError::InvalidRole(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
    }
}

fn message_for_engine_error(err: EngineError) -> String {
    match err {
        EngineError::Database(db_err) => {
            tracing::error!("database error: {db_err}");
            "internal server error".to_string()
        }
        other => other.to_string(),
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let ServerError::Engine(err) = self;
        let status = status_for_engine_error(&err);
        let error = message_for_engine_error(err);

        (status, Json(Error { error })).into_response()
    }
}

impl From<EngineError> for ServerError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}
