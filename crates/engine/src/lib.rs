//! Team ledger engine.
//!
//! Members of a team record income and expense entries. Whoever created an
//! entry owns it: they change it directly, everybody else proposes a change
//! request that the owner approves or rejects. Roles only decide team
//! management (who may grant which role, who may remove whom), never who may
//! bypass the owner of an entry.

pub use change_requests::{
    ChangeRequest, ChangeRequestKind, ChangeRequestStatus, Resolution, ResolveAction,
};
pub use commands::{
    ChangeRequestFilter, ChangeRequestScope, NewTransactionCmd, TransactionChanges,
    TransactionListFilter,
};
pub use error::EngineError;
pub use identity::Actor;
pub use ops::{Engine, EngineBuilder};
pub use roles::{Role, can_assign_role, can_override_rank};
pub use team_memberships::TeamMembership;
pub use teams::Team;
pub use transactions::{Transaction, TransactionKind, TransactionStatus};
pub use view_mode::ViewMode;

mod change_requests;
mod commands;
mod error;
mod identity;
mod ops;
mod roles;
mod team_memberships;
mod teams;
mod transactions;
mod users;
mod util;
mod view_mode;

pub type ResultEngine<T> = Result<T, EngineError>;
