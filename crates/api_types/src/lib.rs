use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod membership {
    use super::*;

    /// Role of a user inside a team.
    ///
    /// Lower roles carry less authority:
    /// - `owner`: created the team, manages everyone else.
    /// - `admin`: manages deputies and members.
    /// - `deputy`: manages members.
    /// - `member`: no management rights.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum TeamRole {
        Owner,
        Admin,
        Deputy,
        Member,
    }

    /// Request body for adding a member.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct MemberNew {
        pub username: String,
        pub role: TeamRole,
    }

    /// Request body for changing a member's role.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct RoleUpdate {
        pub role: TeamRole,
    }

    /// Response body for listing members.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct MembersResponse {
        pub members: Vec<MemberView>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct MemberView {
        pub username: String,
        pub role: TeamRole,
    }
}

pub mod team {
    use super::*;
    use crate::membership::TeamRole;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TeamNew {
        pub name: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TeamView {
        pub id: Uuid,
        pub name: String,
        pub created_by: String,
        pub created_at: DateTime<Utc>,
        /// Role of the caller in this team.
        pub role: TeamRole,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TeamsResponse {
        pub teams: Vec<TeamView>,
    }
}

pub mod view_mode {
    use super::*;
    use crate::membership::TeamRole;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ViewModeSelect {
        pub mode: TeamRole,
    }

    /// Display-only selection. It is never used to authorize a request, the
    /// client is expected to keep it for the session.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct ViewModeView {
        pub actual_role: TeamRole,
        pub selected_mode: TeamRole,
        pub available_modes: Vec<TeamRole>,
    }
}

pub mod transaction {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum TransactionKind {
        Income,
        Expense,
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum TransactionStatus {
        Approved,
        EditRequested,
        DeleteRequested,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionNew {
        pub kind: TransactionKind,
        /// Must be > 0.
        pub amount_minor: i64,
        pub category: String,
        pub note: Option<String>,
    }

    /// A partial update. Absent fields are left untouched; an empty `note`
    /// clears it.
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

    /// Query string for listing transactions.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct TransactionList {
        pub owner: Option<String>,
        pub kind: Option<TransactionKind>,
        pub status: Option<TransactionStatus>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionView {
        pub id: Uuid,
        pub owner: String,
        pub kind: TransactionKind,
        pub amount_minor: i64,
        pub category: String,
        pub note: Option<String>,
        pub status: TransactionStatus,
        pub created_at: DateTime<Utc>,
        pub updated_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionListResponse {
        pub transactions: Vec<TransactionView>,
    }
}

pub mod change_request {
    use super::*;
    use crate::transaction::{TransactionChanges, TransactionView};

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum ChangeRequestKind {
        Edit,
        Delete,
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum ChangeRequestStatus {
        Pending,
        Approved,
        Rejected,
        Cancelled,
        Expired,
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum ResolveAction {
        Approve,
        Reject,
    }

    /// Which side of the requests the caller wants to see.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum ChangeRequestScope {
        /// Requests against transactions the caller owns.
        Incoming,
        /// Requests the caller raised.
        Outgoing,
        #[default]
        All,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct EditRequestNew {
        pub changes: TransactionChanges,
        pub reason: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct DeleteRequestNew {
        pub reason: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Resolve {
        pub action: ResolveAction,
    }

    /// Query string for listing change requests.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct ChangeRequestList {
        pub scope: Option<ChangeRequestScope>,
        pub status: Option<ChangeRequestStatus>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ChangeRequestView {
        pub id: Uuid,
        pub transaction_id: Uuid,
        pub transaction_owner: String,
        pub requester: String,
        pub kind: ChangeRequestKind,
        pub proposed_changes: Option<TransactionChanges>,
        pub reason: String,
        pub status: ChangeRequestStatus,
        pub created_at: DateTime<Utc>,
        pub resolved_at: Option<DateTime<Utc>>,
        pub resolved_by: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ChangeRequestListResponse {
        pub change_requests: Vec<ChangeRequestView>,
    }

    /// Outcome of a resolve call. `transaction` is absent when the entry was
    /// deleted.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct ResolutionView {
        pub change_request: ChangeRequestView,
        pub transaction: Option<TransactionView>,
        pub deleted: bool,
    }
}
