//! Change requests: proposals to edit or delete someone else's transaction.
//!
//! A request starts `Pending` and ends in exactly one terminal status.
//! Only the owner of the target transaction approves or rejects it; the
//! requester may cancel it; the expiry sweep may expire it.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    EngineError, ResultEngine, Transaction, TransactionChanges, TransactionStatus,
    util::parse_uuid,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeRequestKind {
    Edit,
    Delete,
}

impl ChangeRequestKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Edit => "edit",
            Self::Delete => "delete",
        }
    }

    /// Status a transaction holds while a request of this kind is pending.
    pub fn pending_status(self) -> TransactionStatus {
        match self {
            Self::Edit => TransactionStatus::EditRequested,
            Self::Delete => TransactionStatus::DeleteRequested,
        }
    }
}

impl TryFrom<&str> for ChangeRequestKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "edit" => Ok(Self::Edit),
            "delete" => Ok(Self::Delete),
            other => Err(EngineError::Validation(format!(
                "invalid change request kind: {other}"
            ))),
        }
    }
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

impl ChangeRequestStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Cancelled => "cancelled",
            Self::Expired => "expired",
        }
    }

    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl TryFrom<&str> for ChangeRequestStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            "cancelled" => Ok(Self::Cancelled),
            "expired" => Ok(Self::Expired),
            other => Err(EngineError::Validation(format!(
                "invalid change request status: {other}"
            ))),
        }
    }
}

/// Decision of the transaction owner on a pending request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolveAction {
    Approve,
    Reject,
}

impl ResolveAction {
    pub(crate) fn outcome(self) -> ChangeRequestStatus {
        match self {
            Self::Approve => ChangeRequestStatus::Approved,
            Self::Reject => ChangeRequestStatus::Rejected,
        }
    }
}

/// Outcome of a resolution: the transaction as it stands afterwards, or
/// `deleted` when an approved delete removed it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub request: ChangeRequest,
    pub transaction: Option<Transaction>,
    pub deleted: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeRequest {
    pub id: Uuid,
    pub team_id: String,
    pub target_transaction_id: Uuid,
    /// Owner of the target at request time, the only member who resolves it.
    pub target_owner_id: String,
    pub requester_id: String,
    pub kind: ChangeRequestKind,
    pub proposed_changes: Option<TransactionChanges>,
    pub reason: String,
    pub status: ChangeRequestStatus,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub resolved_by: Option<String>,
}

impl ChangeRequest {
    /// A new pending edit request.
    pub fn edit(
        target: &Transaction,
        requester_id: String,
        changes: TransactionChanges,
        reason: String,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self::pending(
            target,
            requester_id,
            ChangeRequestKind::Edit,
            Some(changes),
            reason,
            created_at,
        )
    }

    /// A new pending delete request.
    pub fn delete(
        target: &Transaction,
        requester_id: String,
        reason: String,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self::pending(
            target,
            requester_id,
            ChangeRequestKind::Delete,
            None,
            reason,
            created_at,
        )
    }

    fn pending(
        target: &Transaction,
        requester_id: String,
        kind: ChangeRequestKind,
        proposed_changes: Option<TransactionChanges>,
        reason: String,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            team_id: target.team_id.clone(),
            target_transaction_id: target.id,
            target_owner_id: target.owner_user_id.clone(),
            requester_id,
            kind,
            proposed_changes,
            reason,
            status: ChangeRequestStatus::Pending,
            created_at,
            resolved_at: None,
            resolved_by: None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == ChangeRequestStatus::Pending
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "change_requests")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub team_id: String,
    pub target_transaction_id: String,
    pub target_owner_id: String,
    pub requester_id: String,
    pub kind: String,
    pub proposed_changes: Option<String>,
    pub reason: String,
    pub status: String,
    pub created_at: DateTimeUtc,
    pub resolved_at: Option<DateTimeUtc>,
    pub resolved_by: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::teams::Entity",
        from = "Column::TeamId",
        to = "super::teams::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Teams,
}

impl Related<super::teams::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Teams.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<&ChangeRequest> for ActiveModel {
    type Error = EngineError;

    fn try_from(req: &ChangeRequest) -> ResultEngine<Self> {
        let proposed_changes = req
            .proposed_changes
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(|err| EngineError::Validation(format!("invalid proposed changes: {err}")))?;
        Ok(Self {
            id: ActiveValue::Set(req.id.to_string()),
            team_id: ActiveValue::Set(req.team_id.clone()),
            target_transaction_id: ActiveValue::Set(req.target_transaction_id.to_string()),
            target_owner_id: ActiveValue::Set(req.target_owner_id.clone()),
            requester_id: ActiveValue::Set(req.requester_id.clone()),
            kind: ActiveValue::Set(req.kind.as_str().to_string()),
            proposed_changes: ActiveValue::Set(proposed_changes),
            reason: ActiveValue::Set(req.reason.clone()),
            status: ActiveValue::Set(req.status.as_str().to_string()),
            created_at: ActiveValue::Set(req.created_at),
            resolved_at: ActiveValue::Set(req.resolved_at),
            resolved_by: ActiveValue::Set(req.resolved_by.clone()),
        })
    }
}

impl TryFrom<Model> for ChangeRequest {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let proposed_changes = model
            .proposed_changes
            .as_deref()
            .map(serde_json::from_str::<TransactionChanges>)
            .transpose()
            .map_err(|err| {
                EngineError::Validation(format!("invalid stored proposed changes: {err}"))
            })?;
        Ok(Self {
            id: parse_uuid(&model.id, "change_request")?,
            team_id: model.team_id,
            target_transaction_id: parse_uuid(&model.target_transaction_id, "transaction")?,
            target_owner_id: model.target_owner_id,
            requester_id: model.requester_id,
            kind: ChangeRequestKind::try_from(model.kind.as_str())?,
            proposed_changes,
            reason: model.reason,
            status: ChangeRequestStatus::try_from(model.status.as_str())?,
            created_at: model.created_at,
            resolved_at: model.resolved_at,
            resolved_by: model.resolved_by,
        })
    }
}
