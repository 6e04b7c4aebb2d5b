//! Transaction primitives.
//!
//! A `Transaction` is one income or expense entry recorded by a team member.
//! The member who created it owns it: only they edit or delete it directly,
//! and only they resolve change requests raised against it.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, ResultEngine, TransactionChanges, util::parse_uuid};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Income,
    Expense,
}

impl TransactionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }
}

impl TryFrom<&str> for TransactionKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "income" => Ok(Self::Income),
            "expense" => Ok(Self::Expense),
            other => Err(EngineError::Validation(format!(
                "invalid transaction kind: {other}"
            ))),
        }
    }
}

/// Approval status of a transaction.
///
/// Anything other than `Approved` means exactly one pending change request
/// targets the transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    Approved,
    EditRequested,
    DeleteRequested,
}

impl TransactionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Approved => "approved",
            Self::EditRequested => "edit_requested",
            Self::DeleteRequested => "delete_requested",
        }
    }
}

impl TryFrom<&str> for TransactionStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "approved" => Ok(Self::Approved),
            "edit_requested" => Ok(Self::EditRequested),
            "delete_requested" => Ok(Self::DeleteRequested),
            other => Err(EngineError::Validation(format!(
                "invalid transaction status: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub team_id: String,
    pub owner_user_id: String,
    pub kind: TransactionKind,
    pub amount_minor: i64,
    pub category: String,
    pub note: Option<String>,
    pub status: TransactionStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Transaction {
    pub fn new(
        team_id: String,
        owner_user_id: String,
        kind: TransactionKind,
        amount_minor: i64,
        category: String,
        note: Option<String>,
        created_at: DateTime<Utc>,
    ) -> ResultEngine<Self> {
        if amount_minor <= 0 {
            return Err(EngineError::Validation(
                "amount_minor must be > 0".to_string(),
            ));
        }
        let category = category.trim();
        if category.is_empty() {
            return Err(EngineError::Validation(
                "category must not be empty".to_string(),
            ));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            team_id,
            owner_user_id,
            kind,
            amount_minor,
            category: category.to_string(),
            note: note
                .map(|n| n.trim().to_string())
                .filter(|n| !n.is_empty()),
            status: TransactionStatus::Approved,
            created_at,
            updated_at: created_at,
        })
    }

    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.owner_user_id == user_id
    }

    /// Applies a validated patch. Fields left `None` keep their value; an
    /// empty `note` clears it.
    pub fn apply(&mut self, changes: &TransactionChanges, at: DateTime<Utc>) {
        if let Some(amount_minor) = changes.amount_minor {
            self.amount_minor = amount_minor;
        }
        if let Some(kind) = changes.kind {
            self.kind = kind;
        }
        if let Some(category) = changes.category.as_deref() {
            self.category = category.trim().to_string();
        }
        if let Some(note) = changes.note.as_deref() {
            let note = note.trim();
            self.note = (!note.is_empty()).then(|| note.to_string());
        }
        self.updated_at = at;
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub team_id: String,
    pub owner_user_id: String,
    pub kind: String,
    pub amount_minor: i64,
    pub category: String,
    pub note: Option<String>,
    pub status: String,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
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

impl From<&Transaction> for ActiveModel {
    fn from(tx: &Transaction) -> Self {
        Self {
            id: ActiveValue::Set(tx.id.to_string()),
            team_id: ActiveValue::Set(tx.team_id.clone()),
            owner_user_id: ActiveValue::Set(tx.owner_user_id.clone()),
            kind: ActiveValue::Set(tx.kind.as_str().to_string()),
            amount_minor: ActiveValue::Set(tx.amount_minor),
            category: ActiveValue::Set(tx.category.clone()),
            note: ActiveValue::Set(tx.note.clone()),
            status: ActiveValue::Set(tx.status.as_str().to_string()),
            created_at: ActiveValue::Set(tx.created_at),
            updated_at: ActiveValue::Set(tx.updated_at),
        }
    }
}

impl TryFrom<Model> for Transaction {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "transaction")?,
            team_id: model.team_id,
            owner_user_id: model.owner_user_id,
            kind: TransactionKind::try_from(model.kind.as_str())?,
            amount_minor: model.amount_minor,
            category: model.category,
            note: model.note,
            status: TransactionStatus::try_from(model.status.as_str())?,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}
