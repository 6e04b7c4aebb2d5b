//! Teams: the shared ledgers members record entries into.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, ResultEngine};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub id: Uuid,
    pub name: String,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

impl Team {
    pub fn new(name: String, created_by: String, created_at: DateTime<Utc>) -> ResultEngine<Self> {
        if name.trim().is_empty() {
            return Err(EngineError::Validation(
                "team name must not be empty".to_string(),
            ));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            name: name.trim().to_string(),
            created_by,
            created_at,
        })
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "teams")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
    pub created_by: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::team_memberships::Entity")]
    Memberships,
    #[sea_orm(has_many = "super::transactions::Entity")]
    Transactions,
}

impl Related<super::team_memberships::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Memberships.def()
    }
}

impl Related<super::transactions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Team> for ActiveModel {
    fn from(team: &Team) -> Self {
        Self {
            id: ActiveValue::Set(team.id.to_string()),
            name: ActiveValue::Set(team.name.clone()),
            created_by: ActiveValue::Set(team.created_by.clone()),
            created_at: ActiveValue::Set(team.created_at),
        }
    }
}

impl TryFrom<Model> for Team {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: crate::util::parse_uuid(&model.id, "team")?,
            name: model.name,
            created_by: model.created_by,
            created_at: model.created_at,
        })
    }
}
