use sea_orm::{DatabaseTransaction, QueryFilter, prelude::*};
use uuid::Uuid;

use crate::{
    Actor, ChangeRequest, EngineError, ResultEngine, TeamMembership, Transaction,
    change_requests, team_memberships, transactions, users,
};

use super::Engine;

impl Engine {
    pub(super) async fn find_membership(
        &self,
        db: &DatabaseTransaction,
        team_id: &str,
        user_id: &str,
    ) -> ResultEngine<Option<TeamMembership>> {
        team_memberships::Entity::find_by_id((team_id.to_string(), user_id.to_string()))
            .one(db)
            .await?
            .map(TeamMembership::try_from)
            .transpose()
    }

    pub(super) async fn require_membership(
        &self,
        db: &DatabaseTransaction,
        team_id: &str,
        user_id: &str,
    ) -> ResultEngine<TeamMembership> {
        self.find_membership(db, team_id, user_id)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("member not exists".to_string()))
    }

    pub(super) async fn require_user_exists(
        &self,
        db: &DatabaseTransaction,
        username: &str,
    ) -> ResultEngine<()> {
        let exists = users::Entity::find_by_id(username.to_string())
            .one(db)
            .await?
            .is_some();
        if !exists {
            return Err(EngineError::KeyNotFound("user not exists".to_string()));
        }
        Ok(())
    }

    /// Loads a transaction of the actor's team. Transactions of other teams
    /// are reported as missing.
    pub(super) async fn require_transaction(
        &self,
        db: &DatabaseTransaction,
        actor: &Actor,
        transaction_id: Uuid,
    ) -> ResultEngine<Transaction> {
        let model = transactions::Entity::find_by_id(transaction_id.to_string())
            .filter(transactions::Column::TeamId.eq(actor.team_id.clone()))
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("transaction not exists".to_string()))?;
        Transaction::try_from(model)
    }

    pub(super) async fn require_change_request(
        &self,
        db: &DatabaseTransaction,
        actor: &Actor,
        request_id: Uuid,
    ) -> ResultEngine<ChangeRequest> {
        let model = change_requests::Entity::find_by_id(request_id.to_string())
            .filter(change_requests::Column::TeamId.eq(actor.team_id.clone()))
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("change_request not exists".to_string()))?;
        ChangeRequest::try_from(model)
    }
}
