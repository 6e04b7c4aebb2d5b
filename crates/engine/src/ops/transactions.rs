use chrono::Utc;
use sea_orm::{QueryFilter, QueryOrder, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    Actor, ChangeRequestStatus, EngineError, NewTransactionCmd, ResultEngine, Transaction,
    TransactionChanges, TransactionListFilter, TransactionStatus, change_requests, transactions,
};

use super::{Engine, guards, with_tx};

fn require_owner(actor: &Actor, tx: &Transaction, action: &str) -> ResultEngine<()> {
    if !tx.is_owned_by(&actor.user_id) {
        return Err(EngineError::Forbidden(format!(
            "only the owner can {action} this transaction directly, request a change instead"
        )));
    }
    Ok(())
}

impl Engine {
    /// Records a new entry owned by the actor. Entries are born `Approved`.
    pub async fn create_transaction(
        &self,
        actor: &Actor,
        cmd: NewTransactionCmd,
    ) -> ResultEngine<Transaction> {
        with_tx!(self, |db_tx| {
            self.require_membership(&db_tx, &actor.team_id, &actor.user_id)
                .await?;
            let tx = Transaction::new(
                actor.team_id.clone(),
                actor.user_id.clone(),
                cmd.kind,
                cmd.amount_minor,
                cmd.category,
                cmd.note,
                Utc::now(),
            )?;
            transactions::ActiveModel::from(&tx).insert(&db_tx).await?;
            Ok(tx)
        })
    }

    pub async fn transaction(&self, actor: &Actor, transaction_id: Uuid) -> ResultEngine<Transaction> {
        with_tx!(self, |db_tx| {
            self.require_transaction(&db_tx, actor, transaction_id).await
        })
    }

    /// Lists the team's transactions, newest first.
    pub async fn list_transactions(
        &self,
        actor: &Actor,
        filter: &TransactionListFilter,
    ) -> ResultEngine<Vec<Transaction>> {
        with_tx!(self, |db_tx| {
            let mut query = transactions::Entity::find()
                .filter(transactions::Column::TeamId.eq(actor.team_id.clone()));
            if let Some(owner) = filter.owner_user_id.as_deref() {
                query = query.filter(transactions::Column::OwnerUserId.eq(owner.to_string()));
            }
            if let Some(kind) = filter.kind {
                query = query.filter(transactions::Column::Kind.eq(kind.as_str()));
            }
            if let Some(status) = filter.status {
                query = query.filter(transactions::Column::Status.eq(status.as_str()));
            }
            query
                .order_by_desc(transactions::Column::CreatedAt)
                .order_by_desc(transactions::Column::Id)
                .all(&db_tx)
                .await?
                .into_iter()
                .map(Transaction::try_from)
                .collect::<ResultEngine<Vec<_>>>()
        })
    }

    /// Direct edit by the transaction's owner, whatever their rank.
    ///
    /// The status is left as it is: a pending request against the entry
    /// stays pending and is still decided by the owner.
    pub async fn edit_own_transaction(
        &self,
        actor: &Actor,
        transaction_id: Uuid,
        changes: TransactionChanges,
    ) -> ResultEngine<Transaction> {
        changes.validate()?;
        with_tx!(self, |db_tx| {
            let mut tx = self.require_transaction(&db_tx, actor, transaction_id).await?;
            require_owner(actor, &tx, "edit")?;

            let expected = tx.status;
            tx.apply(&changes, Utc::now());
            guards::write_transaction(&db_tx, &tx, expected).await?;
            Ok(tx)
        })
    }

    /// Direct removal by the transaction's owner.
    ///
    /// A pending request against the entry is cancelled, since there is
    /// nothing left to resolve.
    pub async fn delete_own_transaction(
        &self,
        actor: &Actor,
        transaction_id: Uuid,
    ) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let tx = self.require_transaction(&db_tx, actor, transaction_id).await?;
            require_owner(actor, &tx, "delete")?;

            let now = Utc::now();
            if tx.status != TransactionStatus::Approved {
                let pending = change_requests::Entity::find()
                    .filter(
                        change_requests::Column::TargetTransactionId.eq(tx.id.to_string()),
                    )
                    .filter(
                        change_requests::Column::Status.eq(ChangeRequestStatus::Pending.as_str()),
                    )
                    .all(&db_tx)
                    .await?;
                for model in pending {
                    let request_id = crate::util::parse_uuid(&model.id, "change_request")?;
                    guards::close_request(
                        &db_tx,
                        request_id,
                        ChangeRequestStatus::Cancelled,
                        Some(&actor.user_id),
                        now,
                    )
                    .await?;
                }
            }

            guards::delete_transaction(&db_tx, tx.id, tx.status).await?;
            tracing::info!(transaction_id = %tx.id, owner = %actor.user_id, "transaction deleted");
            Ok(())
        })
    }
}
