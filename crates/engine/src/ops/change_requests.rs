use chrono::{DateTime, Utc};
use sea_orm::{DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    Actor, ChangeRequest, ChangeRequestFilter, ChangeRequestKind, ChangeRequestScope,
    ChangeRequestStatus, EngineError, Resolution, ResolveAction, ResultEngine, Transaction,
    TransactionChanges, TransactionStatus, change_requests, util::normalize_required_text,
};

use super::{Engine, guards, with_tx};

impl Engine {
    /// Proposes an edit of a transaction the actor does not own.
    ///
    /// Owners must use [`Engine::edit_own_transaction`] instead. Only one
    /// request may be pending per transaction.
    pub async fn request_edit_others(
        &self,
        actor: &Actor,
        transaction_id: Uuid,
        changes: TransactionChanges,
        reason: &str,
    ) -> ResultEngine<ChangeRequest> {
        changes.validate()?;
        let reason = normalize_required_text(reason, "reason")?;
        with_tx!(self, |db_tx| {
            let tx = self
                .require_requestable(&db_tx, actor, transaction_id)
                .await?;
            let request =
                ChangeRequest::edit(&tx, actor.user_id.clone(), changes, reason, Utc::now());
            self.open_request(&db_tx, &request).await?;
            Ok(request)
        })
    }

    /// Proposes the removal of a transaction the actor does not own.
    pub async fn request_delete_others(
        &self,
        actor: &Actor,
        transaction_id: Uuid,
        reason: &str,
    ) -> ResultEngine<ChangeRequest> {
        let reason = normalize_required_text(reason, "reason")?;
        with_tx!(self, |db_tx| {
            let tx = self
                .require_requestable(&db_tx, actor, transaction_id)
                .await?;
            let request = ChangeRequest::delete(&tx, actor.user_id.clone(), reason, Utc::now());
            self.open_request(&db_tx, &request).await?;
            Ok(request)
        })
    }

    /// Approves or rejects a pending request. Only the owner of the target
    /// transaction may resolve it, whatever the ranks involved.
    ///
    /// The request status and the transaction mutation commit together or
    /// not at all.
    pub async fn confirm_change(
        &self,
        actor: &Actor,
        request_id: Uuid,
        action: ResolveAction,
    ) -> ResultEngine<Resolution> {
        with_tx!(self, |db_tx| {
            let mut request = self
                .require_change_request(&db_tx, actor, request_id)
                .await?;
            if !request.is_pending() {
                return Err(EngineError::Conflict(format!(
                    "change request already {}",
                    request.status.as_str()
                )));
            }
            let mut tx = self
                .require_transaction(&db_tx, actor, request.target_transaction_id)
                .await?;
            if !tx.is_owned_by(&actor.user_id) {
                return Err(EngineError::Forbidden(
                    "only the transaction owner can resolve this request".to_string(),
                ));
            }

            let now = Utc::now();
            let outcome = action.outcome();
            guards::close_request(&db_tx, request.id, outcome, Some(&actor.user_id), now)
                .await?;

            let pending_status = request.kind.pending_status();
            let (transaction, deleted) = match (action, request.kind) {
                (ResolveAction::Approve, ChangeRequestKind::Edit) => {
                    let changes = request.proposed_changes.as_ref().ok_or_else(|| {
                        EngineError::Validation("edit request without changes".to_string())
                    })?;
                    tx.apply(changes, now);
                    tx.status = TransactionStatus::Approved;
                    guards::write_transaction(&db_tx, &tx, pending_status).await?;
                    (Some(tx), false)
                }
                (ResolveAction::Approve, ChangeRequestKind::Delete) => {
                    guards::delete_transaction(&db_tx, tx.id, pending_status).await?;
                    (None, true)
                }
                (ResolveAction::Reject, _) => {
                    guards::transition_transaction(
                        &db_tx,
                        tx.id,
                        pending_status,
                        TransactionStatus::Approved,
                    )
                    .await?;
                    tx.status = TransactionStatus::Approved;
                    (Some(tx), false)
                }
            };

            request.status = outcome;
            request.resolved_at = Some(now);
            request.resolved_by = Some(actor.user_id.clone());
            tracing::info!(
                request_id = %request.id,
                transaction_id = %request.target_transaction_id,
                kind = request.kind.as_str(),
                outcome = outcome.as_str(),
                "change request resolved"
            );
            Ok(Resolution {
                request,
                transaction,
                deleted,
            })
        })
    }

    /// Withdraws a pending request. Only its requester may do so.
    pub async fn cancel_change_request(
        &self,
        actor: &Actor,
        request_id: Uuid,
    ) -> ResultEngine<ChangeRequest> {
        with_tx!(self, |db_tx| {
            let mut request = self
                .require_change_request(&db_tx, actor, request_id)
                .await?;
            if !request.is_pending() {
                return Err(EngineError::Conflict(format!(
                    "change request already {}",
                    request.status.as_str()
                )));
            }
            if request.requester_id != actor.user_id {
                return Err(EngineError::Forbidden(
                    "only the requester can cancel this request".to_string(),
                ));
            }

            let now = Utc::now();
            self.release_request(
                &db_tx,
                &request,
                ChangeRequestStatus::Cancelled,
                Some(&actor.user_id),
                now,
            )
            .await?;
            request.status = ChangeRequestStatus::Cancelled;
            request.resolved_at = Some(now);
            request.resolved_by = Some(actor.user_id.clone());
            Ok(request)
        })
    }

    /// Expires every request that has been pending longer than the
    /// configured TTL, returning their ids. Does nothing without a TTL.
    pub async fn expire_change_requests(&self, now: DateTime<Utc>) -> ResultEngine<Vec<Uuid>> {
        let Some(ttl) = self.request_ttl else {
            return Ok(Vec::new());
        };
        // A TTL reaching past the calendar leaves nothing stale.
        let Some(cutoff) = now.checked_sub_signed(ttl) else {
            return Ok(Vec::new());
        };
        with_tx!(self, |db_tx| {
            let stale = change_requests::Entity::find()
                .filter(
                    change_requests::Column::Status.eq(ChangeRequestStatus::Pending.as_str()),
                )
                .filter(change_requests::Column::CreatedAt.lte(cutoff))
                .order_by_asc(change_requests::Column::CreatedAt)
                .all(&db_tx)
                .await?;

            let mut expired = Vec::with_capacity(stale.len());
            for model in stale {
                let request = ChangeRequest::try_from(model)?;
                self.release_request(&db_tx, &request, ChangeRequestStatus::Expired, None, now)
                    .await?;
                expired.push(request.id);
            }
            if !expired.is_empty() {
                tracing::info!(count = expired.len(), "change requests expired");
            }
            Ok(expired)
        })
    }

    pub async fn change_request(
        &self,
        actor: &Actor,
        request_id: Uuid,
    ) -> ResultEngine<ChangeRequest> {
        with_tx!(self, |db_tx| {
            self.require_change_request(&db_tx, actor, request_id).await
        })
    }

    /// Lists the team's change requests, newest first.
    pub async fn list_change_requests(
        &self,
        actor: &Actor,
        filter: &ChangeRequestFilter,
    ) -> ResultEngine<Vec<ChangeRequest>> {
        with_tx!(self, |db_tx| {
            let mut query = change_requests::Entity::find()
                .filter(change_requests::Column::TeamId.eq(actor.team_id.clone()));
            query = match filter.scope {
                ChangeRequestScope::Incoming => query.filter(
                    change_requests::Column::TargetOwnerId.eq(actor.user_id.clone()),
                ),
                ChangeRequestScope::Outgoing => query
                    .filter(change_requests::Column::RequesterId.eq(actor.user_id.clone())),
                ChangeRequestScope::All => query,
            };
            if let Some(status) = filter.status {
                query = query.filter(change_requests::Column::Status.eq(status.as_str()));
            }
            query
                .order_by_desc(change_requests::Column::CreatedAt)
                .order_by_desc(change_requests::Column::Id)
                .all(&db_tx)
                .await?
                .into_iter()
                .map(ChangeRequest::try_from)
                .collect::<ResultEngine<Vec<_>>>()
        })
    }

    /// Loads a transaction a request may be raised against.
    async fn require_requestable(
        &self,
        db: &DatabaseTransaction,
        actor: &Actor,
        transaction_id: Uuid,
    ) -> ResultEngine<Transaction> {
        let tx = self.require_transaction(db, actor, transaction_id).await?;
        if tx.is_owned_by(&actor.user_id) {
            return Err(EngineError::Validation(
                "owners change their own transactions directly".to_string(),
            ));
        }
        if tx.status != TransactionStatus::Approved {
            return Err(EngineError::Conflict(
                "a change request is already pending for this transaction".to_string(),
            ));
        }
        // Only the owner resolves, and a former member no longer can.
        if self
            .find_membership(db, &actor.team_id, &tx.owner_user_id)
            .await?
            .is_none()
        {
            return Err(EngineError::Conflict(
                "the transaction owner is no longer a member of the team".to_string(),
            ));
        }
        Ok(tx)
    }

    /// Flags the target transaction and stores the pending request.
    async fn open_request(
        &self,
        db: &DatabaseTransaction,
        request: &ChangeRequest,
    ) -> ResultEngine<()> {
        guards::transition_transaction(
            db,
            request.target_transaction_id,
            TransactionStatus::Approved,
            request.kind.pending_status(),
        )
        .await?;
        change_requests::ActiveModel::try_from(request)?
            .insert(db)
            .await
            .map_err(|err| {
                EngineError::from_write(
                    err,
                    "a change request is already pending for this transaction",
                )
            })?;
        tracing::info!(
            request_id = %request.id,
            transaction_id = %request.target_transaction_id,
            requester = %request.requester_id,
            kind = request.kind.as_str(),
            "change request opened"
        );
        Ok(())
    }

    /// Closes a pending request without applying it and returns its target
    /// to `Approved`.
    pub(super) async fn release_request(
        &self,
        db: &DatabaseTransaction,
        request: &ChangeRequest,
        to: ChangeRequestStatus,
        resolved_by: Option<&str>,
        at: DateTime<Utc>,
    ) -> ResultEngine<()> {
        guards::close_request(db, request.id, to, resolved_by, at).await?;
        guards::transition_transaction(
            db,
            request.target_transaction_id,
            request.kind.pending_status(),
            TransactionStatus::Approved,
        )
        .await?;
        tracing::info!(
            request_id = %request.id,
            status = to.as_str(),
            "change request released"
        );
        Ok(())
    }
}
