//! Guarded state transitions.
//!
//! Every status change is a single `UPDATE … WHERE status = <expected>`.
//! A statement that touches no row lost a race against another writer and
//! fails with [`EngineError::Conflict`]; the surrounding DB transaction then
//! rolls back whatever the call already wrote.

use chrono::{DateTime, Utc};
use sea_orm::{DatabaseTransaction, QueryFilter, prelude::*, sea_query::Expr};
use uuid::Uuid;

use crate::{
    ChangeRequestStatus, EngineError, ResultEngine, Transaction, TransactionStatus,
    change_requests, transactions,
};

fn ensure_one_row(rows_affected: u64, what: &str) -> ResultEngine<()> {
    if rows_affected != 1 {
        tracing::warn!("guarded transition lost: {what}");
        return Err(EngineError::Conflict(what.to_string()));
    }
    Ok(())
}

/// Writes `tx` (fields and status) if the stored status is still `expected`.
pub(super) async fn write_transaction(
    db: &DatabaseTransaction,
    tx: &Transaction,
    expected: TransactionStatus,
) -> ResultEngine<()> {
    let res = transactions::Entity::update_many()
        .col_expr(transactions::Column::Kind, Expr::value(tx.kind.as_str()))
        .col_expr(transactions::Column::AmountMinor, Expr::value(tx.amount_minor))
        .col_expr(transactions::Column::Category, Expr::value(tx.category.clone()))
        .col_expr(transactions::Column::Note, Expr::value(tx.note.clone()))
        .col_expr(transactions::Column::Status, Expr::value(tx.status.as_str()))
        .col_expr(transactions::Column::UpdatedAt, Expr::value(tx.updated_at))
        .filter(transactions::Column::Id.eq(tx.id.to_string()))
        .filter(transactions::Column::Status.eq(expected.as_str()))
        .exec(db)
        .await?;
    ensure_one_row(res.rows_affected, "transaction status changed concurrently")
}

/// Moves a transaction from `from` to `to` without touching its fields.
pub(super) async fn transition_transaction(
    db: &DatabaseTransaction,
    transaction_id: Uuid,
    from: TransactionStatus,
    to: TransactionStatus,
) -> ResultEngine<()> {
    let res = transactions::Entity::update_many()
        .col_expr(transactions::Column::Status, Expr::value(to.as_str()))
        .filter(transactions::Column::Id.eq(transaction_id.to_string()))
        .filter(transactions::Column::Status.eq(from.as_str()))
        .exec(db)
        .await?;
    ensure_one_row(
        res.rows_affected,
        "transaction is not in the expected status",
    )
}

/// Removes a transaction if its status is still `expected`.
pub(super) async fn delete_transaction(
    db: &DatabaseTransaction,
    transaction_id: Uuid,
    expected: TransactionStatus,
) -> ResultEngine<()> {
    let res = transactions::Entity::delete_many()
        .filter(transactions::Column::Id.eq(transaction_id.to_string()))
        .filter(transactions::Column::Status.eq(expected.as_str()))
        .exec(db)
        .await?;
    ensure_one_row(res.rows_affected, "transaction changed concurrently")
}

/// Closes a pending change request with a terminal status.
pub(super) async fn close_request(
    db: &DatabaseTransaction,
    request_id: Uuid,
    to: ChangeRequestStatus,
    resolved_by: Option<&str>,
    at: DateTime<Utc>,
) -> ResultEngine<()> {
    debug_assert!(to.is_terminal());
    let res = change_requests::Entity::update_many()
        .col_expr(change_requests::Column::Status, Expr::value(to.as_str()))
        .col_expr(change_requests::Column::ResolvedAt, Expr::value(Some(at)))
        .col_expr(
            change_requests::Column::ResolvedBy,
            Expr::value(resolved_by.map(ToString::to_string)),
        )
        .filter(change_requests::Column::Id.eq(request_id.to_string()))
        .filter(change_requests::Column::Status.eq(ChangeRequestStatus::Pending.as_str()))
        .exec(db)
        .await?;
    ensure_one_row(res.rows_affected, "change request already resolved")
}
