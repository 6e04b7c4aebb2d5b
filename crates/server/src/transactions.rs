//! Transactions API endpoints

use api_types::{
    change_request::{ChangeRequestView, DeleteRequestNew, EditRequestNew},
    transaction::{
        TransactionChanges, TransactionKind as ApiKind, TransactionList, TransactionListResponse,
        TransactionNew, TransactionStatus as ApiStatus, TransactionView,
    },
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use uuid::Uuid;

use crate::{ServerError, change_requests::change_request_view, server::ServerState, user};

pub(crate) fn map_kind(kind: engine::TransactionKind) -> ApiKind {
    match kind {
        engine::TransactionKind::Income => ApiKind::Income,
        engine::TransactionKind::Expense => ApiKind::Expense,
    }
}

fn engine_kind(kind: ApiKind) -> engine::TransactionKind {
    match kind {
        ApiKind::Income => engine::TransactionKind::Income,
        ApiKind::Expense => engine::TransactionKind::Expense,
    }
}

fn map_status(status: engine::TransactionStatus) -> ApiStatus {
    match status {
        engine::TransactionStatus::Approved => ApiStatus::Approved,
        engine::TransactionStatus::EditRequested => ApiStatus::EditRequested,
        engine::TransactionStatus::DeleteRequested => ApiStatus::DeleteRequested,
    }
}

fn engine_status(status: ApiStatus) -> engine::TransactionStatus {
    match status {
        ApiStatus::Approved => engine::TransactionStatus::Approved,
        ApiStatus::EditRequested => engine::TransactionStatus::EditRequested,
        ApiStatus::DeleteRequested => engine::TransactionStatus::DeleteRequested,
    }
}

pub(crate) fn map_changes(changes: engine::TransactionChanges) -> TransactionChanges {
    TransactionChanges {
        amount_minor: changes.amount_minor,
        kind: changes.kind.map(map_kind),
        category: changes.category,
        note: changes.note,
    }
}

fn engine_changes(changes: TransactionChanges) -> engine::TransactionChanges {
    engine::TransactionChanges {
        amount_minor: changes.amount_minor,
        kind: changes.kind.map(engine_kind),
        category: changes.category,
        note: changes.note,
    }
}

pub(crate) fn transaction_view(tx: engine::Transaction) -> TransactionView {
    TransactionView {
        id: tx.id,
        owner: tx.owner_user_id,
        kind: map_kind(tx.kind),
        amount_minor: tx.amount_minor,
        category: tx.category,
        note: tx.note,
        status: map_status(tx.status),
        created_at: tx.created_at,
        updated_at: tx.updated_at,
    }
}

pub async fn list(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(team_id): Path<String>,
    Query(query): Query<TransactionList>,
) -> Result<Json<TransactionListResponse>, ServerError> {
    let actor = state.actor(&team_id, &user).await?;
    let filter = engine::TransactionListFilter {
        owner_user_id: query.owner,
        kind: query.kind.map(engine_kind),
        status: query.status.map(engine_status),
    };

    let transactions = state
        .engine
        .list_transactions(&actor, &filter)
        .await?
        .into_iter()
        .map(transaction_view)
        .collect();

    Ok(Json(TransactionListResponse { transactions }))
}

pub async fn create(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(team_id): Path<String>,
    Json(payload): Json<TransactionNew>,
) -> Result<(StatusCode, Json<TransactionView>), ServerError> {
    let actor = state.actor(&team_id, &user).await?;
    let mut cmd = engine::NewTransactionCmd::new(
        engine_kind(payload.kind),
        payload.amount_minor,
        payload.category,
    );
    if let Some(note) = payload.note {
        cmd = cmd.note(note);
    }

    let tx = state.engine.create_transaction(&actor, cmd).await?;
    Ok((StatusCode::CREATED, Json(transaction_view(tx))))
}

pub async fn get(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path((team_id, id)): Path<(String, Uuid)>,
) -> Result<Json<TransactionView>, ServerError> {
    let actor = state.actor(&team_id, &user).await?;
    let tx = state.engine.transaction(&actor, id).await?;
    Ok(Json(transaction_view(tx)))
}

/// Direct edit, reserved to the transaction's owner.
pub async fn update(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path((team_id, id)): Path<(String, Uuid)>,
    Json(payload): Json<TransactionChanges>,
) -> Result<Json<TransactionView>, ServerError> {
    let actor = state.actor(&team_id, &user).await?;
    let tx = state
        .engine
        .edit_own_transaction(&actor, id, engine_changes(payload))
        .await?;
    Ok(Json(transaction_view(tx)))
}

/// Direct removal, reserved to the transaction's owner.
pub async fn delete(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path((team_id, id)): Path<(String, Uuid)>,
) -> Result<StatusCode, ServerError> {
    let actor = state.actor(&team_id, &user).await?;
    state.engine.delete_own_transaction(&actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn request_edit(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path((team_id, id)): Path<(String, Uuid)>,
    Json(payload): Json<EditRequestNew>,
) -> Result<(StatusCode, Json<ChangeRequestView>), ServerError> {
    let actor = state.actor(&team_id, &user).await?;
    let request = state
        .engine
        .request_edit_others(&actor, id, engine_changes(payload.changes), &payload.reason)
        .await?;
    Ok((StatusCode::CREATED, Json(change_request_view(request))))
}

pub async fn request_delete(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path((team_id, id)): Path<(String, Uuid)>,
    Json(payload): Json<DeleteRequestNew>,
) -> Result<(StatusCode, Json<ChangeRequestView>), ServerError> {
    let actor = state.actor(&team_id, &user).await?;
    let request = state
        .engine
        .request_delete_others(&actor, id, &payload.reason)
        .await?;
    Ok((StatusCode::CREATED, Json(change_request_view(request))))
}
