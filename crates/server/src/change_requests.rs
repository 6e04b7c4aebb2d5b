//! Change request endpoints: listing, resolution by the transaction owner
//! and cancellation by the requester.

use api_types::change_request::{
    ChangeRequestKind as ApiKind, ChangeRequestList, ChangeRequestListResponse,
    ChangeRequestScope as ApiScope, ChangeRequestStatus as ApiStatus, ChangeRequestView,
    ResolutionView, Resolve, ResolveAction as ApiAction,
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use engine::{ChangeRequest, ChangeRequestKind, ChangeRequestScope, ChangeRequestStatus};
use uuid::Uuid;

use crate::{
    ServerError,
    server::ServerState,
    transactions::{map_changes, transaction_view},
    user,
};

fn map_kind(kind: ChangeRequestKind) -> ApiKind {
    match kind {
        ChangeRequestKind::Edit => ApiKind::Edit,
        ChangeRequestKind::Delete => ApiKind::Delete,
    }
}

fn map_status(status: ChangeRequestStatus) -> ApiStatus {
    match status {
        ChangeRequestStatus::Pending => ApiStatus::Pending,
        ChangeRequestStatus::Approved => ApiStatus::Approved,
        ChangeRequestStatus::Rejected => ApiStatus::Rejected,
        ChangeRequestStatus::Cancelled => ApiStatus::Cancelled,
        ChangeRequestStatus::Expired => ApiStatus::Expired,
    }
}

fn engine_status(status: ApiStatus) -> ChangeRequestStatus {
    match status {
        ApiStatus::Pending => ChangeRequestStatus::Pending,
        ApiStatus::Approved => ChangeRequestStatus::Approved,
        ApiStatus::Rejected => ChangeRequestStatus::Rejected,
        ApiStatus::Cancelled => ChangeRequestStatus::Cancelled,
        ApiStatus::Expired => ChangeRequestStatus::Expired,
    }
}

fn engine_scope(scope: ApiScope) -> ChangeRequestScope {
    match scope {
        ApiScope::Incoming => ChangeRequestScope::Incoming,
        ApiScope::Outgoing => ChangeRequestScope::Outgoing,
        ApiScope::All => ChangeRequestScope::All,
    }
}

pub(crate) fn change_request_view(request: ChangeRequest) -> ChangeRequestView {
    ChangeRequestView {
        id: request.id,
        transaction_id: request.target_transaction_id,
        transaction_owner: request.target_owner_id,
        requester: request.requester_id,
        kind: map_kind(request.kind),
        proposed_changes: request.proposed_changes.map(map_changes),
        reason: request.reason,
        status: map_status(request.status),
        created_at: request.created_at,
        resolved_at: request.resolved_at,
        resolved_by: request.resolved_by,
    }
}

pub async fn list(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(team_id): Path<String>,
    Query(query): Query<ChangeRequestList>,
) -> Result<Json<ChangeRequestListResponse>, ServerError> {
    let actor = state.actor(&team_id, &user).await?;
    let filter = engine::ChangeRequestFilter {
        scope: query.scope.map(engine_scope).unwrap_or_default(),
        status: query.status.map(engine_status),
    };

    let change_requests = state
        .engine
        .list_change_requests(&actor, &filter)
        .await?
        .into_iter()
        .map(change_request_view)
        .collect();

    Ok(Json(ChangeRequestListResponse { change_requests }))
}

pub async fn get(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path((team_id, id)): Path<(String, Uuid)>,
) -> Result<Json<ChangeRequestView>, ServerError> {
    let actor = state.actor(&team_id, &user).await?;
    let request = state.engine.change_request(&actor, id).await?;
    Ok(Json(change_request_view(request)))
}

pub async fn resolve(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path((team_id, id)): Path<(String, Uuid)>,
    Json(payload): Json<Resolve>,
) -> Result<Json<ResolutionView>, ServerError> {
    let actor = state.actor(&team_id, &user).await?;
    let action = match payload.action {
        ApiAction::Approve => engine::ResolveAction::Approve,
        ApiAction::Reject => engine::ResolveAction::Reject,
    };

    let resolution = state.engine.confirm_change(&actor, id, action).await?;
    Ok(Json(ResolutionView {
        change_request: change_request_view(resolution.request),
        transaction: resolution.transaction.map(transaction_view),
        deleted: resolution.deleted,
    }))
}

pub async fn cancel(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path((team_id, id)): Path<(String, Uuid)>,
) -> Result<Json<ChangeRequestView>, ServerError> {
    let actor = state.actor(&team_id, &user).await?;
    let request = state.engine.cancel_change_request(&actor, id).await?;
    Ok(Json(change_request_view(request)))
}
