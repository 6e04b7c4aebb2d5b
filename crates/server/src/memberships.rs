//! Team membership endpoints.

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};

use api_types::membership::{MemberNew, MemberView, MembersResponse, RoleUpdate, TeamRole};
use engine::{Role, TeamMembership};

use crate::{ServerError, server::ServerState, user};

pub(crate) fn map_role(role: Role) -> TeamRole {
    match role {
        Role::Owner => TeamRole::Owner,
        Role::Admin => TeamRole::Admin,
        Role::Deputy => TeamRole::Deputy,
        Role::Member => TeamRole::Member,
    }
}

pub(crate) fn engine_role(role: TeamRole) -> Role {
    match role {
        TeamRole::Owner => Role::Owner,
        TeamRole::Admin => Role::Admin,
        TeamRole::Deputy => Role::Deputy,
        TeamRole::Member => Role::Member,
    }
}

fn member_view(membership: TeamMembership) -> MemberView {
    MemberView {
        username: membership.user_id,
        role: map_role(membership.role),
    }
}

pub async fn list(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(team_id): Path<String>,
) -> Result<Json<MembersResponse>, ServerError> {
    let actor = state.actor(&team_id, &user).await?;
    let members = state
        .engine
        .list_members(&actor)
        .await?
        .into_iter()
        .map(member_view)
        .collect();

    Ok(Json(MembersResponse { members }))
}

pub async fn add(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(team_id): Path<String>,
    Json(payload): Json<MemberNew>,
) -> Result<(StatusCode, Json<MemberView>), ServerError> {
    let actor = state.actor(&team_id, &user).await?;
    let membership = state
        .engine
        .add_member(&actor, &payload.username, engine_role(payload.role))
        .await?;
    Ok((StatusCode::CREATED, Json(member_view(membership))))
}

pub async fn assign_role(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path((team_id, username)): Path<(String, String)>,
    Json(payload): Json<RoleUpdate>,
) -> Result<Json<MemberView>, ServerError> {
    let actor = state.actor(&team_id, &user).await?;
    let membership = state
        .engine
        .assign_role(&actor, &username, engine_role(payload.role))
        .await?;
    Ok(Json(member_view(membership)))
}

pub async fn remove(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path((team_id, username)): Path<(String, String)>,
) -> Result<StatusCode, ServerError> {
    let actor = state.actor(&team_id, &user).await?;
    state.engine.remove_member(&actor, &username).await?;
    Ok(StatusCode::NO_CONTENT)
}
