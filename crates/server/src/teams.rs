use axum::{Extension, Json, extract::State, http::StatusCode};

use api_types::team::{TeamNew, TeamView, TeamsResponse};
use engine::{Role, Team};

use crate::{ServerError, memberships::map_role, server::ServerState, user};

fn team_view(team: Team, role: Role) -> TeamView {
    TeamView {
        id: team.id,
        name: team.name,
        created_by: team.created_by,
        created_at: team.created_at,
        role: map_role(role),
    }
}

/// Creates a team owned by the caller.
pub async fn create(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<TeamNew>,
) -> Result<(StatusCode, Json<TeamView>), ServerError> {
    let team = state
        .engine
        .create_team(&payload.name, &user.username)
        .await?;
    Ok((StatusCode::CREATED, Json(team_view(team, Role::Owner))))
}

/// Teams the caller belongs to.
pub async fn list(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
) -> Result<Json<TeamsResponse>, ServerError> {
    let teams = state
        .engine
        .teams_of(&user.username)
        .await?
        .into_iter()
        .map(|(team, role)| team_view(team, role))
        .collect();
    Ok(Json(TeamsResponse { teams }))
}
