//! View mode validation.
//!
//! The server keeps no session: it checks the requested mode against the
//! caller's actual role and echoes the result back for the client to keep.

use axum::{
    Extension, Json,
    extract::{Path, State},
};

use api_types::view_mode::{ViewModeSelect, ViewModeView};
use engine::ViewMode;

use crate::{
    ServerError,
    memberships::{engine_role, map_role},
    server::ServerState,
    user,
};

pub async fn select(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(team_id): Path<String>,
    Json(payload): Json<ViewModeSelect>,
) -> Result<Json<ViewModeView>, ServerError> {
    let actor = state.actor(&team_id, &user).await?;
    let mode = ViewMode::with_selection(actor.role, engine_role(payload.mode))?;

    Ok(Json(ViewModeView {
        actual_role: map_role(mode.actual_role()),
        selected_mode: map_role(mode.selected_mode()),
        available_modes: mode.available_modes().into_iter().map(map_role).collect(),
    }))
}
