//! Identity Context passed to every engine call.

use crate::Role;

/// Who is calling, in which team, with what actual role.
///
/// The engine trusts the value: it is built by the authentication layer,
/// usually through [`Engine::actor`](crate::Engine::actor), which reads the
/// persisted membership row. It carries no display role, so a
/// [`ViewMode`](crate::ViewMode) cannot reach an authority check.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Actor {
    pub user_id: String,
    pub team_id: String,
    pub role: Role,
}

impl Actor {
    #[must_use]
    pub fn new(user_id: impl Into<String>, team_id: impl Into<String>, role: Role) -> Self {
        Self {
            user_id: user_id.into(),
            team_id: team_id.into(),
            role,
        }
    }
}
