//! Cosmetic display role selection.
//!
//! A [`ViewMode`] lets a member look at the ledger as if they held a lower
//! role. It lives for one session and is never read by an authority check:
//! every engine operation takes an [`Actor`](crate::Actor), which only
//! carries the actual role.

use serde::{Deserialize, Serialize};

use crate::{EngineError, ResultEngine, Role};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewMode {
    actual_role: Role,
    selected_mode: Role,
}

impl ViewMode {
    /// Starts displaying the actual role.
    pub fn new(actual_role: Role) -> Self {
        Self {
            actual_role,
            selected_mode: actual_role,
        }
    }

    /// Builds a view mode with an initial selection.
    pub fn with_selection(actual_role: Role, selected_mode: Role) -> ResultEngine<Self> {
        let mut mode = Self::new(actual_role);
        mode.select(selected_mode)?;
        Ok(mode)
    }

    pub fn actual_role(&self) -> Role {
        self.actual_role
    }

    pub fn selected_mode(&self) -> Role {
        self.selected_mode
    }

    /// Switches the displayed role. Fails if `mode` carries more authority
    /// than the actual role.
    pub fn select(&mut self, mode: Role) -> ResultEngine<()> {
        if mode.can_override_rank(self.actual_role) {
            return Err(EngineError::Forbidden(format!(
                "view mode {mode} exceeds actual role {}",
                self.actual_role
            )));
        }
        self.selected_mode = mode;
        Ok(())
    }

    pub fn reset(&mut self) {
        self.selected_mode = self.actual_role;
    }

    /// Roles the member may display, most authoritative first.
    pub fn available_modes(&self) -> Vec<Role> {
        Role::ALL
            .into_iter()
            .filter(|r| r.rank() >= self.actual_role.rank())
            .collect()
    }

    pub fn is_narrowed(&self) -> bool {
        self.selected_mode != self.actual_role
    }
}
