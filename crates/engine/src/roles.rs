//! Team roles and the rank comparisons every authority check is built on.
//!
//! Roles form a fixed total order, lower rank means more authority:
//! `Owner (0) < Admin (1) < Deputy (2) < Member (3)`.
//!
//! Role strings are parsed into [`Role`] exactly once, where they enter the
//! engine (a storage row or a request body). Comparisons never look at
//! strings.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::EngineError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Owner,
    Admin,
    Deputy,
    Member,
}

impl Role {
    /// Every role, most authoritative first.
    pub const ALL: [Role; 4] = [Role::Owner, Role::Admin, Role::Deputy, Role::Member];

    pub fn rank(self) -> u8 {
        match self {
            Self::Owner => 0,
            Self::Admin => 1,
            Self::Deputy => 2,
            Self::Member => 3,
        }
    }

    /// `true` if `self` strictly outranks `other`.
    pub fn can_override_rank(self, other: Role) -> bool {
        self.rank() < other.rank()
    }

    /// `true` if a member holding `self` may grant `new_role` to someone.
    ///
    /// Nobody can grant a role equal to or above their own, so `Owner` can
    /// never be granted.
    pub fn can_assign_role(self, new_role: Role) -> bool {
        self.rank() < new_role.rank()
    }

    /// Returns the canonical role string used by the database.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Owner => "owner",
            Self::Admin => "admin",
            Self::Deputy => "deputy",
            Self::Member => "member",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Role {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "owner" => Ok(Self::Owner),
            "admin" => Ok(Self::Admin),
            "deputy" => Ok(Self::Deputy),
            "member" => Ok(Self::Member),
            other => Err(EngineError::InvalidRole(format!(
                "invalid team role: {other}"
            ))),
        }
    }
}

impl FromStr for Role {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::try_from(s)
    }
}

/// Free-function form of [`Role::can_override_rank`].
pub fn can_override_rank(a: Role, b: Role) -> bool {
    a.can_override_rank(b)
}

/// Free-function form of [`Role::can_assign_role`].
pub fn can_assign_role(actor: Role, new_role: Role) -> bool {
    actor.can_assign_role(new_role)
}
