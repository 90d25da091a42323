//! Identity roles.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AuthError;

/// Closed classification of an identity driving authorization.
///
/// Roles are ordered by rank: every role holds at least the permissions of
/// the roles ranked below it.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Authenticated identity with no assigned role.
    #[default]
    Guest,
    /// Regular reader account.
    User,
    /// Account allowed to author articles.
    Writer,
    /// Platform administrator.
    Admin,
}

impl Role {
    /// All roles in ascending rank order.
    pub const ALL: [Role; 4] = [Role::Guest, Role::User, Role::Writer, Role::Admin];

    /// Returns the role name as stored by the identity provider.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Guest => "guest",
            Self::User => "user",
            Self::Writer => "writer",
            Self::Admin => "admin",
        }
    }

    /// Numeric rank, `0` for guest up to `3` for admin.
    #[must_use]
    pub fn rank(&self) -> u8 {
        match self {
            Self::Guest => 0,
            Self::User => 1,
            Self::Writer => 2,
            Self::Admin => 3,
        }
    }

    /// Interprets a role claim leniently.
    ///
    /// An absent or unrecognized claim maps to [`Role::Guest`], which
    /// resolves to the baseline permission set.
    #[must_use]
    pub fn from_claim(claim: Option<&str>) -> Self {
        match claim {
            Some(value) => value.parse().unwrap_or_else(|_| {
                tracing::debug!(role = value, "Unrecognized role claim, using baseline");
                Self::Guest
            }),
            None => Self::Guest,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "guest" => Ok(Self::Guest),
            "user" => Ok(Self::User),
            "writer" => Ok(Self::Writer),
            "admin" => Ok(Self::Admin),
            _ => Err(AuthError::unknown_role(s)),
        }
    }
}
