//! Identity profile snapshots supplied by the identity provider.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::Role;

/// Immutable snapshot of a signed-in identity.
///
/// Owned by the identity provider; the cache copies it into each
/// [`CachedSession`](crate::session::CachedSession) it builds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityProfile {
    /// Stable, unique identity id.
    pub id: String,

    /// Email address.
    pub email: String,

    /// Assigned role.
    #[serde(default)]
    pub role: Role,

    /// Name shown in the UI.
    pub display_name: String,

    /// Whether the email address has been verified.
    #[serde(default)]
    pub email_verified: bool,

    /// When the identity was created.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,

    /// When the identity was last updated.
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl IdentityProfile {
    /// Creates a profile with the given id, email and role.
    ///
    /// The display name defaults to the local part of the email address and
    /// both timestamps are set to `now`.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        email: impl Into<String>,
        role: Role,
        now: OffsetDateTime,
    ) -> Self {
        let email = email.into();
        let display_name = email.split('@').next().unwrap_or_default().to_string();
        Self {
            id: id.into(),
            email,
            role,
            display_name,
            email_verified: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Sets the display name.
    #[must_use]
    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }

    /// Sets the email-verified flag.
    #[must_use]
    pub fn with_email_verified(mut self, verified: bool) -> Self {
        self.email_verified = verified;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn test_display_name_defaults_to_email_local_part() {
        let profile = IdentityProfile::new(
            "u1",
            "ada@example.com",
            Role::Writer,
            datetime!(2024-03-01 09:00:00 UTC),
        );
        assert_eq!(profile.display_name, "ada");
        assert!(!profile.email_verified);
        assert_eq!(profile.created_at, profile.updated_at);
    }

    #[test]
    fn test_serde_camel_case() {
        let profile = IdentityProfile::new(
            "u1",
            "ada@example.com",
            Role::Admin,
            datetime!(2024-03-01 09:00:00 UTC),
        )
        .with_display_name("Ada")
        .with_email_verified(true);

        let json = serde_json::to_value(&profile).unwrap();
        assert_eq!(json["displayName"], "Ada");
        assert_eq!(json["emailVerified"], true);
        assert_eq!(json["role"], "admin");
        assert_eq!(json["createdAt"], "2024-03-01T09:00:00Z");

        let back: IdentityProfile = serde_json::from_value(json).unwrap();
        assert_eq!(back, profile);
    }
}
