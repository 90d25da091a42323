//! Identity provider seam.
//!
//! Profiles come from a hosted identity service outside this crate. The cache
//! only needs to fetch a profile by id when a session must be rebuilt, for
//! example after an administrator changed someone's role.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::AuthResult;
use crate::error::AuthError;
use crate::types::IdentityProfile;

/// Source of identity profiles.
pub trait IdentityProvider: Send + Sync {
    /// Fetches the current profile for `id`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::IdentityProvider`] if the profile cannot be
    /// fetched or does not exist.
    fn fetch_identity_profile(&self, id: &str) -> AuthResult<IdentityProfile>;
}

/// Identity provider serving profiles from memory.
///
/// Useful in tests and for tooling that seeds sessions locally.
#[derive(Debug, Default)]
pub struct StaticIdentityProvider {
    profiles: RwLock<HashMap<String, IdentityProfile>>,
}

impl StaticIdentityProvider {
    /// Creates an empty provider.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a profile.
    pub fn upsert(&self, profile: IdentityProfile) {
        if let Ok(mut profiles) = self.profiles.write() {
            profiles.insert(profile.id.clone(), profile);
        }
    }

    /// Removes a profile.
    pub fn remove(&self, id: &str) {
        if let Ok(mut profiles) = self.profiles.write() {
            profiles.remove(id);
        }
    }
}

impl IdentityProvider for StaticIdentityProvider {
    fn fetch_identity_profile(&self, id: &str) -> AuthResult<IdentityProfile> {
        self.profiles
            .read()
            .map_err(|_| AuthError::identity_provider("profile table lock poisoned"))?
            .get(id)
            .cloned()
            .ok_or_else(|| AuthError::identity_provider(format!("no profile for identity {id}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Role;
    use time::macros::datetime;

    #[test]
    fn test_static_provider() {
        let provider = StaticIdentityProvider::new();
        let profile = IdentityProfile::new(
            "u1",
            "u1@example.com",
            Role::User,
            datetime!(2024-01-01 00:00:00 UTC),
        );
        provider.upsert(profile.clone());

        assert_eq!(provider.fetch_identity_profile("u1").unwrap(), profile);
        assert!(matches!(
            provider.fetch_identity_profile("missing"),
            Err(AuthError::IdentityProvider { .. })
        ));

        provider.remove("u1");
        assert!(provider.fetch_identity_profile("u1").is_err());
    }
}
