//! Session caching.
//!
//! A [`CachedSession`] pairs an identity snapshot with its derived
//! permission set and a freshness window. [`SessionCache`] owns the table of
//! cached sessions, mirrors it into a persistent store, and answers
//! authorization queries.

pub mod cache;
pub mod clock;
pub mod provider;

use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

use crate::types::{IdentityProfile, PermissionSet, Role};

pub use cache::{SessionCache, SessionCacheBuilder, SessionCacheStats};
pub use clock::{Clock, ManualClock, SystemClock};
pub use provider::{IdentityProvider, StaticIdentityProvider};

/// Time-stamped pairing of an identity snapshot and its permission set.
///
/// Sessions are replaced wholesale, never patched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedSession {
    /// Identity snapshot taken when the session was cached.
    pub profile: IdentityProfile,

    /// Permission set resolved from the snapshot's role.
    pub permissions: PermissionSet,

    /// When the session was cached.
    #[serde(with = "time::serde::rfc3339")]
    pub last_updated: OffsetDateTime,

    /// End of the freshness window (`last_updated + ttl`).
    #[serde(with = "time::serde::rfc3339")]
    pub expires_at: OffsetDateTime,
}

impl CachedSession {
    /// Identity id of the session owner.
    #[must_use]
    pub fn identity_id(&self) -> &str {
        &self.profile.id
    }

    /// Role of the session owner.
    #[must_use]
    pub fn role(&self) -> Role {
        self.profile.role
    }

    /// Returns `true` if the session is still fresh at `now`.
    #[must_use]
    pub fn is_fresh_at(&self, now: OffsetDateTime) -> bool {
        now < self.expires_at
    }

    /// Time left until expiry, zero once expired.
    #[must_use]
    pub fn remaining_at(&self, now: OffsetDateTime) -> Duration {
        (self.expires_at - now).max(Duration::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::resolve;
    use time::macros::datetime;

    #[test]
    fn test_freshness_boundary() {
        let start = datetime!(2024-01-01 00:00:00 UTC);
        let session = CachedSession {
            profile: IdentityProfile::new("u1", "u1@example.com", Role::User, start),
            permissions: resolve(Role::User),
            last_updated: start,
            expires_at: start + Duration::minutes(30),
        };

        assert!(session.is_fresh_at(start));
        assert!(session.is_fresh_at(start + Duration::minutes(29)));
        assert!(!session.is_fresh_at(start + Duration::minutes(30)));
        assert_eq!(session.remaining_at(start), Duration::minutes(30));
        assert_eq!(
            session.remaining_at(start + Duration::hours(2)),
            Duration::ZERO
        );
        assert_eq!(session.identity_id(), "u1");
        assert_eq!(session.role(), Role::User);
    }
}
