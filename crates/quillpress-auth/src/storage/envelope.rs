//! Serialized form of a cached session.
//!
//! The durable medium stores plain text, so timestamps are written as epoch
//! milliseconds and the role as its lowercase name. Envelopes carry a format
//! version; anything written in another version is rejected and treated by
//! the cache as a miss.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::session::CachedSession;
use crate::types::{IdentityProfile, PermissionSet, Role};

/// Current envelope format version.
pub const ENVELOPE_VERSION: u32 = 1;

/// Errors raised while encoding or decoding an envelope.
#[derive(Debug, thiserror::Error)]
pub enum EnvelopeError {
    /// The payload is not valid envelope JSON.
    #[error("Malformed envelope: {0}")]
    Json(#[from] serde_json::Error),

    /// The envelope was written by an incompatible format version.
    #[error("Unsupported envelope version {found}")]
    UnsupportedVersion {
        /// Version found in the payload.
        found: u32,
    },

    /// The stored role is not a known role.
    #[error("Unknown role in envelope: {value}")]
    UnknownRole {
        /// The stored role name.
        value: String,
    },

    /// A stored timestamp is out of range.
    #[error("Invalid timestamp in field {field}: {value}")]
    InvalidTimestamp {
        /// Name of the offending field.
        field: &'static str,
        /// The stored millisecond value.
        value: i64,
    },
}

/// Persisted copy of a [`CachedSession`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionEnvelope {
    pub version: u32,
    pub uid: String,
    pub role: String,
    pub display_name: String,
    pub email: String,
    pub email_verified: bool,
    pub created_at: i64,
    pub updated_at: i64,
    pub permissions: PermissionSet,
    pub last_updated: i64,
    pub expires_at: i64,
}

impl SessionEnvelope {
    /// Builds the envelope for `session`.
    #[must_use]
    pub fn from_session(session: &CachedSession) -> Self {
        let profile = &session.profile;
        Self {
            version: ENVELOPE_VERSION,
            uid: profile.id.clone(),
            role: profile.role.as_str().to_string(),
            display_name: profile.display_name.clone(),
            email: profile.email.clone(),
            email_verified: profile.email_verified,
            created_at: to_epoch_millis(profile.created_at),
            updated_at: to_epoch_millis(profile.updated_at),
            permissions: session.permissions.clone(),
            last_updated: to_epoch_millis(session.last_updated),
            expires_at: to_epoch_millis(session.expires_at),
        }
    }

    /// Serializes the envelope to JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn encode(&self) -> Result<String, EnvelopeError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parses an envelope and checks its version.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload is not envelope JSON or was written by
    /// another format version.
    pub fn decode(raw: &str) -> Result<Self, EnvelopeError> {
        let envelope: Self = serde_json::from_str(raw)?;
        if envelope.version != ENVELOPE_VERSION {
            return Err(EnvelopeError::UnsupportedVersion {
                found: envelope.version,
            });
        }
        Ok(envelope)
    }

    /// Converts the envelope back into a session.
    ///
    /// # Errors
    ///
    /// Returns an error if the role is unknown or a timestamp is out of range.
    pub fn into_session(self) -> Result<CachedSession, EnvelopeError> {
        let role: Role = self
            .role
            .parse()
            .map_err(|_| EnvelopeError::UnknownRole {
                value: self.role.clone(),
            })?;

        let profile = IdentityProfile {
            id: self.uid,
            email: self.email,
            role,
            display_name: self.display_name,
            email_verified: self.email_verified,
            created_at: from_epoch_millis("createdAt", self.created_at)?,
            updated_at: from_epoch_millis("updatedAt", self.updated_at)?,
        };

        Ok(CachedSession {
            profile,
            permissions: self.permissions,
            last_updated: from_epoch_millis("lastUpdated", self.last_updated)?,
            expires_at: from_epoch_millis("expiresAt", self.expires_at)?,
        })
    }
}

/// Milliseconds since the Unix epoch.
#[must_use]
pub fn to_epoch_millis(at: OffsetDateTime) -> i64 {
    (at.unix_timestamp_nanos() / 1_000_000) as i64
}

fn from_epoch_millis(field: &'static str, value: i64) -> Result<OffsetDateTime, EnvelopeError> {
    OffsetDateTime::from_unix_timestamp_nanos(i128::from(value) * 1_000_000)
        .map_err(|_| EnvelopeError::InvalidTimestamp { field, value })
}
