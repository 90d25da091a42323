//! Persistent backing store for cached sessions.
//!
//! The session cache persists through a minimal key-value interface so it
//! stays independent of the durable medium behind it:
//!
//! - [`KeyValueStore`] - the storage trait
//! - [`InMemoryKeyValueStore`] - process-local implementation for tests
//! - [`FileKeyValueStore`] - one file per key in a local directory
//! - [`SessionEnvelope`] - the serialized form of a cached session
//!
//! Entries written by the cache are keyed `<namespace>_<identity id>`, see
//! [`session_key`].

pub mod envelope;
pub mod file;
pub mod memory;

pub use envelope::{ENVELOPE_VERSION, EnvelopeError, SessionEnvelope};
pub use file::FileKeyValueStore;
pub use memory::InMemoryKeyValueStore;

/// Result type for key-value store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors raised by a key-value store implementation.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The underlying medium failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The key cannot be stored by this backend.
    #[error("Invalid key: {message}")]
    InvalidKey {
        /// Description of why the key was rejected.
        message: String,
    },

    /// The backend refused the operation.
    #[error("Store unavailable: {message}")]
    Unavailable {
        /// Description of the failure.
        message: String,
    },
}

impl StoreError {
    /// Creates a new `InvalidKey` error.
    #[must_use]
    pub fn invalid_key(message: impl Into<String>) -> Self {
        Self::InvalidKey {
            message: message.into(),
        }
    }

    /// Creates a new `Unavailable` error.
    #[must_use]
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }
}

/// Minimal durable key-value interface used by the session cache.
///
/// Values are plain text. Implementations must be safe to share between
/// threads; every call is a short synchronous unit.
pub trait KeyValueStore: Send + Sync {
    /// Reads the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the medium cannot be read.
    fn get(&self, key: &str) -> StoreResult<Option<String>>;

    /// Stores `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be written.
    fn set(&self, key: &str, value: &str) -> StoreResult<()>;

    /// Removes `key`. Removing a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the medium cannot be modified.
    fn delete(&self, key: &str) -> StoreResult<()>;

    /// Lists every stored key starting with `prefix`.
    ///
    /// # Errors
    ///
    /// Returns an error if the medium cannot be enumerated.
    fn keys_with_prefix(&self, prefix: &str) -> StoreResult<Vec<String>>;
}

/// Prefix shared by every session key in `namespace`.
#[must_use]
pub fn session_prefix(namespace: &str) -> String {
    format!("{namespace}_")
}

/// Builds the persistent key for an identity's session.
#[must_use]
pub fn session_key(namespace: &str, identity_id: &str) -> String {
    format!("{}{identity_id}", session_prefix(namespace))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_key_format() {
        assert_eq!(
            session_key("quillpress_auth_cache", "u-42"),
            "quillpress_auth_cache_u-42"
        );
        assert!(session_key("qp", "u1").starts_with(&session_prefix("qp")));
        assert!(!"qpx_theme".starts_with(&session_prefix("qp")));
    }

    #[test]
    fn test_store_error_display() {
        assert_eq!(
            StoreError::invalid_key("empty").to_string(),
            "Invalid key: empty"
        );
        assert_eq!(
            StoreError::unavailable("read-only").to_string(),
            "Store unavailable: read-only"
        );
    }
}
