//! Authorization error types.
//!
//! The session cache swallows expected conditions (missing, expired or
//! corrupt entries) and answers them as cache misses or denials. The errors
//! here cover the remaining cases: malformed input handed to the core,
//! unusable configuration, and collaborator failures.

use std::fmt;

use crate::config::ConfigError;
use crate::storage::{EnvelopeError, StoreError};

/// Errors that can occur in the authorization core.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The identity id is empty or cannot be used as a cache key.
    #[error("Invalid identity: {message}")]
    InvalidIdentity {
        /// Description of why the identity is invalid.
        message: String,
    },

    /// A role name did not parse into a known role.
    #[error("Unknown role: {value}")]
    UnknownRole {
        /// The role name as received.
        value: String,
    },

    /// A route pattern could not be compiled.
    #[error("Invalid route pattern '{pattern}': {message}")]
    InvalidPattern {
        /// The offending pattern.
        pattern: String,
        /// Description of the problem.
        message: String,
    },

    /// The persistent backing store failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),

    /// A persisted session envelope could not be encoded or decoded.
    #[error("Envelope error: {0}")]
    Envelope(#[from] EnvelopeError),

    /// The configuration is invalid.
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),

    /// The identity provider failed to supply a profile.
    #[error("Identity provider error: {message}")]
    IdentityProvider {
        /// Description of the error.
        message: String,
    },
}

impl AuthError {
    /// Creates a new `InvalidIdentity` error.
    #[must_use]
    pub fn invalid_identity(message: impl Into<String>) -> Self {
        Self::InvalidIdentity {
            message: message.into(),
        }
    }

    /// Creates a new `UnknownRole` error.
    #[must_use]
    pub fn unknown_role(value: impl Into<String>) -> Self {
        Self::UnknownRole {
            value: value.into(),
        }
    }

    /// Creates a new `InvalidPattern` error.
    #[must_use]
    pub fn invalid_pattern(pattern: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidPattern {
            pattern: pattern.into(),
            message: message.into(),
        }
    }

    /// Creates a new `IdentityProvider` error.
    #[must_use]
    pub fn identity_provider(message: impl Into<String>) -> Self {
        Self::IdentityProvider {
            message: message.into(),
        }
    }

    /// Returns `true` if the caller supplied bad input.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidIdentity { .. } | Self::UnknownRole { .. } | Self::InvalidPattern { .. }
        )
    }

    /// Returns the error category for logging purposes.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidIdentity { .. } => ErrorCategory::Validation,
            Self::UnknownRole { .. } => ErrorCategory::Validation,
            Self::InvalidPattern { .. } => ErrorCategory::Policy,
            Self::Storage(_) => ErrorCategory::Infrastructure,
            Self::Envelope(_) => ErrorCategory::Infrastructure,
            Self::Configuration(_) => ErrorCategory::Configuration,
            Self::IdentityProvider { .. } => ErrorCategory::IdentityProvider,
        }
    }
}

/// Categories of authorization errors for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Bad input handed to the core.
    Validation,
    /// Static policy table problems.
    Policy,
    /// Persistent store failures.
    Infrastructure,
    /// Configuration errors.
    Configuration,
    /// Identity provider failures.
    IdentityProvider,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation => write!(f, "validation"),
            Self::Policy => write!(f, "policy"),
            Self::Infrastructure => write!(f, "infrastructure"),
            Self::Configuration => write!(f, "configuration"),
            Self::IdentityProvider => write!(f, "identity_provider"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AuthError::invalid_identity("identity id is empty");
        assert_eq!(err.to_string(), "Invalid identity: identity id is empty");

        let err = AuthError::unknown_role("owner");
        assert_eq!(err.to_string(), "Unknown role: owner");

        let err = AuthError::invalid_pattern("/a/:", "empty placeholder");
        assert_eq!(
            err.to_string(),
            "Invalid route pattern '/a/:': empty placeholder"
        );
    }

    #[test]
    fn test_store_error_conversion() {
        let err: AuthError = StoreError::invalid_key("bad key").into();
        assert!(matches!(err, AuthError::Storage(_)));
        assert_eq!(err.category(), ErrorCategory::Infrastructure);
        assert!(!err.is_client_error());
    }

    #[test]
    fn test_error_category() {
        assert_eq!(
            AuthError::invalid_identity("x").category(),
            ErrorCategory::Validation
        );
        assert_eq!(
            AuthError::invalid_pattern("x", "y").category(),
            ErrorCategory::Policy
        );
        assert_eq!(
            AuthError::from(ConfigError::InvalidValue("x".into())).category(),
            ErrorCategory::Configuration
        );
        assert_eq!(
            AuthError::identity_provider("x").category(),
            ErrorCategory::IdentityProvider
        );
        assert_eq!(ErrorCategory::IdentityProvider.to_string(), "identity_provider");
    }
}
