//! Authorization cache configuration.
//!
//! # Example (TOML)
//!
//! ```toml
//! [cache]
//! ttl = "30m"
//! namespace = "quillpress_auth_cache"
//!
//! [store]
//! kind = "file"
//! dir = "/var/lib/quillpress/sessions"
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::storage::{FileKeyValueStore, InMemoryKeyValueStore, KeyValueStore, StoreError};

/// Default session lifetime.
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(30 * 60);

/// Default key namespace for persisted sessions.
pub const DEFAULT_NAMESPACE: &str = "quillpress_auth_cache";

/// Root configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthzConfig {
    /// Session cache settings.
    pub cache: SessionCacheConfig,

    /// Persistent backing store settings.
    pub store: StoreConfig,
}

/// Session cache settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SessionCacheConfig {
    /// How long a cached session stays fresh.
    #[serde(with = "humantime_serde")]
    pub ttl: Duration,

    /// Prefix of every persisted session key.
    /// Keys are `<namespace>_<identity id>`.
    pub namespace: String,
}

impl Default for SessionCacheConfig {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_SESSION_TTL,
            namespace: DEFAULT_NAMESPACE.to_string(),
        }
    }
}

impl SessionCacheConfig {
    /// The TTL as a `time::Duration`.
    ///
    /// Saturates at `time::Duration::MAX` for absurdly long TTLs.
    #[must_use]
    pub fn ttl(&self) -> time::Duration {
        time::Duration::try_from(self.ttl).unwrap_or(time::Duration::MAX)
    }

    /// Validates the cache settings.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if the TTL is zero or the namespace
    /// is empty or contains whitespace.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ttl.is_zero() {
            return Err(ConfigError::InvalidValue(
                "cache.ttl must be > 0".to_string(),
            ));
        }
        if self.namespace.is_empty() {
            return Err(ConfigError::InvalidValue(
                "cache.namespace cannot be empty".to_string(),
            ));
        }
        if self.namespace.chars().any(char::is_whitespace) {
            return Err(ConfigError::InvalidValue(format!(
                "cache.namespace '{}' cannot contain whitespace",
                self.namespace
            )));
        }
        Ok(())
    }
}

/// Which durable medium backs the session cache.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum StoreConfig {
    /// Process-local store; nothing survives a restart.
    #[default]
    Memory,
    /// One file per session inside `dir`.
    File {
        /// Directory holding session files.
        dir: PathBuf,
    },
}

impl StoreConfig {
    /// Opens the configured store.
    ///
    /// # Errors
    ///
    /// Returns an error if a file store directory cannot be created.
    pub fn open(&self) -> Result<Arc<dyn KeyValueStore>, StoreError> {
        match self {
            Self::Memory => Ok(Arc::new(InMemoryKeyValueStore::new())),
            Self::File { dir } => Ok(Arc::new(FileKeyValueStore::open(dir)?)),
        }
    }
}

impl AuthzConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// Returns an error if the document does not parse or fails validation.
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads and validates a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, does not parse, or fails
    /// validation.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` for an unusable cache section or an
    /// empty file store directory.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.cache.validate()?;
        match &self.store {
            StoreConfig::File { dir } if dir.as_os_str().is_empty() => Err(
                ConfigError::InvalidValue("store.dir cannot be empty".to_string()),
            ),
            _ => Ok(()),
        }
    }

    /// Renders the configuration as TOML.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An invalid configuration value was provided.
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),

    /// The configuration document could not be parsed.
    #[error("Failed to parse configuration: {0}")]
    Parse(String),

    /// The configuration file could not be read.
    #[error("Failed to read configuration: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AuthzConfig::default();
        assert_eq!(config.cache.ttl, Duration::from_secs(1800));
        assert_eq!(config.cache.ttl(), time::Duration::minutes(30));
        assert_eq!(config.cache.namespace, DEFAULT_NAMESPACE);
        assert_eq!(config.store, StoreConfig::Memory);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_toml() {
        let config = AuthzConfig::from_toml_str(
            r#"
            [cache]
            ttl = "45m"
            namespace = "qp_sessions"

            [store]
            kind = "file"
            dir = "/tmp/qp"
            "#,
        )
        .unwrap();
        assert_eq!(config.cache.ttl, Duration::from_secs(45 * 60));
        assert_eq!(config.cache.namespace, "qp_sessions");
        assert_eq!(
            config.store,
            StoreConfig::File {
                dir: PathBuf::from("/tmp/qp")
            }
        );
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = AuthzConfig::from_toml_str("[cache]\nttl = \"5m\"\n").unwrap();
        assert_eq!(config.cache.ttl, Duration::from_secs(300));
        assert_eq!(config.cache.namespace, DEFAULT_NAMESPACE);
        assert_eq!(config.store, StoreConfig::Memory);

        let empty = AuthzConfig::from_toml_str("").unwrap();
        assert_eq!(empty.cache.ttl, DEFAULT_SESSION_TTL);
    }

    #[test]
    fn test_zero_ttl_fails_validation() {
        let err = AuthzConfig::from_toml_str("[cache]\nttl = \"0s\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(_)));
        assert!(err.to_string().contains("ttl"));
    }

    #[test]
    fn test_bad_namespace_fails_validation() {
        let mut config = AuthzConfig::default();
        config.cache.namespace = String::new();
        assert!(config.validate().unwrap_err().to_string().contains("namespace"));

        config.cache.namespace = "two words".to_string();
        assert!(config.validate().unwrap_err().to_string().contains("whitespace"));
    }

    #[test]
    fn test_malformed_toml() {
        let err = AuthzConfig::from_toml_str("[cache\nttl=").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));

        let err = AuthzConfig::from_toml_str("[cache]\nttl = \"soon\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_toml_roundtrip() {
        let config = AuthzConfig {
            store: StoreConfig::File {
                dir: PathBuf::from("/var/lib/qp"),
            },
            ..Default::default()
        };
        let rendered = config.to_toml_string().unwrap();
        let parsed = AuthzConfig::from_toml_str(&rendered).unwrap();
        assert_eq!(parsed.store, config.store);
        assert_eq!(parsed.cache.ttl, config.cache.ttl);
    }

    #[test]
    fn test_open_file_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = StoreConfig::File {
            dir: dir.path().join("sessions"),
        }
        .open()
        .unwrap();
        store.set("k", "v").unwrap();
        assert!(dir.path().join("sessions").is_dir());
    }
}
