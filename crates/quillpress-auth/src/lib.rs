//! # quillpress-auth
//!
//! Authorization cache and permission resolution for the Quillpress
//! publishing client.
//!
//! This crate provides:
//! - A static role policy table resolving roles to permission sets
//! - Route authorization against literal and templated route patterns
//! - A session cache with lazy TTL expiry, mirrored into a persistent
//!   key-value store so sessions survive restarts
//!
//! ## Modules
//!
//! - [`types`] - Roles, capabilities, permission sets and identity profiles
//! - [`policy`] - Permission resolution and route matching
//! - [`storage`] - Persistent key-value stores and the session envelope
//! - [`session`] - The session cache manager
//! - [`config`] - Cache and store configuration

pub mod config;
pub mod error;
pub mod policy;
pub mod session;
pub mod storage;
pub mod types;

pub use config::{AuthzConfig, ConfigError, SessionCacheConfig, StoreConfig};
pub use error::{AuthError, ErrorCategory};
pub use policy::{RouteMatcher, RoutePattern, is_authorized, resolve, resolve_claim};
pub use session::{
    CachedSession, Clock, IdentityProvider, ManualClock, SessionCache, SessionCacheBuilder,
    SessionCacheStats, StaticIdentityProvider, SystemClock,
};
pub use storage::{
    EnvelopeError, FileKeyValueStore, InMemoryKeyValueStore, KeyValueStore, SessionEnvelope,
    StoreError,
};
pub use types::{Capabilities, Capability, IdentityProfile, PermissionSet, Role};

/// Type alias for authorization results.
pub type AuthResult<T> = Result<T, AuthError>;

/// Prelude module for convenient imports.
///
/// ```
/// use quillpress_auth::prelude::*;
/// ```
pub mod prelude {
    pub use crate::AuthResult;
    pub use crate::config::{AuthzConfig, ConfigError, SessionCacheConfig, StoreConfig};
    pub use crate::error::{AuthError, ErrorCategory};
    pub use crate::policy::{RouteMatcher, is_authorized, resolve};
    pub use crate::session::{
        CachedSession, Clock, IdentityProvider, SessionCache, SessionCacheStats, SystemClock,
    };
    pub use crate::storage::{FileKeyValueStore, InMemoryKeyValueStore, KeyValueStore};
    pub use crate::types::{Capability, IdentityProfile, PermissionSet, Role};
}
