//! Session cache manager.
//!
//! Lifecycle of one identity's entry:
//!
//! ```text
//! ABSENT --cache_session--> FRESH --ttl elapses--> EXPIRED --next access--> ABSENT
//! ```
//!
//! Expiry is lazy: nothing sweeps the table, an expired entry is dropped the
//! next time someone asks for it. The in-memory table is authoritative for
//! the life of the process; the persistent store lets a restarted process
//! pick up sessions that are still fresh.
//!
//! Read and parse failures of the persistent store count as misses, write
//! failures are logged and ignored. The only error callers see is a
//! malformed identity id.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use quillpress_auth::session::SessionCache;
//! use quillpress_auth::storage::InMemoryKeyValueStore;
//! use quillpress_auth::types::{IdentityProfile, Role};
//!
//! let cache = SessionCache::new(Arc::new(InMemoryKeyValueStore::new()));
//! let profile = IdentityProfile::new("u1", "ada@example.com", Role::Admin, time::OffsetDateTime::now_utc());
//! cache.cache_session(profile).unwrap();
//!
//! assert!(cache.has_route_permission("u1", "/admin/reports"));
//! assert!(!cache.has_route_permission("someone-else", "/dashboard"));
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use time::{Duration, OffsetDateTime};

use super::{CachedSession, Clock, IdentityProvider, SystemClock};
use crate::AuthResult;
use crate::config::{AuthzConfig, ConfigError, SessionCacheConfig};
use crate::error::AuthError;
use crate::policy::{RouteMatcher, resolve};
use crate::storage::{KeyValueStore, SessionEnvelope, StoreError, session_key, session_prefix};
use crate::types::{Capability, IdentityProfile};

// =============================================================================
// Statistics
// =============================================================================

#[derive(Debug, Default)]
struct Counters {
    memory_hits: AtomicU64,
    persistent_hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
    persist_failures: AtomicU64,
}

/// Statistics about the session cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionCacheStats {
    /// Sessions currently held in memory.
    pub entries: usize,

    /// Lookups answered from memory.
    pub memory_hits: u64,

    /// Lookups answered by promoting a persisted session.
    pub persistent_hits: u64,

    /// Lookups that found nothing usable.
    pub misses: u64,

    /// Entries dropped because they expired, were corrupt, or were stale.
    pub evictions: u64,

    /// Writes or deletes against the persistent store that failed.
    pub persist_failures: u64,

    /// Session lifetime.
    pub ttl: Duration,
}

// =============================================================================
// Builder
// =============================================================================

/// Builder for [`SessionCache`].
pub struct SessionCacheBuilder {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    config: SessionCacheConfig,
}

impl SessionCacheBuilder {
    fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            clock: Arc::new(SystemClock),
            config: SessionCacheConfig::default(),
        }
    }

    /// Sets the time source.
    #[must_use]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Sets the cache configuration.
    #[must_use]
    pub fn config(mut self, config: SessionCacheConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the session lifetime.
    #[must_use]
    pub fn ttl(mut self, ttl: std::time::Duration) -> Self {
        self.config.ttl = ttl;
        self
    }

    /// Sets the persisted key namespace.
    #[must_use]
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.config.namespace = namespace.into();
        self
    }

    /// Builds the cache.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn build(self) -> Result<SessionCache, ConfigError> {
        self.config.validate()?;
        Ok(SessionCache {
            sessions: DashMap::new(),
            store: self.store,
            clock: self.clock,
            ttl: self.config.ttl(),
            namespace: self.config.namespace,
            matcher: RouteMatcher::new(),
            cleared: DashMap::new(),
            cleared_all_at: RwLock::new(None),
            counters: Counters::default(),
        })
    }
}

// =============================================================================
// Session Cache
// =============================================================================

/// Cache of resolved sessions keyed by identity id.
///
/// Construct one per process and share it (for example behind an `Arc` in
/// the application context). Every method is a short synchronous call and
/// each write replaces a whole entry, so concurrent callers never observe a
/// partially updated session.
pub struct SessionCache {
    sessions: DashMap<String, CachedSession>,
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
    namespace: String,
    matcher: RouteMatcher,
    /// Identity id -> when its session was last cleared.
    cleared: DashMap<String, OffsetDateTime>,
    /// When every session was last cleared.
    cleared_all_at: RwLock<Option<OffsetDateTime>>,
    counters: Counters,
}

impl SessionCache {
    /// Creates a cache with default settings and the system clock.
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        let defaults = SessionCacheConfig::default();
        Self {
            sessions: DashMap::new(),
            store,
            clock: Arc::new(SystemClock),
            ttl: defaults.ttl(),
            namespace: defaults.namespace,
            matcher: RouteMatcher::new(),
            cleared: DashMap::new(),
            cleared_all_at: RwLock::new(None),
            counters: Counters::default(),
        }
    }

    /// Starts building a cache over `store`.
    #[must_use]
    pub fn builder(store: Arc<dyn KeyValueStore>) -> SessionCacheBuilder {
        SessionCacheBuilder::new(store)
    }

    /// Opens the configured store and builds a cache over it.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the store cannot
    /// be opened.
    pub fn from_config(config: &AuthzConfig) -> AuthResult<Self> {
        config.validate()?;
        let store = config.store.open()?;
        Ok(Self::builder(store).config(config.cache.clone()).build()?)
    }

    /// Session lifetime.
    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Namespace of persisted session keys.
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    // -------------------------------------------------------------------------
    // Writes
    // -------------------------------------------------------------------------

    /// Resolves the permissions for `profile` and caches the session.
    ///
    /// Any prior entry for the identity is replaced. The session is also
    /// written to the persistent store; a failed write is logged and the
    /// in-memory entry stays authoritative.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidIdentity`] if the identity id is empty or
    /// contains whitespace or control characters.
    pub fn cache_session(&self, mut profile: IdentityProfile) -> AuthResult<CachedSession> {
        validate_identity_id(&profile.id)?;

        profile.created_at = truncate_to_millis(profile.created_at);
        profile.updated_at = truncate_to_millis(profile.updated_at);
        let now = truncate_to_millis(self.clock.now());
        let session = CachedSession {
            permissions: resolve(profile.role),
            profile,
            last_updated: now,
            expires_at: now.saturating_add(self.ttl),
        };
        let id = session.identity_id().to_string();

        self.cleared.remove(&id);
        self.sessions.insert(id.clone(), session.clone());
        self.persist(&session);

        tracing::debug!(
            identity = %id,
            role = %session.role(),
            expires_at = %session.expires_at,
            "Session cached"
        );

        Ok(session)
    }

    /// Fetches the current profile from `provider` and caches it.
    ///
    /// Use after a role change so the new permissions take effect at once.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider fails, returns a profile for another
    /// identity, or the identity id is malformed.
    pub fn refresh_session(
        &self,
        id: &str,
        provider: &dyn IdentityProvider,
    ) -> AuthResult<CachedSession> {
        let profile = provider.fetch_identity_profile(id)?;
        if profile.id != id {
            return Err(AuthError::identity_provider(format!(
                "requested profile {id}, received {}",
                profile.id
            )));
        }
        self.cache_session(profile)
    }

    /// Removes the session of `id` from memory and from the persistent store.
    ///
    /// A persisted copy that survives a failed delete is never promoted back.
    pub fn clear_session(&self, id: &str) {
        let now = self.clock.now();
        self.prune_tombstones(now);
        self.cleared.insert(id.to_string(), now);
        self.sessions.remove(id);
        self.delete_persisted(id);
        tracing::debug!(identity = %id, "Session cleared");
    }

    /// Removes every session from memory and every persisted entry keyed
    /// `<namespace>_...`.
    ///
    /// Returns the number of persisted entries removed.
    pub fn clear_all_sessions(&self) -> usize {
        let now = self.clock.now();
        if let Ok(mut cleared_all_at) = self.cleared_all_at.write() {
            *cleared_all_at = Some(now);
        }
        // the watermark covers every earlier tombstone
        self.cleared.clear();
        let in_memory = self.sessions.len();
        self.sessions.clear();

        let keys = match self.store.keys_with_prefix(&session_prefix(&self.namespace)) {
            Ok(keys) => keys,
            Err(e) => {
                self.counters.persist_failures.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(error = %e, "Failed to list persisted sessions");
                Vec::new()
            }
        };

        let mut removed = 0;
        for key in &keys {
            match self.store.delete(key) {
                Ok(()) => removed += 1,
                Err(e) => {
                    self.counters.persist_failures.fetch_add(1, Ordering::Relaxed);
                    tracing::warn!(key = %key, error = %e, "Failed to delete persisted session");
                }
            }
        }

        tracing::info!(in_memory, persisted = removed, "All sessions cleared");
        removed
    }

    /// Sign-out hook: drops every cached session.
    pub fn on_sign_out(&self) {
        self.clear_all_sessions();
    }

    // -------------------------------------------------------------------------
    // Reads
    // -------------------------------------------------------------------------

    /// Returns the fresh session of `id`, if any.
    ///
    /// Falls back to the persistent store when memory has no fresh entry and
    /// promotes a fresh persisted copy into memory. Absent, corrupt, stale or
    /// expired entries are evicted from both tiers.
    #[must_use]
    pub fn get_session(&self, id: &str) -> Option<CachedSession> {
        let now = self.clock.now();

        let cached = self.sessions.get(id).map(|entry| entry.value().clone());
        if let Some(session) = cached {
            if session.is_fresh_at(now) {
                self.counters.memory_hits.fetch_add(1, Ordering::Relaxed);
                return Some(session);
            }
            tracing::debug!(identity = %id, "Cached session expired");
            self.sessions.remove(id);
            self.counters.evictions.fetch_add(1, Ordering::Relaxed);
        }

        match self
            .load_persisted(id, now)
            .and_then(|session| self.promote(id, session, now))
        {
            Some(session) => {
                self.counters.persistent_hits.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(identity = %id, "Session restored from persistent store");
                Some(session)
            }
            None => {
                self.counters.misses.fetch_add(1, Ordering::Relaxed);
                self.evict(id);
                None
            }
        }
    }

    /// Returns the fresh session of `id`, rebuilding it through `provider` on
    /// a miss.
    ///
    /// # Errors
    ///
    /// Returns an error if the session has to be rebuilt and the provider
    /// fails.
    pub fn get_or_refresh(
        &self,
        id: &str,
        provider: &dyn IdentityProvider,
    ) -> AuthResult<CachedSession> {
        match self.get_session(id) {
            Some(session) => Ok(session),
            None => self.refresh_session(id, provider),
        }
    }

    /// Returns `true` if `id` has a fresh session whose permissions allow
    /// `path`. Denies when there is no session.
    ///
    /// `path` must already be normalized by the caller.
    #[must_use]
    pub fn has_route_permission(&self, id: &str, path: &str) -> bool {
        let Some(session) = self.get_session(id) else {
            tracing::debug!(identity = %id, path, "Route denied: no session");
            return false;
        };
        match self.matcher.first_match(&session.permissions, path) {
            Some(pattern) => {
                tracing::trace!(identity = %id, path, pattern, "Route allowed");
                true
            }
            None => {
                tracing::debug!(identity = %id, role = %session.role(), path, "Route denied");
                false
            }
        }
    }

    /// Returns `true` if `id` has a fresh session granting `capability`.
    #[must_use]
    pub fn has_capability(&self, id: &str, capability: Capability) -> bool {
        self.get_session(id)
            .is_some_and(|session| session.permissions.allows(capability))
    }

    /// Landing route of `id`'s session.
    #[must_use]
    pub fn default_route(&self, id: &str) -> Option<String> {
        self.get_session(id)
            .map(|session| session.permissions.default_route)
    }

    /// Identity ids currently held in memory, fresh or not.
    #[must_use]
    pub fn cached_identities(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .sessions
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        ids.sort();
        ids
    }

    /// Get cache statistics.
    #[must_use]
    pub fn stats(&self) -> SessionCacheStats {
        SessionCacheStats {
            entries: self.sessions.len(),
            memory_hits: self.counters.memory_hits.load(Ordering::Relaxed),
            persistent_hits: self.counters.persistent_hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
            evictions: self.counters.evictions.load(Ordering::Relaxed),
            persist_failures: self.counters.persist_failures.load(Ordering::Relaxed),
            ttl: self.ttl,
        }
    }

    // -------------------------------------------------------------------------
    // Persistence
    // -------------------------------------------------------------------------

    fn key(&self, id: &str) -> String {
        session_key(&self.namespace, id)
    }

    fn persist(&self, session: &CachedSession) {
        let key = self.key(session.identity_id());
        let result = SessionEnvelope::from_session(session)
            .encode()
            .map_err(AuthError::from)
            .and_then(|raw| self.store.set(&key, &raw).map_err(AuthError::from));

        if let Err(e) = result {
            self.counters.persist_failures.fetch_add(1, Ordering::Relaxed);
            tracing::warn!(key = %key, error = %e, "Failed to persist session, keeping in-memory copy");
        }
    }

    fn delete_persisted(&self, id: &str) {
        let key = self.key(id);
        match self.store.delete(&key) {
            Ok(()) => {}
            // never written, so nothing to delete
            Err(StoreError::InvalidKey { .. }) => {}
            Err(e) => {
                self.counters.persist_failures.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(key = %key, error = %e, "Failed to delete persisted session");
            }
        }
    }

    /// Drops tombstones old enough that any copy they guard has expired.
    fn prune_tombstones(&self, now: OffsetDateTime) {
        let ttl = self.ttl;
        self.cleared
            .retain(|_, cleared_at| now < cleared_at.saturating_add(ttl));
    }

    /// Inserts a loaded session unless a clear raced with the load.
    ///
    /// The checks are repeated under the entry lock; `clear_session` records
    /// its tombstone before it touches the table. A fresh entry cached in the
    /// meantime wins over the loaded copy.
    fn promote(
        &self,
        id: &str,
        session: CachedSession,
        now: OffsetDateTime,
    ) -> Option<CachedSession> {
        match self.sessions.entry(id.to_string()) {
            Entry::Occupied(entry) if entry.get().is_fresh_at(now) => Some(entry.get().clone()),
            entry => {
                if let Some(reason) = self.reject_reason(id, &session, now) {
                    tracing::debug!(identity = %id, reason, "Discarding persisted session");
                    return None;
                }
                entry.insert(session.clone());
                Some(session)
            }
        }
    }

    /// Drops every trace of `id`.
    fn evict(&self, id: &str) {
        if self.sessions.remove(id).is_some() {
            self.counters.evictions.fetch_add(1, Ordering::Relaxed);
        }
        self.delete_persisted(id);
    }

    /// Loads a persisted session that is usable at `now`.
    fn load_persisted(&self, id: &str, now: OffsetDateTime) -> Option<CachedSession> {
        let key = self.key(id);
        let raw = match self.store.get(&key) {
            Ok(Some(raw)) => raw,
            Ok(None) | Err(StoreError::InvalidKey { .. }) => return None,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Failed to read persisted session");
                return None;
            }
        };

        let session = match SessionEnvelope::decode(&raw).and_then(SessionEnvelope::into_session) {
            Ok(session) => session,
            Err(e) => {
                self.counters.evictions.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(key = %key, error = %e, "Discarding corrupt persisted session");
                return None;
            }
        };

        if let Some(reason) = self.reject_reason(id, &session, now) {
            self.counters.evictions.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(key = %key, reason, "Discarding persisted session");
            return None;
        }

        Some(session)
    }

    fn reject_reason(
        &self,
        id: &str,
        session: &CachedSession,
        now: OffsetDateTime,
    ) -> Option<&'static str> {
        if session.identity_id() != id {
            return Some("identity mismatch");
        }
        if !session.is_fresh_at(now) {
            return Some("expired");
        }
        let cleared_at = self.cleared.get(id).map(|entry| *entry.value());
        if cleared_at.is_some_and(|at| session.last_updated <= at) {
            return Some("identity was cleared");
        }
        let cleared_all_at = self.cleared_all_at.read().ok().and_then(|at| *at);
        if cleared_all_at.is_some_and(|at| session.last_updated <= at) {
            return Some("all sessions were cleared");
        }
        if session.permissions != resolve(session.role()) {
            return Some("policy changed");
        }
        None
    }
}

fn validate_identity_id(id: &str) -> AuthResult<()> {
    if id.is_empty() {
        return Err(AuthError::invalid_identity("identity id is empty"));
    }
    if id.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(AuthError::invalid_identity(format!(
            "identity id {id:?} contains whitespace or control characters"
        )));
    }
    Ok(())
}

/// Persisted timestamps have millisecond precision; truncating up front keeps
/// the in-memory and persisted copies identical.
fn truncate_to_millis(at: OffsetDateTime) -> OffsetDateTime {
    at.replace_millisecond(at.millisecond()).unwrap_or(at)
}

// =============================================================================
// Tests
// =============================================================================
