//! Session cache behaviour over a file-backed store.

use std::sync::Arc;

use quillpress_auth::prelude::*;
use quillpress_auth::{AuthzConfig, ManualClock, StoreConfig};
use time::macros::datetime;
use time::{Duration, OffsetDateTime};

const START: OffsetDateTime = datetime!(2024-03-10 12:00:00 UTC);

fn profile(id: &str, role: Role) -> IdentityProfile {
    IdentityProfile::new(id, format!("{id}@quillpress.test"), role, START)
        .with_email_verified(true)
}

fn open_cache(dir: &std::path::Path, clock: &Arc<ManualClock>) -> SessionCache {
    let store = Arc::new(FileKeyValueStore::open(dir).unwrap());
    SessionCache::builder(store)
        .clock(clock.clone())
        .build()
        .unwrap()
}

#[test]
fn sessions_survive_a_restart() {
    let dir = tempfile::tempdir().unwrap();
    let clock = Arc::new(ManualClock::new(START));

    let first = open_cache(dir.path(), &clock);
    let cached = first.cache_session(profile("writer-1", Role::Writer)).unwrap();
    drop(first);

    clock.advance(Duration::minutes(12));
    let second = open_cache(dir.path(), &clock);
    let restored = second.get_session("writer-1").unwrap();

    assert_eq!(restored, cached);
    assert!(restored.profile.email_verified);
    assert!(second.has_route_permission("writer-1", "/article/edit/42"));
    assert!(!second.has_route_permission("writer-1", "/admin"));
    assert_eq!(second.default_route("writer-1").as_deref(), Some("/writer"));
}

#[test]
fn expired_sessions_are_dropped_after_a_restart() {
    let dir = tempfile::tempdir().unwrap();
    let clock = Arc::new(ManualClock::new(START));

    open_cache(dir.path(), &clock)
        .cache_session(profile("u1", Role::User))
        .unwrap();

    clock.advance(Duration::minutes(30));
    let cache = open_cache(dir.path(), &clock);
    assert!(cache.get_session("u1").is_none());
    assert!(!cache.has_route_permission("u1", "/dashboard"));

    let store = FileKeyValueStore::open(dir.path()).unwrap();
    assert!(store.keys_with_prefix(cache.namespace()).unwrap().is_empty());
}

#[test]
fn clear_all_leaves_foreign_keys_alone() {
    let dir = tempfile::tempdir().unwrap();
    let clock = Arc::new(ManualClock::new(START));
    let cache = open_cache(dir.path(), &clock);
    let store = FileKeyValueStore::open(dir.path()).unwrap();

    cache.cache_session(profile("u1", Role::User)).unwrap();
    cache.cache_session(profile("a1", Role::Admin)).unwrap();
    store.set("editor_preferences", r#"{"theme":"dark"}"#).unwrap();

    assert_eq!(cache.clear_all_sessions(), 2);
    assert!(cache.get_session("u1").is_none());
    assert!(cache.get_session("a1").is_none());
    assert_eq!(
        store.get("editor_preferences").unwrap().as_deref(),
        Some(r#"{"theme":"dark"}"#)
    );

    let reopened = open_cache(dir.path(), &clock);
    assert!(reopened.get_session("a1").is_none());
}

#[test]
fn cleared_session_stays_gone_across_instances() {
    let dir = tempfile::tempdir().unwrap();
    let clock = Arc::new(ManualClock::new(START));
    let cache = open_cache(dir.path(), &clock);

    cache.cache_session(profile("a1", Role::Admin)).unwrap();
    cache.clear_session("a1");
    assert!(!cache.has_route_permission("a1", "/admin"));

    let reopened = open_cache(dir.path(), &clock);
    assert!(reopened.get_session("a1").is_none());
}

#[test]
fn corrupt_session_file_is_a_miss() {
    let dir = tempfile::tempdir().unwrap();
    let clock = Arc::new(ManualClock::new(START));
    let cache = open_cache(dir.path(), &clock);
    let store = FileKeyValueStore::open(dir.path()).unwrap();

    let key = format!("{}_u1", cache.namespace());
    store.set(&key, "\u{0}garbage").unwrap();

    assert!(cache.get_session("u1").is_none());
    assert_eq!(store.get(&key).unwrap(), None);
}

#[test]
fn cache_built_from_config() {
    let dir = tempfile::tempdir().unwrap();
    let config = AuthzConfig {
        store: StoreConfig::File {
            dir: dir.path().join("sessions"),
        },
        ..Default::default()
    };

    let cache = SessionCache::from_config(&config).unwrap();
    cache.cache_session(profile("g1", Role::Guest)).unwrap();
    assert!(cache.has_route_permission("g1", "/messages"));
    assert!(!cache.has_route_permission("g1", "/bookmarks"));
    assert!(cache.has_capability("g1", Capability::SendMessages));
    assert_eq!(cache.stats().ttl, Duration::minutes(30));

    let on_disk = FileKeyValueStore::open(dir.path().join("sessions")).unwrap();
    assert_eq!(on_disk.keys_with_prefix("quillpress_auth_cache").unwrap().len(), 1);
}

#[test]
fn concurrent_callers_share_one_cache() {
    let dir = tempfile::tempdir().unwrap();
    let clock = Arc::new(ManualClock::new(START));
    let cache = Arc::new(open_cache(dir.path(), &clock));

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let cache = cache.clone();
            std::thread::spawn(move || {
                let id = format!("u{i}");
                let role = if i % 2 == 0 { Role::Admin } else { Role::User };
                cache.cache_session(profile(&id, role)).unwrap();
                (i, cache.has_route_permission(&id, "/admin"))
            })
        })
        .collect();

    for handle in handles {
        let (i, allowed) = handle.join().unwrap();
        assert_eq!(allowed, i % 2 == 0);
    }
    assert_eq!(cache.cached_identities().len(), 8);
}
