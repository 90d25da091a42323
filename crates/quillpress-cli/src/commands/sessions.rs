use std::sync::Arc;

use anyhow::{Context, Result};
use quillpress_auth::storage::session_prefix;
use quillpress_auth::{
    AuthzConfig, CachedSession, IdentityProfile, KeyValueStore, SessionCache, StoreConfig,
};
use time::OffsetDateTime;

use crate::cli::{ClearArgs, OutputFormat, PutArgs};
use crate::output::{print_json, print_session, print_sessions, print_success, print_warning};

/// Session cache plus a handle on its store, for listing.
pub struct SessionContext {
    cache: SessionCache,
    store: Arc<dyn KeyValueStore>,
}

impl SessionContext {
    pub fn open(config: &AuthzConfig) -> Result<Self> {
        config.validate()?;
        if config.store == StoreConfig::Memory {
            print_warning("Store kind is `memory`: sessions will not outlive this command");
        }
        let store = config.store.open().context("Failed to open session store")?;
        let cache = SessionCache::builder(store.clone())
            .config(config.cache.clone())
            .build()?;
        Ok(Self { cache, store })
    }

    /// Fresh sessions in the namespace. Expired or unreadable entries are
    /// evicted on the way.
    fn fresh_sessions(&self) -> Result<Vec<CachedSession>> {
        let prefix = session_prefix(self.cache.namespace());
        let keys = self
            .store
            .keys_with_prefix(&prefix)
            .context("Failed to list persisted sessions")?;
        Ok(keys
            .iter()
            .filter_map(|key| key.strip_prefix(&prefix))
            .filter_map(|id| self.cache.get_session(id))
            .collect())
    }
}

pub fn list(ctx: &SessionContext, format: OutputFormat) -> Result<()> {
    let sessions = ctx.fresh_sessions()?;
    match format {
        OutputFormat::Json => print_json(&sessions),
        OutputFormat::Table => {
            print_sessions(&sessions, OffsetDateTime::now_utc());
            Ok(())
        }
    }
}

pub fn show(ctx: &SessionContext, id: &str, format: OutputFormat) -> Result<()> {
    let session = ctx
        .cache
        .get_session(id)
        .with_context(|| format!("No fresh session for identity {id}"))?;
    match format {
        OutputFormat::Json => print_json(&session),
        OutputFormat::Table => {
            print_session(&session, OffsetDateTime::now_utc());
            Ok(())
        }
    }
}

pub fn put(ctx: &SessionContext, args: &PutArgs, format: OutputFormat) -> Result<()> {
    let mut profile =
        IdentityProfile::new(&args.id, &args.email, args.role, OffsetDateTime::now_utc())
            .with_email_verified(args.verified);
    if let Some(display_name) = &args.display_name {
        profile = profile.with_display_name(display_name);
    }

    let session = ctx.cache.cache_session(profile)?;
    match format {
        OutputFormat::Json => print_json(&session),
        OutputFormat::Table => {
            print_success(&format!(
                "Cached {} session for {} (landing route {})",
                session.role(),
                session.identity_id(),
                session.permissions.default_route
            ));
            Ok(())
        }
    }
}

pub fn clear(ctx: &SessionContext, args: &ClearArgs) -> Result<()> {
    if args.all {
        let removed = ctx.cache.clear_all_sessions();
        print_success(&format!("Cleared {removed} persisted sessions"));
        return Ok(());
    }
    let id = args.id.as_deref().context("Identity id is required")?;
    ctx.cache.clear_session(id);
    print_success(&format!("Cleared session for {id}"));
    Ok(())
}
