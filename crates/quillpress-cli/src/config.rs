use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use quillpress_auth::{AuthzConfig, StoreConfig};

const CONFIG_FILE: &str = "authz.toml";
const SESSIONS_DIR: &str = "sessions";

fn config_dir() -> Result<PathBuf> {
    Ok(dirs::home_dir()
        .context("Cannot determine home directory")?
        .join(".quillpress"))
}

/// Resolves the config path: `--config` / `QUILLPRESS_CONFIG`, then
/// `~/.quillpress/authz.toml`.
pub fn config_path(cli_config: Option<&Path>) -> Result<PathBuf> {
    match cli_config {
        Some(path) => Ok(path.to_path_buf()),
        None => Ok(config_dir()?.join(CONFIG_FILE)),
    }
}

/// Loads the config at `path`.
///
/// A missing file yields the defaults, except that sessions are kept in a
/// `sessions` directory next to the config so they outlive one invocation.
pub fn load(path: &Path) -> Result<AuthzConfig> {
    if !path.exists() {
        let dir = path
            .parent()
            .map(|parent| parent.join(SESSIONS_DIR))
            .unwrap_or_else(|| PathBuf::from(SESSIONS_DIR));
        return Ok(AuthzConfig {
            store: StoreConfig::File { dir },
            ..Default::default()
        });
    }
    AuthzConfig::load(path).with_context(|| format!("Failed to load {}", path.display()))
}
