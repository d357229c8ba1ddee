//! CLI command implementations.

pub mod admin;
pub mod config;
pub mod serve;

use std::path::Path;

use anyhow::Context;
use yiaga_core::Config;

pub use admin::run_admin;
pub use config::run_config;
pub use serve::run_serve;

/// Load the config file if present, then apply environment overrides.
///
/// # Errors
///
/// Returns error if the file exists but cannot be read or is invalid.
pub fn load_config(path: &Path) -> anyhow::Result<Config> {
    let config = if path.exists() {
        Config::load(path).with_context(|| format!("Failed to load {}", path.display()))?
    } else {
        Config::default()
    };
    Ok(config.with_env_overrides())
}
