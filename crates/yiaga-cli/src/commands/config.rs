//! Config file helpers.

use std::path::Path;

use anyhow::{Result, bail};
use yiaga_api::JwtManager;
use yiaga_core::Config;

use crate::ui;

/// Config actions.
#[derive(Debug, Clone, Copy)]
pub enum ConfigAction {
    /// Write a default config with a generated secret.
    Init {
        /// Overwrite an existing file.
        force: bool,
    },
    /// Load and validate the file.
    Validate,
    /// Print the file path.
    Path,
}

/// Run the config command.
///
/// # Errors
///
/// Returns error if the file cannot be written or fails validation.
pub fn run_config(path: &Path, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Init { force } => init_config(path, force),
        ConfigAction::Validate => validate_config(path),
        ConfigAction::Path => {
            println!("{}", path.display());
            Ok(())
        }
    }
}

fn init_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!(
            "{} already exists. Use --force to overwrite",
            path.display()
        );
    }

    let mut config = Config::default();
    config.auth.jwt_secret = Some(JwtManager::generate_hex_secret());
    config.save(path)?;

    ui::success(&format!("Wrote {}", path.display()));
    ui::info("Keep this file private: it holds the token signing secret");
    Ok(())
}

fn validate_config(path: &Path) -> Result<()> {
    if !path.exists() {
        ui::warning(&format!("{} not found, defaults apply", path.display()));
        return Ok(());
    }

    match Config::load(path) {
        Ok(config) => {
            ui::success("Configuration is valid");
            ui::kv("Port", &config.server.port.to_string());
            ui::kv("Org email domain", &config.auth.org_email_domain);
            ui::kv(
                "Signing secret",
                if config.auth.jwt_secret.is_some() { "set" } else { "not set" },
            );
            Ok(())
        }
        Err(e) => {
            ui::error(&format!("Invalid configuration: {e}"));
            Err(e.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_writes_loadable_config_with_secret() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("yiaga.json");

        run_config(&path, ConfigAction::Init { force: false }).unwrap();
        let config = Config::load(&path).unwrap();
        assert_eq!(config.auth.jwt_secret.unwrap().len(), 64);

        assert!(run_config(&path, ConfigAction::Init { force: false }).is_err());
        run_config(&path, ConfigAction::Init { force: true }).unwrap();
    }

    #[test]
    fn test_validate_rejects_short_secret() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("yiaga.json");
        std::fs::write(&path, r#"{ auth: { jwtSecret: "short" } }"#).unwrap();

        assert!(run_config(&path, ConfigAction::Validate).is_err());
    }
}
