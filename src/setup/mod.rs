//! First-run setup and config migration.
//!
//! Creates the config file from the embedded template when it is missing and
//! restamps it when an older wavescope wrote it.

pub mod version;

use std::path::{Path, PathBuf};

use crate::config::{get_config_path, WavescopeConfig};
use version::{check_setup, stamp_version, SetupAction, CURRENT_VERSION};

/// Embedded default configuration template.
pub const DEFAULT_CONFIG: &str = include_str!("../../environments/wavescope.toml");

/// Makes sure a current config file exists and returns its path.
///
/// # Errors
/// Returns an error if the config directory or file cannot be accessed.
pub fn ensure_config() -> anyhow::Result<PathBuf> {
    let config_path = get_config_path()?;

    match check_setup(&config_path)? {
        SetupAction::Create => {
            write_default_config(&config_path)?;
            tracing::info!("Created default config at {}", config_path.display());
        }
        SetupAction::Migrate { from } => {
            migrate_config(&config_path)?;
            tracing::info!("Migrated config from version {} to {}", from, CURRENT_VERSION);
        }
        SetupAction::UpToDate => {
            tracing::debug!("Config version up to date ({})", CURRENT_VERSION);
        }
    }

    Ok(config_path)
}

fn write_default_config(config_path: &Path) -> anyhow::Result<()> {
    std::fs::write(config_path, stamp_version(DEFAULT_CONFIG, CURRENT_VERSION))?;
    Ok(())
}

/// Restamps a config that still parses; replaces one that does not, keeping
/// the old file next to it as `.bak`.
fn migrate_config(config_path: &Path) -> anyhow::Result<()> {
    let content = std::fs::read_to_string(config_path)?;

    match WavescopeConfig::parse(&content) {
        Ok(_) => {
            std::fs::write(config_path, stamp_version(&content, CURRENT_VERSION))?;
        }
        Err(e) => {
            let backup = config_path.with_extension("toml.bak");
            tracing::warn!(
                "Old config no longer parses ({}); saved as {} and replaced with defaults",
                e,
                backup.display()
            );
            std::fs::rename(config_path, &backup)?;
            write_default_config(config_path)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("wavescope_{}_{}", name, std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_default_config_is_stamped() {
        let dir = scratch_dir("setup_default");
        let path = dir.join("wavescope.toml");
        write_default_config(&path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            version::parse_config_version(&content),
            Some(CURRENT_VERSION.to_string())
        );
        assert!(WavescopeConfig::parse(&content).is_ok());
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_migration_keeps_valid_settings() {
        let dir = scratch_dir("setup_migrate");
        let path = dir.join("wavescope.toml");
        std::fs::write(&path, "config_version = \"0.0.1\"\n[display]\nzoom = 4\n").unwrap();

        migrate_config(&path).unwrap();
        let config = WavescopeConfig::parse(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(config.display.zoom, 4);
        assert_eq!(check_setup(&path).unwrap(), SetupAction::UpToDate);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_migration_replaces_broken_config() {
        let dir = scratch_dir("setup_broken");
        let path = dir.join("wavescope.toml");
        std::fs::write(&path, "[display]\nzoom = \"huge\"\n").unwrap();

        migrate_config(&path).unwrap();
        assert!(path.with_extension("toml.bak").exists());
        let config = WavescopeConfig::parse(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(config, WavescopeConfig::default());
        std::fs::remove_dir_all(&dir).ok();
    }
}
