//! Config file versioning.
//!
//! The first line of the config file records which wavescope version wrote
//! it: `config_version = "X.Y.Z"`. Startup compares it with the running
//! version to decide whether the file has to be created or migrated.

use anyhow::anyhow;
use regex::Regex;
use std::cmp::Ordering;
use std::fmt;
use std::path::Path;

/// Version of the running binary, from Cargo.toml.
pub const CURRENT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// A `major.minor.patch` version.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd)]
pub struct ConfigVersion {
    major: u32,
    minor: u32,
    patch: u32,
}

impl ConfigVersion {
    /// Parses "0.1.0". Pre-release or build suffixes are not accepted.
    pub fn parse(version_str: &str) -> anyhow::Result<Self> {
        let mut numbers = version_str.trim().split('.').map(|part| {
            part.parse::<u32>()
                .map_err(|_| anyhow!("Invalid version component '{part}' in '{version_str}'"))
        });

        let (Some(major), Some(minor), Some(patch), None) =
            (numbers.next(), numbers.next(), numbers.next(), numbers.next())
        else {
            return Err(anyhow!(
                "Invalid version format: '{version_str}'. Expected 'major.minor.patch'"
            ));
        };

        Ok(ConfigVersion {
            major: major?,
            minor: minor?,
            patch: patch?,
        })
    }

    pub fn current() -> anyhow::Result<Self> {
        Self::parse(CURRENT_VERSION)
    }
}

impl fmt::Display for ConfigVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// What startup has to do with the config file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetupAction {
    /// No config file yet
    Create,
    /// Config written by an older (or unknown) version
    Migrate { from: String },
    UpToDate,
}

/// Extracts the version from the first line of config text.
///
/// The line must be an assignment, not a comment.
pub fn parse_config_version(content: &str) -> Option<String> {
    let first_line = content.lines().next()?;
    let regex = Regex::new(r#"^\s*config_version\s*=\s*"([^"]+)""#).ok()?;
    regex
        .captures(first_line)
        .map(|caps| caps[1].to_string())
}

/// Returns `content` with its version line replaced by `version`.
pub fn stamp_version(content: &str, version: &str) -> String {
    let version_line = format!(r#"config_version = "{version}""#);
    let rest: Vec<&str> = content
        .lines()
        .filter(|line| !line.trim_start().starts_with("config_version"))
        .collect();

    if rest.is_empty() {
        version_line
    } else {
        format!("{}\n{}", version_line, rest.join("\n"))
    }
}

/// Decides what to do with the config file at `config_path`.
///
/// # Errors
/// - If the file exists but cannot be read
/// - If the recorded version is malformed
pub fn check_setup(config_path: &Path) -> anyhow::Result<SetupAction> {
    if !config_path.exists() {
        return Ok(SetupAction::Create);
    }

    let content = std::fs::read_to_string(config_path)?;
    let Some(recorded) = parse_config_version(&content) else {
        return Ok(SetupAction::Migrate {
            from: "unknown".to_string(),
        });
    };

    let recorded_version = ConfigVersion::parse(&recorded)?;
    let current = ConfigVersion::current()?;

    Ok(match recorded_version.cmp(&current) {
        Ordering::Less => SetupAction::Migrate { from: recorded },
        Ordering::Equal => SetupAction::UpToDate,
        Ordering::Greater => {
            tracing::warn!(
                "Config version {} is newer than app version {}",
                recorded,
                CURRENT_VERSION
            );
            SetupAction::UpToDate
        }
    })
}
