//! Configuration management for wavescope.
//!
//! Loads the TOML configuration stored in the user's config
//! directory. Every field has a default, so a partial file is valid.

pub mod file;

pub use file::{get_config_path, DecodeConfig, DisplayConfig, PlaybackConfig, WavescopeConfig};
