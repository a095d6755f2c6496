//! Configuration file management for wavescope.
//!
//! This module handles loading application configuration from TOML files.
//! Configuration is stored in the user's config directory.

use ratatui::style::Color;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;

use crate::waveform::Normalization;

/// Waveform display settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DisplayConfig {
    /// Zoom factor applied when a file is opened (1 fits the whole file)
    #[serde(default = "default_zoom")]
    pub zoom: u32,
    /// Largest zoom factor reachable with the zoom keys
    #[serde(default = "default_max_zoom")]
    pub max_zoom: u32,
    /// Redraw interval in milliseconds
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
    /// Per-channel waveform colors as "#RRGGBB" or color names; cycled for more channels
    #[serde(default = "default_channel_colors")]
    pub channel_colors: Vec<String>,
    /// Playback cursor color
    #[serde(default = "default_cursor_color")]
    pub cursor_color: String,
}

fn default_zoom() -> u32 {
    1
}

fn default_max_zoom() -> u32 {
    64
}

fn default_tick_ms() -> u64 {
    33
}

fn default_channel_colors() -> Vec<String> {
    vec!["#CEE0DC".to_string(), "#B9CFD4".to_string()]
}

fn default_cursor_color() -> String {
    "#FF3C3C".to_string()
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            zoom: default_zoom(),
            max_zoom: default_max_zoom(),
            tick_ms: default_tick_ms(),
            channel_colors: default_channel_colors(),
            cursor_color: default_cursor_color(),
        }
    }
}

impl DisplayConfig {
    /// Color for `channel`, cycling through the configured list.
    ///
    /// Unparseable entries fall back to white.
    pub fn channel_color(&self, channel: usize) -> Color {
        if self.channel_colors.is_empty() {
            return Color::White;
        }
        parse_color(&self.channel_colors[channel % self.channel_colors.len()])
    }

    pub fn cursor_color(&self) -> Color {
        parse_color(&self.cursor_color)
    }
}

fn parse_color(value: &str) -> Color {
    Color::from_str(value).unwrap_or_else(|_| {
        tracing::warn!("Invalid color '{}', using white", value);
        Color::White
    })
}

/// Decoding settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DecodeConfig {
    /// Integer sample scaling: "peak" (observed maximum) or "full_scale" (bit depth)
    #[serde(default)]
    pub normalization: Normalization,
}

/// Playback settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlaybackConfig {
    /// External player: "auto" (ffplay, then mpv), "none", or a binary name
    #[serde(default = "default_player")]
    pub player: String,
    /// Seconds moved by the left/right keys
    #[serde(default = "default_seek_step_secs")]
    pub seek_step_secs: f64,
    /// Start playing as soon as a file is loaded
    #[serde(default)]
    pub autoplay: bool,
}

fn default_player() -> String {
    "auto".to_string()
}

fn default_seek_step_secs() -> f64 {
    5.0
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            player: default_player(),
            seek_step_secs: default_seek_step_secs(),
            autoplay: false,
        }
    }
}

/// Complete application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct WavescopeConfig {
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub decode: DecodeConfig,
    #[serde(default)]
    pub playback: PlaybackConfig,
}

impl WavescopeConfig {
    /// Loads configuration from the user's config directory.
    ///
    /// # Errors
    /// - If the config directory cannot be determined
    /// - If the config file cannot be read
    /// - If the TOML is malformed
    pub fn load() -> anyhow::Result<Self> {
        let config_path = get_config_path()?;
        let config_content = fs::read_to_string(&config_path)
            .map_err(|e| anyhow::anyhow!("Failed to read {}: {e}", config_path.display()))?;
        Self::parse(&config_content)
    }

    /// Parses configuration from TOML text.
    ///
    /// # Errors
    /// - If the TOML is malformed or a value has the wrong type
    pub fn parse(content: &str) -> anyhow::Result<Self> {
        let config: WavescopeConfig = toml::from_str(content)?;
        Ok(config)
    }
}

/// Retrieves the path to the config file, creating its directory.
///
/// # Errors
/// - If the home directory cannot be determined
/// - If the config directory cannot be created
pub fn get_config_path() -> anyhow::Result<PathBuf> {
    let config_dir = dirs::home_dir()
        .ok_or_else(|| anyhow::anyhow!("Could not determine home directory"))?
        .join(".config")
        .join("wavescope");

    fs::create_dir_all(&config_dir)
        .map_err(|e| anyhow::anyhow!("Failed to create config directory: {e}"))?;

    Ok(config_dir.join("wavescope.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = WavescopeConfig::parse("").unwrap();
        assert_eq!(config, WavescopeConfig::default());
        assert_eq!(config.display.zoom, 1);
        assert_eq!(config.decode.normalization, Normalization::Peak);
        assert_eq!(config.playback.player, "auto");
    }

    #[test]
    fn test_default_template_parses() {
        let config = WavescopeConfig::parse(crate::setup::DEFAULT_CONFIG).unwrap();
        assert_eq!(config.display.max_zoom, 64);
        assert_eq!(config.decode.normalization, Normalization::Peak);
    }

    #[test]
    fn test_partial_sections() {
        let config = WavescopeConfig::parse(
            r#"
            config_version = "0.1.0"

            [decode]
            normalization = "full_scale"

            [playback]
            player = "none"
            autoplay = true
            "#,
        )
        .unwrap();
        assert_eq!(config.decode.normalization, Normalization::FullScale);
        assert_eq!(config.playback.player, "none");
        assert!(config.playback.autoplay);
        assert_eq!(config.playback.seek_step_secs, 5.0);
        assert_eq!(config.display.tick_ms, 33);
    }

    #[test]
    fn test_invalid_normalization_is_rejected() {
        assert!(WavescopeConfig::parse("[decode]\nnormalization = \"loud\"").is_err());
    }

    #[test]
    fn test_colors() {
        let display = DisplayConfig {
            channel_colors: vec!["#FF0000".to_string(), "blue".to_string()],
            cursor_color: "not-a-color".to_string(),
            ..DisplayConfig::default()
        };
        assert_eq!(display.channel_color(0), Color::Rgb(255, 0, 0));
        assert_eq!(display.channel_color(1), Color::Blue);
        assert_eq!(display.channel_color(2), Color::Rgb(255, 0, 0));
        assert_eq!(display.cursor_color(), Color::White);
    }

    #[test]
    fn test_round_trip_through_toml() {
        let config = WavescopeConfig::default();
        let text = toml::to_string_pretty(&config).unwrap();
        assert_eq!(WavescopeConfig::parse(&text).unwrap(), config);
    }
}
