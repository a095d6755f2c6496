//! Audible playback through an external player process.
//!
//! The waveform cursor is driven by [`PlaybackClock`](super::PlaybackClock);
//! this module only starts and stops a player so the audio follows along.
//! Players that accept a start offset (ffplay, mpv) are preferred.

use anyhow::{anyhow, Result};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::time::Duration;

use crate::decode::binaries::find_binary;

/// Players tried, in order, when the config says "auto".
const AUTO_PLAYERS: &[&str] = &["ffplay", "mpv"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PlayerKind {
    Ffplay,
    Mpv,
    /// Plays from the beginning only
    Other,
}

impl PlayerKind {
    fn from_binary(path: &Path) -> Self {
        match path.file_stem().and_then(|s| s.to_str()) {
            Some("ffplay") => PlayerKind::Ffplay,
            Some("mpv") => PlayerKind::Mpv,
            _ => PlayerKind::Other,
        }
    }
}

/// Optional external audio player.
pub struct ExternalPlayer {
    binary: Option<(PathBuf, PlayerKind)>,
    child: Option<Child>,
}

impl ExternalPlayer {
    /// Resolves the player named in config: "auto", "none", or a binary name.
    ///
    /// An unavailable player is logged and playback stays silent.
    pub fn from_setting(setting: &str) -> Self {
        let binary = match setting.trim() {
            "none" | "" => None,
            "auto" => AUTO_PLAYERS.iter().find_map(|name| find_binary(name).ok()),
            name => match find_binary(name) {
                Ok(path) => Some(path),
                Err(e) => {
                    tracing::warn!("Configured player '{}' unavailable: {}", name, e);
                    None
                }
            },
        };

        match &binary {
            Some(path) => tracing::info!("Audio player: {}", path.display()),
            None => tracing::info!("No audio player, cursor-only playback"),
        }

        Self {
            binary: binary.map(|path| {
                let kind = PlayerKind::from_binary(&path);
                (path, kind)
            }),
            child: None,
        }
    }

    /// A player that never makes a sound.
    pub fn silent() -> Self {
        Self {
            binary: None,
            child: None,
        }
    }

    pub fn is_available(&self) -> bool {
        self.binary.is_some()
    }

    /// Starts playing `path` from `offset`, stopping any previous playback.
    ///
    /// # Errors
    /// - If the player process cannot be spawned
    pub fn start(&mut self, path: &Path, offset: Duration) -> Result<()> {
        self.stop();

        let Some((binary, kind)) = &self.binary else {
            return Ok(());
        };

        let mut cmd = Command::new(binary);
        let offset_secs = format!("{:.3}", offset.as_secs_f64());
        match kind {
            PlayerKind::Ffplay => {
                cmd.args(["-nodisp", "-autoexit", "-loglevel", "quiet"]);
                cmd.args(["-ss", offset_secs.as_str()]);
            }
            PlayerKind::Mpv => {
                cmd.args(["--no-video", "--really-quiet"])
                    .arg(format!("--start={offset_secs}"));
            }
            PlayerKind::Other => {
                if !offset.is_zero() {
                    tracing::warn!(
                        "{} cannot start at an offset, playing from the beginning",
                        binary.display()
                    );
                }
            }
        }
        cmd.arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());

        let child = cmd
            .spawn()
            .map_err(|e| anyhow!("Failed to start audio player {}: {e}", binary.display()))?;
        tracing::debug!("Audio player started at {}s", offset_secs);
        self.child = Some(child);
        Ok(())
    }

    /// Stops playback, if running.
    pub fn stop(&mut self) {
        if let Some(mut child) = self.child.take() {
            if let Err(e) = child.kill() {
                tracing::debug!("Audio player already exited: {}", e);
            }
            let _ = child.wait();
        }
    }
}

impl Drop for ExternalPlayer {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_kind_from_binary() {
        assert_eq!(PlayerKind::from_binary(Path::new("/usr/bin/ffplay")), PlayerKind::Ffplay);
        assert_eq!(PlayerKind::from_binary(Path::new("mpv")), PlayerKind::Mpv);
        assert_eq!(PlayerKind::from_binary(Path::new("/usr/bin/paplay")), PlayerKind::Other);
    }

    #[test]
    fn test_none_setting_is_silent() {
        let mut player = ExternalPlayer::from_setting("none");
        assert!(!player.is_available());
        assert!(player.start(Path::new("whatever.wav"), Duration::ZERO).is_ok());
        player.stop();
    }

    #[test]
    fn test_missing_player_is_silent() {
        let player = ExternalPlayer::from_setting("wavescope-no-such-player");
        assert!(!player.is_available());
    }
}
