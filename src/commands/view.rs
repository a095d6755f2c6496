//! Interactive waveform viewer.
//!
//! Opens the given files one at a time, draws the waveform with a playback
//! cursor, and optionally plays the audio through an external player.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use crate::config::WavescopeConfig;
use crate::playback::ExternalPlayer;
use crate::ui::ErrorScreen;
use crate::view::{ViewerSession, ViewerTui};

/// Runs the viewer until the user quits.
///
/// # Errors
/// - If no files were given
/// - If the configuration cannot be loaded
/// - If the terminal cannot be set up or drawn to
pub async fn handle_view(files: Vec<PathBuf>, mute: bool) -> Result<(), anyhow::Error> {
    if files.is_empty() {
        return Err(anyhow::anyhow!(
            "No audio files given. Usage: wavescope <FILES>..."
        ));
    }

    tracing::info!("=== wavescope viewer started ({} files) ===", files.len());

    let config = match WavescopeConfig::load() {
        Ok(config) => config,
        Err(err) => {
            tracing::error!("Failed to load configuration: {err}");
            let error_message = format!(
                "Configuration Error:\n\n{err}\n\n\
                 Please check your ~/.config/wavescope/wavescope.toml file and try again."
            );
            let mut error_screen = ErrorScreen::new()?;
            error_screen.show_error(&error_message)?;
            error_screen.cleanup()?;
            return Err(anyhow::anyhow!("Configuration error: {err}"));
        }
    };

    tracing::info!(
        "Configuration loaded: zoom={}, max_zoom={}, normalization={}, player={}",
        config.display.zoom,
        config.display.max_zoom,
        config.decode.normalization,
        config.playback.player
    );

    let player = if mute {
        ExternalPlayer::silent()
    } else {
        ExternalPlayer::from_setting(&config.playback.player)
    };

    let mut tui = ViewerTui::new(&config.display)?;
    let mut session = ViewerSession::new(files, &config, player);
    let tick = Duration::from_millis(config.display.tick_ms.max(1));

    let (width, height) = tui.layout()?.canvas_pixels();
    session.resize(width, height);
    session.open_current();

    loop {
        let (width, height) = tui.layout()?.canvas_pixels();
        session.resize(width, height);
        session.poll_load();

        let now = Instant::now();
        session.tick(now);

        let primitives = session.primitives();
        let view = session.view();
        tui.draw(
            &primitives,
            view.pixel_width(),
            view.pixel_height(),
            &session.status(),
        )?;

        let command = tui.handle_input(tick).map_err(|e| {
            tracing::error!("Input handling error: {}", e);
            anyhow::anyhow!("Input handling error: {e}")
        })?;
        if !session.apply(command, Instant::now()) {
            break;
        }
    }

    tui.cleanup()?;
    tracing::info!("Viewer closed");
    Ok(())
}
