//! Prints basic facts about an audio file.

use std::path::{Path, PathBuf};

use crate::commands::peaks;
use crate::config::WavescopeConfig;
use crate::loader::LoadedAudio;
use crate::view::ui::format_time;

/// Decodes `file` and prints its format, length and peak level.
///
/// # Errors
/// - If the configuration cannot be loaded
/// - If the file cannot be decoded
pub async fn handle_info(file: PathBuf) -> Result<(), anyhow::Error> {
    let config = WavescopeConfig::load()?;
    // No columns needed, only the buffer
    let loaded = peaks::load(&file, &config, 0, 1).await?;
    print!("{}", format_info(&file, &loaded));
    Ok(())
}

fn format_info(file: &Path, loaded: &LoadedAudio) -> String {
    let buffer = &loaded.buffer;
    let source = &loaded.source;

    let mut format = if source.float {
        format!("{}-bit float", source.bits_per_sample)
    } else {
        format!("{}-bit PCM", source.bits_per_sample)
    };
    if source.converted {
        format.push_str(" (converted by ffmpeg)");
    }

    let duration = buffer.duration();
    [
        ("File", file.display().to_string()),
        ("Format", format),
        ("Channels", buffer.channel_count().to_string()),
        ("Sample rate", format!("{} Hz", buffer.sample_rate())),
        ("Frames", buffer.frame_count().to_string()),
        (
            "Duration",
            format!("{} ({:.3}s)", format_time(duration), duration.as_secs_f64()),
        ),
        ("Peak", format!("{:.4}", buffer.peak_magnitude())),
        ("Normalization", buffer.normalization().to_string()),
    ]
    .iter()
    .map(|(label, value)| format!("{:<15}{}\n", format!("{label}:"), value))
    .collect()
}
