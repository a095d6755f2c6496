//! Prints the min/max envelope of a file.
//!
//! Useful for scripting and for checking what the viewer would draw without
//! a terminal UI.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use anyhow::anyhow;
use serde::Serialize;

use crate::config::WavescopeConfig;
use crate::loader::{LoadedAudio, Loader};

/// Envelope of one file, as printed.
#[derive(Debug, Serialize)]
struct PeaksReport {
    file: String,
    sample_rate: u32,
    frame_count: usize,
    pixel_width: usize,
    zoom_factor: u32,
    samples_per_pixel: usize,
    channels: Vec<ChannelPeaks>,
}

#[derive(Debug, Serialize)]
struct ChannelPeaks {
    channel: usize,
    /// `[min, max]` per column, `null` where the column has no data
    columns: Vec<Option<[f32; 2]>>,
}

/// Loads `file` and prints its envelope.
///
/// # Errors
/// - If the configuration cannot be loaded
/// - If the file cannot be decoded
/// - If `channel` is out of range
pub async fn handle_peaks(
    file: PathBuf,
    width: usize,
    zoom: u32,
    channel: Option<usize>,
    json: bool,
) -> Result<(), anyhow::Error> {
    let config = WavescopeConfig::load()?;
    let loaded = load(&file, &config, width, zoom).await?;
    let report = build_report(&file, &loaded, channel)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", format_text(&report));
    }
    Ok(())
}

/// Decodes `file` through the background loader and waits for it.
pub(crate) async fn load(
    file: &Path,
    config: &WavescopeConfig,
    width: usize,
    zoom: u32,
) -> Result<LoadedAudio, anyhow::Error> {
    let mut loader = Loader::new(config.decode.normalization);
    loader.load(file.to_path_buf(), width, zoom);

    let result = loader
        .recv()
        .await
        .ok_or_else(|| anyhow!("Loading {} was cancelled", file.display()))?;
    result
        .outcome
        .map_err(|e| anyhow!("Failed to load {}: {e}", file.display()))
}

fn build_report(
    file: &Path,
    loaded: &LoadedAudio,
    channel: Option<usize>,
) -> Result<PeaksReport, anyhow::Error> {
    let envelope = &loaded.envelope;
    let channel_count = envelope.channel_count();

    let selected: Vec<usize> = match channel {
        Some(c) if c >= channel_count => {
            return Err(anyhow!(
                "Channel {c} out of range, {} has {channel_count} channels",
                file.display()
            ))
        }
        Some(c) => vec![c],
        None => (0..channel_count).collect(),
    };

    let channels = selected
        .into_iter()
        .map(|c| ChannelPeaks {
            channel: c,
            columns: envelope
                .channel(c)
                .iter()
                .map(|column| column.peak().map(|(min, max)| [min, max]))
                .collect(),
        })
        .collect();

    Ok(PeaksReport {
        file: file.display().to_string(),
        sample_rate: loaded.buffer.sample_rate(),
        frame_count: loaded.buffer.frame_count(),
        pixel_width: envelope.pixel_width(),
        zoom_factor: envelope.zoom_factor(),
        samples_per_pixel: envelope.samples_per_pixel(),
        channels,
    })
}

/// Tab-separated `column channel min max` rows; no-data columns print `-`.
fn format_text(report: &PeaksReport) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "# {}: {} frames at {}Hz, width {}, zoom {}, {} samples per pixel",
        report.file,
        report.frame_count,
        report.sample_rate,
        report.pixel_width,
        report.zoom_factor,
        report.samples_per_pixel
    );

    for channel in &report.channels {
        for (x, column) in channel.columns.iter().enumerate() {
            let _ = match column {
                Some([min, max]) => writeln!(out, "{x}\t{}\t{min:.6}\t{max:.6}", channel.channel),
                None => writeln!(out, "{x}\t{}\t-\t-", channel.channel),
            };
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::test_support::write_wav;

    async fn load_fixture(name: &str, channels: u16, samples: &[i16], width: usize) -> LoadedAudio {
        let path = write_wav(name, channels, 8000, samples);
        let loaded = load(&path, &WavescopeConfig::default(), width, 1).await.unwrap();
        std::fs::remove_file(&path).ok();
        loaded
    }

    #[tokio::test]
    async fn test_report_matches_envelope() {
        let samples = [16384, -16384, 32767, -32767, 0, 0, 0, 0];
        let loaded = load_fixture("peaks_mono", 1, &samples, 4).await;
        let report = build_report(Path::new("mono.wav"), &loaded, None).unwrap();

        assert_eq!(report.frame_count, 8);
        assert_eq!(report.samples_per_pixel, 2);
        assert_eq!(report.channels.len(), 1);
        let columns = &report.channels[0].columns;
        assert_eq!(columns.len(), 4);
        assert_eq!(columns[1], Some([-1.0, 1.0]));
        assert_eq!(columns[2], Some([0.0, 0.0]));
    }

    #[tokio::test]
    async fn test_channel_selection() {
        let loaded = load_fixture("peaks_stereo", 2, &[100, -100, 200, -200], 2).await;

        let report = build_report(Path::new("stereo.wav"), &loaded, Some(1)).unwrap();
        assert_eq!(report.channels.len(), 1);
        assert_eq!(report.channels[0].channel, 1);

        assert!(build_report(Path::new("stereo.wav"), &loaded, Some(2)).is_err());
    }

    #[tokio::test]
    async fn test_text_and_json_output() {
        let loaded = load_fixture("peaks_output", 1, &[1000, -1000], 4).await;
        let report = build_report(Path::new("short.wav"), &loaded, None).unwrap();

        let text = format_text(&report);
        let rows: Vec<&str> = text.lines().skip(1).collect();
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0], "0\t0\t1.000000\t1.000000");
        assert_eq!(rows[3], "3\t0\t-\t-");

        let json: serde_json::Value = serde_json::to_value(&report).unwrap();
        assert_eq!(json["pixel_width"], 4);
        assert!(json["channels"][0]["columns"][3].is_null());
    }
}
