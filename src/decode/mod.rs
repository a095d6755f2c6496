//! Audio file decoding.
//!
//! Turns a file on disk into a [`SampleBuffer`]. WAV is read directly with
//! hound; everything else goes through a temporary WAV made by ffmpeg.
//! Decoding is cancellable so a newer load can supersede an older one.

pub mod binaries;
pub mod error;
pub mod ffmpeg;
pub mod wav;

pub use error::{DecodeError, DecodeResult};

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::waveform::{Normalization, SampleBuffer};

/// Shared cancellation flag for one decode.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// `Err(Cancelled)` once the flag is raised.
    pub fn check(&self) -> DecodeResult<()> {
        if self.is_cancelled() {
            Err(DecodeError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Where the samples came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceInfo {
    /// Bit depth of the decoded PCM (16 after ffmpeg conversion)
    pub bits_per_sample: u16,
    pub float: bool,
    /// Whether ffmpeg transcoded the file first
    pub converted: bool,
}

/// A decoded file.
#[derive(Debug, Clone)]
pub struct DecodedAudio {
    pub buffer: SampleBuffer,
    pub source: SourceInfo,
}

/// Decodes `path` into a normalized sample buffer.
///
/// # Errors
/// - If the file cannot be read or decoded
/// - `Cancelled` if `cancel` is raised before decoding finishes
pub fn decode_file(
    path: &Path,
    normalization: Normalization,
    cancel: &CancelFlag,
) -> DecodeResult<DecodedAudio> {
    cancel.check()?;

    if !path.is_file() {
        return Err(DecodeError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("{} is not a file", path.display()),
        )));
    }

    if is_wav(path) {
        return wav::decode_wav(path, normalization, cancel);
    }

    let temp = ffmpeg::convert_to_wav(path, cancel)?;
    let mut decoded = wav::decode_wav(temp.path(), normalization, cancel)?;
    decoded.source.converted = true;
    Ok(decoded)
}

fn is_wav(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("wav") || ext.eq_ignore_ascii_case("wave"))
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicU64, Ordering};

    static NEXT: AtomicU64 = AtomicU64::new(0);

    /// Unique path in the temp dir for a test fixture.
    pub fn temp_wav_path(name: &str) -> PathBuf {
        let id = NEXT.fetch_add(1, Ordering::Relaxed);
        std::env::temp_dir().join(format!(
            "wavescope_test_{}_{}_{}.wav",
            std::process::id(),
            name,
            id
        ))
    }

    /// Writes a 16-bit WAV fixture and returns its path.
    pub fn write_wav(name: &str, channels: u16, sample_rate: u32, samples: &[i16]) -> PathBuf {
        let path = temp_wav_path(name);
        let spec = hound::WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for &s in samples {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();
        path
    }
}
