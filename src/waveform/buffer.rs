//! Decoded, normalized multi-channel sample storage.
//!
//! A `SampleBuffer` is built once per load and never mutated afterwards. New
//! audio replaces the whole buffer; the view holds it behind an `Arc`.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use super::error::{WaveformError, WaveformResult};

/// Source of process-unique buffer ids for envelope cache keys.
static NEXT_BUFFER_ID: AtomicU64 = AtomicU64::new(1);

/// How fixed-point samples are scaled into [-1.0, 1.0].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Normalization {
    /// Divide by the largest magnitude present in the buffer.
    ///
    /// Quiet recordings are shown full-scale.
    #[default]
    Peak,
    /// Divide by the format's theoretical maximum, `2^(bits - 1)`.
    FullScale,
}

impl std::fmt::Display for Normalization {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Peak => write!(f, "peak"),
            Self::FullScale => write!(f, "full_scale"),
        }
    }
}

/// Interleaved samples with their format metadata.
#[derive(Debug, Clone)]
pub struct SampleBuffer {
    id: u64,
    samples: Vec<f32>,
    channel_count: usize,
    sample_rate: u32,
    normalization: Normalization,
}

impl SampleBuffer {
    /// Builds a buffer from interleaved float samples.
    ///
    /// Values outside [-1.0, 1.0] are clamped and NaN becomes silence.
    ///
    /// # Errors
    /// - `InvalidFormat` if `channel_count` or `sample_rate` is zero
    /// - `InvalidFormat` if the sample count is not a multiple of `channel_count`
    pub fn new(samples: Vec<f32>, channel_count: usize, sample_rate: u32) -> WaveformResult<Self> {
        let mut samples = samples;
        for s in samples.iter_mut() {
            *s = if s.is_nan() { 0.0 } else { s.clamp(-1.0, 1.0) };
        }
        Self::assemble(samples, channel_count, sample_rate, Normalization::FullScale)
    }

    /// Builds a buffer from interleaved fixed-point samples.
    ///
    /// `bits_per_sample` is the width of the source format (8, 16, 24, 32).
    /// See [`Normalization`] for how the divisor is picked. A buffer of
    /// all-zero samples stays silent under either convention.
    ///
    /// # Errors
    /// - `InvalidFormat` if `bits_per_sample` is outside 1..=32
    /// - the same layout errors as [`SampleBuffer::new`]
    pub fn from_int_samples(
        raw: &[i32],
        bits_per_sample: u16,
        channel_count: usize,
        sample_rate: u32,
        normalization: Normalization,
    ) -> WaveformResult<Self> {
        if bits_per_sample == 0 || bits_per_sample > 32 {
            return Err(WaveformError::InvalidFormat(format!(
                "unsupported bit depth {bits_per_sample}"
            )));
        }

        let divisor = match normalization {
            Normalization::Peak => raw
                .iter()
                .map(|&s| (s as i64).unsigned_abs())
                .max()
                .unwrap_or(0) as f64,
            Normalization::FullScale => (1u64 << (bits_per_sample - 1)) as f64,
        };

        let samples = if divisor == 0.0 {
            vec![0.0; raw.len()]
        } else {
            raw.iter()
                .map(|&s| ((s as f64) / divisor).clamp(-1.0, 1.0) as f32)
                .collect()
        };

        Self::assemble(samples, channel_count, sample_rate, normalization)
    }

    fn assemble(
        samples: Vec<f32>,
        channel_count: usize,
        sample_rate: u32,
        normalization: Normalization,
    ) -> WaveformResult<Self> {
        if channel_count == 0 {
            return Err(WaveformError::InvalidFormat(
                "channel count must be positive".to_string(),
            ));
        }
        if sample_rate == 0 {
            return Err(WaveformError::InvalidFormat(
                "sample rate must be positive".to_string(),
            ));
        }
        if samples.len() % channel_count != 0 {
            return Err(WaveformError::InvalidFormat(format!(
                "{} samples do not divide into {} channels",
                samples.len(),
                channel_count
            )));
        }

        Ok(Self {
            id: NEXT_BUFFER_ID.fetch_add(1, Ordering::Relaxed),
            samples,
            channel_count,
            sample_rate,
            normalization,
        })
    }

    /// Process-unique identity of this buffer.
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn channel_count(&self) -> usize {
        self.channel_count
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn normalization(&self) -> Normalization {
        self.normalization
    }

    /// Number of frames (one sample per channel each).
    pub fn frame_count(&self) -> usize {
        self.samples.len() / self.channel_count
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Interleaved sample data.
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Playback length at the buffer's sample rate.
    pub fn duration(&self) -> Duration {
        Duration::from_secs_f64(self.frame_count() as f64 / self.sample_rate as f64)
    }

    /// Largest absolute sample value across all channels.
    pub fn peak_magnitude(&self) -> f32 {
        self.samples.iter().fold(0.0f32, |peak, s| peak.max(s.abs()))
    }
}
