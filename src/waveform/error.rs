//! Error types for the waveform engine.

use thiserror::Error;

/// Errors raised while constructing waveform data.
///
/// Empty buffers, zero widths and zero durations are not errors; they render
/// as an empty view.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WaveformError {
    /// Malformed sample/channel arithmetic
    #[error("Invalid sample format: {0}")]
    InvalidFormat(String),
}

/// Result type for waveform operations
pub type WaveformResult<T> = Result<T, WaveformError>;
