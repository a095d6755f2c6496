//! Decoder error types

use thiserror::Error;

use crate::waveform::WaveformError;

/// Errors that can occur while turning a file into a sample buffer
#[derive(Error, Debug)]
pub enum DecodeError {
    /// File could not be read
    #[error("Failed to read audio file: {0}")]
    Io(#[from] std::io::Error),

    /// WAV container or sample data is malformed
    #[error("Invalid WAV data: {0}")]
    Wav(#[from] hound::Error),

    /// Sample layout the waveform engine rejects
    #[error(transparent)]
    Format(#[from] WaveformError),

    /// Format the decoder cannot handle
    #[error("Unsupported audio format: {0}")]
    UnsupportedFormat(String),

    /// ffmpeg could not be found or failed to convert the file
    #[error("ffmpeg conversion failed: {0}")]
    Ffmpeg(String),

    /// A newer load superseded this one
    #[error("Decoding cancelled")]
    Cancelled,
}

/// Result type for decoding
pub type DecodeResult<T> = Result<T, DecodeError>;
