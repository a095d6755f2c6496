//! Waveform envelope engine.
//!
//! Turns decoded sample buffers into per-pixel min/max envelopes, maps
//! playback positions to pixel columns, and describes the result as draw
//! primitives for a painting layer.

pub mod buffer;
pub mod envelope;
pub mod error;
pub mod position;
pub mod render;

pub use buffer::{Normalization, SampleBuffer};
pub use envelope::{build, Column, Envelope, EnvelopeCache};
pub use error::WaveformError;
pub use render::{describe, Band, DrawPrimitive};
