//! Playback transport.
//!
//! The clock produces generation-tagged position and duration notifications;
//! the external player makes the audio audible.

pub mod clock;
pub mod player;

pub use clock::PlaybackClock;
pub use player::ExternalPlayer;

/// Periodic playback position notification, in frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionUpdate {
    pub generation: u64,
    pub frames: u64,
}

/// One-time duration notification for a loaded buffer, in frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DurationUpdate {
    pub generation: u64,
    pub frames: u64,
}
