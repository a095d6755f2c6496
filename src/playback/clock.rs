//! Wall-clock playback transport.
//!
//! Tracks where playback is for one loaded buffer and emits the position and
//! duration notifications the waveform view consumes. Every operation takes
//! the current instant, so time only moves when the caller says so.

use std::time::{Duration, Instant};

use super::{DurationUpdate, PositionUpdate};
use crate::waveform::position::frames_from_millis;

#[derive(Debug, Clone, Copy, PartialEq)]
enum ClockState {
    Paused { at_frames: u64 },
    Playing { started: Instant, from_frames: u64 },
}

/// Playback position source for one generation of loaded audio.
#[derive(Debug, Clone)]
pub struct PlaybackClock {
    generation: u64,
    sample_rate: u32,
    duration_frames: u64,
    state: ClockState,
}

impl PlaybackClock {
    /// A paused clock at frame 0.
    pub fn new(generation: u64, sample_rate: u32, duration_frames: u64) -> Self {
        Self {
            generation,
            sample_rate,
            duration_frames,
            state: ClockState::Paused { at_frames: 0 },
        }
    }

    /// Clock for a view with nothing loaded.
    pub fn idle() -> Self {
        Self::new(0, 0, 0)
    }

    pub fn is_playing(&self) -> bool {
        matches!(self.state, ClockState::Playing { .. })
    }

    /// Current position, clamped to the duration.
    pub fn position_at(&self, now: Instant) -> u64 {
        match self.state {
            ClockState::Paused { at_frames } => at_frames,
            ClockState::Playing { started, from_frames } => {
                let elapsed = now.saturating_duration_since(started);
                let advanced = (elapsed.as_secs_f64() * self.sample_rate as f64) as u64;
                from_frames.saturating_add(advanced).min(self.duration_frames)
            }
        }
    }

    /// Position as time.
    pub fn elapsed_at(&self, now: Instant) -> Duration {
        frames_to_duration(self.position_at(now), self.sample_rate)
    }

    pub fn duration(&self) -> Duration {
        frames_to_duration(self.duration_frames, self.sample_rate)
    }

    /// Whether playback has reached the end.
    pub fn is_finished_at(&self, now: Instant) -> bool {
        self.duration_frames > 0 && self.position_at(now) >= self.duration_frames
    }

    /// Starts playing. At the end of the audio, restarts from the beginning.
    ///
    /// Returns `false` when there is nothing to play.
    pub fn play_at(&mut self, now: Instant) -> bool {
        if self.duration_frames == 0 || self.sample_rate == 0 {
            return false;
        }
        if self.is_playing() {
            return true;
        }
        let mut from_frames = self.position_at(now);
        if from_frames >= self.duration_frames {
            from_frames = 0;
        }
        self.state = ClockState::Playing {
            started: now,
            from_frames,
        };
        true
    }

    pub fn pause_at(&mut self, now: Instant) {
        self.state = ClockState::Paused {
            at_frames: self.position_at(now),
        };
    }

    /// Toggles play/pause; returns whether the clock is now playing.
    pub fn toggle_at(&mut self, now: Instant) -> bool {
        if self.is_playing() {
            self.pause_at(now);
            false
        } else {
            self.play_at(now)
        }
    }

    /// Moves to `frames` (clamped), keeping the play/pause state.
    pub fn seek_at(&mut self, frames: u64, now: Instant) {
        let frames = frames.min(self.duration_frames);
        self.state = match self.state {
            ClockState::Paused { .. } => ClockState::Paused { at_frames: frames },
            ClockState::Playing { .. } => ClockState::Playing {
                started: now,
                from_frames: frames,
            },
        };
    }

    /// Moves by `delta_secs` (negative seeks backwards).
    pub fn seek_by_at(&mut self, delta_secs: f64, now: Instant) {
        let current = self.position_at(now);
        let step = frames_from_millis((delta_secs.abs() * 1000.0).round() as u64, self.sample_rate);
        let target = if delta_secs < 0.0 {
            current.saturating_sub(step)
        } else {
            current.saturating_add(step)
        };
        self.seek_at(target, now);
    }

    /// Stops the clock once it has run past the end.
    pub fn settle_at(&mut self, now: Instant) {
        if self.is_playing() && self.is_finished_at(now) {
            self.state = ClockState::Paused {
                at_frames: self.duration_frames,
            };
        }
    }

    pub fn position_update_at(&self, now: Instant) -> PositionUpdate {
        PositionUpdate {
            generation: self.generation,
            frames: self.position_at(now),
        }
    }

    pub fn duration_update(&self) -> DurationUpdate {
        DurationUpdate {
            generation: self.generation,
            frames: self.duration_frames,
        }
    }
}

fn frames_to_duration(frames: u64, sample_rate: u32) -> Duration {
    if sample_rate == 0 {
        return Duration::ZERO;
    }
    Duration::from_secs_f64(frames as f64 / sample_rate as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_clock_is_paused_at_zero() {
        let clock = PlaybackClock::new(3, 1000, 5000);
        let now = Instant::now();
        assert!(!clock.is_playing());
        assert_eq!(clock.position_at(now), 0);
        assert_eq!(clock.duration(), Duration::from_secs(5));
    }

    #[test]
    fn test_position_advances_while_playing() {
        let mut clock = PlaybackClock::new(1, 1000, 10_000);
        let start = Instant::now();
        assert!(clock.play_at(start));

        assert_eq!(clock.position_at(start + Duration::from_millis(1500)), 1500);
        clock.pause_at(start + Duration::from_secs(2));
        assert_eq!(clock.position_at(start + Duration::from_secs(9)), 2000);
    }

    #[test]
    fn test_position_is_clamped_and_settles() {
        let mut clock = PlaybackClock::new(1, 1000, 1000);
        let start = Instant::now();
        clock.play_at(start);

        let later = start + Duration::from_secs(5);
        assert_eq!(clock.position_at(later), 1000);
        assert!(clock.is_finished_at(later));
        clock.settle_at(later);
        assert!(!clock.is_playing());

        // Playing again from the end restarts
        clock.play_at(later);
        assert_eq!(clock.position_at(later), 0);
    }

    #[test]
    fn test_seek_keeps_state() {
        let mut clock = PlaybackClock::new(1, 100, 1000);
        let start = Instant::now();
        clock.seek_at(400, start);
        assert_eq!(clock.position_at(start), 400);
        assert!(!clock.is_playing());

        clock.play_at(start);
        clock.seek_at(5000, start + Duration::from_secs(1));
        assert!(clock.is_playing());
        assert_eq!(clock.position_at(start + Duration::from_secs(1)), 1000);
    }

    #[test]
    fn test_seek_by_seconds() {
        let mut clock = PlaybackClock::new(1, 100, 1000);
        let now = Instant::now();
        clock.seek_by_at(3.0, now);
        assert_eq!(clock.position_at(now), 300);
        clock.seek_by_at(-5.0, now);
        assert_eq!(clock.position_at(now), 0);
    }

    #[test]
    fn test_idle_clock_cannot_play() {
        let mut clock = PlaybackClock::idle();
        assert!(!clock.toggle_at(Instant::now()));
        assert_eq!(clock.duration(), Duration::ZERO);
    }

    #[test]
    fn test_updates_carry_generation() {
        let clock = PlaybackClock::new(7, 1000, 2000);
        let now = Instant::now();
        assert_eq!(clock.position_update_at(now), PositionUpdate { generation: 7, frames: 0 });
        assert_eq!(clock.duration_update(), DurationUpdate { generation: 7, frames: 2000 });
    }
}
