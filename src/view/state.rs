//! State behind one waveform display.
//!
//! Owns the single live [`SampleBuffer`] and its cached envelope, filters
//! load results and playback notifications by generation, and turns the
//! current state into draw primitives on demand.

use std::path::PathBuf;
use std::sync::Arc;

use crate::decode::SourceInfo;
use crate::loader::LoadResult;
use crate::playback::{DurationUpdate, PositionUpdate};
use crate::waveform::position::{to_pixel, to_position};
use crate::waveform::render::{self, DrawPrimitive};
use crate::waveform::{EnvelopeCache, SampleBuffer};

/// What happened to a delivered load result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// The result was current and is now displayed
    Applied,
    /// A newer load was requested after this one; the result was dropped
    Stale,
    /// The current load failed; the previous waveform stays on screen
    Failed(String),
}

/// The buffer currently on display.
#[derive(Debug, Clone)]
pub struct Shown {
    pub generation: u64,
    pub path: PathBuf,
    pub buffer: Arc<SampleBuffer>,
    pub source: SourceInfo,
}

#[derive(Debug)]
pub struct WaveformView {
    shown: Option<Shown>,
    expected_generation: u64,
    /// Last generation whose result arrived, applied or failed
    settled_generation: u64,
    cache: EnvelopeCache,
    pixel_width: u32,
    pixel_height: u32,
    zoom: u32,
    max_zoom: u32,
    position_frames: u64,
    duration_frames: u64,
}

impl WaveformView {
    pub fn new(zoom: u32, max_zoom: u32) -> Self {
        let max_zoom = max_zoom.max(1);
        Self {
            shown: None,
            expected_generation: 0,
            settled_generation: 0,
            cache: EnvelopeCache::new(),
            pixel_width: 0,
            pixel_height: 0,
            zoom: zoom.clamp(1, max_zoom),
            max_zoom,
            position_frames: 0,
            duration_frames: 0,
        }
    }

    /// Records that `generation` is now the only load whose result counts.
    ///
    /// Generations only move forward; an older number is ignored.
    pub fn begin_load(&mut self, generation: u64) {
        if generation > self.expected_generation {
            self.expected_generation = generation;
        }
    }

    /// Hands a finished load to the view.
    pub fn deliver(&mut self, result: LoadResult) -> Delivery {
        if result.generation != self.expected_generation {
            tracing::debug!(
                "Dropping stale load result (generation {}, expecting {})",
                result.generation,
                self.expected_generation
            );
            return Delivery::Stale;
        }

        self.settled_generation = result.generation;
        let loaded = match result.outcome {
            Ok(loaded) => loaded,
            Err(message) => return Delivery::Failed(message),
        };

        self.duration_frames = loaded.buffer.frame_count() as u64;
        self.position_frames = 0;
        self.cache.insert(loaded.envelope);
        self.shown = Some(Shown {
            generation: result.generation,
            path: result.path,
            buffer: loaded.buffer,
            source: loaded.source,
        });
        Delivery::Applied
    }

    pub fn shown(&self) -> Option<&Shown> {
        self.shown.as_ref()
    }

    /// Generation of the displayed buffer, 0 when nothing is shown.
    pub fn shown_generation(&self) -> u64 {
        self.shown.as_ref().map_or(0, |shown| shown.generation)
    }

    /// Whether a requested load has not been delivered yet.
    ///
    /// A failed result counts as delivered.
    pub fn is_loading(&self) -> bool {
        self.expected_generation != self.settled_generation
    }

    /// Sets the drawing area in envelope pixels.
    pub fn resize(&mut self, pixel_width: u32, pixel_height: u32) {
        self.pixel_width = pixel_width;
        self.pixel_height = pixel_height;
    }

    pub fn pixel_width(&self) -> u32 {
        self.pixel_width
    }

    pub fn pixel_height(&self) -> u32 {
        self.pixel_height
    }

    /// Sets the zoom factor, clamped to `[1, max_zoom]`.
    pub fn set_zoom(&mut self, factor: u32) {
        self.zoom = factor.clamp(1, self.max_zoom);
    }

    /// Halves the zoom factor, showing fewer frames per column.
    pub fn zoom_in(&mut self) {
        self.set_zoom(self.zoom / 2);
    }

    /// Doubles the zoom factor, aggregating more frames per column.
    pub fn zoom_out(&mut self) {
        self.set_zoom(self.zoom.saturating_mul(2));
    }

    pub fn zoom(&self) -> u32 {
        self.zoom
    }

    /// Applies a playback position notification for the shown buffer.
    ///
    /// Returns false when the update belongs to another generation.
    pub fn position_changed(&mut self, update: PositionUpdate) -> bool {
        if self.shown.is_none() || update.generation != self.shown_generation() {
            return false;
        }
        self.position_frames = update.frames.min(self.duration_frames);
        true
    }

    /// Applies a duration notification for the shown buffer.
    pub fn duration_changed(&mut self, update: DurationUpdate) -> bool {
        if self.shown.is_none() || update.generation != self.shown_generation() {
            return false;
        }
        self.duration_frames = update.frames;
        self.position_frames = self.position_frames.min(update.frames);
        true
    }

    pub fn position_frames(&self) -> u64 {
        self.position_frames
    }

    pub fn duration_frames(&self) -> u64 {
        self.duration_frames
    }

    /// Column of the playback cursor.
    pub fn cursor_pixel(&self) -> u32 {
        to_pixel(self.position_frames, self.duration_frames, self.pixel_width)
    }

    /// Frame position under column `x`, for click-to-seek.
    pub fn seek_to_pixel(&self, x: u32) -> u64 {
        to_position(x, self.duration_frames, self.pixel_width)
    }

    /// Draw primitives for the current state.
    ///
    /// Rebuilds the envelope when width, zoom or buffer changed since the
    /// last call. With nothing loaded only the cursor is produced.
    pub fn primitives(&mut self) -> Vec<DrawPrimitive> {
        let height = self.pixel_height as f32;
        let Some(shown) = &self.shown else {
            return vec![render::cursor(0, height)];
        };

        let envelope = self
            .cache
            .get_or_build(&shown.buffer, self.pixel_width as usize, self.zoom);
        render::describe(
            &envelope,
            self.cursor_pixel(),
            height,
            shown.buffer.channel_count(),
        )
    }

    #[cfg(test)]
    fn envelope_builds(&self) -> u64 {
        self.cache.build_count()
    }
}
