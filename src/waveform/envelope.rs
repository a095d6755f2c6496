//! Min/max envelope generation for waveform display.
//!
//! Reduces a [`SampleBuffer`] to one (min, max) pair per pixel column and
//! channel, so a waveform can be drawn without touching every sample on each
//! repaint.

use std::sync::Arc;

use super::buffer::SampleBuffer;

/// One pixel column of an envelope.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Column {
    /// No frames fall into this column; renderers skip it.
    NoData,
    /// Extremes of the frames covered by this column.
    Peak { min: f32, max: f32 },
}

impl Column {
    /// The (min, max) pair, if the column holds data.
    pub fn peak(&self) -> Option<(f32, f32)> {
        match *self {
            Column::NoData => None,
            Column::Peak { min, max } => Some((min, max)),
        }
    }
}

/// Per-channel columns plus the parameters they were built with.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    /// `channels[c][x]` is column `x` of channel `c`
    channels: Vec<Vec<Column>>,
    pixel_width: usize,
    zoom_factor: u32,
    samples_per_pixel: usize,
    buffer_id: u64,
}

impl Envelope {
    pub fn channels(&self) -> &[Vec<Column>] {
        &self.channels
    }

    /// Columns of one channel, empty if the channel does not exist.
    pub fn channel(&self, channel: usize) -> &[Column] {
        self.channels.get(channel).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    pub fn pixel_width(&self) -> usize {
        self.pixel_width
    }

    pub fn zoom_factor(&self) -> u32 {
        self.zoom_factor
    }

    /// Frames aggregated into each column (0 when nothing was sampled).
    pub fn samples_per_pixel(&self) -> usize {
        self.samples_per_pixel
    }

    /// Id of the [`SampleBuffer`] this envelope was built from.
    pub fn buffer_id(&self) -> u64 {
        self.buffer_id
    }

    /// Cache key this envelope satisfies.
    pub fn key(&self) -> EnvelopeKey {
        EnvelopeKey {
            buffer_id: self.buffer_id,
            pixel_width: self.pixel_width,
            zoom_factor: self.zoom_factor,
        }
    }
}

/// Builds the envelope of `buffer` for a display `pixel_width` columns wide.
///
/// A `zoom_factor` of 1 fits the whole buffer into the width; larger factors
/// aggregate proportionally more frames per column, leaving trailing columns
/// as [`Column::NoData`]. A zoom of 0 is treated as 1. A width of 0 yields no
/// columns; an empty buffer yields `pixel_width` `NoData` columns.
pub fn build(buffer: &SampleBuffer, pixel_width: usize, zoom_factor: u32) -> Envelope {
    let zoom_factor = zoom_factor.max(1);
    let channel_count = buffer.channel_count();
    let frames = buffer.frame_count();

    let mut envelope = Envelope {
        channels: Vec::with_capacity(channel_count),
        pixel_width,
        zoom_factor,
        samples_per_pixel: 0,
        buffer_id: buffer.id(),
    };

    if pixel_width == 0 {
        envelope.channels = vec![Vec::new(); channel_count];
        return envelope;
    }
    if frames == 0 {
        envelope.channels = vec![vec![Column::NoData; pixel_width]; channel_count];
        return envelope;
    }

    let samples_per_pixel = ((frames / pixel_width).saturating_mul(zoom_factor as usize)).max(1);
    envelope.samples_per_pixel = samples_per_pixel;
    let samples = buffer.samples();

    for channel in 0..channel_count {
        let columns = (0..pixel_width)
            .map(|x| {
                let start = x.saturating_mul(samples_per_pixel);
                let end = x
                    .saturating_add(1)
                    .saturating_mul(samples_per_pixel)
                    .min(frames);
                if start >= end {
                    return Column::NoData;
                }

                let interleaved = &samples[start * channel_count..end * channel_count];
                let (min, max) = interleaved.iter().skip(channel).step_by(channel_count).fold(
                    (f32::INFINITY, f32::NEG_INFINITY),
                    |(min, max), &sample| (min.min(sample), max.max(sample)),
                );
                Column::Peak { min, max }
            })
            .collect();
        envelope.channels.push(columns);
    }

    envelope
}

/// Validity key of a cached envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnvelopeKey {
    pub buffer_id: u64,
    pub pixel_width: usize,
    pub zoom_factor: u32,
}

/// Holds the single live envelope of a view.
///
/// The envelope is reused as long as buffer, width and zoom are unchanged,
/// and rebuilt synchronously otherwise.
#[derive(Debug, Default)]
pub struct EnvelopeCache {
    cached: Option<Arc<Envelope>>,
    builds: u64,
}

impl EnvelopeCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached envelope, rebuilding it if the key changed.
    pub fn get_or_build(
        &mut self,
        buffer: &SampleBuffer,
        pixel_width: usize,
        zoom_factor: u32,
    ) -> Arc<Envelope> {
        let key = EnvelopeKey {
            buffer_id: buffer.id(),
            pixel_width,
            zoom_factor: zoom_factor.max(1),
        };

        if let Some(envelope) = &self.cached {
            if envelope.key() == key {
                return Arc::clone(envelope);
            }
        }

        let envelope = Arc::new(build(buffer, pixel_width, zoom_factor));
        self.builds += 1;
        tracing::debug!(
            "Envelope rebuilt: buffer={}, width={}, zoom={}, spp={}",
            key.buffer_id,
            key.pixel_width,
            key.zoom_factor,
            envelope.samples_per_pixel()
        );
        self.cached = Some(Arc::clone(&envelope));
        envelope
    }

    /// Adopts an envelope built elsewhere, e.g. on the load worker.
    pub fn insert(&mut self, envelope: Arc<Envelope>) {
        self.cached = Some(envelope);
    }

    /// Number of envelopes this cache has built itself.
    pub fn build_count(&self) -> u64 {
        self.builds
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mono(samples: Vec<f32>) -> SampleBuffer {
        SampleBuffer::new(samples, 1, 44100).unwrap()
    }

    /// Deterministic pseudo-random samples in [-1, 1].
    fn noise(len: usize, seed: u64) -> Vec<f32> {
        let mut state = seed;
        (0..len)
            .map(|_| {
                state = state
                    .wrapping_mul(6364136223846793005)
                    .wrapping_add(1442695040888963407);
                ((state >> 33) as f32 / (1u64 << 31) as f32) * 2.0 - 1.0
            })
            .collect()
    }

    #[test]
    fn test_mono_reference_envelope() {
        let buffer = mono(vec![0.5, -0.5, 1.0, -1.0, 0.0, 0.25, -0.25, 0.0]);
        let envelope = build(&buffer, 4, 1);

        assert_eq!(envelope.samples_per_pixel(), 2);
        assert_eq!(
            envelope.channel(0),
            &[
                Column::Peak { min: -0.5, max: 0.5 },
                Column::Peak { min: -1.0, max: 1.0 },
                Column::Peak { min: 0.0, max: 0.25 },
                Column::Peak { min: -0.25, max: 0.0 },
            ]
        );
    }

    #[test]
    fn test_zero_width_has_no_columns() {
        let buffer = mono(noise(100, 1));
        for zoom in [0, 1, 3, 50] {
            let envelope = build(&buffer, 0, zoom);
            assert_eq!(envelope.channel_count(), 1);
            assert!(envelope.channel(0).is_empty());
        }
    }

    #[test]
    fn test_empty_buffer_has_no_data_columns() {
        let buffer = SampleBuffer::new(Vec::new(), 2, 44100).unwrap();
        for (width, zoom) in [(1, 1), (17, 1), (64, 8)] {
            let envelope = build(&buffer, width, zoom);
            assert_eq!(envelope.channel_count(), 2);
            for channel in envelope.channels() {
                assert_eq!(channel.len(), width);
                assert!(channel.iter().all(|column| *column == Column::NoData));
            }
        }
    }

    #[test]
    fn test_column_count_and_ordering_hold_for_many_shapes() {
        for (len, channels, seed) in [(1000, 1, 7), (999, 3, 11), (64, 2, 3), (5, 1, 9)] {
            let buffer = SampleBuffer::new(noise(len * channels, seed), channels, 44100).unwrap();
            for width in [1, 3, 10, 64, 200] {
                for zoom in [1, 2, 7] {
                    let envelope = build(&buffer, width, zoom);
                    assert_eq!(envelope.channel_count(), channels);
                    for channel in envelope.channels() {
                        assert_eq!(channel.len(), width);
                        for column in channel {
                            if let Some((min, max)) = column.peak() {
                                assert!(min <= max);
                                assert!((-1.0..=1.0).contains(&min));
                                assert!((-1.0..=1.0).contains(&max));
                            }
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_build_is_idempotent() {
        let buffer = SampleBuffer::new(noise(4410, 42), 2, 44100).unwrap();
        let a = build(&buffer, 123, 2);
        let b = build(&buffer, 123, 2);
        assert_eq!(a, b);
        for (ca, cb) in a.channels().iter().zip(b.channels()) {
            for (x, y) in ca.iter().zip(cb) {
                if let (Some(p), Some(q)) = (x.peak(), y.peak()) {
                    assert_eq!(p.0.to_bits(), q.0.to_bits());
                    assert_eq!(p.1.to_bits(), q.1.to_bits());
                }
            }
        }
    }

    #[test]
    fn test_zoom_out_aggregates_more_frames() {
        let buffer = mono(vec![0.5, -0.5, 1.0, -1.0, 0.0, 0.25, -0.25, 0.0]);
        let envelope = build(&buffer, 4, 2);

        assert_eq!(envelope.samples_per_pixel(), 4);
        assert_eq!(
            envelope.channel(0),
            &[
                Column::Peak { min: -1.0, max: 1.0 },
                Column::Peak { min: -0.25, max: 0.25 },
                Column::NoData,
                Column::NoData,
            ]
        );
    }

    #[test]
    fn test_width_larger_than_buffer() {
        let buffer = mono(vec![0.1, 0.2, 0.3]);
        let envelope = build(&buffer, 5, 1);

        assert_eq!(envelope.samples_per_pixel(), 1);
        assert_eq!(envelope.channel(0)[2], Column::Peak { min: 0.3, max: 0.3 });
        assert_eq!(envelope.channel(0)[3..], [Column::NoData, Column::NoData]);
    }

    #[test]
    fn test_channels_are_reduced_independently() {
        let buffer = SampleBuffer::new(vec![1.0, -1.0, 0.5, -0.5], 2, 44100).unwrap();
        let envelope = build(&buffer, 1, 1);

        assert_eq!(envelope.channel(0), &[Column::Peak { min: 0.5, max: 1.0 }]);
        assert_eq!(envelope.channel(1), &[Column::Peak { min: -1.0, max: -0.5 }]);
    }

    #[test]
    fn test_zero_zoom_is_clamped() {
        let buffer = mono(noise(80, 5));
        assert_eq!(build(&buffer, 8, 0), build(&buffer, 8, 1));
    }

    #[test]
    fn test_cache_reuses_until_key_changes() {
        let buffer = mono(noise(1000, 2));
        let mut cache = EnvelopeCache::new();

        let first = cache.get_or_build(&buffer, 100, 1);
        let again = cache.get_or_build(&buffer, 100, 1);
        assert!(Arc::ptr_eq(&first, &again));
        assert_eq!(cache.build_count(), 1);

        let resized = cache.get_or_build(&buffer, 50, 1);
        assert_eq!(resized.pixel_width(), 50);
        let zoomed = cache.get_or_build(&buffer, 50, 2);
        assert_eq!(zoomed.zoom_factor(), 2);
        assert_eq!(cache.build_count(), 3);

        let other = mono(noise(1000, 2));
        let rebuilt = cache.get_or_build(&other, 50, 2);
        assert_eq!(rebuilt.buffer_id(), other.id());
        assert_eq!(cache.build_count(), 4);
    }

    #[test]
    fn test_cache_adopts_inserted_envelope() {
        let buffer = mono(noise(500, 8));
        let mut cache = EnvelopeCache::new();
        let prebuilt = Arc::new(build(&buffer, 40, 1));
        cache.insert(Arc::clone(&prebuilt));

        let served = cache.get_or_build(&buffer, 40, 1);
        assert!(Arc::ptr_eq(&served, &prebuilt));
        assert_eq!(cache.build_count(), 0);

        // A different width no longer matches the adopted envelope
        let resized = cache.get_or_build(&buffer, 20, 1);
        assert!(!Arc::ptr_eq(&resized, &prebuilt));
        assert_eq!(cache.build_count(), 1);
    }
}
