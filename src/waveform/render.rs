//! Geometry for drawing an envelope and playback cursor.
//!
//! Produces an ordered list of primitives in widget coordinates (origin top
//! left, y growing downwards). Colors and stroke styles belong to whoever
//! paints them.

use super::envelope::{Column, Envelope};

/// One drawing instruction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DrawPrimitive {
    /// Vertical segment of one envelope column, from the max (top) to the min (bottom).
    Segment {
        channel: usize,
        x: u32,
        y_top: f32,
        y_bottom: f32,
    },
    /// Playback cursor spanning the full widget height.
    Cursor { x: u32, y_top: f32, y_bottom: f32 },
}

/// Horizontal band assigned to one channel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Band {
    pub top: f32,
    pub height: f32,
}

impl Band {
    /// Band of `channel` when `height` is split evenly into `channel_count`
    /// bands, channel 0 topmost.
    pub fn for_channel(channel: usize, channel_count: usize, height: f32) -> Self {
        if channel_count == 0 {
            return Band { top: 0.0, height };
        }
        let band_height = height / channel_count as f32;
        Band {
            top: band_height * channel as f32,
            height: band_height,
        }
    }

    /// Row of sample value `value`: 1.0 is the top edge, -1.0 the bottom edge.
    pub fn y_for(&self, value: f32) -> f32 {
        self.height * (1.0 - value) / 2.0 + self.top
    }
}

/// Describes `envelope` and a cursor at `cursor_pixel` for a widget
/// `widget_height` rows tall.
///
/// Segments are emitted channel by channel, left to right, skipping
/// [`Column::NoData`]. The cursor is always the last primitive so it draws on
/// top of the waveform.
pub fn describe(
    envelope: &Envelope,
    cursor_pixel: u32,
    widget_height: f32,
    channel_count: usize,
) -> Vec<DrawPrimitive> {
    let drawn_channels = channel_count.min(envelope.channel_count());
    let mut primitives = Vec::with_capacity(drawn_channels * envelope.pixel_width() + 1);

    for channel in 0..drawn_channels {
        let band = Band::for_channel(channel, channel_count, widget_height);
        for (x, column) in envelope.channel(channel).iter().enumerate() {
            if let Column::Peak { min, max } = *column {
                primitives.push(DrawPrimitive::Segment {
                    channel,
                    x: x as u32,
                    y_top: band.y_for(max),
                    y_bottom: band.y_for(min),
                });
            }
        }
    }

    primitives.push(cursor(cursor_pixel, widget_height));
    primitives
}

/// Cursor primitive alone, for views with nothing loaded.
pub fn cursor(cursor_pixel: u32, widget_height: f32) -> DrawPrimitive {
    DrawPrimitive::Cursor {
        x: cursor_pixel,
        y_top: 0.0,
        y_bottom: widget_height,
    }
}
