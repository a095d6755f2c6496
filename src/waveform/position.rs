//! Mapping between playback position and pixel offset.
//!
//! All arithmetic is done in integers (widened to u128) so the same position
//! always lands on the same column.

/// Pixel column of `position_frames` in a display `pixel_width` wide.
///
/// Rounds to the nearest column and clamps to `[0, pixel_width - 1]`. Returns
/// 0 when there is no duration or no width.
pub fn to_pixel(position_frames: u64, duration_frames: u64, pixel_width: u32) -> u32 {
    if duration_frames == 0 || pixel_width == 0 {
        return 0;
    }

    let numerator = position_frames as u128 * pixel_width as u128;
    let pixel = rounded_div(numerator, duration_frames as u128);
    pixel.min(pixel_width as u128 - 1) as u32
}

/// Playback position of pixel column `pixel`, the inverse of [`to_pixel`].
///
/// Clamped to `[0, duration_frames]`. Returns 0 when there is no duration or
/// no width.
pub fn to_position(pixel: u32, duration_frames: u64, pixel_width: u32) -> u64 {
    if duration_frames == 0 || pixel_width == 0 {
        return 0;
    }

    let numerator = pixel as u128 * duration_frames as u128;
    let position = rounded_div(numerator, pixel_width as u128);
    position.min(duration_frames as u128) as u64
}

/// Converts a millisecond timestamp from the playback engine to frames.
pub fn frames_from_millis(millis: u64, sample_rate: u32) -> u64 {
    rounded_div(millis as u128 * sample_rate as u128, 1000) as u64
}

/// Converts a frame position to milliseconds.
pub fn millis_from_frames(frames: u64, sample_rate: u32) -> u64 {
    if sample_rate == 0 {
        return 0;
    }
    rounded_div(frames as u128 * 1000, sample_rate as u128) as u64
}

fn rounded_div(numerator: u128, denominator: u128) -> u128 {
    (numerator + denominator / 2) / denominator
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_midpoint() {
        assert_eq!(to_pixel(500, 1000, 200), 100);
        assert_eq!(to_position(100, 1000, 200), 500);
    }

    #[test]
    fn test_zero_duration_is_guarded() {
        for width in [0, 1, 200] {
            assert_eq!(to_pixel(0, 0, width), 0);
            assert_eq!(to_pixel(12345, 0, width), 0);
        }
        assert_eq!(to_position(10, 0, 200), 0);
    }

    #[test]
    fn test_zero_width() {
        assert_eq!(to_pixel(500, 1000, 0), 0);
        assert_eq!(to_position(0, 1000, 0), 0);
    }

    #[test]
    fn test_end_is_clamped_to_last_column() {
        assert_eq!(to_pixel(1000, 1000, 200), 199);
        assert_eq!(to_pixel(5000, 1000, 200), 199);
        assert_eq!(to_position(400, 1000, 200), 1000);
    }

    #[test]
    fn test_rounding() {
        // 3 * 10 / 7 = 4.28..
        assert_eq!(to_pixel(3, 7, 10), 4);
        // 5 * 10 / 7 = 7.14..
        assert_eq!(to_pixel(5, 7, 10), 7);
    }

    #[test]
    fn test_round_trip_within_one_pixel() {
        let cases = [(1000u64, 200u32), (7, 10), (44_100 * 180, 317), (3, 1), (1, 640)];
        for (duration, width) in cases {
            let frames_per_pixel = duration.div_ceil(width as u64).max(1);
            let step = (duration / 500).max(1);
            let mut position = 0;
            while position <= duration {
                let pixel = to_pixel(position, duration, width);
                assert!(pixel < width);
                let back = to_position(pixel, duration, width);
                assert!(
                    back.abs_diff(position) <= frames_per_pixel,
                    "p={position} d={duration} w={width} pixel={pixel} back={back}"
                );
                position += step;
            }
        }
    }

    #[test]
    fn test_millisecond_conversions() {
        assert_eq!(frames_from_millis(1000, 44100), 44100);
        assert_eq!(frames_from_millis(500, 48000), 24000);
        assert_eq!(millis_from_frames(22050, 44100), 500);
        assert_eq!(millis_from_frames(100, 0), 0);
    }
}
