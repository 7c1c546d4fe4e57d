//! Synthetic ring series for demos and smoke tests.

use peakpick_core::MemorySeries;
use std::f64::consts::TAU;

/// Raw value of pixels in the module gap.
const GAP_VALUE: i64 = 4_294_967_295;
const BACKGROUND: f64 = 5.0;
const RING_AMPLITUDE: f64 = 150.0;
const SPOT_AMPLITUDE: f64 = 2_000.0;
const SPOTS_PER_FRAME: usize = 4;

/// A powder ring around the frame centre with a few bright single-crystal
/// spots on it that rotate from frame to frame, and a one-pixel vertical gap
/// flagged with the detector's invalid-pixel value.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn ring_series(width: usize, height: usize, frames: usize) -> MemorySeries {
    let cx = width as f64 / 2.0;
    let cy = height as f64 / 2.0;
    let radius = 0.3 * width.min(height) as f64;
    let gap = width / 3;

    MemorySeries::from_fn(width, height, frames, |frame, x, y| {
        if x == gap {
            return GAP_VALUE;
        }
        let dx = x as f64 - cx;
        let dy = y as f64 - cy;
        let ring = RING_AMPLITUDE * gaussian((dx * dx + dy * dy).sqrt() - radius, 1.5);

        let spots: f64 = (0..SPOTS_PER_FRAME)
            .map(|k| {
                let angle = TAU * k as f64 / SPOTS_PER_FRAME as f64 + 0.05 * frame as f64;
                let sx = cx + radius * angle.cos();
                let sy = cy + radius * angle.sin();
                SPOT_AMPLITUDE * gaussian((x as f64 - sx).hypot(y as f64 - sy), 1.2)
            })
            .sum();

        (BACKGROUND + ring + spots).round() as i64
    })
}

fn gaussian(distance: f64, sigma: f64) -> f64 {
    (-(distance * distance) / (2.0 * sigma * sigma)).exp()
}

#[cfg(test)]
mod tests {
    use super::*;
    use peakpick_core::{FrameSource, SanitizeConfig};

    #[test]
    fn test_ring_series_shape_and_gap() {
        let series = ring_series(100, 80, 3);
        assert_eq!(series.frame_count(), 3);
        assert_eq!(series.frame_shape(), (100, 80));

        let frame = series.read_frame(0, &SanitizeConfig::default()).unwrap();
        assert_eq!(frame.get(33, 10), Some(0));
        assert_eq!(frame.get(0, 0), Some(5));
        // Spot 0 of frame 0 sits on the ring at angle zero.
        assert!(frame.get(74, 40).unwrap() > 1_000);
    }

    #[test]
    fn test_spots_move_between_frames() {
        let series = ring_series(100, 100, 20);
        let sanitize = SanitizeConfig::default();
        let first = series.read_frame(0, &sanitize).unwrap();
        let last = series.read_frame(19, &sanitize).unwrap();
        assert!(first.get(80, 50).unwrap() > last.get(80, 50).unwrap());
    }
}
