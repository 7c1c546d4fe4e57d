//! Display options of the image plot.

use peakpick_core::{Colormap, DisplayRange};

/// Axis-aligned region of the plot in plot coordinates.
///
/// The image is drawn with row `r` at `y = -r`, so a top-down pixel range
/// becomes a negative, bottom-up plot range.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewBounds {
    pub min: [f64; 2],
    pub max: [f64; 2],
}

impl ViewBounds {
    /// Bounds covering pixel columns `xrange` and rows `yrange`, each given in
    /// either order.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn from_pixel_ranges(xrange: [i64; 2], yrange: [i64; 2]) -> Self {
        let (x0, x1) = (xrange[0].min(xrange[1]), xrange[0].max(xrange[1]));
        let (y0, y1) = (yrange[0].min(yrange[1]), yrange[0].max(yrange[1]));
        Self {
            min: [x0 as f64, -(y1 as f64)],
            max: [x1 as f64, -(y0 as f64)],
        }
    }
}

/// Colormap, intensity window and the home view of the plot.
#[derive(Clone, Debug)]
pub struct ViewState {
    pub colormap: Colormap,
    pub range: DisplayRange,
    home: ViewBounds,
    reset_pending: bool,
}

impl ViewState {
    #[must_use]
    pub fn new(xrange: [i64; 2], yrange: [i64; 2], range: DisplayRange) -> Self {
        Self {
            colormap: Colormap::Hot,
            range,
            home: ViewBounds::from_pixel_ranges(xrange, yrange),
            reset_pending: true,
        }
    }

    #[must_use]
    pub fn home(&self) -> ViewBounds {
        self.home
    }

    /// Return to the home view on the next repaint.
    pub fn request_reset(&mut self) {
        self.reset_pending = true;
    }

    /// Bounds to apply this repaint, if a reset is pending.
    pub fn take_reset(&mut self) -> Option<ViewBounds> {
        std::mem::take(&mut self.reset_pending).then(|| self.home())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_from_top_down_ranges() {
        let bounds = ViewBounds::from_pixel_ranges([1400, 1700], [2100, 1800]);
        assert_eq!(bounds.min, [1400.0, -2100.0]);
        assert_eq!(bounds.max, [1700.0, -1800.0]);
        assert_eq!(bounds, ViewBounds::from_pixel_ranges([1700, 1400], [1800, 2100]));
    }

    #[test]
    fn test_reset_is_taken_once() {
        let mut view = ViewState::new([0, 10], [10, 0], DisplayRange::default());
        assert_eq!(view.take_reset(), Some(view.home()));
        assert_eq!(view.take_reset(), None);

        view.request_reset();
        assert!(view.take_reset().is_some());
    }
}
