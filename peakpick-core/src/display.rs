//! Intensity-to-colour mapping shared by the viewer and the PNG renderer.

use crate::frame::Frame;

/// Available colormaps for frame display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Colormap {
    /// Hot (thermal) - black to red to yellow to white.
    #[default]
    Hot,
    /// Grayscale - black to white.
    Grayscale,
    /// Viridis (approximate) - blue to teal to green to yellow.
    Viridis,
}

impl std::fmt::Display for Colormap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Colormap::Hot => write!(f, "Hot"),
            Colormap::Grayscale => write!(f, "Grayscale"),
            Colormap::Viridis => write!(f, "Viridis"),
        }
    }
}

impl std::str::FromStr for Colormap {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "hot" => Ok(Colormap::Hot),
            "gray" | "grey" | "grayscale" => Ok(Colormap::Grayscale),
            "viridis" => Ok(Colormap::Viridis),
            other => Err(format!("unknown colormap '{other}'")),
        }
    }
}

impl Colormap {
    /// All colormaps, in menu order.
    pub const ALL: [Colormap; 3] = [Colormap::Hot, Colormap::Grayscale, Colormap::Viridis];

    /// Apply the colormap to a normalized value [0, 1] and return RGBA bytes.
    #[must_use]
    pub fn apply(self, val: f32) -> [u8; 4] {
        let val = if val.is_nan() { 0.0 } else { val.clamp(0.0, 1.0) };
        match self {
            Colormap::Grayscale => {
                let v = unit_to_u8(val);
                [v, v, v, 255]
            }
            Colormap::Hot => {
                // Piecewise linear like matplotlib's "hot": red ramps first,
                // then green, then blue.
                let r = unit_to_u8(val / 0.365);
                let g = unit_to_u8((val - 0.365) / 0.381);
                let b = unit_to_u8((val - 0.746) / 0.254);
                [r, g, b, 255]
            }
            Colormap::Viridis => {
                let r = unit_to_u8(val.powf(2.0));
                let g = unit_to_u8(val);
                let b = unit_to_u8(1.0 - val);
                [r, g, b, 255]
            }
        }
    }
}

/// Scale `[0, 1]` to a byte, clamping out-of-range input.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn unit_to_u8(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Linear display window: values at or below `vmin` map to 0, at or above `vmax` to 1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayRange {
    pub vmin: f64,
    pub vmax: f64,
}

impl Default for DisplayRange {
    fn default() -> Self {
        Self {
            vmin: 0.0,
            vmax: 500.0,
        }
    }
}

impl DisplayRange {
    #[must_use]
    pub fn new(vmin: f64, vmax: f64) -> Self {
        Self { vmin, vmax }
    }

    /// Normalise a pixel value into `[0, 1]`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn normalize(&self, value: f64) -> f32 {
        let span = self.vmax - self.vmin;
        if span <= 0.0 {
            return if value > self.vmin { 1.0 } else { 0.0 };
        }
        ((value - self.vmin) / span).clamp(0.0, 1.0) as f32
    }
}

/// Rectangular pixel region, `x0..x1` columns and `y0..y1` rows (exclusive ends).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRegion {
    pub x0: usize,
    pub x1: usize,
    pub y0: usize,
    pub y1: usize,
}

impl PixelRegion {
    /// Whole-frame region.
    #[must_use]
    pub fn full(frame: &Frame) -> Self {
        Self {
            x0: 0,
            x1: frame.width(),
            y0: 0,
            y1: frame.height(),
        }
    }

    /// Region spanning two axis ranges given in either order, clipped to the frame.
    #[must_use]
    #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
    pub fn from_ranges(frame: &Frame, xrange: [i64; 2], yrange: [i64; 2]) -> Self {
        let clip = |v: i64, max: usize| -> usize { v.clamp(0, max as i64) as usize };
        let (xa, xb) = (xrange[0].min(xrange[1]), xrange[0].max(xrange[1]));
        let (ya, yb) = (yrange[0].min(yrange[1]), yrange[0].max(yrange[1]));
        Self {
            x0: clip(xa, frame.width()),
            x1: clip(xb, frame.width()),
            y0: clip(ya, frame.height()),
            y1: clip(yb, frame.height()),
        }
    }

    /// The part of the region inside `frame`; inverted ranges become empty.
    #[must_use]
    pub fn clipped(&self, frame: &Frame) -> Self {
        let x1 = self.x1.min(frame.width());
        let y1 = self.y1.min(frame.height());
        Self {
            x0: self.x0.min(x1),
            x1,
            y0: self.y0.min(y1),
            y1,
        }
    }

    #[must_use]
    pub fn width(&self) -> usize {
        self.x1.saturating_sub(self.x0)
    }

    #[must_use]
    pub fn height(&self) -> usize {
        self.y1.saturating_sub(self.y0)
    }
}

/// Render a frame region into RGBA bytes, row-major, top row first.
///
/// The region is clipped to the frame first, so the output holds
/// `clipped.width() * clipped.height()` pixels.
#[must_use]
pub fn render_rgba(
    frame: &Frame,
    region: PixelRegion,
    range: DisplayRange,
    colormap: Colormap,
) -> Vec<u8> {
    let region = region.clipped(frame);
    let mut pixels = Vec::with_capacity(region.width() * region.height() * 4);
    for y in region.y0..region.y1 {
        let Some(row) = frame.row(y) else {
            break;
        };
        for &value in &row[region.x0..region.x1] {
            pixels.extend_from_slice(&colormap.apply(range.normalize(f64::from(value))));
        }
    }
    pixels
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hot_endpoints() {
        assert_eq!(Colormap::Hot.apply(0.0), [0, 0, 0, 255]);
        assert_eq!(Colormap::Hot.apply(1.0), [255, 255, 255, 255]);
        let mid = Colormap::Hot.apply(0.5);
        assert_eq!(mid[0], 255);
        assert_eq!(mid[2], 0);
    }

    #[test]
    fn test_normalize_clips() {
        let range = DisplayRange::new(0.0, 500.0);
        assert!((range.normalize(-10.0) - 0.0).abs() < f32::EPSILON);
        assert!((range.normalize(250.0) - 0.5).abs() < f32::EPSILON);
        assert!((range.normalize(9000.0) - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_degenerate_range() {
        let range = DisplayRange::new(10.0, 10.0);
        assert!(range.normalize(10.0).abs() < f32::EPSILON);
        assert!((range.normalize(11.0) - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_region_from_inverted_ranges() {
        let frame = Frame::zeros(100, 80);
        let region = PixelRegion::from_ranges(&frame, [10, 40], [70, 20]);
        assert_eq!(region, PixelRegion { x0: 10, x1: 40, y0: 20, y1: 70 });
        let clipped = PixelRegion::from_ranges(&frame, [-5, 500], [0, 500]);
        assert_eq!(clipped, PixelRegion::full(&frame));
    }

    #[test]
    fn test_render_region_size() {
        let frame = Frame::new(3, 2, vec![0, 250, 500, 0, 0, 0]).unwrap();
        let region = PixelRegion { x0: 1, x1: 3, y0: 0, y1: 1 };
        let rgba = render_rgba(&frame, region, DisplayRange::default(), Colormap::Grayscale);
        assert_eq!(rgba.len(), 2 * 4);
        assert_eq!(&rgba[4..8], &[255, 255, 255, 255]);
    }

    #[test]
    fn test_render_clips_region_to_frame() {
        let frame = Frame::zeros(4, 4);
        let wide = PixelRegion { x0: 0, x1: 8, y0: 0, y1: 2 };
        let rgba = render_rgba(&frame, wide, DisplayRange::default(), Colormap::Hot);
        assert_eq!(rgba.len(), 4 * 2 * 4);

        let inverted = PixelRegion { x0: 3, x1: 1, y0: 6, y1: 9 };
        assert_eq!(inverted.clipped(&frame), PixelRegion { x0: 1, x1: 1, y0: 4, y1: 4 });
        let rgba = render_rgba(&frame, inverted, DisplayRange::default(), Colormap::Hot);
        assert!(rgba.is_empty());
    }

    #[test]
    fn test_colormap_parse() {
        assert_eq!("HOT".parse::<Colormap>(), Ok(Colormap::Hot));
        assert_eq!("grey".parse::<Colormap>(), Ok(Colormap::Grayscale));
        assert!("jet".parse::<Colormap>().is_err());
    }
}
