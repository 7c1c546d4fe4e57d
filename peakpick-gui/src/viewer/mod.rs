//! Image rendering and plot coordinate mapping.

mod texture;

pub use texture::{frame_image, FrameTexture, TextureKey};

/// Pixel under a plot position, or `None` outside a `width` x `height` frame.
///
/// Column `c` spans `c..c + 1` on the x axis and row `r` spans `-(r + 1)..-r`
/// on the y axis.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn pixel_at(x: f64, y: f64, width: usize, height: usize) -> Option<(i64, i64)> {
    if !x.is_finite() || !y.is_finite() {
        return None;
    }
    let col = x.floor() as i64;
    let row = (-y).floor() as i64;
    let inside = usize::try_from(col).is_ok_and(|c| c < width)
        && usize::try_from(row).is_ok_and(|r| r < height);
    inside.then_some((col, row))
}

/// Plot position of the centre of pixel `(x, y)`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn pixel_center(x: i64, y: i64) -> [f64; 2] {
    [x as f64 + 0.5, -(y as f64 + 0.5)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pixel_at() {
        assert_eq!(pixel_at(0.2, -0.7, 10, 5), Some((0, 0)));
        assert_eq!(pixel_at(9.99, -4.01, 10, 5), Some((9, 4)));
        assert_eq!(pixel_at(3.0, -2.0, 10, 5), Some((3, 2)));
        assert_eq!(pixel_at(10.0, -1.0, 10, 5), None);
        assert_eq!(pixel_at(-0.1, -1.0, 10, 5), None);
        assert_eq!(pixel_at(1.0, 0.5, 10, 5), None);
        assert_eq!(pixel_at(f64::NAN, -1.0, 10, 5), None);
    }

    #[test]
    fn test_center_maps_back_to_pixel() {
        let [x, y] = pixel_center(7, 3);
        assert_eq!([x, y], [7.5, -3.5]);
        assert_eq!(pixel_at(x, y, 10, 5), Some((7, 3)));
    }
}
