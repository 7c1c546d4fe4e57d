//! Fixed-size pixel windows around picked peaks.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::frame::Frame;

/// Edge length of a square patch. Always odd so the peak sits on the centre pixel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "usize", into = "usize"))]
pub struct PatchSize(usize);

impl PatchSize {
    /// Validate a patch size.
    ///
    /// # Errors
    /// Returns [`Error::InvalidPatchSize`] for even or zero sizes.
    pub fn new(size: usize) -> Result<Self> {
        if size == 0 || size % 2 == 0 {
            return Err(Error::InvalidPatchSize(size));
        }
        Ok(Self(size))
    }

    #[inline]
    #[must_use]
    pub fn get(self) -> usize {
        self.0
    }

    /// Distance from the centre pixel to the edge.
    #[inline]
    #[must_use]
    pub fn half(self) -> usize {
        self.0 / 2
    }
}

impl Default for PatchSize {
    fn default() -> Self {
        Self(9)
    }
}

impl TryFrom<usize> for PatchSize {
    type Error = Error;

    fn try_from(value: usize) -> Result<Self> {
        Self::new(value)
    }
}

impl From<PatchSize> for usize {
    fn from(value: PatchSize) -> Self {
        value.0
    }
}

/// A square excerpt of a frame, row-major.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "PatchRepr"))]
pub struct Patch {
    size: PatchSize,
    data: Vec<i32>,
}

impl Patch {
    /// Wrap an existing buffer.
    ///
    /// # Errors
    /// Returns [`Error::ShapeMismatch`] if `data` is not `size * size` long.
    pub fn new(size: PatchSize, data: Vec<i32>) -> Result<Self> {
        let n = size.get();
        if data.len() != n * n {
            return Err(Error::ShapeMismatch {
                width: n,
                height: n,
                len: data.len(),
            });
        }
        Ok(Self { size, data })
    }

    #[inline]
    #[must_use]
    pub fn size(&self) -> PatchSize {
        self.size
    }

    #[inline]
    #[must_use]
    pub fn data(&self) -> &[i32] {
        &self.data
    }

    /// Value at patch-local column `i`, row `j`.
    #[must_use]
    pub fn get(&self, i: usize, j: usize) -> Option<i32> {
        let n = self.size.get();
        (i < n && j < n).then(|| self.data[j * n + i])
    }

    /// Maximum value within the patch.
    #[must_use]
    pub fn intensity(&self) -> i32 {
        self.data.iter().copied().max().unwrap_or(0)
    }
}

#[cfg(feature = "serde")]
#[derive(Deserialize)]
struct PatchRepr {
    size: PatchSize,
    data: Vec<i32>,
}

#[cfg(feature = "serde")]
impl TryFrom<PatchRepr> for Patch {
    type Error = Error;

    fn try_from(repr: PatchRepr) -> Result<Self> {
        Self::new(repr.size, repr.data)
    }
}

/// Crop a `size x size` window centred on column `x`, row `y`.
///
/// The window is clamped to the frame; pixels that fall outside the image are
/// left at zero, so a window near an edge keeps the peak on its centre pixel.
#[must_use]
#[allow(clippy::cast_possible_wrap, clippy::cast_sign_loss)]
pub fn extract_patch(frame: &Frame, x: i64, y: i64, size: PatchSize) -> Patch {
    let n = size.get();
    let half = size.half() as i64;
    let mut data = vec![0i32; n * n];

    // Desired window bounds (exclusive upper).
    let (row_min, row_max) = (y.saturating_sub(half), y.saturating_add(half + 1));
    let (col_min, col_max) = (x.saturating_sub(half), x.saturating_add(half + 1));

    // Intersection with the image.
    let img_row_min = row_min.max(0);
    let img_row_max = row_max.min(frame.height() as i64);
    let img_col_min = col_min.max(0);
    let img_col_max = col_max.min(frame.width() as i64);

    if img_row_min < img_row_max && img_col_min < img_col_max {
        let row_offset = (img_row_min - row_min) as usize;
        let col_offset = (img_col_min - col_min) as usize;
        let cols = (img_col_max - img_col_min) as usize;
        for (k, row) in (img_row_min..img_row_max).enumerate() {
            let Some(src) = frame.row(row as usize) else {
                continue;
            };
            let src = &src[img_col_min as usize..img_col_min as usize + cols];
            let start = (row_offset + k) * n + col_offset;
            data[start..start + cols].copy_from_slice(src);
        }
    }

    Patch { size, data }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(width: usize, height: usize) -> Frame {
        let data = (0..width * height)
            .map(|v| i32::try_from(v).unwrap())
            .collect();
        Frame::new(width, height, data).unwrap()
    }

    #[test]
    fn test_patch_size_validation() {
        assert!(PatchSize::new(9).is_ok());
        assert!(matches!(PatchSize::new(8), Err(Error::InvalidPatchSize(8))));
        assert!(matches!(PatchSize::new(0), Err(Error::InvalidPatchSize(0))));
        assert_eq!(PatchSize::default().get(), 9);
        assert_eq!(PatchSize::new(5).unwrap().half(), 2);
    }

    #[test]
    fn test_extract_interior() {
        let frame = ramp(10, 10);
        let patch = extract_patch(&frame, 5, 4, PatchSize::new(3).unwrap());
        assert_eq!(patch.data(), &[34, 35, 36, 44, 45, 46, 54, 55, 56]);
        assert_eq!(patch.get(1, 1), Some(45));
        assert_eq!(patch.intensity(), 56);
    }

    #[test]
    fn test_extract_top_left_corner_zero_pads() {
        let frame = ramp(10, 10);
        let patch = extract_patch(&frame, 0, 0, PatchSize::new(3).unwrap());
        assert_eq!(patch.data(), &[0, 0, 0, 0, 0, 1, 0, 10, 11]);
    }

    #[test]
    fn test_extract_bottom_right_corner_zero_pads() {
        let frame = ramp(4, 3);
        let patch = extract_patch(&frame, 3, 2, PatchSize::new(3).unwrap());
        // centre is pixel (3, 2) = 11
        assert_eq!(patch.data(), &[6, 7, 0, 10, 11, 0, 0, 0, 0]);
    }

    #[test]
    fn test_extract_fully_outside() {
        let frame = ramp(4, 4);
        let patch = extract_patch(&frame, -20, 50, PatchSize::new(5).unwrap());
        assert!(patch.data().iter().all(|&v| v == 0));
        assert_eq!(patch.intensity(), 0);
    }

    #[test]
    fn test_extract_at_integer_limits() {
        let frame = ramp(4, 4);
        let size = PatchSize::new(5).unwrap();
        for (x, y) in [(i64::MAX, 0), (0, i64::MAX), (i64::MIN, i64::MIN), (i64::MAX, i64::MIN)] {
            let patch = extract_patch(&frame, x, y, size);
            assert_eq!(patch.data().len(), 25);
            assert!(patch.data().iter().all(|&v| v == 0));
        }
    }

    #[test]
    fn test_extract_larger_than_frame() {
        let frame = ramp(2, 2);
        let patch = extract_patch(&frame, 1, 1, PatchSize::new(5).unwrap());
        // Image occupies rows/cols 1..3 of the patch.
        assert_eq!(patch.get(1, 1), Some(0));
        assert_eq!(patch.get(2, 1), Some(1));
        assert_eq!(patch.get(1, 2), Some(2));
        assert_eq!(patch.get(2, 2), Some(3));
        assert_eq!(patch.data().iter().filter(|&&v| v != 0).count(), 3);
    }

    #[test]
    fn test_patch_new_rejects_wrong_len() {
        let size = PatchSize::new(3).unwrap();
        assert!(Patch::new(size, vec![0; 9]).is_ok());
        assert!(Patch::new(size, vec![0; 8]).is_err());
    }
}
