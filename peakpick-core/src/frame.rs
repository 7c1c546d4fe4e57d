//! Detector frames and pixel sanitising.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Limits applied when converting raw detector counts into a frame.
///
/// Hybrid pixel detectors flag dead, hot and gap pixels with sentinel values
/// (all bits set, which reads as a huge positive or a negative count). Any
/// count above `max_valid` or below zero is replaced by zero.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SanitizeConfig {
    /// Largest count kept as-is.
    pub max_valid: i64,
}

impl Default for SanitizeConfig {
    fn default() -> Self {
        Self { max_valid: 10_000 }
    }
}

impl SanitizeConfig {
    /// Set the largest valid count.
    #[must_use]
    pub fn with_max_valid(mut self, max_valid: i64) -> Self {
        self.max_valid = max_valid;
        self
    }

    /// Sanitise a single raw count.
    #[inline]
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn apply(&self, raw: i64) -> i32 {
        if raw < 0 || raw > self.max_valid || raw > i64::from(i32::MAX) {
            0
        } else {
            raw as i32
        }
    }
}

/// Pixels to exclude from a frame, row-major like [`Frame`].
///
/// Built from a detector mask where any non-zero value flags a bad pixel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PixelMask {
    width: usize,
    height: usize,
    masked: Vec<bool>,
}

impl PixelMask {
    /// Create a mask from per-pixel flags.
    ///
    /// # Errors
    /// Returns [`Error::ShapeMismatch`] if `masked.len() != width * height`.
    pub fn new(width: usize, height: usize, masked: Vec<bool>) -> Result<Self> {
        if masked.len() != width.saturating_mul(height) {
            return Err(Error::ShapeMismatch {
                width,
                height,
                len: masked.len(),
            });
        }
        Ok(Self {
            width,
            height,
            masked,
        })
    }

    /// Create a mask from stored values; non-zero means masked.
    ///
    /// # Errors
    /// Returns [`Error::ShapeMismatch`] if `values.len() != width * height`.
    pub fn from_values(width: usize, height: usize, values: &[i64]) -> Result<Self> {
        Self::new(width, height, values.iter().map(|&v| v != 0).collect())
    }

    #[inline]
    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    #[must_use]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Whether pixel `(x, y)` is masked. Pixels outside the mask are not.
    #[must_use]
    pub fn is_masked(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.height && self.masked[y * self.width + x]
    }

    /// Number of masked pixels.
    #[must_use]
    pub fn count(&self) -> usize {
        self.masked.iter().filter(|&&m| m).count()
    }
}

/// Summary statistics of a frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameStats {
    pub min: i32,
    pub max: i32,
    pub mean: f64,
    pub nonzero: usize,
}

/// A single 2-D detector image, stored row-major.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    width: usize,
    height: usize,
    data: Vec<i32>,
}

impl Frame {
    /// Create a frame from an already sanitised pixel buffer.
    ///
    /// # Errors
    /// Returns [`Error::ShapeMismatch`] if `data.len() != width * height`.
    pub fn new(width: usize, height: usize, data: Vec<i32>) -> Result<Self> {
        if data.len() != width.saturating_mul(height) {
            return Err(Error::ShapeMismatch {
                width,
                height,
                len: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Create a zero-filled frame.
    #[must_use]
    pub fn zeros(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![0; width * height],
        }
    }

    /// Build a frame from raw detector counts, sanitising every pixel.
    ///
    /// # Errors
    /// Returns [`Error::ShapeMismatch`] if `raw.len() != width * height`.
    pub fn from_raw(
        width: usize,
        height: usize,
        raw: &[i64],
        sanitize: &SanitizeConfig,
    ) -> Result<Self> {
        let data = raw.iter().map(|&v| sanitize.apply(v)).collect();
        Self::new(width, height, data)
    }

    /// Number of columns.
    #[inline]
    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of rows.
    #[inline]
    #[must_use]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Row-major pixel values.
    #[inline]
    #[must_use]
    pub fn data(&self) -> &[i32] {
        &self.data
    }

    /// Pixel value at column `x`, row `y`.
    #[inline]
    #[must_use]
    pub fn get(&self, x: usize, y: usize) -> Option<i32> {
        if x < self.width && y < self.height {
            Some(self.data[y * self.width + x])
        } else {
            None
        }
    }

    /// One image row.
    #[must_use]
    pub fn row(&self, y: usize) -> Option<&[i32]> {
        if y < self.height {
            let start = y * self.width;
            Some(&self.data[start..start + self.width])
        } else {
            None
        }
    }

    /// Zero every masked pixel.
    ///
    /// # Errors
    /// Returns [`Error::ShapeMismatch`] if the mask has a different shape.
    pub fn apply_mask(&mut self, mask: &PixelMask) -> Result<()> {
        if (mask.width, mask.height) != (self.width, self.height) {
            return Err(Error::ShapeMismatch {
                width: self.width,
                height: self.height,
                len: mask.masked.len(),
            });
        }
        for (value, &masked) in self.data.iter_mut().zip(&mask.masked) {
            if masked {
                *value = 0;
            }
        }
        Ok(())
    }

    /// Maximum pixel value (0 for an empty frame).
    #[must_use]
    pub fn max(&self) -> i32 {
        self.data.iter().copied().max().unwrap_or(0)
    }

    /// Summary statistics.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn stats(&self) -> FrameStats {
        if self.data.is_empty() {
            return FrameStats {
                min: 0,
                max: 0,
                mean: 0.0,
                nonzero: 0,
            };
        }
        let mut min = i32::MAX;
        let mut max = i32::MIN;
        let mut sum = 0i64;
        let mut nonzero = 0usize;
        for &v in &self.data {
            min = min.min(v);
            max = max.max(v);
            sum += i64::from(v);
            if v != 0 {
                nonzero += 1;
            }
        }
        FrameStats {
            min,
            max,
            mean: sum as f64 / self.data.len() as f64,
            nonzero,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_sanitize_clears_sentinels() {
        let raw = [5, -1, 10_000, 10_001, 4_294_967_295, 0];
        let frame = Frame::from_raw(3, 2, &raw, &SanitizeConfig::default()).unwrap();
        assert_eq!(frame.data(), &[5, 0, 10_000, 0, 0, 0]);
    }

    #[test]
    fn test_sanitize_custom_limit() {
        let cfg = SanitizeConfig::default().with_max_valid(100);
        assert_eq!(cfg.apply(100), 100);
        assert_eq!(cfg.apply(101), 0);
    }

    #[test]
    fn test_shape_mismatch() {
        let err = Frame::new(3, 3, vec![0; 8]).unwrap_err();
        assert!(matches!(err, Error::ShapeMismatch { len: 8, .. }));
    }

    #[test]
    fn test_get_and_row() {
        let frame = Frame::new(3, 2, vec![1, 2, 3, 4, 5, 6]).unwrap();
        assert_eq!(frame.get(2, 1), Some(6));
        assert_eq!(frame.get(3, 0), None);
        assert_eq!(frame.row(1), Some(&[4, 5, 6][..]));
        assert_eq!(frame.row(2), None);
    }

    #[test]
    fn test_apply_mask() {
        let mut frame = Frame::new(3, 2, vec![1, 2, 3, 4, 5, 6]).unwrap();
        let mask = PixelMask::from_values(3, 2, &[0, 1, 0, 0, 0, -1]).unwrap();
        assert_eq!(mask.count(), 2);
        assert!(mask.is_masked(1, 0));
        assert!(!mask.is_masked(3, 0));

        frame.apply_mask(&mask).unwrap();
        assert_eq!(frame.data(), &[1, 0, 3, 4, 5, 0]);
    }

    #[test]
    fn test_apply_mask_shape_mismatch() {
        let mut frame = Frame::new(3, 2, vec![1; 6]).unwrap();
        let transposed = PixelMask::new(2, 3, vec![true; 6]).unwrap();
        assert!(matches!(
            frame.apply_mask(&transposed),
            Err(Error::ShapeMismatch { width: 3, height: 2, len: 6 })
        ));
        assert_eq!(frame.data(), &[1; 6]);
        assert!(PixelMask::new(2, 2, vec![false; 3]).is_err());
    }

    #[test]
    fn test_stats() {
        let frame = Frame::new(2, 2, vec![0, 2, 4, 6]).unwrap();
        let stats = frame.stats();
        assert_eq!(stats.min, 0);
        assert_eq!(stats.max, 6);
        assert_eq!(stats.nonzero, 3);
        assert_relative_eq!(stats.mean, 3.0);
    }
}
