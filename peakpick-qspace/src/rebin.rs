//! Rebinning of a detector frame onto a regular q grid.

use ndarray::Array3;
use peakpick_core::Frame;
use rayon::prelude::*;

use crate::error::{Error, Result};
use crate::geometry::Geometry;
use crate::transform::{DetectorTransform, QVector};

/// Default upper bound on the number of bins in a rebinned volume.
pub const DEFAULT_MAX_BINS: usize = 1 << 27;

/// Options for [`qtransform_with`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RebinOptions {
    /// Bin width in inverse angstrom, the same along all three axes.
    pub dq: f64,
    /// Sample rotation about axis 1 in degrees.
    pub zrot_deg: f64,
    pub max_bins: usize,
}

impl RebinOptions {
    #[must_use]
    pub fn new(dq: f64) -> Self {
        Self {
            dq,
            zrot_deg: 0.0,
            max_bins: DEFAULT_MAX_BINS,
        }
    }

    #[must_use]
    pub fn with_zrot(mut self, zrot_deg: f64) -> Self {
        self.zrot_deg = zrot_deg;
        self
    }

    #[must_use]
    pub fn with_max_bins(mut self, max_bins: usize) -> Self {
        self.max_bins = max_bins;
        self
    }
}

/// One axis of the q grid. Bins are uniform over `[min, max]`, the last bin
/// includes `max`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct QAxis {
    pub min: f64,
    pub max: f64,
    pub bins: usize,
}

impl QAxis {
    /// Axis spanning `[min, max]` with `floor(span / dq + 0.5)` bins, at least one.
    #[must_use]
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    pub fn from_range(min: f64, max: f64, dq: f64) -> Self {
        let bins = ((max - min) / dq + 0.5).floor().max(1.0) as usize;
        Self { min, max, bins }
    }

    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn bin_width(&self) -> f64 {
        (self.max - self.min) / self.bins as f64
    }

    /// Bin containing `value`, `None` outside the axis.
    #[must_use]
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    pub fn index(&self, value: f64) -> Option<usize> {
        if !(self.min..=self.max).contains(&value) {
            return None;
        }
        let span = self.max - self.min;
        if span <= 0.0 {
            return Some(0);
        }
        let idx = ((value - self.min) / span * self.bins as f64) as usize;
        Some(idx.min(self.bins - 1))
    }

    /// `bins + 1` bin edges.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn edges(&self) -> Vec<f64> {
        let w = self.bin_width();
        (0..=self.bins).map(|i| self.min + w * i as f64).collect()
    }

    /// Bin centres.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn centers(&self) -> Vec<f64> {
        let w = self.bin_width();
        (0..self.bins)
            .map(|i| self.min + w * (i as f64 + 0.5))
            .collect()
    }
}

/// Mean pixel intensity per q bin, indexed `[q1, q2, q3]`.
#[derive(Clone, Debug, PartialEq)]
pub struct QVolume {
    pub axes: [QAxis; 3],
    pub intensity: Array3<f64>,
    pub counts: Array3<u32>,
}

impl QVolume {
    #[must_use]
    pub fn shape(&self) -> [usize; 3] {
        [self.axes[0].bins, self.axes[1].bins, self.axes[2].bins]
    }

    /// Number of bins that received at least one pixel.
    #[must_use]
    pub fn filled_bins(&self) -> usize {
        self.counts.iter().filter(|&&c| c > 0).count()
    }

    /// Sum of `intensity * counts`, i.e. the total rebinned signal.
    #[must_use]
    pub fn total_signal(&self) -> f64 {
        self.intensity
            .iter()
            .zip(self.counts.iter())
            .map(|(&i, &c)| i * f64::from(c))
            .sum()
    }
}

/// Rebin a frame into q space with bin width `dq` and no sample rotation.
///
/// # Errors
/// See [`qtransform_with`].
pub fn qtransform(frame: &Frame, geometry: &Geometry, dq: f64) -> Result<QVolume> {
    qtransform_with(frame, geometry, &RebinOptions::new(dq))
}

/// Rebin a frame into q space.
///
/// Every pixel is mapped through the detector transform, the grid spans the
/// observed range of each q component, and each bin holds the mean intensity
/// of the pixels that fall into it. Empty bins are 0.
///
/// # Errors
/// - [`Error::InvalidParameter`] if `dq` is not a positive finite number.
/// - [`Error::InvalidGeometry`] if the geometry does not validate.
/// - [`Error::VolumeTooLarge`] if the grid would exceed `max_bins`.
#[allow(clippy::cast_precision_loss)]
pub fn qtransform_with(frame: &Frame, geometry: &Geometry, options: &RebinOptions) -> Result<QVolume> {
    if !(options.dq.is_finite() && options.dq > 0.0) {
        return Err(Error::InvalidParameter {
            name: "dq",
            value: options.dq,
        });
    }
    geometry.validate()?;

    let width = frame.width();
    let transform = DetectorTransform::new(*geometry);
    let zrot = options.zrot_deg;

    let qpoints: Vec<QVector> = (0..frame.height())
        .into_par_iter()
        .flat_map_iter(|row| {
            (0..width).map(move |col| transform.to_q(row as f64, col as f64, zrot))
        })
        .collect();

    let axes = q_axes(&qpoints, options.dq);
    let total = axes.iter().map(|a| a.bins).try_fold(1usize, usize::checked_mul);
    match total {
        Some(n) if n <= options.max_bins => {}
        Some(n) => return Err(Error::VolumeTooLarge(n, options.max_bins)),
        None => return Err(Error::VolumeTooLarge(usize::MAX, options.max_bins)),
    }

    let bins: Vec<Option<[usize; 3]>> = qpoints
        .par_iter()
        .map(|q| Some([axes[0].index(q.q1)?, axes[1].index(q.q2)?, axes[2].index(q.q3)?]))
        .collect();

    let shape = (axes[0].bins, axes[1].bins, axes[2].bins);
    let mut intensity = Array3::<f64>::zeros(shape);
    let mut counts = Array3::<u32>::zeros(shape);
    for (bin, &value) in bins.iter().zip(frame.data()) {
        if let Some(idx) = bin {
            intensity[*idx] += f64::from(value);
            counts[*idx] += 1;
        }
    }
    intensity.zip_mut_with(&counts, |i, &c| {
        if c > 0 {
            *i /= f64::from(c);
        }
    });

    Ok(QVolume {
        axes,
        intensity,
        counts,
    })
}

fn q_axes(points: &[QVector], dq: f64) -> [QAxis; 3] {
    let init = || [(f64::INFINITY, f64::NEG_INFINITY); 3];
    let ranges = points
        .par_iter()
        .fold(init, |mut acc, q| {
            for (r, v) in acc.iter_mut().zip([q.q1, q.q2, q.q3]) {
                r.0 = r.0.min(v);
                r.1 = r.1.max(v);
            }
            acc
        })
        .reduce(init, |mut a, b| {
            for (r, o) in a.iter_mut().zip(b) {
                r.0 = r.0.min(o.0);
                r.1 = r.1.max(o.1);
            }
            a
        });
    ranges.map(|(min, max)| QAxis::from_range(min, max, dq))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::test_geometry;
    use approx::assert_relative_eq;

    fn ramp_frame(width: usize, height: usize) -> Frame {
        let data = (0..width * height)
            .map(|i| i32::try_from(i % 17).unwrap())
            .collect();
        Frame::new(width, height, data).unwrap()
    }

    #[test]
    fn test_axis_bins() {
        let axis = QAxis::from_range(0.0, 1.0, 0.1);
        assert_eq!(axis.bins, 10);
        assert_eq!(axis.index(0.0), Some(0));
        assert_eq!(axis.index(1.0), Some(9));
        assert_eq!(axis.index(0.55), Some(5));
        assert_eq!(axis.index(1.01), None);
        assert_eq!(axis.edges().len(), 11);
        assert_relative_eq!(axis.centers()[0], 0.05, epsilon = 1e-12);

        // Span below half a bin still gets one bin.
        let narrow = QAxis::from_range(0.0, 0.01, 0.1);
        assert_eq!(narrow.bins, 1);
        let flat = QAxis::from_range(2.0, 2.0, 0.1);
        assert_eq!(flat.index(2.0), Some(0));
    }

    #[test]
    fn test_rejects_bad_dq() {
        let frame = ramp_frame(4, 4);
        let g = test_geometry();
        for dq in [0.0, -1.0, f64::NAN] {
            assert!(matches!(
                qtransform(&frame, &g, dq),
                Err(Error::InvalidParameter { name: "dq", .. })
            ));
        }
    }

    #[test]
    fn test_signal_and_pixels_conserved() {
        let frame = ramp_frame(32, 24);
        let g = test_geometry();
        let volume = qtransform(&frame, &g, 1e-3).unwrap();

        let pixels: u32 = volume.counts.iter().sum();
        assert_eq!(pixels as usize, 32 * 24);

        let expected: f64 = frame.data().iter().map(|&v| f64::from(v)).sum();
        assert_relative_eq!(volume.total_signal(), expected, max_relative = 1e-9);
        assert!(volume.filled_bins() > 0);
        assert_eq!(volume.intensity.shape(), &volume.shape()[..]);
    }

    #[test]
    fn test_uniform_frame_is_flat() {
        let frame = Frame::new(16, 16, vec![7; 256]).unwrap();
        let volume = qtransform(&frame, &test_geometry(), 5e-4).unwrap();
        for (&i, &c) in volume.intensity.iter().zip(volume.counts.iter()) {
            if c > 0 {
                assert_relative_eq!(i, 7.0);
            } else {
                assert_relative_eq!(i, 0.0);
            }
        }
    }

    #[test]
    fn test_volume_limit() {
        let frame = ramp_frame(32, 32);
        let options = RebinOptions::new(1e-5).with_max_bins(10);
        assert!(matches!(
            qtransform_with(&frame, &test_geometry(), &options),
            Err(Error::VolumeTooLarge(_, 10))
        ));
    }
}
