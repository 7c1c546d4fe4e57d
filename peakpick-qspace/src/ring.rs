//! Ring-width estimation from picked peak pairs.
//!
//! Peaks are picked as pairs on opposite sides of a Debye-Scherrer ring. The
//! spread of in-plane |q| over all picked points measures how wide the ring is.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use peakpick_core::PeakBook;

use crate::error::{Error, Result};
use crate::geometry::Geometry;
use crate::transform::{DetectorTransform, QVector};

/// A picked detector position: column `x`, row `y`, and the frame it came from.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RingPoint {
    pub frame: usize,
    pub x: f64,
    pub y: f64,
}

/// Two consecutive picked points and their q coordinates.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RingPair {
    pub points: [RingPoint; 2],
    pub q: [QVector; 2],
    pub radii: [f64; 2],
}

impl RingPair {
    /// Midpoint of the two q vectors in the detector plane.
    #[must_use]
    pub fn center(&self) -> (f64, f64) {
        (
            0.5 * (self.q[0].q1 + self.q[1].q1),
            0.5 * (self.q[0].q2 + self.q[1].q2),
        )
    }
}

/// Result of [`analyze_ring`].
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RingReport {
    pub pairs: Vec<RingPair>,
    /// Trailing point without a partner, left out of the width.
    pub unpaired: Option<RingPoint>,
    pub min_radius: f64,
    pub max_radius: f64,
    /// Whether each pair was shifted onto its own midpoint.
    pub corrected: bool,
}

impl RingReport {
    #[must_use]
    pub fn width(&self) -> f64 {
        self.max_radius - self.min_radius
    }

    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn mean_radius(&self) -> f64 {
        let sum: f64 = self.pairs.iter().flat_map(|p| p.radii).sum();
        sum / (2 * self.pairs.len()) as f64
    }
}

/// Analyse every peak of a book, in ascending frame order.
///
/// # Errors
/// See [`analyze_points`].
#[allow(clippy::cast_precision_loss)]
pub fn analyze_ring(geometry: &Geometry, book: &PeakBook, corrected: bool) -> Result<RingReport> {
    let points: Vec<RingPoint> = book
        .flattened()
        .map(|(frame, peak)| RingPoint {
            frame,
            x: peak.x as f64,
            y: peak.y as f64,
        })
        .collect();
    analyze_points(geometry, &points, corrected)
}

/// Pair points consecutively and compute in-plane |q| of each.
///
/// With `corrected`, both q vectors of a pair are shifted so that the pair's
/// midpoint sits at the origin, which removes a beam-centre offset.
///
/// # Errors
/// - [`Error::InvalidGeometry`] if the geometry does not validate.
/// - [`Error::NotEnoughPeaks`] with fewer than two points.
pub fn analyze_points(
    geometry: &Geometry,
    points: &[RingPoint],
    corrected: bool,
) -> Result<RingReport> {
    geometry.validate()?;
    if points.len() < 2 {
        return Err(Error::NotEnoughPeaks(points.len()));
    }

    let transform = DetectorTransform::new(*geometry);
    let mut pairs = Vec::with_capacity(points.len() / 2);
    let mut min_radius = f64::INFINITY;
    let mut max_radius = f64::NEG_INFINITY;

    let mut chunks = points.chunks_exact(2);
    for chunk in &mut chunks {
        let a = chunk[0];
        let b = chunk[1];
        let mut q = [transform.to_q(a.y, a.x, 0.0), transform.to_q(b.y, b.x, 0.0)];
        if corrected {
            let c1 = 0.5 * (q[0].q1 + q[1].q1);
            let c2 = 0.5 * (q[0].q2 + q[1].q2);
            for v in &mut q {
                v.q1 -= c1;
                v.q2 -= c2;
            }
        }
        let radii = [q[0].in_plane_norm(), q[1].in_plane_norm()];
        for r in radii {
            min_radius = min_radius.min(r);
            max_radius = max_radius.max(r);
        }
        pairs.push(RingPair {
            points: [a, b],
            q,
            radii,
        });
    }

    Ok(RingReport {
        pairs,
        unpaired: chunks.remainder().first().copied(),
        min_radius,
        max_radius,
        corrected,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::test_geometry;
    use approx::assert_relative_eq;

    fn point(x: f64, y: f64) -> RingPoint {
        RingPoint { frame: 0, x, y }
    }

    #[test]
    fn test_not_enough_peaks() {
        let g = test_geometry();
        assert_eq!(
            analyze_points(&g, &[point(1.0, 1.0)], false),
            Err(Error::NotEnoughPeaks(1))
        );
        assert_eq!(analyze_points(&g, &[], false), Err(Error::NotEnoughPeaks(0)));
    }

    #[test]
    fn test_symmetric_pair_has_zero_width() {
        let g = test_geometry();
        let points = [point(600.0, 500.0), point(400.0, 500.0)];
        let report = analyze_points(&g, &points, false).unwrap();
        assert_eq!(report.pairs.len(), 1);
        assert_relative_eq!(report.width(), 0.0, epsilon = 1e-12);
        assert!(report.unpaired.is_none());
    }

    #[test]
    fn test_correction_removes_center_offset() {
        let g = test_geometry();
        // Both points shifted 30 px along x from a symmetric pair.
        let points = [point(630.0, 500.0), point(430.0, 500.0)];
        let raw = analyze_points(&g, &points, false).unwrap();
        assert!(raw.width() > 1e-3);

        let fixed = analyze_points(&g, &points, true).unwrap();
        assert_relative_eq!(fixed.width(), 0.0, epsilon = 1e-12);
        let (c1, c2) = fixed.pairs[0].center();
        assert_relative_eq!(c1, 0.0, epsilon = 1e-12);
        assert_relative_eq!(c2, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_odd_peak_is_unpaired() {
        let g = test_geometry();
        let points = [point(600.0, 500.0), point(400.0, 500.0), point(500.0, 700.0)];
        let report = analyze_points(&g, &points, false).unwrap();
        assert_eq!(report.pairs.len(), 1);
        assert_eq!(report.unpaired, Some(point(500.0, 700.0)));
    }

    #[test]
    fn test_row_maps_to_q1() {
        let g = test_geometry();
        // Displacement along y (rows) only shows up in q1.
        let points = [point(500.0, 600.0), point(500.0, 400.0)];
        let report = analyze_points(&g, &points, false).unwrap();
        assert!(report.pairs[0].q[0].q1 > 0.0);
        assert_relative_eq!(report.pairs[0].q[0].q2, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_invalid_geometry() {
        let g = Geometry {
            dist: -1.0,
            ..test_geometry()
        };
        let points = [point(1.0, 1.0), point(2.0, 2.0)];
        assert!(matches!(
            analyze_points(&g, &points, false),
            Err(Error::InvalidGeometry(_))
        ));
    }
}
