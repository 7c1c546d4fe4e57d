//! Detector pixel to scattering vector.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::geometry::{apply, Geometry, Matrix3};

/// Scattering vector components in inverse angstrom.
///
/// `q1` follows detector axis 1 (vertical), `q2` axis 2 (horizontal) and `q3`
/// the beam direction.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct QVector {
    pub q1: f64,
    pub q2: f64,
    pub q3: f64,
}

impl QVector {
    /// Length of the in-plane component `(q1, q2)`.
    #[must_use]
    pub fn in_plane_norm(&self) -> f64 {
        self.q1.hypot(self.q2)
    }

    /// Full length of the vector.
    #[must_use]
    pub fn norm(&self) -> f64 {
        (self.q1 * self.q1 + self.q2 * self.q2 + self.q3 * self.q3).sqrt()
    }
}

/// Precomputed pieces of a [`Geometry`] for transforming many pixels.
#[derive(Clone, Copy, Debug)]
pub struct DetectorTransform {
    geometry: Geometry,
    rotation: Matrix3,
    k: f64,
}

impl DetectorTransform {
    #[must_use]
    pub fn new(geometry: Geometry) -> Self {
        Self {
            rotation: geometry.rotation_matrix(),
            k: geometry.wave_number(),
            geometry,
        }
    }

    #[must_use]
    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    /// Scattering vector of detector position `(d1, d2)` in pixels.
    ///
    /// `d1` is the row, `d2` the column. The sample may be rotated by
    /// `zrot_deg` about axis 1, which mixes `q2` and `q3`.
    #[must_use]
    pub fn to_q(&self, d1: f64, d2: f64, zrot_deg: f64) -> QVector {
        let g = &self.geometry;
        let dn1 = d1 * g.pixel1 - g.poni1;
        let dn2 = d2 * g.pixel2 - g.poni2;
        let xp = apply(&self.rotation, [dn1, dn2, g.dist]);
        let norm = (xp[0] * xp[0] + xp[1] * xp[1] + xp[2] * xp[2]).sqrt();

        let alpha = (xp[0] / norm).atan();
        let phi = (xp[1] / norm).atan();

        let q1 = self.k * alpha.sin();
        let q2 = self.k * alpha.cos() * phi.sin();
        let q3 = self.k * (alpha.cos() * phi.cos() - 1.0);

        let (sz, cz) = zrot_deg.to_radians().sin_cos();
        QVector {
            q1,
            q2: cz * q2 - sz * q3,
            q3: sz * q2 + cz * q3,
        }
    }
}

/// One-off transform of a single detector position. See [`DetectorTransform::to_q`].
#[must_use]
pub fn det_to_q(geometry: &Geometry, d1: f64, d2: f64, zrot_deg: f64) -> QVector {
    DetectorTransform::new(*geometry).to_q(d1, d2, zrot_deg)
}
