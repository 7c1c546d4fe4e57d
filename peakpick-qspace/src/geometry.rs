//! Detector geometry in the PONI convention.
//!
//! Axis 1 is vertical (detector rows), axis 2 horizontal (columns) and axis 3
//! runs from the sample to the detector. `poni1`/`poni2` locate the point of
//! normal incidence on the detector plane, `rot1..rot3` are rotations about the
//! three axes applied in that order.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// 3x3 rotation matrix, row-major.
pub type Matrix3 = [[f64; 3]; 3];

/// Calibrated sample-detector geometry. Lengths in metres, angles in radians.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Geometry {
    /// Sample to point-of-normal-incidence distance.
    pub dist: f64,
    /// PONI coordinate along axis 1.
    pub poni1: f64,
    /// PONI coordinate along axis 2.
    pub poni2: f64,
    pub rot1: f64,
    pub rot2: f64,
    pub rot3: f64,
    /// Pixel pitch along axis 1 (rows).
    pub pixel1: f64,
    /// Pixel pitch along axis 2 (columns).
    pub pixel2: f64,
    /// X-ray wavelength.
    pub wavelength: f64,
}

impl Geometry {
    /// Check that lengths are positive and every value is finite.
    ///
    /// # Errors
    /// Returns [`Error::InvalidGeometry`] naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("dist", self.dist),
            ("poni1", self.poni1),
            ("poni2", self.poni2),
            ("rot1", self.rot1),
            ("rot2", self.rot2),
            ("rot3", self.rot3),
            ("pixel1", self.pixel1),
            ("pixel2", self.pixel2),
            ("wavelength", self.wavelength),
        ];
        for (name, value) in fields {
            if !value.is_finite() {
                return Err(Error::InvalidGeometry(format!("{name} is not finite")));
            }
        }
        for (name, value) in [
            ("dist", self.dist),
            ("pixel1", self.pixel1),
            ("pixel2", self.pixel2),
            ("wavelength", self.wavelength),
        ] {
            if value <= 0.0 {
                return Err(Error::InvalidGeometry(format!(
                    "{name} must be positive, got {value}"
                )));
            }
        }
        Ok(())
    }

    /// Combined rotation `rot3 . rot2 . rot1`.
    #[must_use]
    pub fn rotation_matrix(&self) -> Matrix3 {
        let (s1, c1) = self.rot1.sin_cos();
        let (s2, c2) = self.rot2.sin_cos();
        let (s3, c3) = self.rot3.sin_cos();

        let r1 = [[1.0, 0.0, 0.0], [0.0, c1, s1], [0.0, -s1, c1]];
        let r2 = [[c2, 0.0, -s2], [0.0, 1.0, 0.0], [s2, 0.0, c2]];
        let r3 = [[c3, -s3, 0.0], [s3, c3, 0.0], [0.0, 0.0, 1.0]];

        matmul(&matmul(&r3, &r2), &r1)
    }

    /// Wave number `2 pi / lambda` in inverse angstrom.
    #[must_use]
    pub fn wave_number(&self) -> f64 {
        2.0 * std::f64::consts::PI / (self.wavelength * 1e10)
    }
}

fn matmul(a: &Matrix3, b: &Matrix3) -> Matrix3 {
    let mut out = [[0.0; 3]; 3];
    for (i, row) in out.iter_mut().enumerate() {
        for (j, cell) in row.iter_mut().enumerate() {
            *cell = (0..3).map(|k| a[i][k] * b[k][j]).sum();
        }
    }
    out
}

/// Multiply a matrix with a column vector.
#[must_use]
pub fn apply(m: &Matrix3, v: [f64; 3]) -> [f64; 3] {
    [
        m[0][0] * v[0] + m[0][1] * v[1] + m[0][2] * v[2],
        m[1][0] * v[0] + m[1][1] * v[1] + m[1][2] * v[2],
        m[2][0] * v[0] + m[2][1] * v[1] + m[2][2] * v[2],
    ]
}

#[cfg(test)]
pub(crate) fn test_geometry() -> Geometry {
    Geometry {
        dist: 1.0,
        poni1: 0.05,
        poni2: 0.05,
        rot1: 0.0,
        rot2: 0.0,
        rot3: 0.0,
        pixel1: 1e-4,
        pixel2: 1e-4,
        wavelength: 1e-10,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_identity_rotation() {
        let m = test_geometry().rotation_matrix();
        for (i, row) in m.iter().enumerate() {
            for (j, &v) in row.iter().enumerate() {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert_relative_eq!(v, expected);
            }
        }
    }

    #[test]
    fn test_rotation_is_orthonormal() {
        let geometry = Geometry {
            rot1: 0.1,
            rot2: -0.2,
            rot3: 0.3,
            ..test_geometry()
        };
        let m = geometry.rotation_matrix();
        for i in 0..3 {
            for j in 0..3 {
                let dot: f64 = (0..3).map(|k| m[i][k] * m[j][k]).sum();
                let expected = if i == j { 1.0 } else { 0.0 };
                assert_relative_eq!(dot, expected, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_rot1_convention() {
        let geometry = Geometry {
            rot1: std::f64::consts::FRAC_PI_2,
            ..test_geometry()
        };
        let v = apply(&geometry.rotation_matrix(), [0.0, 0.0, 1.0]);
        assert_relative_eq!(v[1], 1.0, epsilon = 1e-12);
        assert_relative_eq!(v[2], 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_mixed_rotations_match_closed_form() {
        // Laboratory coordinates of a detector point as written out in the
        // pyFAI geometry documentation.
        for (rot1, rot2, rot3) in [(0.0, 0.0, 0.1), (0.02, -0.03, 0.4), (-0.2, 0.15, -0.7)] {
            let geometry = Geometry {
                rot1,
                rot2,
                rot3,
                ..test_geometry()
            };
            let (p1, p2, l) = (0.01, 0.02, 0.15);
            let (s1, c1) = rot1.sin_cos();
            let (s2, c2) = rot2.sin_cos();
            let (s3, c3) = rot3.sin_cos();
            let t1 = p1 * c2 * c3 + p2 * (c3 * s1 * s2 - c1 * s3) - l * (c1 * c3 * s2 + s1 * s3);
            let t2 = p1 * c2 * s3 + p2 * (c1 * c3 + s1 * s2 * s3) - l * (-c3 * s1 + c1 * s2 * s3);
            let t3 = p1 * s2 - p2 * c2 * s1 + l * c1 * c2;

            let v = apply(&geometry.rotation_matrix(), [p1, p2, l]);
            assert_relative_eq!(v[0], t1, epsilon = 1e-12);
            assert_relative_eq!(v[1], t2, epsilon = 1e-12);
            assert_relative_eq!(v[2], t3, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_wave_number() {
        assert_relative_eq!(
            test_geometry().wave_number(),
            2.0 * std::f64::consts::PI,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_validate() {
        assert!(test_geometry().validate().is_ok());
        let bad = Geometry {
            wavelength: 0.0,
            ..test_geometry()
        };
        assert!(matches!(bad.validate(), Err(Error::InvalidGeometry(_))));
        let nan = Geometry {
            rot2: f64::NAN,
            ..test_geometry()
        };
        assert!(nan.validate().is_err());
    }
}
