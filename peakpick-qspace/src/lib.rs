//! peakpick-qspace: Reciprocal-space analysis of picked peaks.
//!
//! Maps detector pixels to scattering vectors for a calibrated geometry,
//! estimates ring widths from picked peak pairs, and rebins whole frames onto
//! a regular q grid.
//!

mod error;
pub mod geometry;
pub mod rebin;
pub mod ring;
pub mod transform;

pub use error::{Error, Result};
pub use geometry::{Geometry, Matrix3};
pub use rebin::{qtransform, qtransform_with, QAxis, QVolume, RebinOptions, DEFAULT_MAX_BINS};
pub use ring::{analyze_points, analyze_ring, RingPair, RingPoint, RingReport};
pub use transform::{det_to_q, DetectorTransform, QVector};
