//! Error types for peakpick-qspace.

use thiserror::Error;

/// Result type alias for q-space operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Q-space error types.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Geometry parameter outside its physical domain.
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    /// Invalid numeric parameter.
    #[error("invalid parameter {name}: {value}")]
    InvalidParameter { name: &'static str, value: f64 },

    /// Ring analysis needs at least one pair of peaks.
    #[error("ring analysis needs at least 2 peaks, got {0}")]
    NotEnoughPeaks(usize),

    /// Requested rebinning grid exceeds the allowed bin count.
    #[error("q volume of {0} bins exceeds the limit of {1}")]
    VolumeTooLarge(usize, usize),

    /// Core library error.
    #[error("core error: {0}")]
    Core(#[from] peakpick_core::Error),
}
