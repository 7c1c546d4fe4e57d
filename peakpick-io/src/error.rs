//! I/O error types.

use thiserror::Error;

/// Result type for I/O operations.
pub type Result<T> = std::result::Result<T, Error>;

/// I/O error types.
#[derive(Error, Debug)]
pub enum Error {
    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HDF5 library error.
    #[cfg(feature = "hdf5")]
    #[error("HDF5 error: {0}")]
    Hdf5(#[from] hdf5::Error),

    /// Peak file (de)serialisation error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV output error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Invalid file format.
    #[error("invalid file format: {0}")]
    InvalidFormat(String),

    /// Required key absent from a calibration file.
    #[error("missing key {0:?} in calibration file")]
    MissingKey(&'static str),

    /// Core library error.
    #[error("core error: {0}")]
    CoreError(#[from] peakpick_core::Error),

    /// Q-space error.
    #[error("q-space error: {0}")]
    QSpace(#[from] peakpick_qspace::Error),
}
