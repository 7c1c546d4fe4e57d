//! Error types for peakpick-core.

use thiserror::Error;

/// Result type alias for peakpick operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for peakpick operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Frame index outside the navigable range.
    #[error("frame index {index} out of bounds ({first}..={last})")]
    FrameOutOfRange {
        index: usize,
        first: usize,
        last: usize,
    },

    /// Patch size must be odd and positive.
    #[error("patch size must be an odd positive number, got {0}")]
    InvalidPatchSize(usize),

    /// Pixel buffer does not match the declared frame shape.
    #[error("frame buffer holds {len} values, expected {width}x{height}")]
    ShapeMismatch {
        width: usize,
        height: usize,
        len: usize,
    },

    /// A series without frames cannot be navigated.
    #[error("image series contains no frames")]
    EmptySeries,

    /// Frame data could not be read from its source.
    #[error("frame source error: {0}")]
    Source(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    ConfigError(String),
}
