//! Frame sources: anything that can hand out detector frames by index.

use crate::error::{Error, Result};
use crate::frame::{Frame, SanitizeConfig};

/// A random-access series of detector frames.
///
/// Implemented by the HDF5 reader in `peakpick-io` and by [`MemorySeries`].
pub trait FrameSource {
    /// Total number of frames in the series.
    fn frame_count(&self) -> usize;

    /// Frame shape as `(width, height)`.
    fn frame_shape(&self) -> (usize, usize);

    /// Read and sanitise one frame.
    ///
    /// # Errors
    /// Returns an error if `index` is out of range or the frame cannot be read.
    fn read_frame(&self, index: usize, sanitize: &SanitizeConfig) -> Result<Frame>;
}

impl<S: FrameSource + ?Sized> FrameSource for Box<S> {
    fn frame_count(&self) -> usize {
        (**self).frame_count()
    }

    fn frame_shape(&self) -> (usize, usize) {
        (**self).frame_shape()
    }

    fn read_frame(&self, index: usize, sanitize: &SanitizeConfig) -> Result<Frame> {
        (**self).read_frame(index, sanitize)
    }
}

/// Raw frames held in memory.
#[derive(Clone, Debug, Default)]
pub struct MemorySeries {
    width: usize,
    height: usize,
    frames: Vec<Vec<i64>>,
}

impl MemorySeries {
    /// Create an empty series with the given frame shape.
    #[must_use]
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            frames: Vec::new(),
        }
    }

    /// Append a raw frame.
    ///
    /// # Errors
    /// Returns [`Error::ShapeMismatch`] if the buffer does not match the series shape.
    pub fn push(&mut self, raw: Vec<i64>) -> Result<()> {
        if raw.len() != self.width * self.height {
            return Err(Error::ShapeMismatch {
                width: self.width,
                height: self.height,
                len: raw.len(),
            });
        }
        self.frames.push(raw);
        Ok(())
    }

    /// Build a series of `count` frames from a generator `f(frame, x, y)`.
    #[must_use]
    pub fn from_fn<F>(width: usize, height: usize, count: usize, f: F) -> Self
    where
        F: Fn(usize, usize, usize) -> i64,
    {
        let frames = (0..count)
            .map(|i| {
                let mut raw = Vec::with_capacity(width * height);
                for y in 0..height {
                    for x in 0..width {
                        raw.push(f(i, x, y));
                    }
                }
                raw
            })
            .collect();
        Self {
            width,
            height,
            frames,
        }
    }

    /// Raw (unsanitised) frame buffers.
    #[must_use]
    pub fn raw_frames(&self) -> &[Vec<i64>] {
        &self.frames
    }
}

impl FrameSource for MemorySeries {
    fn frame_count(&self) -> usize {
        self.frames.len()
    }

    fn frame_shape(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    fn read_frame(&self, index: usize, sanitize: &SanitizeConfig) -> Result<Frame> {
        let raw = self.frames.get(index).ok_or_else(|| Error::FrameOutOfRange {
            index,
            first: 0,
            last: self.frames.len().saturating_sub(1),
        })?;
        Frame::from_raw(self.width, self.height, raw, sanitize)
    }
}
