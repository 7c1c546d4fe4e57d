//! Frame navigation within a series.

use crate::error::{Error, Result};

/// Default number of frames skipped by [`FrameCursor::next`] and [`FrameCursor::prev`].
pub const DEFAULT_FRAME_STEP: usize = 20;

/// Position within a series, bounded by `first..=last`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameCursor {
    first: usize,
    last: usize,
    current: usize,
    step: usize,
}

impl FrameCursor {
    /// Cursor over a series of `frame_count` frames, starting at frame 0.
    ///
    /// # Errors
    /// Returns [`Error::EmptySeries`] when `frame_count` is zero.
    pub fn new(frame_count: usize) -> Result<Self> {
        if frame_count == 0 {
            return Err(Error::EmptySeries);
        }
        Ok(Self {
            first: 0,
            last: frame_count - 1,
            current: 0,
            step: DEFAULT_FRAME_STEP,
        })
    }

    /// Set the navigation step.
    ///
    /// # Errors
    /// Returns [`Error::ConfigError`] for a zero step.
    pub fn with_step(mut self, step: usize) -> Result<Self> {
        self.set_step(step)?;
        Ok(self)
    }

    /// Change the navigation step.
    ///
    /// # Errors
    /// Returns [`Error::ConfigError`] for a zero step.
    pub fn set_step(&mut self, step: usize) -> Result<()> {
        if step == 0 {
            return Err(Error::ConfigError("frame step must be at least 1".into()));
        }
        self.step = step;
        Ok(())
    }

    #[inline]
    #[must_use]
    pub fn first(&self) -> usize {
        self.first
    }

    #[inline]
    #[must_use]
    pub fn last(&self) -> usize {
        self.last
    }

    #[inline]
    #[must_use]
    pub fn current(&self) -> usize {
        self.current
    }

    #[inline]
    #[must_use]
    pub fn step(&self) -> usize {
        self.step
    }

    /// Jump to `index`.
    ///
    /// # Errors
    /// Returns [`Error::FrameOutOfRange`] unless `first <= index <= last`.
    pub fn set(&mut self, index: usize) -> Result<()> {
        if index < self.first || index > self.last {
            return Err(Error::FrameOutOfRange {
                index,
                first: self.first,
                last: self.last,
            });
        }
        self.current = index;
        Ok(())
    }

    /// Advance by one step, stopping at the last frame.
    pub fn next(&mut self) -> usize {
        self.current = self.current.saturating_add(self.step).min(self.last);
        self.current
    }

    /// Go back by one step, stopping at the first frame.
    pub fn prev(&mut self) -> usize {
        self.current = self.current.saturating_sub(self.step).max(self.first);
        self.current
    }
}
