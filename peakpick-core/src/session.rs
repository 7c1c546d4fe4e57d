//! The interactive peak-picking session.
//!
//! Ties a [`FrameSource`] to a [`FrameCursor`] and a [`PeakBook`]. The session
//! knows nothing about widgets; a GUI or script drives it by calling the
//! navigation and picking methods and reading back the current image and peaks.

use crate::cursor::{FrameCursor, DEFAULT_FRAME_STEP};
use crate::error::Result;
use crate::frame::{Frame, SanitizeConfig};
use crate::patch::{extract_patch, Patch, PatchSize};
use crate::peak::{Peak, PeakBook};
use crate::source::FrameSource;

/// Session configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SessionConfig {
    /// Frames skipped by next/previous.
    pub frame_step: usize,
    /// Edge length of stored peak patches.
    pub patch_size: PatchSize,
    /// Pixel clean-up applied to every displayed frame.
    pub sanitize: SanitizeConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            frame_step: DEFAULT_FRAME_STEP,
            patch_size: PatchSize::default(),
            sanitize: SanitizeConfig::default(),
        }
    }
}

impl SessionConfig {
    /// Set the navigation step.
    #[must_use]
    pub fn with_frame_step(mut self, step: usize) -> Self {
        self.frame_step = step;
        self
    }

    /// Set the patch size.
    #[must_use]
    pub fn with_patch_size(mut self, size: PatchSize) -> Self {
        self.patch_size = size;
        self
    }

    /// Set the pixel sanitising limits.
    #[must_use]
    pub fn with_sanitize(mut self, sanitize: SanitizeConfig) -> Self {
        self.sanitize = sanitize;
        self
    }
}

/// Navigation and peak bookkeeping over one image series.
pub struct PickingSession<S> {
    source: S,
    config: SessionConfig,
    cursor: FrameCursor,
    book: PeakBook,
    cached: Option<(usize, Frame)>,
    dirty: bool,
}

impl<S: FrameSource> PickingSession<S> {
    /// Start a session at the first frame of `source`.
    ///
    /// # Errors
    /// Returns an error if the source has no frames or the step is zero.
    pub fn new(source: S, config: SessionConfig) -> Result<Self> {
        let cursor = FrameCursor::new(source.frame_count())?.with_step(config.frame_step)?;
        Ok(Self {
            source,
            config,
            cursor,
            book: PeakBook::new(),
            cached: None,
            dirty: false,
        })
    }

    /// Resume from previously saved peaks.
    #[must_use]
    pub fn with_book(mut self, book: PeakBook) -> Self {
        self.book = book;
        self
    }

    #[must_use]
    pub fn source(&self) -> &S {
        &self.source
    }

    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    #[must_use]
    pub fn cursor(&self) -> &FrameCursor {
        &self.cursor
    }

    #[must_use]
    pub fn book(&self) -> &PeakBook {
        &self.book
    }

    /// Index of the displayed frame.
    #[must_use]
    pub fn current_frame(&self) -> usize {
        self.cursor.current()
    }

    /// Jump to a frame.
    ///
    /// # Errors
    /// Returns an error if `index` lies outside the series.
    pub fn set_current_frame(&mut self, index: usize) -> Result<()> {
        self.cursor.set(index)
    }

    /// Advance by the configured step.
    pub fn next_frame(&mut self) -> usize {
        self.cursor.next()
    }

    /// Go back by the configured step.
    pub fn prev_frame(&mut self) -> usize {
        self.cursor.prev()
    }

    /// Change the navigation step.
    ///
    /// # Errors
    /// Returns an error for a zero step.
    pub fn set_frame_step(&mut self, step: usize) -> Result<()> {
        self.cursor.set_step(step)?;
        self.config.frame_step = step;
        Ok(())
    }

    /// The sanitised image of the current frame.
    ///
    /// The frame is read once and cached until the cursor moves.
    ///
    /// # Errors
    /// Returns an error if the source cannot deliver the frame.
    pub fn current_image(&mut self) -> Result<&Frame> {
        let index = self.cursor.current();
        let frame = match self.cached.take() {
            Some((cached_index, frame)) if cached_index == index => frame,
            _ => self.source.read_frame(index, &self.config.sanitize)?,
        };
        Ok(&self.cached.insert((index, frame)).1)
    }

    /// Patch around `(x, y)` on the current image.
    ///
    /// # Errors
    /// Returns an error if the current frame cannot be read.
    pub fn extract_peak(&mut self, x: i64, y: i64) -> Result<Patch> {
        let size = self.config.patch_size;
        let frame = self.current_image()?;
        Ok(extract_patch(frame, x, y, size))
    }

    /// Record a peak at `(x, y)` on the current frame.
    ///
    /// # Errors
    /// Returns an error if the current frame cannot be read.
    pub fn add_peak(&mut self, x: i64, y: i64) -> Result<&Peak> {
        let patch = self.extract_peak(x, y)?;
        let frame = self.cursor.current();
        self.dirty = true;
        Ok(self.book.push(frame, Peak::new(x, y, patch)))
    }

    /// Drop the last peak picked on the current frame.
    pub fn undo_peak(&mut self) -> Option<Peak> {
        let peak = self.book.undo(self.cursor.current());
        if peak.is_some() {
            self.dirty = true;
        }
        peak
    }

    /// Peaks picked on the current frame.
    #[must_use]
    pub fn peaks_for_current_frame(&self) -> &[Peak] {
        self.book.for_frame(self.cursor.current())
    }

    /// Total number of picked peaks.
    #[must_use]
    pub fn total_peak_count(&self) -> usize {
        self.book.total_count()
    }

    /// Whether peaks changed since the last save.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Mark the current book as persisted.
    pub fn mark_saved(&mut self) {
        self.dirty = false;
    }
}
