//! Picked peaks and their per-frame bookkeeping.

use std::collections::BTreeMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::patch::Patch;

/// A single diffraction peak picked on a frame.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Peak {
    /// Column of the peak centre (image coordinates).
    pub x: i64,
    /// Row of the peak centre (image coordinates).
    pub y: i64,
    /// Raw pixel window around the centre.
    pub patch: Patch,
}

impl Peak {
    /// Creates a new peak.
    #[must_use]
    pub fn new(x: i64, y: i64, patch: Patch) -> Self {
        Self { x, y, patch }
    }

    /// Absolute image coordinate `(x, y)` of the peak centre.
    #[inline]
    #[must_use]
    pub fn coordinate(&self) -> (i64, i64) {
        (self.x, self.y)
    }

    /// Maximum intensity within the patch.
    #[inline]
    #[must_use]
    pub fn intensity(&self) -> i32 {
        self.patch.intensity()
    }
}

/// Peaks grouped by frame index, in ascending frame order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct PeakBook {
    frames: BTreeMap<usize, Vec<Peak>>,
}

impl PeakBook {
    /// Creates an empty book.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a peak to `frame`.
    pub fn push(&mut self, frame: usize, peak: Peak) -> &Peak {
        let peaks = self.frames.entry(frame).or_default();
        peaks.push(peak);
        &peaks[peaks.len() - 1]
    }

    /// Remove the most recently added peak of `frame`.
    ///
    /// Frames left without peaks are dropped from the book.
    pub fn undo(&mut self, frame: usize) -> Option<Peak> {
        let peaks = self.frames.get_mut(&frame)?;
        let peak = peaks.pop();
        if peaks.is_empty() {
            self.frames.remove(&frame);
        }
        peak
    }

    /// Peaks of one frame (empty if none were picked).
    #[must_use]
    pub fn for_frame(&self, frame: usize) -> &[Peak] {
        self.frames.get(&frame).map_or(&[][..], Vec::as_slice)
    }

    /// Total number of peaks across all frames.
    #[must_use]
    pub fn total_count(&self) -> usize {
        self.frames.values().map(Vec::len).sum()
    }

    /// Number of frames holding at least one peak.
    #[must_use]
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Iterate `(frame, peaks)` in ascending frame order.
    pub fn frames(&self) -> impl Iterator<Item = (usize, &[Peak])> {
        self.frames.iter().map(|(&f, p)| (f, p.as_slice()))
    }

    /// Iterate every peak with its frame, ascending frame then pick order.
    pub fn flattened(&self) -> impl Iterator<Item = (usize, &Peak)> {
        self.frames
            .iter()
            .flat_map(|(&f, peaks)| peaks.iter().map(move |p| (f, p)))
    }

    /// Remove every peak.
    pub fn clear(&mut self) {
        self.frames.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patch::{Patch, PatchSize};

    fn peak(x: i64, y: i64, value: i32) -> Peak {
        let size = PatchSize::new(1).unwrap();
        Peak::new(x, y, Patch::new(size, vec![value]).unwrap())
    }

    #[test]
    fn test_push_and_count() {
        let mut book = PeakBook::new();
        book.push(40, peak(1, 2, 5));
        book.push(0, peak(3, 4, 6));
        book.push(40, peak(5, 6, 7));

        assert_eq!(book.total_count(), 3);
        assert_eq!(book.frame_count(), 2);
        assert_eq!(book.for_frame(40).len(), 2);
        assert!(book.for_frame(20).is_empty());
    }

    #[test]
    fn test_undo_pops_last_of_frame() {
        let mut book = PeakBook::new();
        book.push(0, peak(1, 1, 1));
        book.push(0, peak(2, 2, 2));
        book.push(20, peak(3, 3, 3));

        let popped = book.undo(0).unwrap();
        assert_eq!(popped.coordinate(), (2, 2));
        assert_eq!(book.for_frame(0).len(), 1);
        assert_eq!(book.for_frame(20).len(), 1);
    }

    #[test]
    fn test_undo_empty_frame_is_noop() {
        let mut book = PeakBook::new();
        assert!(book.undo(7).is_none());
        book.push(7, peak(0, 0, 0));
        assert!(book.undo(7).is_some());
        assert!(book.undo(7).is_none());
        assert!(book.is_empty());
    }

    #[test]
    fn test_flattened_order() {
        let mut book = PeakBook::new();
        book.push(60, peak(6, 0, 0));
        book.push(20, peak(2, 0, 0));
        book.push(20, peak(3, 0, 0));
        book.push(0, peak(0, 0, 0));

        let order: Vec<(usize, i64)> = book.flattened().map(|(f, p)| (f, p.x)).collect();
        assert_eq!(order, vec![(0, 0), (20, 2), (20, 3), (60, 6)]);
    }

    #[test]
    fn test_peak_intensity() {
        let p = peak(1, 2, 42);
        assert_eq!(p.intensity(), 42);
        assert_eq!(p.coordinate(), (1, 2));
    }
}
