//! peakpick-core: Core types for interactive XRD/SAXS peak picking.
//!
//! This crate provides the detector frame model, fixed-size peak patch
//! extraction, per-frame peak bookkeeping, frame navigation and the picking
//! session that ties them together. It performs no I/O; frames come from a
//! [`FrameSource`] implementation.
//!

pub mod cursor;
pub mod display;
pub mod error;
pub mod frame;
pub mod patch;
pub mod peak;
pub mod session;
pub mod source;

pub use cursor::{FrameCursor, DEFAULT_FRAME_STEP};
pub use display::{render_rgba, Colormap, DisplayRange, PixelRegion};
pub use error::{Error, Result};
pub use frame::{Frame, FrameStats, PixelMask, SanitizeConfig};
pub use patch::{extract_patch, Patch, PatchSize};
pub use peak::{Peak, PeakBook};
pub use session::{PickingSession, SessionConfig};
pub use source::{FrameSource, MemorySeries};
