//! Main application state and logic.
//!
//! `PeakPickApp` owns the picking session and routes button presses, slider
//! moves, keyboard shortcuts and image clicks to it. Rendering lives in the
//! `ui` modules.

use std::path::PathBuf;

use eframe::egui;
use peakpick_core::{FrameSource, PickingSession};
use peakpick_io::{Hdf5FrameSeries, PeakFile, PeakFileMeta};

use crate::state::{StatusLine, ViewState};
use crate::viewer::{frame_image, FrameTexture, TextureKey};

/// Main application state.
pub struct PeakPickApp<S = Hdf5FrameSeries> {
    /// Navigation and picked peaks.
    pub(crate) session: PickingSession<S>,
    /// Where Save Peaks writes.
    pub(crate) peak_file: PeakFile,
    /// Image series on display.
    pub(crate) data_path: PathBuf,
    /// Colormap, intensity window and home view.
    pub(crate) view: ViewState,
    /// Whether clicks on the image record peaks.
    pub(crate) add_mode: bool,
    /// Message shown in the status bar.
    pub(crate) status: StatusLine,
    /// Pixel under the pointer and its value.
    pub(crate) cursor_info: Option<(i64, i64, i32)>,
    /// Cached image of the current frame.
    pub(crate) texture: Option<FrameTexture>,
}

impl<S: FrameSource> PeakPickApp<S> {
    pub fn new(
        session: PickingSession<S>,
        peak_file: PeakFile,
        data_path: PathBuf,
        view: ViewState,
    ) -> Self {
        Self {
            session,
            peak_file,
            data_path,
            view,
            add_mode: false,
            status: StatusLine::default(),
            cursor_info: None,
            texture: None,
        }
    }

    pub fn go_next(&mut self) {
        let frame = self.session.next_frame();
        log::debug!("Next frame: {frame}");
    }

    pub fn go_prev(&mut self) {
        let frame = self.session.prev_frame();
        log::debug!("Previous frame: {frame}");
    }

    /// Jump to a frame picked on the slider.
    pub fn go_to(&mut self, index: usize) {
        if let Err(e) = self.session.set_current_frame(index) {
            self.status.error(e.to_string());
        }
    }

    pub fn set_step(&mut self, step: usize) {
        if let Err(e) = self.session.set_frame_step(step) {
            self.status.error(e.to_string());
        }
    }

    pub fn toggle_add_mode(&mut self) {
        self.add_mode = !self.add_mode;
        self.status.info(if self.add_mode {
            "Add Peak: click on the image to record a peak"
        } else {
            "Add Peak off"
        });
    }

    /// Record a peak at pixel `(x, y)` of the current frame.
    pub fn add_peak_at(&mut self, x: i64, y: i64) {
        let frame = self.session.current_frame();
        match self.session.add_peak(x, y) {
            Ok(peak) => {
                let intensity = peak.intensity();
                log::info!("Peak at ({x}, {y}) on frame {frame}, intensity {intensity}");
                self.status
                    .info(format!("Peak at ({x}, {y}) on frame {frame}, intensity {intensity}"));
            }
            Err(e) => self.status.error(format!("Cannot add peak: {e}")),
        }
    }

    pub fn undo_peak(&mut self) {
        let frame = self.session.current_frame();
        match self.session.undo_peak() {
            Some(peak) => {
                let (x, y) = peak.coordinate();
                self.status
                    .info(format!("Removed peak at ({x}, {y}) on frame {frame}"));
            }
            None => self.status.info(format!("No peaks to undo on frame {frame}")),
        }
    }

    /// Write every picked peak to the result file.
    pub fn save_peaks(&mut self) {
        let meta = PeakFileMeta::new(
            Some(self.data_path.display().to_string()),
            self.session.config().patch_size,
        );
        match self.peak_file.save(self.session.book(), &meta) {
            Ok(()) => {
                self.session.mark_saved();
                let total = self.session.total_peak_count();
                let path = self.peak_file.path().display();
                log::info!("Saved {total} peaks to {path}");
                self.status.success(format!("Saved {total} peaks to {path}"));
            }
            Err(e) => self.status.error(format!("Save failed: {e}")),
        }
    }

    /// "Frame: N | Peaks: M", with a trailing `*` while there are unsaved changes.
    #[must_use]
    pub fn info_text(&self) -> String {
        let dirty = if self.session.is_dirty() { " *" } else { "" };
        format!(
            "Frame: {} | Peaks: {}{dirty}",
            self.session.current_frame(),
            self.session.total_peak_count()
        )
    }

    /// Plot positions of the peaks picked on the current frame.
    #[must_use]
    pub fn marker_positions(&self) -> Vec<[f64; 2]> {
        self.session
            .peaks_for_current_frame()
            .iter()
            .map(|peak| {
                let (x, y) = peak.coordinate();
                crate::viewer::pixel_center(x, y)
            })
            .collect()
    }

    /// Value of pixel `(x, y)` in the current frame.
    pub fn pixel_value(&mut self, x: i64, y: i64) -> Option<i32> {
        let frame = self.session.current_image().ok()?;
        frame.get(usize::try_from(x).ok()?, usize::try_from(y).ok()?)
    }

    /// Upload the current frame if the cached texture is stale.
    pub(crate) fn ensure_texture(&mut self, ctx: &egui::Context) {
        let key = TextureKey {
            frame: self.session.current_frame(),
            colormap: self.view.colormap,
            range: self.view.range,
        };
        if self.texture.as_ref().is_some_and(|t| t.is_current(&key)) {
            return;
        }

        match self.session.current_image() {
            Ok(frame) => {
                let size = [frame.width(), frame.height()];
                let image = frame_image(frame, key.colormap, key.range);
                let handle = ctx.load_texture("frame", image, egui::TextureOptions::NEAREST);
                self.texture = Some(FrameTexture { key, handle, size });
            }
            Err(e) => {
                self.texture = None;
                self.status
                    .error(format!("Cannot read frame {}: {e}", key.frame));
            }
        }
    }

    /// Keyboard shortcuts, ignored while a text field has focus.
    fn handle_shortcuts(&mut self, ctx: &egui::Context) {
        if ctx.wants_keyboard_input() {
            return;
        }
        let (prev, next, toggle, undo, save) = ctx.input_mut(|i| {
            (
                i.consume_key(egui::Modifiers::NONE, egui::Key::ArrowLeft),
                i.consume_key(egui::Modifiers::NONE, egui::Key::ArrowRight),
                i.consume_key(egui::Modifiers::NONE, egui::Key::A),
                i.consume_key(egui::Modifiers::COMMAND, egui::Key::Z),
                i.consume_key(egui::Modifiers::COMMAND, egui::Key::S),
            )
        });
        if prev {
            self.go_prev();
        }
        if next {
            self.go_next();
        }
        if toggle {
            self.toggle_add_mode();
        }
        if undo {
            self.undo_peak();
        }
        if save {
            self.save_peaks();
        }
    }
}

impl<S: FrameSource + 'static> eframe::App for PeakPickApp<S> {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        crate::ui::theme::apply_system_theme(ctx);
        self.handle_shortcuts(ctx);
        self.ensure_texture(ctx);
        self.render_side_panel(ctx);
        self.render_bottom_panel(ctx);
        self.render_central_panel(ctx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use peakpick_core::{DisplayRange, MemorySeries, SessionConfig};

    fn app(dir: &std::path::Path) -> PeakPickApp<MemorySeries> {
        let series = MemorySeries::from_fn(30, 30, 100, |i, x, y| (i * 100 + y * 30 + x) as i64);
        let session = PickingSession::new(series, SessionConfig::default()).unwrap();
        PeakPickApp::new(
            session,
            PeakFile::new(dir.join("peaks.json")),
            PathBuf::from("scan_master.h5"),
            ViewState::new([0, 30], [30, 0], DisplayRange::default()),
        )
    }

    #[test]
    fn test_navigation_and_info() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app(dir.path());
        assert_eq!(app.info_text(), "Frame: 0 | Peaks: 0");

        app.go_next();
        app.go_next();
        assert_eq!(app.session.current_frame(), 40);
        app.go_prev();
        assert_eq!(app.session.current_frame(), 20);

        app.go_to(99);
        assert_eq!(app.session.current_frame(), 99);
        app.go_to(100);
        assert_eq!(app.session.current_frame(), 99);
        assert_eq!(app.status.kind, crate::state::StatusKind::Error);
    }

    #[test]
    fn test_pick_undo_and_markers() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app(dir.path());
        app.go_next();
        app.add_peak_at(4, 7);
        app.add_peak_at(10, 2);
        assert_eq!(app.marker_positions(), vec![[4.5, -7.5], [10.5, -2.5]]);
        assert_eq!(app.info_text(), "Frame: 20 | Peaks: 2 *");
        assert_eq!(app.pixel_value(4, 7), Some(2_000 + 7 * 30 + 4));
        assert_eq!(app.pixel_value(-1, 7), None);

        app.undo_peak();
        assert_eq!(app.marker_positions(), vec![[4.5, -7.5]]);

        app.go_next();
        assert!(app.marker_positions().is_empty());
        app.undo_peak();
        assert_eq!(app.session.total_peak_count(), 1);
    }

    #[test]
    fn test_save_clears_dirty_marker() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app(dir.path());
        app.add_peak_at(15, 15);
        app.save_peaks();

        assert_eq!(app.status.kind, crate::state::StatusKind::Success);
        assert_eq!(app.info_text(), "Frame: 0 | Peaks: 1");
        let (book, meta) = app.peak_file.load().unwrap();
        assert_eq!(book.total_count(), 1);
        assert_eq!(meta.source.as_deref(), Some("scan_master.h5"));
    }

    #[test]
    fn test_toggle_add_mode() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app(dir.path());
        assert!(!app.add_mode);
        app.toggle_add_mode();
        assert!(app.add_mode);
        app.toggle_add_mode();
        assert!(!app.add_mode);
    }
}
