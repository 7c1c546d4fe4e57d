//! Main view (central panel) rendering.

use eframe::egui::{self, Color32};
use egui_plot::{MarkerShape, Plot, PlotBounds, PlotImage, PlotPoint, Points};
use peakpick_core::FrameSource;

use crate::app::PeakPickApp;
use crate::viewer::pixel_at;

impl<S: FrameSource> PeakPickApp<S> {
    /// Render the central panel with the current frame and its peaks.
    #[allow(clippy::cast_precision_loss)]
    pub(crate) fn render_central_panel(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            let Some(([width, height], texture_id)) =
                self.texture.as_ref().map(|t| (t.size, t.handle.id()))
            else {
                ui.centered_and_justified(|ui| ui.label("No Data"));
                return;
            };

            let markers = self.marker_positions();
            let reset = self.view.take_reset();
            let (w, h) = (width as f64, height as f64);

            let plot = Plot::new("frame_plot")
                .data_aspect(1.0)
                .show_grid(false)
                .allow_double_click_reset(false)
                .y_axis_formatter(|mark, _range| format!("{:.0}", -mark.value))
                .label_formatter(|_name, value| {
                    format!("x = {:.0}\ny = {:.0}", value.x.floor(), (-value.y).floor())
                });

            let response = plot.show(ui, |plot_ui| {
                if let Some(bounds) = reset {
                    plot_ui.set_plot_bounds(PlotBounds::from_min_max(bounds.min, bounds.max));
                }
                plot_ui.image(PlotImage::new(
                    texture_id,
                    PlotPoint::new(w / 2.0, -h / 2.0),
                    [width as f32, height as f32],
                ));
                if !markers.is_empty() {
                    plot_ui.points(
                        Points::new(markers)
                            .name("peaks")
                            .shape(MarkerShape::Cross)
                            .radius(6.0)
                            .color(Color32::WHITE),
                    );
                }
                plot_ui
                    .pointer_coordinate()
                    .and_then(|p| pixel_at(p.x, p.y, width, height))
            });

            let hovered = response.inner;
            self.cursor_info =
                hovered.and_then(|(x, y)| self.pixel_value(x, y).map(|value| (x, y, value)));

            if self.add_mode {
                if response.response.hovered() {
                    ui.ctx().set_cursor_icon(egui::CursorIcon::Crosshair);
                }
                // A press released after panning is a drag, not a click.
                if response.response.clicked() {
                    if let Some((x, y)) = hovered {
                        self.add_peak_at(x, y);
                    }
                }
            }
        });
    }
}
