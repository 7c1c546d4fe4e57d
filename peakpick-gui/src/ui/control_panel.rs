//! Side panel controls and the bottom status bar.

use eframe::egui::{self, Color32, FontFamily, FontId, Stroke};
use peakpick_core::{Colormap, FrameSource};

use super::theme::{
    accent, form_label, primary_button, stat_label, stat_value, stat_value_highlight,
    toggle_button, ThemeColors,
};
use crate::app::PeakPickApp;
use crate::state::StatusKind;
use crate::util::{format_number, short_name};

impl<S: FrameSource> PeakPickApp<S> {
    /// Render the left control panel.
    pub(crate) fn render_side_panel(&mut self, ctx: &egui::Context) {
        let colors = ThemeColors::from_ctx(ctx);

        egui::SidePanel::left("ctrl")
            .default_width(240.0)
            .frame(
                egui::Frame::none()
                    .fill(colors.bg_panel)
                    .inner_margin(egui::Margin::ZERO),
            )
            .show(ctx, |ui| {
                egui::ScrollArea::vertical()
                    .auto_shrink([false, false])
                    .show(ui, |ui| {
                        self.render_section(ui, "Series", true, |app, ui| {
                            app.render_series_info(ui);
                        });
                        self.render_section(ui, "Navigation", true, |app, ui| {
                            app.render_navigation(ui);
                        });
                        self.render_section(ui, "Peaks", true, |app, ui| {
                            app.render_peak_controls(ui);
                        });
                        self.render_section(ui, "View", true, |app, ui| {
                            app.render_view_options(ui);
                        });
                        self.render_section(ui, "Shortcuts", false, |_, ui| {
                            Self::render_shortcuts(ui);
                        });
                        ui.add_space(12.0);
                    });
            });
    }

    /// Render a collapsible section with header.
    fn render_section<F>(
        &mut self,
        ui: &mut egui::Ui,
        title: &str,
        default_open: bool,
        content: F,
    ) where
        F: FnOnce(&mut Self, &mut egui::Ui),
    {
        ui.push_id(title, |ui| {
            let colors = ThemeColors::from_ui(ui);
            let header_height = ui.spacing().interact_size.y.max(28.0);
            let (header_rect, header_response) = ui.allocate_exact_size(
                egui::vec2(ui.available_width(), header_height),
                egui::Sense::click(),
            );

            let id = ui.make_persistent_id(format!("{title}_open"));
            let mut is_open = ui.data_mut(|d| *d.get_temp_mut_or_insert_with(id, || default_open));
            if header_response.clicked() {
                is_open = !is_open;
                ui.data_mut(|d| d.insert_temp(id, is_open));
            }

            let header_fill = if header_response.hovered() {
                colors.bg_header
            } else {
                Color32::TRANSPARENT
            };
            let painter = ui.painter();
            painter.rect_filled(header_rect, 0.0, header_fill);
            painter.text(
                header_rect.left_center() + egui::vec2(16.0, 0.0),
                egui::Align2::LEFT_CENTER,
                title.to_uppercase(),
                FontId::new(11.0, FontFamily::Proportional),
                colors.text_primary,
            );
            painter.text(
                header_rect.right_center() - egui::vec2(16.0, 0.0),
                egui::Align2::CENTER_CENTER,
                if is_open { "▼" } else { "▶" },
                FontId::monospace(10.0),
                colors.text_dim,
            );
            painter.hline(
                header_rect.x_range(),
                header_rect.bottom(),
                Stroke::new(1.0, colors.border),
            );

            if is_open {
                egui::Frame::none()
                    .inner_margin(egui::Margin {
                        left: 16.0,
                        right: 16.0,
                        top: 12.0,
                        bottom: 16.0,
                    })
                    .show(ui, |ui| content(self, ui));
            }

            let last_rect = ui.min_rect();
            ui.painter().hline(
                last_rect.x_range(),
                last_rect.bottom(),
                Stroke::new(1.0, colors.border),
            );
        });
    }

    fn render_series_info(&self, ui: &mut egui::Ui) {
        let (width, height) = self.session.source().frame_shape();
        let frames = self.session.source().frame_count();
        egui::Grid::new("series_info")
            .num_columns(2)
            .spacing([12.0, 4.0])
            .show(ui, |ui| {
                ui.label(stat_label("File"));
                ui.label(stat_value(&short_name(&self.data_path)))
                    .on_hover_text(self.data_path.display().to_string());
                ui.end_row();
                ui.label(stat_label("Frames"));
                let frames = i64::try_from(frames).unwrap_or(i64::MAX);
                ui.label(stat_value(&format_number(frames)));
                ui.end_row();
                ui.label(stat_label("Shape"));
                ui.label(stat_value(&format!("{width} x {height}")));
                ui.end_row();
            });
    }

    fn render_navigation(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            if ui.button("◀ Previous").clicked() {
                self.go_prev();
            }
            if ui.button("Next ▶").clicked() {
                self.go_next();
            }
        });
        ui.add_space(6.0);

        let cursor = *self.session.cursor();
        ui.label(form_label("Frame"));
        let mut frame = cursor.current();
        // The slider reads the session every repaint, so navigation elsewhere
        // moves it without reporting a change.
        let slider = ui.add(egui::Slider::new(&mut frame, cursor.first()..=cursor.last()));
        if slider.changed() {
            self.go_to(frame);
        }

        ui.add_space(6.0);
        ui.horizontal(|ui| {
            ui.label(form_label("Step"));
            let mut step = cursor.step();
            let max_step = cursor.last().max(1);
            if ui
                .add(egui::DragValue::new(&mut step).range(1..=max_step))
                .changed()
            {
                self.set_step(step);
            }
        });
    }

    fn render_peak_controls(&mut self, ui: &mut egui::Ui) {
        let width = ui.available_width();
        let add = ui
            .add_sized([width, 28.0], toggle_button("Add Peak", self.add_mode))
            .on_hover_text("Click on the image to record peaks (A)");
        if add.clicked() {
            self.toggle_add_mode();
        }

        ui.horizontal(|ui| {
            if ui
                .button("Undo")
                .on_hover_text("Remove the last peak on this frame (Ctrl+Z)")
                .clicked()
            {
                self.undo_peak();
            }
            if ui
                .add(primary_button("Save Peaks"))
                .on_hover_text(self.peak_file.path().display().to_string())
                .clicked()
            {
                self.save_peaks();
            }
        });

        ui.add_space(8.0);
        let book = self.session.book();
        let on_frame = self.session.peaks_for_current_frame().len();
        egui::Grid::new("peak_stats")
            .num_columns(2)
            .spacing([12.0, 4.0])
            .show(ui, |ui| {
                ui.label(stat_label("This frame"));
                ui.label(stat_value(&on_frame.to_string()));
                ui.end_row();
                ui.label(stat_label("Total"));
                ui.label(stat_value_highlight(&book.total_count().to_string()));
                ui.end_row();
                ui.label(stat_label("Frames"));
                ui.label(stat_value(&book.frame_count().to_string()));
                ui.end_row();
                ui.label(stat_label("Output"));
                ui.label(stat_value(&short_name(self.peak_file.path())));
                ui.end_row();
            });
    }

    fn render_view_options(&mut self, ui: &mut egui::Ui) {
        ui.label(form_label("Colormap"));
        egui::ComboBox::from_id_salt("colormap")
            .selected_text(self.view.colormap.to_string())
            .show_ui(ui, |ui| {
                for colormap in Colormap::ALL {
                    ui.selectable_value(&mut self.view.colormap, colormap, colormap.to_string());
                }
            });

        ui.add_space(6.0);
        egui::Grid::new("display_range")
            .num_columns(2)
            .spacing([12.0, 4.0])
            .show(ui, |ui| {
                ui.label(form_label("vmin"));
                ui.add(egui::DragValue::new(&mut self.view.range.vmin).speed(1.0));
                ui.end_row();
                ui.label(form_label("vmax"));
                ui.add(egui::DragValue::new(&mut self.view.range.vmax).speed(1.0));
                ui.end_row();
            });

        ui.add_space(6.0);
        if ui.button("Reset View").clicked() {
            self.view.request_reset();
        }
    }

    fn render_shortcuts(ui: &mut egui::Ui) {
        egui::Grid::new("shortcuts")
            .num_columns(2)
            .spacing([12.0, 4.0])
            .show(ui, |ui| {
                for (keys, action) in [
                    ("← / →", "Previous / next"),
                    ("A", "Toggle Add Peak"),
                    ("Ctrl+Z", "Undo"),
                    ("Ctrl+S", "Save peaks"),
                ] {
                    ui.label(stat_value(keys));
                    ui.label(stat_label(action));
                    ui.end_row();
                }
            });
    }

    /// Render the bottom status bar.
    pub(crate) fn render_bottom_panel(&self, ctx: &egui::Context) {
        let colors = ThemeColors::from_ctx(ctx);

        egui::TopBottomPanel::bottom("status_bar")
            .frame(
                egui::Frame::none()
                    .fill(colors.bg_header)
                    .inner_margin(egui::Margin {
                        left: 16.0,
                        right: 16.0,
                        top: 6.0,
                        bottom: 6.0,
                    }),
            )
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    let colors = ThemeColors::from_ui(ui);
                    ui.label(
                        egui::RichText::new(self.info_text())
                            .size(11.0)
                            .color(colors.text_primary)
                            .strong(),
                    );
                    Self::status_separator(ui, colors);
                    self.render_cursor_status(ui, colors);
                    Self::status_separator(ui, colors);
                    self.render_status_indicator(ui);
                });
            });
    }

    fn render_status_indicator(&self, ui: &mut egui::Ui) {
        let color = match self.status.kind {
            StatusKind::Info if self.add_mode => accent::RED,
            StatusKind::Info => accent::BLUE,
            StatusKind::Success => accent::GREEN,
            StatusKind::Error => accent::AMBER,
        };
        ui.label(egui::RichText::new("●").size(11.0).color(color));
        ui.label(egui::RichText::new(&self.status.text).size(11.0).color(color));
    }

    fn render_cursor_status(&self, ui: &mut egui::Ui, colors: ThemeColors) {
        if let Some((x, y, value)) = self.cursor_info {
            ui.label(
                egui::RichText::new(format!("Cursor: ({x}, {y}) = "))
                    .size(11.0)
                    .color(colors.text_muted),
            );
            ui.label(
                egui::RichText::new(format_number(i64::from(value)))
                    .size(11.0)
                    .color(colors.text_primary),
            );
        } else {
            ui.label(
                egui::RichText::new("Cursor: -")
                    .size(11.0)
                    .color(colors.text_muted),
            );
        }
    }

    fn status_separator(ui: &mut egui::Ui, colors: ThemeColors) {
        ui.label(egui::RichText::new("│").size(11.0).color(colors.text_dim));
    }
}
