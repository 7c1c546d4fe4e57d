//! UI rendering modules.
//!
//! - `control_panel`: Left sidebar with controls and the bottom status bar
//! - `main_view`: Central panel with the frame image and peak markers
//! - `theme`: Palette, fonts and styled widgets

mod control_panel;
mod main_view;
pub mod theme;
