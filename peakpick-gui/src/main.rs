//! peakpick GUI entry point.

#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

mod app;
mod state;
mod ui;
mod util;
mod viewer;

use std::path::PathBuf;

use anyhow::Context as _;
use app::PeakPickApp;
use clap::Parser;
use eframe::egui;
use peakpick_core::{
    DisplayRange, FrameSource, PatchSize, PickingSession, SanitizeConfig, SessionConfig,
};
use peakpick_io::{Hdf5FrameSeries, PeakFile};
use state::ViewState;

/// Click through an XRD image series and record diffraction peaks.
#[derive(Parser, Debug)]
#[command(name = "peakpick-gui", version, about)]
struct Args {
    /// HDF5 master file of the image series (a file dialog opens when omitted).
    data: Option<PathBuf>,

    /// Peak file written by Save Peaks.
    #[arg(short, long, default_value = "peaks.json")]
    result: PathBuf,

    /// Initial horizontal view limits in pixels.
    #[arg(long, num_args = 2, value_names = ["X0", "X1"], default_values_t = [1400, 1700])]
    xrange: Vec<i64>,

    /// Initial vertical view limits in pixels, top-down like an image axis.
    #[arg(long, num_args = 2, value_names = ["Y0", "Y1"], default_values_t = [2100, 1800])]
    yrange: Vec<i64>,

    /// Intensity shown as the bottom of the colormap.
    #[arg(long, default_value_t = 0.0)]
    vmin: f64,

    /// Intensity shown as the top of the colormap.
    #[arg(long, default_value_t = 500.0)]
    vmax: f64,

    /// Frames skipped by Previous/Next.
    #[arg(long, default_value_t = peakpick_core::DEFAULT_FRAME_STEP)]
    step: usize,

    /// Edge length of the stored peak patches (odd).
    #[arg(long, default_value_t = 9)]
    patch_size: usize,

    /// Raw values above this are treated as invalid pixels.
    #[arg(long, default_value_t = 10_000)]
    max_valid: i64,

    /// Continue from the peaks already stored in the result file.
    #[arg(long)]
    resume: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let Some(data) = args.data.clone().or_else(pick_data_file) else {
        log::info!("No image series selected");
        return Ok(());
    };

    let app = build_app(&args, data)?;
    let opts = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("XRD Image Viewer")
            .with_inner_size([1200.0, 900.0]),
        ..Default::default()
    };
    eframe::run_native(
        "XRD Image Viewer",
        opts,
        Box::new(|cc| {
            ui::theme::configure_style(&cc.egui_ctx);
            Ok(Box::new(app))
        }),
    )
    .map_err(|e| anyhow::anyhow!("viewer failed: {e}"))
}

fn pick_data_file() -> Option<PathBuf> {
    rfd::FileDialog::new()
        .set_title("Open image series")
        .add_filter("HDF5", &["h5", "hdf5", "nxs"])
        .pick_file()
}

fn build_app(args: &Args, data: PathBuf) -> anyhow::Result<PeakPickApp> {
    let series = Hdf5FrameSeries::open(&data)
        .with_context(|| format!("cannot open image series {}", data.display()))?;
    log::info!(
        "Opened {} ({} frames in {} datasets)",
        data.display(),
        series.frame_count(),
        series.members().len()
    );

    let mut patch_size = PatchSize::new(args.patch_size)?;
    let peak_file = PeakFile::new(&args.result);

    let book = if args.resume && peak_file.exists() {
        let (book, meta) = peak_file
            .load()
            .with_context(|| format!("cannot resume from {}", peak_file.path().display()))?;
        if meta.patch_size != patch_size {
            log::warn!(
                "{} was picked with {}-pixel patches; keeping that size",
                peak_file.path().display(),
                meta.patch_size.get()
            );
            patch_size = meta.patch_size;
        }
        log::info!(
            "Resumed {} peaks on {} frames",
            book.total_count(),
            book.frame_count()
        );
        Some(book)
    } else {
        None
    };

    let config = SessionConfig::default()
        .with_frame_step(args.step)
        .with_patch_size(patch_size)
        .with_sanitize(SanitizeConfig::default().with_max_valid(args.max_valid));
    let mut session = PickingSession::new(series, config)?;
    if let Some(book) = book {
        session = session.with_book(book);
    }

    let view = ViewState::new(
        [args.xrange[0], args.xrange[1]],
        [args.yrange[0], args.yrange[1]],
        DisplayRange::new(args.vmin, args.vmax),
    );
    Ok(PeakPickApp::new(session, peak_file, data, view))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_args_debug_assert() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_args_defaults() {
        let args = Args::try_parse_from(["peakpick-gui", "scan_master.h5"]).unwrap();
        assert_eq!(args.xrange, vec![1400, 1700]);
        assert_eq!(args.yrange, vec![2100, 1800]);
        assert_eq!(args.step, 20);
        assert_eq!(args.patch_size, 9);
        assert!(!args.resume);
        assert_eq!(args.result, PathBuf::from("peaks.json"));
    }

    #[test]
    fn test_args_ranges() {
        let args = Args::try_parse_from([
            "peakpick-gui",
            "--xrange",
            "10",
            "200",
            "--yrange",
            "300",
            "0",
            "--resume",
        ])
        .unwrap();
        assert!(args.data.is_none());
        assert_eq!(args.xrange, vec![10, 200]);
        assert_eq!(args.yrange, vec![300, 0]);
        assert!(args.resume);
    }
}
