//! peakpick command-line interface.
//!
//! Inspects detector image series, summarises and exports picked peaks, and
//! runs the q-space analyses on them.
#![allow(clippy::cast_precision_loss)]

mod synth;

use clap::{Parser, Subcommand};
use log::{debug, info};
use peakpick_core::{
    render_rgba, Colormap, DisplayRange, Frame, FrameSource, PixelRegion, SanitizeConfig,
};
use peakpick_io::{
    read_mask_hdf5, read_poni, write_frames_hdf5, write_peaks_csv, write_peaks_hdf5,
    write_qvolume_hdf5, write_ring_csv, Hdf5FrameSeries, PeakFile, QVolumeWriteOptions,
    SeriesLayout, DEFAULT_MASK_DATASET,
};
use peakpick_qspace::{analyze_ring, qtransform_with, RebinOptions};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type for CLI operations.
type Result<T> = std::result::Result<T, CliError>;

/// CLI error types.
#[derive(Error, Debug)]
enum CliError {
    #[error("{0}")]
    PeakpickIo(#[from] peakpick_io::Error),

    #[error("Core error: {0}")]
    Core(#[from] peakpick_core::Error),

    #[error("Q-space error: {0}")]
    QSpace(#[from] peakpick_qspace::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("unsupported output format '{0}' (expected {1})")]
    UnsupportedFormat(String, &'static str),

    #[error("nothing to render: region {0}x{1} is empty")]
    EmptyRegion(usize, usize),
}

/// Inspect XRD/SAXS image series and analyse picked peaks.
#[derive(Parser)]
#[command(name = "peakpick")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Options locating and sanitising frames in an HDF5 series.
#[derive(clap::Args, Debug, Clone)]
struct SeriesArgs {
    /// HDF5 master file
    input: PathBuf,

    /// Group holding the frame datasets
    #[arg(long, default_value = "entry/data")]
    group: String,

    /// Name prefix of the frame datasets
    #[arg(long, default_value = "data")]
    prefix: String,

    /// Counts above this value are treated as invalid and zeroed
    #[arg(long, default_value = "10000")]
    max_valid: i64,

    /// HDF5 file with a 2-D pixel mask; masked pixels are zeroed
    #[arg(long)]
    mask: Option<PathBuf>,

    /// Dataset holding the mask
    #[arg(long, default_value = DEFAULT_MASK_DATASET, requires = "mask")]
    mask_dataset: String,
}

impl SeriesArgs {
    fn open(&self) -> Result<Hdf5FrameSeries> {
        let layout = SeriesLayout::default()
            .with_group(self.group.as_str())
            .with_prefix(self.prefix.as_str());
        debug!("Opening {} ({layout:?})", self.input.display());
        Ok(Hdf5FrameSeries::open_with(&self.input, layout)?)
    }

    fn sanitize(&self) -> SanitizeConfig {
        SanitizeConfig::default().with_max_valid(self.max_valid)
    }

    /// Read a sanitised frame and apply the mask, if any.
    fn read_frame(&self, series: &Hdf5FrameSeries, index: usize) -> Result<Frame> {
        let mut image = series.read_frame(index, &self.sanitize())?;
        if let Some(path) = &self.mask {
            let mask = read_mask_hdf5(path, &self.mask_dataset)?;
            image.apply_mask(&mask)?;
            debug!("Masked {} pixel(s) from {}", mask.count(), path.display());
        }
        Ok(image)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Show the layout of an image series
    Info {
        #[command(flatten)]
        series: SeriesArgs,

        /// Also print statistics of this frame
        #[arg(long)]
        frame: Option<usize>,
    },

    /// Summarise a saved peak file
    Peaks {
        /// Peak file (JSON)
        input: PathBuf,
    },

    /// Export a peak file as CSV rows or an HDF5 patch stack
    Export {
        /// Peak file (JSON)
        input: PathBuf,

        /// Output file (.csv or .h5)
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Estimate the ring width from picked peak pairs
    Ring {
        /// Peak file (JSON)
        input: PathBuf,

        /// PONI calibration file
        #[arg(long)]
        poni: PathBuf,

        /// Centre every pair on its own midpoint
        #[arg(long)]
        corrected: bool,

        /// Write per-point q coordinates to this CSV file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Rebin one frame onto a regular q grid
    Qmap {
        #[command(flatten)]
        series: SeriesArgs,

        /// PONI calibration file
        #[arg(long)]
        poni: PathBuf,

        /// Frame index
        #[arg(long, default_value = "0")]
        frame: usize,

        /// Bin width in inverse angstrom
        #[arg(long, default_value = "0.001")]
        dq: f64,

        /// Sample rotation about the vertical axis (degrees)
        #[arg(long, default_value = "0.0", allow_negative_numbers = true)]
        zrot: f64,

        /// Output HDF5 file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Render a frame region as a colormapped PNG
    Render {
        #[command(flatten)]
        series: SeriesArgs,

        /// Frame index
        #[arg(long, default_value = "0")]
        frame: usize,

        /// Column range
        #[arg(long, num_args = 2, value_names = ["X0", "X1"], allow_negative_numbers = true)]
        xrange: Option<Vec<i64>>,

        /// Row range
        #[arg(long, num_args = 2, value_names = ["Y0", "Y1"], allow_negative_numbers = true)]
        yrange: Option<Vec<i64>>,

        /// Lower end of the colour scale
        #[arg(long, default_value = "0")]
        vmin: f64,

        /// Upper end of the colour scale
        #[arg(long, default_value = "500")]
        vmax: f64,

        /// Colormap (hot, gray, viridis)
        #[arg(long, default_value = "hot")]
        colormap: Colormap,

        /// Output PNG file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Write a synthetic ring series for trying out the picker
    Synth {
        /// Output HDF5 file
        output: PathBuf,

        /// Number of frames
        #[arg(long, default_value = "40")]
        frames: usize,

        /// Frame width in pixels
        #[arg(long, default_value = "512")]
        width: usize,

        /// Frame height in pixels
        #[arg(long, default_value = "512")]
        height: usize,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();

    if let Err(e) = run(cli.command) {
        log::error!("{e}");
        std::process::exit(1);
    }
}

fn run(command: Commands) -> Result<()> {
    match command {
        Commands::Info { series, frame } => cmd_info(&series, frame),
        Commands::Peaks { input } => cmd_peaks(&input),
        Commands::Export { input, output } => cmd_export(&input, &output),
        Commands::Ring {
            input,
            poni,
            corrected,
            output,
        } => cmd_ring(&input, &poni, corrected, output.as_deref()),
        Commands::Qmap {
            series,
            poni,
            frame,
            dq,
            zrot,
            output,
        } => cmd_qmap(&series, &poni, frame, RebinOptions::new(dq).with_zrot(zrot), &output),
        Commands::Render {
            series,
            frame,
            xrange,
            yrange,
            vmin,
            vmax,
            colormap,
            output,
        } => cmd_render(
            &series,
            frame,
            [range_pair(xrange.as_deref()), range_pair(yrange.as_deref())],
            DisplayRange::new(vmin, vmax),
            colormap,
            &output,
        ),
        Commands::Synth {
            output,
            frames,
            width,
            height,
        } => {
            let series = synth::ring_series(width, height, frames);
            write_frames_hdf5(&output, &series)?;
            info!(
                "Wrote {frames} synthetic {width}x{height} frames to {}",
                output.display()
            );
            Ok(())
        }
    }
}

fn range_pair(values: Option<&[i64]>) -> Option<[i64; 2]> {
    match values {
        Some(&[a, b]) => Some([a, b]),
        _ => None,
    }
}

fn cmd_info(args: &SeriesArgs, frame: Option<usize>) -> Result<()> {
    let series = args.open()?;
    let (width, height) = series.frame_shape();

    println!("File: {}", series.path().display());
    println!("Group: {}", series.layout().group);
    println!("Frames: {}", series.frame_count());
    println!("Frame shape: {width} x {height} (width x height)");
    for member in series.members() {
        println!(
            "  {:<16} {:>6} frame(s) from index {} ({}-D)",
            member.name, member.frames, member.first_frame, member.ndim
        );
    }

    if let Some(index) = frame {
        let image = args.read_frame(&series, index)?;
        let stats = image.stats();
        println!("Frame {index}:");
        println!("  Min: {}", stats.min);
        println!("  Max: {}", stats.max);
        println!("  Mean: {:.3}", stats.mean);
        println!(
            "  Non-zero pixels: {} ({:.1}%)",
            stats.nonzero,
            100.0 * stats.nonzero as f64 / (width * height).max(1) as f64
        );
    }
    Ok(())
}

fn cmd_peaks(input: &Path) -> Result<()> {
    let (book, meta) = PeakFile::new(input).load()?;

    println!("File: {}", input.display());
    if let Some(source) = &meta.source {
        println!("Source: {source}");
    }
    println!("Patch size: {}", meta.patch_size.get());
    println!("{:>8} | {:>6} | {:>10}", "Frame", "Peaks", "Max I");
    println!("{:-<30}", "");
    for (frame, peaks) in book.frames() {
        let max_intensity = peaks.iter().map(|p| p.intensity()).max().unwrap_or(0);
        println!("{frame:>8} | {:>6} | {max_intensity:>10}", peaks.len());
    }
    println!(
        "Total: {} peak(s) on {} frame(s)",
        book.total_count(),
        book.frame_count()
    );
    Ok(())
}

fn cmd_export(input: &Path, output: &Path) -> Result<()> {
    let (book, meta) = PeakFile::new(input).load()?;
    match extension(output).as_str() {
        "csv" => write_peaks_csv(output, &book)?,
        "h5" | "hdf5" | "nxs" => write_peaks_hdf5(output, &book, meta.patch_size)?,
        other => return Err(CliError::UnsupportedFormat(other.to_string(), ".csv or .h5")),
    }
    info!(
        "Exported {} peak(s) to {}",
        book.total_count(),
        output.display()
    );
    Ok(())
}

fn cmd_ring(input: &Path, poni: &Path, corrected: bool, output: Option<&Path>) -> Result<()> {
    let (book, _) = PeakFile::new(input).load()?;
    let geometry = read_poni(poni)?;
    debug!("Geometry: {geometry:?}");

    let report = analyze_ring(&geometry, &book, corrected)?;

    println!(
        "{:>4} | {:>6} | {:>8} {:>8} | {:>10} {:>10} {:>10} | {:>10}",
        "Pair", "Frame", "x", "y", "q1", "q2", "q3", "|q|"
    );
    println!("{:-<90}", "");
    for (index, pair) in report.pairs.iter().enumerate() {
        for ((point, q), radius) in pair.points.iter().zip(&pair.q).zip(pair.radii) {
            println!(
                "{index:>4} | {:>6} | {:>8.1} {:>8.1} | {:>10.6} {:>10.6} {:>10.6} | {radius:>10.6}",
                point.frame, point.x, point.y, q.q1, q.q2, q.q3
            );
        }
    }
    if let Some(point) = report.unpaired {
        log::warn!(
            "Ignoring unpaired peak at ({}, {}) in frame {}",
            point.x,
            point.y,
            point.frame
        );
    }
    println!(
        "Radius range: {:.6} - {:.6} 1/A (mean {:.6})",
        report.min_radius,
        report.max_radius,
        report.mean_radius()
    );
    println!(
        "Ring width{}: {:.6} 1/A",
        if corrected { " (corrected)" } else { "" },
        report.width()
    );

    if let Some(path) = output {
        write_ring_csv(path, &report)?;
        info!("Wrote ring coordinates to {}", path.display());
    }
    Ok(())
}

fn cmd_qmap(
    args: &SeriesArgs,
    poni: &Path,
    frame: usize,
    options: RebinOptions,
    output: &Path,
) -> Result<()> {
    let series = args.open()?;
    let geometry = read_poni(poni)?;
    let image = args.read_frame(&series, frame)?;

    let volume = qtransform_with(&image, &geometry, &options)?;
    let [n1, n2, n3] = volume.shape();
    info!(
        "Rebinned frame {frame} onto {n1} x {n2} x {n3} bins ({} filled)",
        volume.filled_bins()
    );
    for (name, axis) in ["q1", "q2", "q3"].iter().zip(&volume.axes) {
        debug!("{name}: {:.6} .. {:.6} 1/A", axis.min, axis.max);
    }

    let write_options = QVolumeWriteOptions {
        frame: Some(frame),
        source: Some(args.input.display().to_string()),
        ..QVolumeWriteOptions::default()
    };
    write_qvolume_hdf5(output, &volume, &write_options)?;
    info!("Wrote q volume to {}", output.display());
    Ok(())
}

fn cmd_render(
    args: &SeriesArgs,
    frame: usize,
    [xrange, yrange]: [Option<[i64; 2]>; 2],
    range: DisplayRange,
    colormap: Colormap,
    output: &Path,
) -> Result<()> {
    let series = args.open()?;
    let image = args.read_frame(&series, frame)?;

    let full = PixelRegion::full(&image);
    let to_i64 = |v: usize| i64::try_from(v).unwrap_or(i64::MAX);
    let region = PixelRegion::from_ranges(
        &image,
        xrange.unwrap_or([0, to_i64(full.x1)]),
        yrange.unwrap_or([0, to_i64(full.y1)]),
    );
    if region.width() == 0 || region.height() == 0 {
        return Err(CliError::EmptyRegion(region.width(), region.height()));
    }

    let pixels = render_rgba(&image, region, range, colormap);
    let width = u32::try_from(region.width()).unwrap_or(u32::MAX);
    let height = u32::try_from(region.height()).unwrap_or(u32::MAX);
    let buffer = image::RgbaImage::from_raw(width, height, pixels)
        .ok_or(CliError::EmptyRegion(region.width(), region.height()))?;
    buffer.save(output)?;
    info!(
        "Rendered frame {frame} region x {}..{} y {}..{} to {}",
        region.x0,
        region.x1,
        region.y0,
        region.y1,
        output.display()
    );
    Ok(())
}

fn extension(path: &Path) -> String {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map_or_else(String::new, str::to_ascii_lowercase)
}
