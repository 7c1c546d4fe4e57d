//! Peak file persistence and tabular export.

use crate::{Error, Result};
use peakpick_core::{PatchSize, PeakBook};
use peakpick_qspace::RingReport;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Current peak file format version.
pub const PEAK_FILE_VERSION: u32 = 1;

/// Descriptive fields stored next to the peaks.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeakFileMeta {
    /// Image series the peaks were picked on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Patch edge length used while picking.
    pub patch_size: PatchSize,
}

impl PeakFileMeta {
    #[must_use]
    pub fn new(source: Option<String>, patch_size: PatchSize) -> Self {
        Self { source, patch_size }
    }
}

#[derive(Serialize)]
struct PeakDocumentRef<'a> {
    format_version: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    source: Option<&'a str>,
    patch_size: PatchSize,
    frames: &'a PeakBook,
}

#[derive(Deserialize)]
struct PeakDocument {
    format_version: u32,
    #[serde(default)]
    source: Option<String>,
    patch_size: PatchSize,
    frames: PeakBook,
}

/// A JSON peak file on disk.
///
/// ```json
/// {
///   "format_version": 1,
///   "source": "scan_master.h5",
///   "patch_size": 9,
///   "frames": { "40": [ { "x": 1520, "y": 1930, "patch": { "size": 9, "data": [...] } } ] }
/// }
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PeakFile {
    path: PathBuf,
}

impl PeakFile {
    #[must_use]
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Write the book, replacing any existing file.
    ///
    /// Missing parent directories are created. The document is written to a
    /// sibling temporary file first and renamed over the target, so an
    /// interrupted save never leaves a truncated peak file behind.
    ///
    /// # Errors
    /// Returns an error if serialisation or any filesystem operation fails.
    pub fn save(&self, book: &PeakBook, meta: &PeakFileMeta) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let document = PeakDocumentRef {
            format_version: PEAK_FILE_VERSION,
            source: meta.source.as_deref(),
            patch_size: meta.patch_size,
            frames: book,
        };

        let tmp = self.temp_path();
        if let Err(e) = write_json(&tmp, &document) {
            let _ = fs::remove_file(&tmp);
            return Err(e);
        }
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    /// Read the book and its metadata.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed, or was written
    /// with an unknown format version.
    pub fn load(&self) -> Result<(PeakBook, PeakFileMeta)> {
        let text = fs::read_to_string(&self.path)?;
        let document: PeakDocument = serde_json::from_str(&text)?;
        if document.format_version != PEAK_FILE_VERSION {
            return Err(Error::InvalidFormat(format!(
                "unsupported peak file version {} (expected {PEAK_FILE_VERSION})",
                document.format_version
            )));
        }
        let meta = PeakFileMeta::new(document.source, document.patch_size);
        Ok((document.frames, meta))
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(std::ffi::OsStr::to_os_string)
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let mut writer = BufWriter::new(fs::File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    writer.get_ref().sync_all()?;
    Ok(())
}

#[derive(Serialize)]
struct PeakRow {
    frame: usize,
    x: i64,
    y: i64,
    intensity: i32,
}

/// Write one `frame,x,y,intensity` row per peak.
///
/// # Errors
/// Returns an error if the file cannot be written.
pub fn write_peaks_csv<P: AsRef<Path>>(path: P, book: &PeakBook) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    for (frame, peak) in book.flattened() {
        wtr.serialize(PeakRow {
            frame,
            x: peak.x,
            y: peak.y,
            intensity: peak.intensity(),
        })?;
    }
    // Empty books still get a header.
    if book.is_empty() {
        wtr.write_record(["frame", "x", "y", "intensity"])?;
    }
    wtr.flush()?;
    Ok(())
}

#[derive(Serialize)]
struct RingRow {
    pair: usize,
    frame: usize,
    x: f64,
    y: f64,
    q1: f64,
    q2: f64,
    q3: f64,
    radius: f64,
}

/// Write the per-point q coordinates of a ring analysis.
///
/// # Errors
/// Returns an error if the file cannot be written.
pub fn write_ring_csv<P: AsRef<Path>>(path: P, report: &RingReport) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    for (pair_index, pair) in report.pairs.iter().enumerate() {
        for ((point, q), radius) in pair.points.iter().zip(&pair.q).zip(pair.radii) {
            wtr.serialize(RingRow {
                pair: pair_index,
                frame: point.frame,
                x: point.x,
                y: point.y,
                q1: q.q1,
                q2: q.q2,
                q3: q.q3,
                radius,
            })?;
        }
    }
    wtr.flush()?;
    Ok(())
}
