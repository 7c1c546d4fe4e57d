//! HDF5 / NeXus support: detector image series and analysis results.

use crate::{Error, Result};
use hdf5::types::{H5Type, VarLenUnicode};
use hdf5::{Dataset, File, Group};
use ndarray::{s, Array2, ArrayView, ArrayView1, Ix2, Ix3};
use peakpick_core::{
    Frame, FrameSource, MemorySeries, Patch, PatchSize, Peak, PeakBook, PixelMask,
    SanitizeConfig,
};
use peakpick_qspace::{QAxis, QVolume};
use std::path::{Path, PathBuf};
use std::str::FromStr;

const FORMAT_VERSION: &str = "0.1";
const QVOLUME_AXES: [&str; 3] = ["q1", "q2", "q3"];

/// Dataset written by [`write_mask_hdf5`].
pub const DEFAULT_MASK_DATASET: &str = "mask";

/// Where the frame datasets of a series live inside a file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SeriesLayout {
    /// Group holding the frame datasets.
    pub group: String,
    /// Only members whose name starts with this prefix are frame datasets.
    pub prefix: String,
}

impl Default for SeriesLayout {
    fn default() -> Self {
        Self {
            group: "entry/data".to_string(),
            prefix: "data".to_string(),
        }
    }
}

impl SeriesLayout {
    #[must_use]
    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = group.into();
        self
    }

    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }
}

/// One dataset contributing frames to a series.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SeriesMember {
    pub name: String,
    /// Number of frames stored in this dataset.
    pub frames: usize,
    /// Series index of the dataset's first frame.
    pub first_frame: usize,
    /// 3 for a frame stack, 2 for a single image.
    pub ndim: usize,
}

/// A detector image series stored in an HDF5 master file.
///
/// Eiger-style master files keep their frames in `entry/data/data_NNNNNN`,
/// usually as external links to separate data files. Members are concatenated
/// in name order. Frames are read lazily, one hyperslab at a time.
pub struct Hdf5FrameSeries {
    path: PathBuf,
    layout: SeriesLayout,
    datasets: Vec<Dataset>,
    members: Vec<SeriesMember>,
    width: usize,
    height: usize,
    total: usize,
}

impl Hdf5FrameSeries {
    /// Open a series with the default layout.
    ///
    /// # Errors
    /// See [`Hdf5FrameSeries::open_with`].
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with(path, SeriesLayout::default())
    }

    /// Open a series with an explicit layout.
    ///
    /// # Errors
    /// Returns an error if the file or group cannot be opened, no member
    /// dataset matches, a dataset is not 2-D or 3-D, or frame shapes differ.
    pub fn open_with<P: AsRef<Path>>(path: P, layout: SeriesLayout) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path)?;
        let group = file.group(&layout.group)?;

        let mut names: Vec<String> = group
            .member_names()?
            .into_iter()
            .filter(|name| name.starts_with(&layout.prefix))
            .collect();
        names.sort();
        if names.is_empty() {
            return Err(Error::InvalidFormat(format!(
                "no datasets named {}* in group {}",
                layout.prefix, layout.group
            )));
        }

        let mut datasets = Vec::with_capacity(names.len());
        let mut members = Vec::with_capacity(names.len());
        let mut frame_shape: Option<(usize, usize)> = None;
        let mut total = 0;

        for name in names {
            let dataset = group.dataset(&name)?;
            let dims = dataset.shape();
            let (frames, height, width) = match dims.as_slice() {
                [n, h, w] => (*n, *h, *w),
                [h, w] => (1, *h, *w),
                _ => {
                    return Err(Error::InvalidFormat(format!(
                        "dataset {name} has {} dimensions, expected 2 or 3",
                        dims.len()
                    )))
                }
            };
            match frame_shape {
                None => frame_shape = Some((width, height)),
                Some(shape) if shape != (width, height) => {
                    return Err(Error::InvalidFormat(format!(
                        "dataset {name} has frames of {width}x{height}, expected {}x{}",
                        shape.0, shape.1
                    )));
                }
                Some(_) => {}
            }
            members.push(SeriesMember {
                name,
                frames,
                first_frame: total,
                ndim: dims.len(),
            });
            datasets.push(dataset);
            total += frames;
        }

        let (width, height) = frame_shape.unwrap_or((0, 0));
        Ok(Self {
            path,
            layout,
            datasets,
            members,
            width,
            height,
            total,
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn layout(&self) -> &SeriesLayout {
        &self.layout
    }

    #[must_use]
    pub fn members(&self) -> &[SeriesMember] {
        &self.members
    }

    /// Read one frame without sanitising.
    ///
    /// # Errors
    /// Returns an error if `index` is out of range or the read fails.
    pub fn read_raw_frame(&self, index: usize) -> Result<Vec<i64>> {
        let pos = self
            .members
            .partition_point(|m| m.first_frame + m.frames <= index);
        let (member, dataset) = self
            .members
            .get(pos)
            .zip(self.datasets.get(pos))
            .ok_or(peakpick_core::Error::FrameOutOfRange {
                index,
                first: 0,
                last: self.total.saturating_sub(1),
            })?;

        let image: Array2<i64> = if member.ndim == 3 {
            dataset.read_slice::<i64, _, Ix2>(s![index - member.first_frame, .., ..])?
        } else {
            dataset.read_2d::<i64>()?
        };
        Ok(image.iter().copied().collect())
    }
}

impl FrameSource for Hdf5FrameSeries {
    fn frame_count(&self) -> usize {
        self.total
    }

    fn frame_shape(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    fn read_frame(
        &self,
        index: usize,
        sanitize: &SanitizeConfig,
    ) -> peakpick_core::Result<Frame> {
        let raw = self.read_raw_frame(index).map_err(|e| match e {
            Error::CoreError(core) => core,
            other => peakpick_core::Error::Source(other.to_string()),
        })?;
        Frame::from_raw(self.width, self.height, &raw, sanitize)
    }
}

/// Write raw frames as a `(frames, height, width)` stack at `entry/data/data`.
///
/// # Errors
/// Returns an error if the series is empty or HDF5 I/O fails.
pub fn write_frames_hdf5<P: AsRef<Path>>(path: P, series: &MemorySeries) -> Result<()> {
    let (width, height) = series.frame_shape();
    let count = series.frame_count();
    if count == 0 {
        return Err(peakpick_core::Error::EmptySeries.into());
    }

    let file = File::create(path)?;
    set_attr_str_file(&file, "peakpick_format_version", FORMAT_VERSION)?;
    let entry = file.create_group("entry")?;
    set_attr_str_group(&entry, "NX_class", "NXentry")?;
    let data = entry.create_group("data")?;
    set_attr_str_group(&data, "NX_class", "NXdata")?;
    set_attr_str_group(&data, "signal", "data")?;

    let dataset = create_fixed_dataset::<i64, _>(
        &data,
        "data",
        (count, height, width),
        Some([1, height.max(1), width.max(1)]),
        Some(1),
        true,
    )?;
    for (i, raw) in series.raw_frames().iter().enumerate() {
        let view = ArrayView::from_shape((height, width), raw.as_slice())
            .map_err(|e| Error::InvalidFormat(format!("frame shape mismatch: {e}")))?;
        dataset.write_slice(view, s![i, .., ..])?;
    }
    Ok(())
}

/// Read a 2-D pixel mask; any non-zero value marks a masked pixel.
///
/// `dataset` is a path inside the file, e.g. `mask` or
/// `entry/instrument/detector/pixel_mask`.
///
/// # Errors
/// Returns an error if the dataset is missing, not 2-D, or HDF5 I/O fails.
pub fn read_mask_hdf5<P: AsRef<Path>>(path: P, dataset: &str) -> Result<PixelMask> {
    let file = File::open(path)?;
    let dataset = file.dataset(dataset)?;
    if dataset.ndim() != 2 {
        return Err(Error::InvalidFormat(format!(
            "mask {} must be 2-D, found {} dimension(s)",
            dataset.name(),
            dataset.ndim()
        )));
    }
    let values: Array2<i64> = dataset.read_2d::<i64>()?;
    let (height, width) = values.dim();
    let flat: Vec<i64> = values.iter().copied().collect();
    Ok(PixelMask::from_values(width, height, &flat)?)
}

/// Write a mask as a `(height, width)` `u8` dataset at [`DEFAULT_MASK_DATASET`].
///
/// # Errors
/// Returns an error if HDF5 I/O fails.
pub fn write_mask_hdf5<P: AsRef<Path>>(path: P, mask: &PixelMask) -> Result<()> {
    let (width, height) = (mask.width(), mask.height());
    let mut values = Vec::with_capacity(width * height);
    for y in 0..height {
        for x in 0..width {
            values.push(u8::from(mask.is_masked(x, y)));
        }
    }

    let file = File::create(path)?;
    set_attr_str_file(&file, "peakpick_format_version", FORMAT_VERSION)?;
    let dataset = file
        .new_dataset::<u8>()
        .shape((height, width))
        .create(DEFAULT_MASK_DATASET)?;
    let view = ArrayView::from_shape((height, width), values.as_slice())
        .map_err(|e| Error::InvalidFormat(format!("mask shape mismatch: {e}")))?;
    dataset.write(view)?;
    Ok(())
}

/// Q-volume write configuration.
#[derive(Clone, Debug)]
pub struct QVolumeWriteOptions {
    pub compression: Option<u8>,
    pub shuffle: bool,
    /// Series frame the volume was computed from.
    pub frame: Option<usize>,
    /// Image series the frame came from.
    pub source: Option<String>,
}

impl Default for QVolumeWriteOptions {
    fn default() -> Self {
        Self {
            compression: Some(1),
            shuffle: true,
            frame: None,
            source: None,
        }
    }
}

/// Write a rebinned q volume as NeXus `NXdata` at `entry/qvolume`.
///
/// Axes are stored as bin edges in inverse angstrom.
///
/// # Errors
/// Returns an error if HDF5 I/O fails.
pub fn write_qvolume_hdf5<P: AsRef<Path>>(
    path: P,
    volume: &QVolume,
    options: &QVolumeWriteOptions,
) -> Result<()> {
    let file = File::create(path)?;
    set_attr_str_file(&file, "peakpick_format_version", FORMAT_VERSION)?;

    let entry = file.create_group("entry")?;
    set_attr_str_group(&entry, "NX_class", "NXentry")?;

    let group = entry.create_group("qvolume")?;
    set_attr_str_group(&group, "NX_class", "NXdata")?;
    set_attr_str_group(&group, "signal", "intensity")?;
    set_axes_attr(&group, &QVOLUME_AXES)?;
    for (index, axis) in (0i32..).zip(QVOLUME_AXES) {
        set_axis_indices(&group, axis, index)?;
    }
    if let Some(frame) = options.frame {
        group
            .new_attr::<u64>()
            .create("frame")?
            .write_scalar(&(frame as u64))?;
    }
    if let Some(source) = &options.source {
        set_attr_str_group(&group, "source", source)?;
    }

    let [n1, n2, n3] = volume.shape();
    let chunk = Some([1, n2, n3]);

    let intensity = create_fixed_dataset::<f64, _>(
        &group,
        "intensity",
        (n1, n2, n3),
        chunk,
        options.compression,
        options.shuffle,
    )?;
    intensity.write(volume.intensity.view())?;

    let counts = create_fixed_dataset::<u32, _>(
        &group,
        "counts",
        (n1, n2, n3),
        chunk,
        options.compression,
        options.shuffle,
    )?;
    counts.write(volume.counts.view())?;
    set_dataset_units(&counts, "pixel")?;

    for (name, axis) in QVOLUME_AXES.iter().zip(&volume.axes) {
        let edges = axis.edges();
        let dataset =
            create_fixed_dataset::<f64, _>(&group, name, (edges.len(),), None, None, false)?;
        dataset.write(ArrayView1::from(edges.as_slice()))?;
        set_dataset_units(&dataset, "1/angstrom")?;
    }
    Ok(())
}

/// Read a volume written by [`write_qvolume_hdf5`].
///
/// # Errors
/// Returns an error if HDF5 I/O fails or the datasets are inconsistent.
pub fn read_qvolume_hdf5<P: AsRef<Path>>(path: P) -> Result<QVolume> {
    let file = File::open(path)?;
    let group = file.group("entry/qvolume")?;

    let intensity = group.dataset("intensity")?.read::<f64, Ix3>()?;
    let counts = group.dataset("counts")?.read::<u32, Ix3>()?;
    if intensity.shape() != counts.shape() {
        return Err(Error::InvalidFormat(
            "intensity and counts shapes differ".to_string(),
        ));
    }

    let mut axes = [QAxis {
        min: 0.0,
        max: 0.0,
        bins: 1,
    }; 3];
    for (dim, (axis, name)) in axes.iter_mut().zip(QVOLUME_AXES).enumerate() {
        let edges = read_dataset_vec::<f64>(&group, name)?;
        let bins = intensity.shape()[dim];
        if edges.len() != bins + 1 {
            return Err(Error::InvalidFormat(format!(
                "axis {name} has {} edges, expected {}",
                edges.len(),
                bins + 1
            )));
        }
        *axis = QAxis {
            min: edges[0],
            max: edges[bins],
            bins,
        };
    }

    Ok(QVolume {
        axes,
        intensity,
        counts,
    })
}

/// Write all peaks of a book to `entry/peaks`.
///
/// Stores `frame`, `x`, `y` and `intensity` vectors and the patches as a
/// `(n, size, size)` stack.
///
/// # Errors
/// Returns an error if peaks carry different patch sizes or HDF5 I/O fails.
pub fn write_peaks_hdf5<P: AsRef<Path>>(path: P, book: &PeakBook, size: PatchSize) -> Result<()> {
    let n = size.get();
    let count = book.total_count();
    let mut frames = Vec::with_capacity(count);
    let mut xs = Vec::with_capacity(count);
    let mut ys = Vec::with_capacity(count);
    let mut intensities = Vec::with_capacity(count);
    let mut patches = Vec::with_capacity(count * n * n);

    for (frame, peak) in book.flattened() {
        if peak.patch.size() != size {
            return Err(Error::InvalidFormat(format!(
                "peak at ({}, {}) in frame {frame} has patch size {}, expected {n}",
                peak.x,
                peak.y,
                peak.patch.size().get()
            )));
        }
        frames.push(frame as u64);
        xs.push(peak.x);
        ys.push(peak.y);
        intensities.push(peak.intensity());
        patches.extend_from_slice(peak.patch.data());
    }

    let file = File::create(path)?;
    set_attr_str_file(&file, "peakpick_format_version", FORMAT_VERSION)?;
    let entry = file.create_group("entry")?;
    set_attr_str_group(&entry, "NX_class", "NXentry")?;
    let group = entry.create_group("peaks")?;
    set_attr_str_group(&group, "NX_class", "NXcollection")?;
    group
        .new_attr::<u64>()
        .create("patch_size")?
        .write_scalar(&(n as u64))?;

    write_vec(&group, "frame", &frames)?;
    write_vec(&group, "x", &xs)?;
    write_vec(&group, "y", &ys)?;
    write_vec(&group, "intensity", &intensities)?;

    let patch_ds = create_fixed_dataset::<i32, _>(&group, "patches", (count, n, n), None, None, false)?;
    if count > 0 {
        let view = ArrayView::from_shape((count, n, n), patches.as_slice())
            .map_err(|e| Error::InvalidFormat(format!("patch stack shape mismatch: {e}")))?;
        patch_ds.write(view)?;
    }
    Ok(())
}

/// Read peaks written by [`write_peaks_hdf5`].
///
/// # Errors
/// Returns an error if HDF5 I/O fails or the datasets are inconsistent.
#[allow(clippy::cast_possible_truncation)]
pub fn read_peaks_hdf5<P: AsRef<Path>>(path: P) -> Result<PeakBook> {
    let file = File::open(path)?;
    let group = file.group("entry/peaks")?;
    let n = group.attr("patch_size")?.read_scalar::<u64>()? as usize;
    let size = PatchSize::try_from(n)?;

    let frames = read_dataset_vec::<u64>(&group, "frame")?;
    let xs = read_dataset_vec::<i64>(&group, "x")?;
    let ys = read_dataset_vec::<i64>(&group, "y")?;
    let count = frames.len();
    if xs.len() != count || ys.len() != count {
        return Err(Error::InvalidFormat(
            "peak vectors have different lengths".to_string(),
        ));
    }

    let patches = if count > 0 {
        read_dataset_vec::<i32>(&group, "patches")?
    } else {
        Vec::new()
    };
    if patches.len() != count * n * n {
        return Err(Error::InvalidFormat(format!(
            "patch stack holds {} values, expected {}",
            patches.len(),
            count * n * n
        )));
    }

    let mut book = PeakBook::new();
    let chunks = patches.chunks_exact((n * n).max(1));
    for (((frame, x), y), data) in frames.into_iter().zip(xs).zip(ys).zip(chunks) {
        let patch = Patch::new(size, data.to_vec())?;
        book.push(frame as usize, Peak::new(x, y, patch));
    }
    Ok(book)
}

fn write_vec<T: H5Type>(group: &Group, name: &str, data: &[T]) -> Result<()> {
    let dataset = create_fixed_dataset::<T, _>(group, name, (data.len(),), None, None, false)?;
    if !data.is_empty() {
        dataset.write(ArrayView1::from(data))?;
    }
    Ok(())
}

fn create_fixed_dataset<T: H5Type, S>(
    group: &Group,
    name: &str,
    shape: S,
    chunk: Option<[usize; 3]>,
    compression: Option<u8>,
    shuffle: bool,
) -> Result<Dataset>
where
    S: Into<hdf5::Extents>,
{
    let mut builder = group.new_dataset::<T>().shape(shape);

    if let Some(chunk_shape) = chunk {
        builder = builder.chunk(chunk_shape);
    }

    if let Some(level) = compression {
        builder = builder.deflate(level);
    }

    if shuffle {
        builder = builder.shuffle();
    }

    Ok(builder.create(name)?)
}

fn set_axes_attr(group: &Group, axes: &[&str]) -> Result<()> {
    let values: Vec<VarLenUnicode> = axes
        .iter()
        .map(|axis| to_var_len_unicode(axis))
        .collect::<Result<Vec<_>>>()?;
    let attr = group
        .new_attr::<VarLenUnicode>()
        .shape((values.len(),))
        .create("axes")?;
    attr.write(ArrayView1::from(values.as_slice()))?;
    Ok(())
}

fn set_axis_indices(group: &Group, name: &str, index: i32) -> Result<()> {
    let attr_name = format!("{name}_indices");
    group
        .new_attr::<i32>()
        .create(attr_name.as_str())?
        .write_scalar(&index)?;
    Ok(())
}

fn set_dataset_units(dataset: &Dataset, units: &str) -> Result<()> {
    let value = to_var_len_unicode(units)?;
    dataset
        .new_attr::<VarLenUnicode>()
        .create("units")?
        .write_scalar(&value)?;
    Ok(())
}

fn set_attr_str_file(file: &File, name: &str, value: &str) -> Result<()> {
    let value = to_var_len_unicode(value)?;
    file.new_attr::<VarLenUnicode>()
        .create(name)?
        .write_scalar(&value)?;
    Ok(())
}

fn set_attr_str_group(group: &Group, name: &str, value: &str) -> Result<()> {
    let value = to_var_len_unicode(value)?;
    group
        .new_attr::<VarLenUnicode>()
        .create(name)?
        .write_scalar(&value)?;
    Ok(())
}

fn read_dataset_vec<T: H5Type>(group: &Group, name: &str) -> Result<Vec<T>> {
    let dataset = group.dataset(name)?;
    Ok(dataset.read_raw::<T>()?)
}

fn to_var_len_unicode(value: &str) -> Result<VarLenUnicode> {
    VarLenUnicode::from_str(value)
        .map_err(|e| Error::InvalidFormat(format!("invalid utf-8 attribute: {e}")))
}
