//! peakpick-io: File I/O for peakpick.
//!
//! This crate reads detector image series from HDF5/NeXus master files,
//! persists picked peaks as JSON, exports peaks and ring analyses as CSV or
//! HDF5, and parses PONI calibration files.
//!

mod error;
#[cfg(feature = "hdf5")]
pub mod hdf5;
pub mod poni;
pub mod store;

pub use error::{Error, Result};
#[cfg(feature = "hdf5")]
pub use hdf5::{
    read_mask_hdf5, read_peaks_hdf5, read_qvolume_hdf5, write_frames_hdf5, write_mask_hdf5,
    write_peaks_hdf5, write_qvolume_hdf5, Hdf5FrameSeries, QVolumeWriteOptions, SeriesLayout,
    SeriesMember, DEFAULT_MASK_DATASET,
};
pub use poni::{parse_poni, read_poni};
pub use store::{write_peaks_csv, write_ring_csv, PeakFile, PeakFileMeta, PEAK_FILE_VERSION};
