//! Saving a picking session and resuming it from the peak file.

use peakpick_core::{MemorySeries, PatchSize, PickingSession, SessionConfig};
use peakpick_io::{PeakFile, PeakFileMeta};

fn series() -> MemorySeries {
    MemorySeries::from_fn(32, 32, 100, |i, x, y| ((i + x + y) % 50) as i64)
}

#[test]
fn test_resume_continues_where_saved() {
    let dir = tempfile::tempdir().unwrap();
    let file = PeakFile::new(dir.path().join("peaks.json"));
    let config = SessionConfig::default().with_patch_size(PatchSize::try_from(5).unwrap());

    let mut session = PickingSession::new(series(), config).unwrap();
    session.set_current_frame(40).unwrap();
    session.add_peak(10, 12).unwrap();
    session.add_peak(20, 22).unwrap();
    assert!(session.is_dirty());

    let meta = PeakFileMeta::new(Some("series".to_string()), config.patch_size);
    file.save(session.book(), &meta).unwrap();
    session.mark_saved();
    assert!(!session.is_dirty());

    let (book, loaded_meta) = file.load().unwrap();
    assert_eq!(loaded_meta.patch_size.get(), 5);

    let mut resumed = PickingSession::new(series(), config)
        .unwrap()
        .with_book(book);
    resumed.set_current_frame(40).unwrap();
    assert_eq!(resumed.peaks_for_current_frame().len(), 2);
    assert!(!resumed.is_dirty());

    let popped = resumed.undo_peak().unwrap();
    assert_eq!(popped.coordinate(), (20, 22));
    assert_eq!(resumed.total_peak_count(), 1);
    assert!(resumed.is_dirty());
}

#[test]
fn test_load_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let file = PeakFile::new(dir.path().join("absent.json"));
    assert!(matches!(file.load(), Err(peakpick_io::Error::Io(_))));
}
