//! Picking peaks through a session and analysing the resulting ring.

use approx::assert_relative_eq;
use peakpick_core::{MemorySeries, PickingSession, SessionConfig};
use peakpick_qspace::{analyze_ring, det_to_q, Error, Geometry};

fn geometry() -> Geometry {
    Geometry {
        dist: 0.5,
        poni1: 0.005,
        poni2: 0.005,
        rot1: 0.0,
        rot2: 0.0,
        rot3: 0.0,
        pixel1: 1e-4,
        pixel2: 1e-4,
        wavelength: 1.0e-10,
    }
}

/// Frames with a bright ring of radius 30 px around pixel (50, 50).
fn ring_series() -> MemorySeries {
    MemorySeries::from_fn(100, 100, 5, |_, x, y| {
        let dx = x as f64 - 50.0;
        let dy = y as f64 - 50.0;
        if ((dx * dx + dy * dy).sqrt() - 30.0).abs() < 1.0 {
            1000
        } else {
            1
        }
    })
}

#[test]
fn test_ring_width_from_picked_pairs() {
    let mut session = PickingSession::new(ring_series(), SessionConfig::default()).unwrap();
    session.add_peak(80, 50).unwrap();
    session.add_peak(20, 50).unwrap();
    session.set_current_frame(4).unwrap();
    session.add_peak(50, 80).unwrap();
    session.add_peak(50, 21).unwrap();

    let report = analyze_ring(&geometry(), session.book(), false).unwrap();
    assert_eq!(report.pairs.len(), 2);
    assert_eq!(report.pairs[1].points[0].frame, 4);
    assert!(report.unpaired.is_none());

    let r30 = det_to_q(&geometry(), 50.0, 80.0, 0.0).in_plane_norm();
    let r29 = det_to_q(&geometry(), 21.0, 50.0, 0.0).in_plane_norm();
    assert_relative_eq!(report.max_radius, r30, max_relative = 1e-9);
    assert_relative_eq!(report.min_radius, r29, max_relative = 1e-9);
    assert_relative_eq!(report.width(), r30 - r29, max_relative = 1e-9);
}

#[test]
fn test_empty_book_is_rejected() {
    let session = PickingSession::new(ring_series(), SessionConfig::default()).unwrap();
    assert_eq!(
        analyze_ring(&geometry(), session.book(), true),
        Err(Error::NotEnoughPeaks(0))
    );
}
