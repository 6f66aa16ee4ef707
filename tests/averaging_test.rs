//! Behavioral tests for counter unwrapping and windowed averaging,
//! driven through the public session API the way the BLE layer drives
//! it: one frame at a time, in arrival order.

use spindash::csc::{
    AveragerConfig, CscSession, DecodeError, ExtendedCounter, RateAverager,
};

fn wheel_frame(revolutions: u32, event_time: u16) -> Vec<u8> {
    let mut frame = vec![0x01];
    frame.extend_from_slice(&revolutions.to_le_bytes());
    frame.extend_from_slice(&event_time.to_le_bytes());
    frame
}

fn crank_frame(revolutions: u16, event_time: u16) -> Vec<u8> {
    let mut frame = vec![0x02];
    frame.extend_from_slice(&revolutions.to_le_bytes());
    frame.extend_from_slice(&event_time.to_le_bytes());
    frame
}

// =============================================================================
// Counter unwrapping
// =============================================================================

#[test]
fn test_wraparound_monotonicity() {
    let mut counter = ExtendedCounter::new(16);
    let raw = [65530u64, 65533, 2, 10];
    let expected = [65530u64, 65533, 65538, 65546];

    let mut previous = 0;
    for (raw, expected) in raw.iter().zip(expected.iter()) {
        let extended = counter.extend(*raw);
        assert_eq!(extended, *expected);
        assert!(extended >= previous);
        previous = extended;
    }
}

#[test]
fn test_tracker_repeat_is_noop() {
    let mut counter = ExtendedCounter::new(16);
    assert_eq!(counter.extend(42), 42);
    assert_eq!(counter.extend(42), 42);
}

// =============================================================================
// Windowed averaging
// =============================================================================

#[test]
fn test_cold_start_is_idempotent() {
    for (tick, count) in [(0u64, 0u64), (999_999, 123), (1, u32::MAX as u64)] {
        let mut avg = RateAverager::new(AveragerConfig::default());
        assert_eq!(avg.observe(tick, count).unwrap(), (0.0, 0));
    }
}

#[test]
fn test_steady_two_rps_converges() {
    // 2 rotations/s: events every 0.5 s (512 ticks), one rotation apart,
    // over more than one 3 s window.
    let mut avg = RateAverager::new(AveragerConfig::default());
    let mut rate = 0.0;
    for i in 0..12u64 {
        rate = avg.observe(i * 512, i).unwrap().0;
    }
    assert!((rate - 2.0).abs() < 1e-9);
}

#[test]
fn test_averager_duplicate_count_keeps_last_average() {
    let mut avg = RateAverager::new(AveragerConfig::default());
    for i in 0..5u64 {
        avg.observe(i * 512, i).unwrap();
    }
    let baseline = avg.observe(5 * 512, 5).unwrap();

    // Sensor keeps notifying without new events.
    for extra in 1..4u64 {
        let repeat = avg.observe(5 * 512 + extra * 100, 5).unwrap();
        assert_eq!(repeat, baseline);
    }
    assert_eq!(avg.cumulative_rotations(), 5);
}

#[test]
fn test_expired_segments_carry_no_weight() {
    let mut avg = RateAverager::new(AveragerConfig::default());
    for i in 0..6u64 {
        avg.observe(i * 512, i).unwrap();
    }

    // Next event lands 60 s later: every 2 rps segment has expired, so
    // only the near-zero gap segment shapes the average.
    let late_tick = 5 * 512 + 60 * 1024;
    let (rate, total) = avg.observe(late_tick, 6).unwrap();
    assert_eq!(total, 6);
    let gap_rate = 1024.0 / (60.0 * 1024.0);
    assert!((rate - gap_rate).abs() < 1e-12);
    assert_eq!(avg.segment_count(), 1);
}

// =============================================================================
// Session end to end
// =============================================================================

#[test]
fn test_session_wheel_ride_with_rollover() {
    let mut session = CscSession::with_defaults();

    // Ride up to the 16-bit event time rollover at a steady 2 rps.
    let mut update = session.process_frame(&wheel_frame(0, 65022)).unwrap();
    for i in 1..6u32 {
        let time = 65022u32 + i * 512;
        update = session
            .process_frame(&wheel_frame(i, (time % 65536) as u16))
            .unwrap();
    }

    assert!((update.wheel_rps - 2.0).abs() < 1e-9);
    assert_eq!(update.rotations, 5);
    assert_eq!(session.wheel_rotations(), 5);
}

#[test]
fn test_session_emits_zero_for_absent_part() {
    let mut session = CscSession::with_defaults();
    session.process_frame(&crank_frame(10, 0)).unwrap();
    let update = session.process_frame(&crank_frame(11, 1024)).unwrap();

    assert_eq!(update.wheel_rps, 0.0);
    assert!((update.crank_rps - 1.0).abs() < 1e-9);
    assert_eq!(update.rotations, 1);
}

#[test]
fn test_session_survives_malformed_frames() {
    let mut session = CscSession::with_defaults();
    session.process_frame(&wheel_frame(0, 0)).unwrap();

    assert!(matches!(
        session.process_frame(&[]),
        Err(DecodeError::TooShort { .. })
    ));
    assert!(matches!(
        session.process_frame(&[0x01, 0xFF]),
        Err(DecodeError::TooShort { .. })
    ));

    // The stream picks up exactly where it left off.
    let update = session.process_frame(&wheel_frame(1, 512)).unwrap();
    assert!((update.wheel_rps - 2.0).abs() < 1e-9);
    assert_eq!(update.rotations, 1);
}

#[test]
fn test_session_duplicate_frames_between_events() {
    let mut session = CscSession::with_defaults();
    session.process_frame(&wheel_frame(7, 100)).unwrap();
    session.process_frame(&wheel_frame(8, 612)).unwrap();

    // The sensor notifies faster than the wheel turns; identical frames
    // must not manufacture rotations.
    let a = session.process_frame(&wheel_frame(8, 612)).unwrap();
    let b = session.process_frame(&wheel_frame(8, 612)).unwrap();
    assert_eq!(a, b);
    assert_eq!(session.wheel_rotations(), 1);
}
