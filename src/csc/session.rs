//! Per-connection CSC processing session.
//!
//! Ties the decoder, counter trackers, and averagers together behind a
//! single entry point: one call per received frame, in arrival order.

use crate::csc::averager::{AveragerConfig, RateAverager};
use crate::csc::counter::ExtendedCounter;
use crate::csc::error::DecodeResult;
use crate::csc::measurement::decode_csc_measurement;

/// Event time fields are 16-bit (1/1024 s units).
const EVENT_TIME_BITS: u8 = 16;
/// Cumulative wheel revolutions are 32-bit.
const WHEEL_REV_BITS: u8 = 32;
/// Cumulative crank revolutions are 16-bit.
const CRANK_REV_BITS: u8 = 16;

/// Result of processing one measurement frame.
///
/// The rate for a part not present in the frame is `0.0`; callers that
/// need to distinguish "no signal" from "zero speed" dispatch on the
/// sensor's location instead.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CscUpdate {
    /// Windowed average wheel rotation rate, rotations per second
    pub wheel_rps: f64,
    /// Windowed average crank rotation rate, rotations per second
    pub crank_rps: f64,
    /// Cumulative rotations of the part that fired in this frame
    pub rotations: u64,
}

/// Decoding and averaging state for one connected CSC sensor.
///
/// Wheel and crank each own an independent tracker pair and averager;
/// nothing is shared between them or across sessions.
pub struct CscSession {
    wheel_time: ExtendedCounter,
    wheel_revs: ExtendedCounter,
    wheel_avg: RateAverager,
    crank_time: ExtendedCounter,
    crank_revs: ExtendedCounter,
    crank_avg: RateAverager,
}

impl CscSession {
    /// Create a session with the given averaging configuration.
    pub fn new(config: AveragerConfig) -> Self {
        Self {
            wheel_time: ExtendedCounter::new(EVENT_TIME_BITS),
            wheel_revs: ExtendedCounter::new(WHEEL_REV_BITS),
            wheel_avg: RateAverager::new(config),
            crank_time: ExtendedCounter::new(EVENT_TIME_BITS),
            crank_revs: ExtendedCounter::new(CRANK_REV_BITS),
            crank_avg: RateAverager::new(config),
        }
    }

    /// Create a session with the default 3-second window.
    pub fn with_defaults() -> Self {
        Self::new(AveragerConfig::default())
    }

    /// Decode one raw measurement frame and fold it into the averages.
    ///
    /// Must be called once per frame, in arrival order: counter
    /// unwrapping reads a late frame as a wrap or as time running
    /// backwards. A rejected frame leaves all session state untouched —
    /// counters are committed only after the averager accepts the pair —
    /// so the caller just logs and skips it.
    pub fn process_frame(&mut self, frame: &[u8]) -> DecodeResult<CscUpdate> {
        let measurement = decode_csc_measurement(frame)?;
        let mut update = CscUpdate {
            wheel_rps: 0.0,
            crank_rps: 0.0,
            rotations: 0,
        };

        if let Some(wheel) = measurement.wheel {
            let tick = self.wheel_time.peek(wheel.event_time as u64);
            let count = self.wheel_revs.peek(wheel.revolutions as u64);
            let (rps, rotations) = self.wheel_avg.observe(tick, count)?;
            self.wheel_time.extend(wheel.event_time as u64);
            self.wheel_revs.extend(wheel.revolutions as u64);
            update.wheel_rps = rps;
            update.rotations = rotations;
            tracing::debug!(tick, count, rps, "wheel event");
        }

        if let Some(crank) = measurement.crank {
            let tick = self.crank_time.peek(crank.event_time as u64);
            let count = self.crank_revs.peek(crank.revolutions as u64);
            let (rps, rotations) = self.crank_avg.observe(tick, count)?;
            self.crank_time.extend(crank.event_time as u64);
            self.crank_revs.extend(crank.revolutions as u64);
            update.crank_rps = rps;
            update.rotations = rotations;
            tracing::debug!(tick, count, rps, "crank event");
        }

        Ok(update)
    }

    /// Cumulative wheel rotations observed this session.
    pub fn wheel_rotations(&self) -> u64 {
        self.wheel_avg.cumulative_rotations()
    }

    /// Cumulative crank rotations observed this session.
    pub fn crank_rotations(&self) -> u64 {
        self.crank_avg.cumulative_rotations()
    }
}
