//! Time-windowed rotation rate averaging.
//!
//! CSC sensors emit one event pair per notification at irregular
//! intervals, so a fixed-sample rolling average misrepresents the rate.
//! `RateAverager` instead keeps the segments between consecutive distinct
//! events and weights each segment's rate by how much of it overlaps a
//! trailing real-time window.

use crate::csc::error::{DecodeError, DecodeResult};
use std::collections::VecDeque;

/// Configuration for rate averaging.
#[derive(Debug, Clone, Copy)]
pub struct AveragerConfig {
    /// Resolution of the sensor's event clock (1024 Hz for CSC)
    pub ticks_per_second: u32,
    /// Trailing window over which rates are averaged
    pub window_seconds: f64,
}

impl Default for AveragerConfig {
    fn default() -> Self {
        Self {
            ticks_per_second: 1024,
            window_seconds: 3.0,
        }
    }
}

impl AveragerConfig {
    fn window_ticks(&self) -> u64 {
        (self.window_seconds * self.ticks_per_second as f64) as u64
    }
}

/// The interval between two consecutive distinct sensor events.
///
/// Immutable once closed; the rate within a segment is assumed uniform
/// since no finer-grained data exists between two events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    /// Extended event time at the segment start (1/1024 s ticks)
    pub start_tick: u64,
    /// Extended event time at the segment end
    pub end_tick: u64,
    /// Extended cumulative count at the segment start
    pub start_count: u64,
    /// Extended cumulative count at the segment end
    pub end_count: u64,
}

impl Segment {
    /// Rotation rate over the segment, in rotations per second.
    fn rate_rps(&self, ticks_per_second: u32) -> f64 {
        let rotations = (self.end_count - self.start_count) as f64;
        let ticks = (self.end_tick - self.start_tick) as f64;
        rotations / ticks * ticks_per_second as f64
    }

    /// Ticks of this segment lying inside `[window_start, window_end]`.
    fn overlap_ticks(&self, window_start: u64, window_end: u64) -> u64 {
        let lo = self.start_tick.max(window_start);
        let hi = self.end_tick.min(window_end);
        hi.saturating_sub(lo)
    }
}

/// Windowed average rotation rate for one rotating part.
#[derive(Debug, Clone)]
pub struct RateAverager {
    config: AveragerConfig,
    /// Closed segments, oldest first
    segments: VecDeque<Segment>,
    /// Start of the not-yet-closed segment
    open_start: Option<(u64, u64)>,
    /// Total rotations across all closed segments
    cumulative_rotations: u64,
    /// Most recently computed average, re-returned on duplicate events
    last_average: f64,
}

impl RateAverager {
    /// Create an averager with the given configuration.
    pub fn new(config: AveragerConfig) -> Self {
        Self {
            config,
            segments: VecDeque::new(),
            open_start: None,
            cumulative_rotations: 0,
            last_average: 0.0,
        }
    }

    /// Ingest one normalized `(event time, cumulative count)` pair and
    /// return the windowed average rate in rotations per second plus the
    /// running cumulative rotation count.
    ///
    /// The first call only opens a segment and returns `(0.0, 0)`. A call
    /// whose count matches the open segment's start is a duplicate frame:
    /// it returns the last computed values without touching history. A
    /// distinct count at an identical tick is malformed sensor data and
    /// fails with [`DecodeError::ZeroDuration`] before any state changes,
    /// so the frame can be discarded cleanly.
    pub fn observe(&mut self, tick: u64, count: u64) -> DecodeResult<(f64, u64)> {
        let (start_tick, start_count) = match self.open_start {
            None => {
                self.open_start = Some((tick, count));
                return Ok((0.0, self.cumulative_rotations));
            }
            Some(open) => open,
        };

        if count == start_count {
            // Duplicate frame between events: nothing new to close.
            return Ok((self.last_average, self.cumulative_rotations));
        }

        if tick == start_tick {
            return Err(DecodeError::ZeroDuration);
        }

        debug_assert!(tick > start_tick, "event time went backwards");
        debug_assert!(count > start_count, "cumulative count went backwards");

        self.segments.push_back(Segment {
            start_tick,
            end_tick: tick,
            start_count,
            end_count: count,
        });
        self.cumulative_rotations += count - start_count;
        self.open_start = Some((tick, count));

        self.prune(tick);
        self.last_average = self.windowed_average(tick);

        Ok((self.last_average, self.cumulative_rotations))
    }

    /// Drop segments that ended strictly before the trailing window.
    ///
    /// This bounds the history to the events of one window rather than
    /// the whole session.
    fn prune(&mut self, now_tick: u64) {
        let window_start = now_tick.saturating_sub(self.config.window_ticks());
        while let Some(front) = self.segments.front() {
            if front.end_tick < window_start {
                self.segments.pop_front();
            } else {
                break;
            }
        }
    }

    /// Overlap-weighted mean rate over `[now - window, now]`.
    fn windowed_average(&self, now_tick: u64) -> f64 {
        let window_start = now_tick.saturating_sub(self.config.window_ticks());

        let mut weighted_sum = 0.0;
        let mut total_overlap = 0.0;
        for segment in &self.segments {
            let overlap = segment.overlap_ticks(window_start, now_tick) as f64;
            if overlap > 0.0 {
                weighted_sum += overlap * segment.rate_rps(self.config.ticks_per_second);
                total_overlap += overlap;
            }
        }

        if total_overlap == 0.0 {
            0.0
        } else {
            weighted_sum / total_overlap
        }
    }

    /// Total rotations observed across closed segments.
    pub fn cumulative_rotations(&self) -> u64 {
        self.cumulative_rotations
    }

    /// Number of segments currently retained.
    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// Discard all history, keeping the configuration.
    pub fn reset(&mut self) {
        self.segments.clear();
        self.open_start = None;
        self.cumulative_rotations = 0;
        self.last_average = 0.0;
    }
}
