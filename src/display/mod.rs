//! Per-sensor display slots and the activity timer.
//!
//! Each sensor worker owns exactly one [`SlotWriter`]; the render loop
//! reads every slot through [`DisplayBoard::snapshot`]. One writer per
//! slot means no coordination beyond the slot's own lock.

use crate::csc::SensorLocation;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// What a sensor's slot is currently showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SlotStatus {
    /// Connection in progress
    #[default]
    Connecting,
    /// Connected, no measurement received yet
    WaitingForData,
    /// Receiving measurements
    Live,
    /// Connection dropped
    Lost,
}

impl std::fmt::Display for SlotStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SlotStatus::Connecting => write!(f, "Connecting"),
            SlotStatus::WaitingForData => write!(f, "Waiting for data"),
            SlotStatus::Live => write!(f, "Live"),
            SlotStatus::Lost => write!(f, "Waiting for sensor"),
        }
    }
}

/// The current contents of one sensor's display slot.
#[derive(Debug, Clone, Default)]
pub struct SlotContent {
    /// Sensor address or name
    pub sensor: String,
    /// Slot state
    pub status: SlotStatus,
    /// Mounting location, once read
    pub location: Option<SensorLocation>,
    /// Road speed, for wheel-mounted sensors
    pub speed_kmh: Option<f64>,
    /// Cadence, for crank-mounted sensors
    pub cadence_rpm: Option<f64>,
    /// Estimated power, when a power curve is configured
    pub power_watts: Option<f64>,
}

/// Write handle to one display slot.
///
/// Held by exactly one sensor worker.
pub struct SlotWriter {
    slot: Arc<Mutex<SlotContent>>,
}

impl SlotWriter {
    /// Update the slot state.
    pub fn set_status(&self, status: SlotStatus) {
        let mut slot = self.slot.lock().expect("slot lock poisoned");
        slot.status = status;
        if status != SlotStatus::Live {
            slot.speed_kmh = None;
            slot.cadence_rpm = None;
            slot.power_watts = None;
        }
    }

    /// Record the sensor's mounting location.
    pub fn set_location(&self, location: SensorLocation) {
        self.slot.lock().expect("slot lock poisoned").location = Some(location);
    }

    /// Publish a new reading and mark the slot live.
    pub fn set_reading(
        &self,
        speed_kmh: Option<f64>,
        cadence_rpm: Option<f64>,
        power_watts: Option<f64>,
    ) {
        let mut slot = self.slot.lock().expect("slot lock poisoned");
        slot.status = SlotStatus::Live;
        slot.speed_kmh = speed_kmh;
        slot.cadence_rpm = cadence_rpm;
        slot.power_watts = power_watts;
    }
}

/// Fixed set of per-sensor slots read by the render loop.
#[derive(Default)]
pub struct DisplayBoard {
    slots: Vec<Arc<Mutex<SlotContent>>>,
}

impl DisplayBoard {
    /// Create an empty board.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a slot for a sensor and return its single write handle.
    pub fn add_slot(&mut self, sensor: impl Into<String>) -> SlotWriter {
        let slot = Arc::new(Mutex::new(SlotContent {
            sensor: sensor.into(),
            ..SlotContent::default()
        }));
        self.slots.push(slot.clone());
        SlotWriter { slot }
    }

    /// Copy out the current contents of every slot, in add order.
    pub fn snapshot(&self) -> Vec<SlotContent> {
        self.slots
            .iter()
            .map(|slot| slot.lock().expect("slot lock poisoned").clone())
            .collect()
    }
}

/// Accumulates moving time: runs while any sensor shows activity and
/// pauses when all go idle, like a bike computer's auto-pause.
#[derive(Debug, Default)]
pub struct ActivityTimer {
    accumulated: Duration,
    started_at: Option<Instant>,
}

impl ActivityTimer {
    /// Create a stopped timer at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start or stop the timer based on current activity.
    pub fn set_active(&mut self, active: bool) {
        match (active, self.started_at) {
            (true, None) => self.started_at = Some(Instant::now()),
            (false, Some(started)) => {
                self.accumulated += started.elapsed();
                self.started_at = None;
            }
            _ => {}
        }
    }

    /// Total accumulated moving time.
    pub fn elapsed(&self) -> Duration {
        match self.started_at {
            Some(started) => self.accumulated + started.elapsed(),
            None => self.accumulated,
        }
    }

    /// Whether the timer is currently running.
    pub fn is_running(&self) -> bool {
        self.started_at.is_some()
    }
}

/// Format a duration as `HH:MM:SS`.
pub fn format_hms(duration: Duration) -> String {
    let total = duration.as_secs();
    format!(
        "{:02}:{:02}:{:02}",
        total / 3600,
        (total % 3600) / 60,
        total % 60
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_writer_snapshot() {
        let mut board = DisplayBoard::new();
        let writer = board.add_slot("D0:AC:A5:BF:B7:52");
        board.add_slot("C6:F9:84:6A:C0:8E");

        writer.set_location(SensorLocation::RearWheel);
        writer.set_reading(Some(32.5), None, Some(180.0));

        let snapshot = board.snapshot();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[0].status, SlotStatus::Live);
        assert_eq!(snapshot[0].location, Some(SensorLocation::RearWheel));
        assert_eq!(snapshot[0].speed_kmh, Some(32.5));
        assert_eq!(snapshot[1].status, SlotStatus::Connecting);
    }

    #[test]
    fn test_leaving_live_clears_readings() {
        let mut board = DisplayBoard::new();
        let writer = board.add_slot("sensor");
        writer.set_reading(Some(20.0), None, None);
        writer.set_status(SlotStatus::Lost);

        let slot = &board.snapshot()[0];
        assert_eq!(slot.status, SlotStatus::Lost);
        assert!(slot.speed_kmh.is_none());
    }

    #[test]
    fn test_activity_timer_accumulates_only_while_active() {
        let mut timer = ActivityTimer::new();
        assert!(!timer.is_running());
        assert_eq!(timer.elapsed(), Duration::ZERO);

        timer.set_active(true);
        assert!(timer.is_running());
        // Repeated activation does not restart the interval.
        timer.set_active(true);

        timer.set_active(false);
        let frozen = timer.elapsed();
        assert!(!timer.is_running());
        assert_eq!(timer.elapsed(), frozen);
    }

    #[test]
    fn test_format_hms() {
        assert_eq!(format_hms(Duration::from_secs(0)), "00:00:00");
        assert_eq!(format_hms(Duration::from_secs(3661)), "01:01:01");
        assert_eq!(format_hms(Duration::from_secs(86399)), "23:59:59");
    }
}
