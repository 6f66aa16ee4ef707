//! SpinDash - Live speed and cadence dashboard
//!
//! Connects to BLE Cycling Speed and Cadence (CSC) sensors, decodes their
//! measurement frames, unwraps the wraparound-prone revolution counters,
//! and derives time-windowed average speed and cadence for live display.

pub mod config;
pub mod csc;
pub mod display;
pub mod metrics;
pub mod sensors;

// Re-export commonly used types
pub use config::AppConfig;
pub use csc::{CscSession, CscUpdate, DecodeError, SensorLocation};
pub use display::{ActivityTimer, DisplayBoard};
pub use sensors::manager::SensorManager;
