//! BLE transport layer for CSC sensors.

pub mod manager;
pub mod types;

pub use manager::SensorManager;
pub use types::{ConnectionState, DiscoveredSensor, SensorConfig, SensorError, SensorEvent};
