//! Sensor transport types and errors.

use crate::csc::{CscUpdate, SensorLocation};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use thiserror::Error;

/// Connection state of a sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    /// Not connected
    #[default]
    Disconnected,
    /// Connection in progress
    Connecting,
    /// Active connection
    Connected,
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionState::Disconnected => write!(f, "Disconnected"),
            ConnectionState::Connecting => write!(f, "Connecting..."),
            ConnectionState::Connected => write!(f, "Connected"),
        }
    }
}

/// A CSC sensor discovered during BLE scanning.
#[derive(Debug, Clone)]
pub struct DiscoveredSensor {
    /// BLE device address/identifier
    pub device_id: String,
    /// User-friendly name (from BLE advertisement)
    pub name: String,
    /// Signal strength (RSSI)
    pub signal_strength: Option<i16>,
    /// When the sensor was last seen
    pub last_seen: Instant,
}

/// Events from the sensor system.
#[derive(Debug, Clone)]
pub enum SensorEvent {
    /// A new sensor was discovered during scanning
    Discovered(DiscoveredSensor),
    /// Sensor connection state changed
    ConnectionChanged {
        device_id: String,
        state: ConnectionState,
    },
    /// A measurement frame was decoded and averaged
    Measurement {
        device_id: String,
        location: SensorLocation,
        update: CscUpdate,
    },
    /// Scan started
    ScanStarted,
    /// Scan stopped
    ScanStopped,
    /// Error occurred
    Error(String),
}

/// Configuration for the sensor manager.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorConfig {
    /// Timeout for discovery scan in seconds
    pub discovery_timeout_secs: u64,
    /// Timeout for connection attempt in seconds
    pub connection_timeout_secs: u64,
    /// Averaging window for speed/cadence smoothing in seconds
    pub averaging_window_seconds: f64,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            discovery_timeout_secs: 30,
            connection_timeout_secs: 10,
            averaging_window_seconds: 3.0,
        }
    }
}

/// Errors that can occur in the sensor system.
#[derive(Debug, Error)]
pub enum SensorError {
    /// BLE adapter not found or unavailable
    #[error("Bluetooth adapter not found")]
    AdapterNotFound,

    /// Failed to start BLE scanning
    #[error("Failed to start scanning: {0}")]
    ScanFailed(String),

    /// Sensor not found with given device ID
    #[error("Sensor not found: {0}")]
    SensorNotFound(String),

    /// Connection to sensor failed
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Failed to subscribe to sensor notifications
    #[error("Failed to subscribe to notifications: {0}")]
    SubscriptionFailed(String),

    /// Failed to read a characteristic value
    #[error("Read failed: {0}")]
    ReadFailed(String),

    /// The peripheral does not expose the CSC service
    #[error("Not a cycling speed/cadence sensor")]
    Unsupported,

    /// Generic BLE error
    #[error("BLE error: {0}")]
    BleError(String),
}
