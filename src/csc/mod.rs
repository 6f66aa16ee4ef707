//! Cycling Speed and Cadence measurement pipeline.
//!
//! Frame bytes go through three pure stages: decode the optional-field
//! wire format, unwrap the finite-width counters, and fold the resulting
//! event pairs into a time-windowed average rate. [`CscSession`] drives
//! the stages for one connected sensor.

pub mod averager;
pub mod counter;
pub mod error;
pub mod location;
pub mod measurement;
pub mod session;

pub use averager::{AveragerConfig, RateAverager, Segment};
pub use counter::ExtendedCounter;
pub use error::{DecodeError, DecodeResult};
pub use location::SensorLocation;
pub use measurement::{
    decode_csc_measurement, CrankRevolutionData, CscMeasurement, WheelRevolutionData,
    CSC_MEASUREMENT_UUID, CSC_SERVICE_UUID, SENSOR_LOCATION_UUID,
};
pub use session::{CscSession, CscUpdate};
