//! Derived display metrics: unit conversions and power estimation.

pub mod power_curve;
pub mod units;

pub use power_curve::PowerCurve;
pub use units::{cadence_rpm, wheel_speed_kmh};
