//! Sensor Location characteristic (0x2A5D).

use crate::csc::error::{DecodeError, DecodeResult};

/// Mounting location reported by a CSC sensor.
///
/// Values follow the assigned-number table for the characteristic; the
/// location tells the display layer whether a sensor's rotation rate is
/// a wheel speed or a crank cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SensorLocation {
    Other,
    TopOfShoe,
    InShoe,
    Hip,
    FrontWheel,
    LeftCrank,
    RightCrank,
    LeftPedal,
    RightPedal,
    FrontHub,
    RearDropout,
    Chainstay,
    RearWheel,
    RearHub,
    Chest,
    Spider,
    ChainRing,
}

impl SensorLocation {
    /// Decode a location from the characteristic's single-byte value.
    ///
    /// Indices at or beyond the 17-entry table fail with
    /// [`DecodeError::UnknownLocation`].
    pub fn from_byte(value: u8) -> DecodeResult<Self> {
        match value {
            0 => Ok(SensorLocation::Other),
            1 => Ok(SensorLocation::TopOfShoe),
            2 => Ok(SensorLocation::InShoe),
            3 => Ok(SensorLocation::Hip),
            4 => Ok(SensorLocation::FrontWheel),
            5 => Ok(SensorLocation::LeftCrank),
            6 => Ok(SensorLocation::RightCrank),
            7 => Ok(SensorLocation::LeftPedal),
            8 => Ok(SensorLocation::RightPedal),
            9 => Ok(SensorLocation::FrontHub),
            10 => Ok(SensorLocation::RearDropout),
            11 => Ok(SensorLocation::Chainstay),
            12 => Ok(SensorLocation::RearWheel),
            13 => Ok(SensorLocation::RearHub),
            14 => Ok(SensorLocation::Chest),
            15 => Ok(SensorLocation::Spider),
            16 => Ok(SensorLocation::ChainRing),
            other => Err(DecodeError::UnknownLocation(other)),
        }
    }

    /// Whether this location marks a wheel-mounted sensor.
    pub fn is_wheel(&self) -> bool {
        matches!(self, SensorLocation::FrontWheel | SensorLocation::RearWheel)
    }

    /// Whether this location marks a crank-mounted sensor.
    pub fn is_crank(&self) -> bool {
        matches!(self, SensorLocation::LeftCrank | SensorLocation::RightCrank)
    }
}

impl std::fmt::Display for SensorLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SensorLocation::Other => "Other",
            SensorLocation::TopOfShoe => "Top of shoe",
            SensorLocation::InShoe => "In shoe",
            SensorLocation::Hip => "Hip",
            SensorLocation::FrontWheel => "Front Wheel",
            SensorLocation::LeftCrank => "Left Crank",
            SensorLocation::RightCrank => "Right Crank",
            SensorLocation::LeftPedal => "Left Pedal",
            SensorLocation::RightPedal => "Right Pedal",
            SensorLocation::FrontHub => "Front Hub",
            SensorLocation::RearDropout => "Rear Dropout",
            SensorLocation::Chainstay => "Chainstay",
            SensorLocation::RearWheel => "Rear Wheel",
            SensorLocation::RearHub => "Rear Hub",
            SensorLocation::Chest => "Chest",
            SensorLocation::Spider => "Spider",
            SensorLocation::ChainRing => "Chain Ring",
        };
        write!(f, "{}", name)
    }
}
