//! CSC decode error types.

use thiserror::Error;

/// Errors that can occur while decoding CSC sensor data.
///
/// All variants are recoverable: the affected frame is skipped and the
/// session keeps running on subsequent frames.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    /// Frame is shorter than its flags byte implies.
    #[error("measurement frame too short: got {got} bytes, need {need}")]
    TooShort { got: usize, need: usize },

    /// Sensor Location index outside the 17-entry assigned table.
    #[error("unknown sensor location index {0}")]
    UnknownLocation(u8),

    /// Sensor reported two distinct revolution counts at the same event
    /// time, which would make the rotation rate undefined.
    #[error("distinct revolution counts at identical event time")]
    ZeroDuration,
}

/// Result type for CSC decode operations.
pub type DecodeResult<T> = Result<T, DecodeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_too_short_message() {
        let err = DecodeError::TooShort { got: 3, need: 7 };
        assert!(err.to_string().contains("got 3"));
        assert!(err.to_string().contains("need 7"));
    }

    #[test]
    fn test_unknown_location_message() {
        let err = DecodeError::UnknownLocation(17);
        assert!(err.to_string().contains("17"));
    }
}
