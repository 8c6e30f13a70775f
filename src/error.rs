//! Error types for the gait engine.
//!
//! Data-quality problems (low confidence, missing keypoints, short history,
//! no calibration) are never errors. They surface as zeroed fields and lowered
//! confidence. Only explicit calibration input and configuration loading can
//! fail.

use thiserror::Error;

/// Gait engine error types.
#[derive(Error, Debug)]
pub enum GaitError {
    #[error("invalid calibration: pixels_per_meter must be positive and finite, got {pixels_per_meter}")]
    InvalidCalibration { pixels_per_meter: f32 },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, GaitError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_calibration_message() {
        let err = GaitError::InvalidCalibration {
            pixels_per_meter: -1.0,
        };
        assert!(err.to_string().contains("-1"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: GaitError = io.into();
        assert!(matches!(err, GaitError::Io(_)));
    }
}
