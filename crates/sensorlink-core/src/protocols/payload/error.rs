use thiserror::Error;

use crate::registry::DeviceType;

/// Errors returned by payload decoding.
///
/// Note: this error type lives in an internal module; the example is
/// illustrative and not compiled as a public doctest.
///
/// # Examples
/// ```text
/// use sensorlink_core::protocols::payload::error::PayloadError;
/// use sensorlink_core::DeviceType;
///
/// let err = PayloadError::Malformed {
///     device_type: DeviceType::Thermometer,
///     expected: 12,
///     actual: 4,
/// };
/// assert!(err.to_string().contains("malformed hw_thermometer payload"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PayloadError {
    #[error("malformed {device_type} payload: expected {expected} bytes, got {actual}")]
    Malformed {
        device_type: DeviceType,
        expected: usize,
        actual: usize,
    },
    #[error("payload too short: need {needed} bytes, got {actual}")]
    TooShort { needed: usize, actual: usize },
}
