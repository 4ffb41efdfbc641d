use thiserror::Error;

/// Errors raised while capturing a frame from raw bytes.
///
/// Note: this error type lives in an internal module; the example is
/// illustrative and not compiled as a public doctest.
///
/// # Examples
/// ```text
/// use sensorlink_core::protocols::frame::error::FrameError;
///
/// let err = FrameError::WrongLength { expected: 23, actual: 22 };
/// assert!(err.to_string().contains("expected 23 bytes"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    #[error("wrong frame length: expected {expected} bytes, got {actual}")]
    WrongLength { expected: usize, actual: usize },
}

/// Reasons a fully assembled frame is rejected by validation.
///
/// These are expected on a shared RF channel and are reported as values,
/// never raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InvalidFrame {
    #[error("checksum mismatch: computed 0x{expected:02X}, trailer 0x{found:02X}")]
    ChecksumMismatch { expected: u8, found: u8 },
    #[error("magic mismatch: found 0x{found:012X}")]
    MagicMismatch { found: u64 },
}
