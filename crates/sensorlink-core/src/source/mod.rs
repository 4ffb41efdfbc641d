mod capture;
mod serial;

pub use capture::CaptureFileSource;
pub use serial::SerialByteSource;

use thiserror::Error;

/// Non-blocking access to the gateway byte stream.
pub trait ByteSource {
    /// Drain whatever bytes are available right now.
    ///
    /// `Ok(Some(bytes))` may be empty when nothing has arrived yet;
    /// `Ok(None)` means the connection is closed or the input is exhausted.
    fn drain_available(&mut self) -> Result<Option<Vec<u8>>, SourceError>;
}

impl<S: ByteSource + ?Sized> ByteSource for Box<S> {
    fn drain_available(&mut self) -> Result<Option<Vec<u8>>, SourceError> {
        (**self).drain_available()
    }
}

/// Link-level failures: the only errors that stop a pipeline run.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("cannot open {port}: {message}")]
    Open { port: String, message: String },
    #[error("serial link error on {port}: {message}")]
    Serial { port: String, message: String },
}
