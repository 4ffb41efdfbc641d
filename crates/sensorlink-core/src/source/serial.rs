use std::io::{ErrorKind, Read};

use serialport::{ClearBuffer, SerialPort};
use tracing::{debug, info};

use super::{ByteSource, SourceError};
use crate::config::SerialConfig;

/// Gateway serial port, drained without blocking on each poll.
///
/// The port is closed when the source is dropped.
pub struct SerialByteSource {
    port: Box<dyn SerialPort>,
    name: String,
}

impl SerialByteSource {
    pub fn open(config: &SerialConfig) -> Result<Self, SourceError> {
        let timeout = config.read_timeout();
        let port = serialport::new(config.port.as_str(), config.baud_rate)
            .timeout(timeout)
            .open()
            .map_err(|e| SourceError::Open {
                port: config.port.clone(),
                message: e.to_string(),
            })?;

        let source = Self {
            port,
            name: config.port.clone(),
        };
        // Stale bytes from before we attached would only desync the first frame.
        source
            .port
            .clear(ClearBuffer::Input)
            .map_err(|e| source.serial_error(e))?;

        info!(
            port = %source.name,
            baud_rate = config.baud_rate,
            timeout_ms = timeout.as_millis() as u64,
            "serial port opened"
        );
        Ok(source)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn serial_error(&self, err: serialport::Error) -> SourceError {
        SourceError::Serial {
            port: self.name.clone(),
            message: err.to_string(),
        }
    }
}

impl ByteSource for SerialByteSource {
    fn drain_available(&mut self) -> Result<Option<Vec<u8>>, SourceError> {
        let available = self
            .port
            .bytes_to_read()
            .map_err(|e| self.serial_error(e))? as usize;
        if available == 0 {
            return Ok(Some(Vec::new()));
        }

        let mut buf = vec![0u8; available];
        match self.port.read(&mut buf) {
            // The driver reported data but the read hit end-of-file: hung up.
            Ok(0) => {
                debug!(port = %self.name, "serial port hung up");
                Ok(None)
            }
            Ok(read) => {
                buf.truncate(read);
                Ok(Some(buf))
            }
            Err(err) if matches!(err.kind(), ErrorKind::TimedOut | ErrorKind::Interrupted) => {
                Ok(Some(Vec::new()))
            }
            Err(err) => Err(SourceError::Io(err)),
        }
    }
}
