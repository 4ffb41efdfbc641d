use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};

use tracing::info;

use super::{ByteSource, SourceError};

/// Replays a raw byte capture of the serial link in fixed-size chunks.
pub struct CaptureFileSource {
    file: File,
    path: PathBuf,
    chunk_size: usize,
}

impl CaptureFileSource {
    pub const DEFAULT_CHUNK_SIZE: usize = 64;

    pub fn open(path: &Path, chunk_size: usize) -> Result<Self, SourceError> {
        let file = File::open(path)?;
        info!(path = %path.display(), chunk_size, "capture file opened");
        Ok(Self {
            file,
            path: path.to_path_buf(),
            chunk_size: chunk_size.max(1),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ByteSource for CaptureFileSource {
    fn drain_available(&mut self) -> Result<Option<Vec<u8>>, SourceError> {
        let mut buf = vec![0u8; self.chunk_size];
        match self.file.read(&mut buf) {
            Ok(0) => Ok(None),
            Ok(read) => {
                buf.truncate(read);
                Ok(Some(buf))
            }
            Err(err) if err.kind() == ErrorKind::Interrupted => Ok(Some(Vec::new())),
            Err(err) => Err(SourceError::Io(err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::CaptureFileSource;
    use crate::source::{ByteSource, SourceError};
    use std::io::Write;

    #[test]
    fn replays_file_in_chunks_then_closes() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&[1, 2, 3, 4, 5]).unwrap();

        let mut source = CaptureFileSource::open(file.path(), 2).unwrap();
        assert_eq!(source.drain_available().unwrap(), Some(vec![1, 2]));
        assert_eq!(source.drain_available().unwrap(), Some(vec![3, 4]));
        assert_eq!(source.drain_available().unwrap(), Some(vec![5]));
        assert_eq!(source.drain_available().unwrap(), None);
    }

    #[test]
    fn zero_chunk_size_still_makes_progress() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&[9]).unwrap();

        let mut source = CaptureFileSource::open(file.path(), 0).unwrap();
        assert_eq!(source.drain_available().unwrap(), Some(vec![9]));
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = match CaptureFileSource::open(&dir.path().join("missing.bin"), 8) {
            Ok(_) => panic!("expected missing capture to be rejected"),
            Err(err) => err,
        };
        assert!(matches!(err, SourceError::Io(_)));
    }
}
