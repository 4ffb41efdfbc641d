use super::error::{FrameError, InvalidFrame};
use super::layout;
use super::reader::{FrameReader, checksum};

/// Exactly `FRAME_LEN` bytes captured from the serial link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RawFrame {
    bytes: [u8; layout::FRAME_LEN],
}

impl RawFrame {
    pub fn from_slice(bytes: &[u8]) -> Result<Self, FrameError> {
        let bytes: [u8; layout::FRAME_LEN] =
            bytes.try_into().map_err(|_| FrameError::WrongLength {
                expected: layout::FRAME_LEN,
                actual: bytes.len(),
            })?;
        Ok(Self { bytes })
    }

    /// Build a well-formed frame (correct magic and checksum) for the given
    /// device code and payload, as the gateway would emit it.
    pub fn assemble(device_code: u32, payload: &[u8; 12]) -> Self {
        let mut bytes = [0u8; layout::FRAME_LEN];
        let magic = layout::HEADER_MAGIC.to_be_bytes();
        bytes[layout::MAGIC_HI_RANGE].copy_from_slice(&magic[2..4]);
        bytes[layout::MAGIC_LO_RANGE].copy_from_slice(&magic[4..8]);
        bytes[layout::DEVICE_CODE_RANGE].copy_from_slice(&device_code.to_be_bytes());
        bytes[layout::PAYLOAD_RANGE].copy_from_slice(payload);
        bytes[layout::CHECKSUM_OFFSET] = checksum(&bytes[layout::CHECKSUMMED_RANGE]);
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8; layout::FRAME_LEN] {
        &self.bytes
    }

    pub fn payload(&self) -> &[u8] {
        FrameReader::new(&self.bytes).read_payload()
    }
}

/// Header fields of a frame that passed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedHeader {
    pub magic: u64,
    pub device_code: u32,
    pub checksum: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Validation {
    Valid(ParsedHeader),
    Invalid(InvalidFrame),
}

/// Check the checksum trailer, then the header magic.
pub fn validate_frame(frame: &RawFrame) -> Validation {
    let reader = FrameReader::new(frame.as_bytes());

    let expected = reader.compute_checksum();
    let found = reader.read_checksum_trailer();
    if expected != found {
        return Validation::Invalid(InvalidFrame::ChecksumMismatch { expected, found });
    }

    let magic = reader.read_magic();
    if magic != layout::HEADER_MAGIC {
        return Validation::Invalid(InvalidFrame::MagicMismatch { found: magic });
    }

    Validation::Valid(ParsedHeader {
        magic,
        device_code: reader.read_device_code(),
        checksum: found,
    })
}

#[cfg(test)]
mod tests {
    use super::{RawFrame, Validation, validate_frame};
    use crate::protocols::frame::error::{FrameError, InvalidFrame};
    use crate::protocols::frame::layout;
    use crate::protocols::frame::reader::checksum;

    const PAYLOAD: [u8; 12] = [0, 0, 0x01, 0, 0xD7, 0x00, 0x2F, 0, 0, 0, 0, 0];

    #[test]
    fn assembled_frame_is_valid() {
        let frame = RawFrame::assemble(0x00AB_CDEF, &PAYLOAD);
        match validate_frame(&frame) {
            Validation::Valid(header) => {
                assert_eq!(header.magic, layout::HEADER_MAGIC);
                assert_eq!(header.device_code, 0x00AB_CDEF);
                assert_eq!(header.checksum, frame.as_bytes()[layout::CHECKSUM_OFFSET]);
            }
            other => panic!("expected valid frame, got {other:?}"),
        }
        assert_eq!(frame.payload(), &PAYLOAD);
    }

    #[test]
    fn wire_bytes_start_with_magic() {
        let frame = RawFrame::assemble(1, &[0; 12]);
        assert_eq!(&frame.as_bytes()[..6], &[0x15, 0x92, 0x02, 0x12, 0x0a, 0x10]);
        assert_eq!(&frame.as_bytes()[6..10], &[0, 0, 0, 1]);
    }

    #[test]
    fn corrupted_trailer_is_checksum_mismatch() {
        let mut bytes = *RawFrame::assemble(7, &PAYLOAD).as_bytes();
        let good = bytes[layout::CHECKSUM_OFFSET];
        bytes[layout::CHECKSUM_OFFSET] = good.wrapping_add(1);
        let frame = RawFrame::from_slice(&bytes).unwrap();
        assert_eq!(
            validate_frame(&frame),
            Validation::Invalid(InvalidFrame::ChecksumMismatch {
                expected: good,
                found: good.wrapping_add(1),
            })
        );
    }

    #[test]
    fn wrong_magic_with_correct_checksum_is_magic_mismatch() {
        let mut bytes = *RawFrame::assemble(7, &PAYLOAD).as_bytes();
        bytes[0] = 0x16;
        bytes[layout::CHECKSUM_OFFSET] = checksum(&bytes[layout::CHECKSUMMED_RANGE]);
        let frame = RawFrame::from_slice(&bytes).unwrap();
        assert_eq!(
            validate_frame(&frame),
            Validation::Invalid(InvalidFrame::MagicMismatch {
                found: 0x1692_0212_0a10,
            })
        );
    }

    #[test]
    fn any_single_bit_flip_is_rejected() {
        let original = *RawFrame::assemble(0x1234_5678, &PAYLOAD).as_bytes();
        for index in layout::CHECKSUMMED_RANGE {
            for bit in 0..8 {
                let mut bytes = original;
                bytes[index] ^= 1 << bit;
                let frame = RawFrame::from_slice(&bytes).unwrap();
                assert!(
                    matches!(validate_frame(&frame), Validation::Invalid(_)),
                    "flip of bit {bit} in byte {index} was accepted"
                );
            }
        }
    }

    #[test]
    fn validation_is_repeatable() {
        let frame = RawFrame::assemble(42, &PAYLOAD);
        assert_eq!(validate_frame(&frame), validate_frame(&frame));
    }

    #[test]
    fn from_slice_enforces_length() {
        assert_eq!(
            RawFrame::from_slice(&[0u8; 22]),
            Err(FrameError::WrongLength {
                expected: layout::FRAME_LEN,
                actual: 22,
            })
        );
        assert!(RawFrame::from_slice(&[0u8; 24]).is_err());
        assert!(RawFrame::from_slice(&[0u8; 23]).is_ok());
    }
}
