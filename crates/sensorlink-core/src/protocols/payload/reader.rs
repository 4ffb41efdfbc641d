use super::error::PayloadError;
use super::layout;
use crate::protocols::common::convert::{flag_set, hex_lower};
use crate::registry::DeviceType;

pub struct PayloadReader<'a> {
    payload: &'a [u8],
}

impl<'a> PayloadReader<'a> {
    pub fn new(payload: &'a [u8]) -> Self {
        Self { payload }
    }

    /// Fixed-format device types reject anything but `PAYLOAD_LEN` bytes.
    pub fn require_fixed_len(&self, device_type: DeviceType) -> Result<(), PayloadError> {
        if self.payload.len() != layout::PAYLOAD_LEN {
            return Err(PayloadError::Malformed {
                device_type,
                expected: layout::PAYLOAD_LEN,
                actual: self.payload.len(),
            });
        }
        Ok(())
    }

    pub fn read_u8(&self, offset: usize) -> Result<u8, PayloadError> {
        self.payload
            .get(offset)
            .copied()
            .ok_or(PayloadError::TooShort {
                needed: offset + 1,
                actual: self.payload.len(),
            })
    }

    pub fn read_u16_le(&self, range: std::ops::Range<usize>) -> Result<u16, PayloadError> {
        let bytes = self.read_slice(range)?;
        if bytes.len() != 2 {
            return Err(PayloadError::TooShort {
                needed: 2,
                actual: bytes.len(),
            });
        }
        Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
    }

    pub fn read_i16_le(&self, range: std::ops::Range<usize>) -> Result<i16, PayloadError> {
        self.read_u16_le(range).map(|raw| raw as i16)
    }

    pub fn read_slice(&self, range: std::ops::Range<usize>) -> Result<&'a [u8], PayloadError> {
        self.payload
            .get(range.clone())
            .ok_or(PayloadError::TooShort {
                needed: range.end,
                actual: self.payload.len(),
            })
    }

    pub fn read_flag(&self, offset: usize, bit: u8) -> Result<bool, PayloadError> {
        self.read_u8(offset).map(|flags| flag_set(flags, bit))
    }

    pub fn read_hex(&self) -> String {
        hex_lower(self.payload)
    }
}
