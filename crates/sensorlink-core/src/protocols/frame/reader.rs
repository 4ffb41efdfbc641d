use super::layout;

/// Fixed-width view over a captured frame.
///
/// Every accessor is infallible: the backing array always holds exactly
/// `FRAME_LEN` bytes and all ranges come from `layout`.
pub struct FrameReader<'a> {
    bytes: &'a [u8; layout::FRAME_LEN],
}

impl<'a> FrameReader<'a> {
    pub fn new(bytes: &'a [u8; layout::FRAME_LEN]) -> Self {
        Self { bytes }
    }

    pub fn read_u8(&self, offset: usize) -> u8 {
        self.bytes[offset]
    }

    pub fn read_u16_be(&self, range: std::ops::Range<usize>) -> u16 {
        let bytes = self.read_slice(range);
        u16::from_be_bytes([bytes[0], bytes[1]])
    }

    pub fn read_u32_be(&self, range: std::ops::Range<usize>) -> u32 {
        let bytes = self.read_slice(range);
        u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
    }

    pub fn read_slice(&self, range: std::ops::Range<usize>) -> &'a [u8] {
        &self.bytes[range]
    }

    /// 48-bit header value: the high 16 bits followed by the low 32 bits.
    pub fn read_magic(&self) -> u64 {
        let hi = self.read_u16_be(layout::MAGIC_HI_RANGE) as u64;
        let lo = self.read_u32_be(layout::MAGIC_LO_RANGE) as u64;
        (hi << 32) | lo
    }

    pub fn read_device_code(&self) -> u32 {
        self.read_u32_be(layout::DEVICE_CODE_RANGE)
    }

    pub fn read_payload(&self) -> &'a [u8] {
        self.read_slice(layout::PAYLOAD_RANGE)
    }

    pub fn read_checksum_trailer(&self) -> u8 {
        self.read_u8(layout::CHECKSUM_OFFSET)
    }

    /// Two's-complement of the mod-256 sum over every byte but the trailer.
    pub fn compute_checksum(&self) -> u8 {
        checksum(self.read_slice(layout::CHECKSUMMED_RANGE))
    }
}

/// `(0x100 - (sum mod 256)) mod 256` over `bytes`.
///
/// Any single-bit error is caught. Compensating errors in two bytes (one
/// byte +n, another -n) leave the sum unchanged and pass; that is a
/// property of mod-256 additive checksums.
pub fn checksum(bytes: &[u8]) -> u8 {
    let sum = bytes.iter().fold(0u8, |acc, b| acc.wrapping_add(*b));
    0u8.wrapping_sub(sum)
}

#[cfg(test)]
mod tests {
    use super::{FrameReader, checksum};
    use crate::protocols::frame::layout;

    fn sample() -> [u8; layout::FRAME_LEN] {
        let mut bytes = [0u8; layout::FRAME_LEN];
        for (i, b) in bytes.iter_mut().enumerate() {
            *b = i as u8;
        }
        bytes
    }

    #[test]
    fn checksum_is_twos_complement_of_sum() {
        assert_eq!(checksum(&[]), 0);
        assert_eq!(checksum(&[0x01]), 0xFF);
        assert_eq!(checksum(&[0x80, 0x80]), 0x00);
        assert_eq!(checksum(&[0xFF, 0x02]), 0xFF);
    }

    #[test]
    fn checksum_plus_sum_wraps_to_zero() {
        let bytes = sample();
        let reader = FrameReader::new(&bytes);
        let sum = bytes[layout::CHECKSUMMED_RANGE]
            .iter()
            .fold(0u8, |acc, b| acc.wrapping_add(*b));
        assert_eq!(sum.wrapping_add(reader.compute_checksum()), 0);
    }

    #[test]
    fn reads_big_endian_header_fields() {
        let bytes = sample();
        let reader = FrameReader::new(&bytes);
        assert_eq!(reader.read_magic(), 0x0001_0203_0405);
        assert_eq!(reader.read_device_code(), 0x0607_0809);
        assert_eq!(reader.read_payload(), &bytes[10..22]);
        assert_eq!(reader.read_checksum_trailer(), 22);
    }
}
