pub const FRAME_LEN: usize = 23;
pub const SYNC_BYTE: u8 = 0x61;
pub const HEADER_MAGIC: u64 = 0x1592_0212_0a10;

pub const MAGIC_HI_RANGE: std::ops::Range<usize> = 0..2;
pub const MAGIC_LO_RANGE: std::ops::Range<usize> = 2..6;
pub const DEVICE_CODE_RANGE: std::ops::Range<usize> = 6..10;
pub const PAYLOAD_RANGE: std::ops::Range<usize> = 10..22;
pub const CHECKSUM_OFFSET: usize = 22;

/// Bytes covered by the additive checksum (everything but the trailer).
pub const CHECKSUMMED_RANGE: std::ops::Range<usize> = 0..CHECKSUM_OFFSET;
