use super::layout;
use super::parser::RawFrame;

/// Splits a chunked serial byte stream into `FRAME_LEN`-byte candidates.
///
/// Bytes are consumed one at a time, so the emitted frames depend only on
/// the byte sequence and never on how it was chunked by the source.
#[derive(Debug, Default)]
pub struct FrameAssembler {
    buffer: Vec<u8>,
}

impl FrameAssembler {
    pub fn new() -> Self {
        Self {
            buffer: Vec::with_capacity(layout::FRAME_LEN),
        }
    }

    /// Append `chunk` and return every candidate frame it completes, in
    /// arrival order.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<RawFrame> {
        chunk
            .iter()
            .filter_map(|byte| self.push_byte(*byte))
            .collect()
    }

    fn push_byte(&mut self, byte: u8) -> Option<RawFrame> {
        self.buffer.push(byte);
        if self.buffer.len() < layout::FRAME_LEN {
            // Synced and waiting for the rest, or still resynchronizing.
            return None;
        }

        // Full length: always restart from an empty buffer, whatever the
        // candidate turns out to be.
        let frame = RawFrame::from_slice(&self.buffer).ok();
        self.buffer.clear();
        frame
    }

    /// Bytes held for the frame currently being assembled.
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    /// Whether the partial frame started on the sync marker.
    pub fn is_synced(&self) -> bool {
        self.buffer.first() == Some(&layout::SYNC_BYTE)
    }

    /// Drop the partial frame, returning how many bytes were discarded.
    pub fn discard(&mut self) -> usize {
        let discarded = self.buffer.len();
        self.buffer.clear();
        discarded
    }
}

#[cfg(test)]
mod tests {
    use super::FrameAssembler;
    use crate::protocols::frame::layout;
    use crate::protocols::frame::parser::RawFrame;

    fn stream() -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(RawFrame::assemble(1, &[1; 12]).as_bytes());
        bytes.extend_from_slice(&[layout::SYNC_BYTE, 0xAA, 0xBB]);
        bytes.extend_from_slice(RawFrame::assemble(2, &[2; 12]).as_bytes());
        bytes.extend_from_slice(RawFrame::assemble(3, &[3; 12]).as_bytes());
        bytes
    }

    #[test]
    fn empty_feed_yields_nothing() {
        let mut assembler = FrameAssembler::new();
        assert!(assembler.feed(&[]).is_empty());
        assert_eq!(assembler.pending(), 0);
    }

    #[test]
    fn exact_frame_is_emitted_and_buffer_reset() {
        let frame = RawFrame::assemble(9, &[0; 12]);
        let mut assembler = FrameAssembler::new();
        assert_eq!(assembler.feed(frame.as_bytes()), vec![frame]);
        assert_eq!(assembler.pending(), 0);
    }

    #[test]
    fn partial_frame_waits_for_more_bytes() {
        let frame = RawFrame::assemble(9, &[0; 12]);
        let mut assembler = FrameAssembler::new();
        assert!(assembler.feed(&frame.as_bytes()[..10]).is_empty());
        assert_eq!(assembler.pending(), 10);
        assert_eq!(assembler.feed(&frame.as_bytes()[10..]), vec![frame]);
    }

    #[test]
    fn sync_led_buffer_waits_then_emits_candidate() {
        let mut assembler = FrameAssembler::new();
        assert!(assembler.feed(&[layout::SYNC_BYTE; 5]).is_empty());
        assert!(assembler.is_synced());
        let frames = assembler.feed(&[0u8; layout::FRAME_LEN - 5]);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].as_bytes()[0], layout::SYNC_BYTE);
        assert!(!assembler.is_synced());
    }

    #[test]
    fn chunking_does_not_change_emitted_frames() {
        let bytes = stream();

        let mut whole = FrameAssembler::new();
        let expected = whole.feed(&bytes);

        let mut single = FrameAssembler::new();
        let one_by_one: Vec<RawFrame> = bytes.iter().flat_map(|b| single.feed(&[*b])).collect();
        assert_eq!(one_by_one, expected);

        for size in [2, 5, 7, 22, 23, 24, 40] {
            let mut chunked = FrameAssembler::new();
            let frames: Vec<RawFrame> = bytes.chunks(size).flat_map(|c| chunked.feed(c)).collect();
            assert_eq!(frames, expected, "chunk size {size}");
            assert_eq!(chunked.pending(), whole.pending());
        }
    }

    #[test]
    fn discard_drops_partial_frame() {
        let mut assembler = FrameAssembler::new();
        assembler.feed(&[0x01, 0x02, 0x03]);
        assert_eq!(assembler.discard(), 3);
        assert_eq!(assembler.pending(), 0);
        assert_eq!(assembler.discard(), 0);
    }
}
