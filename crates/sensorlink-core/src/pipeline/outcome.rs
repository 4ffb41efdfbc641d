use serde::Serialize;

use crate::SensorReading;
use crate::protocols::frame::InvalidFrame;
use crate::protocols::payload::PayloadError;

/// What happened to one candidate frame (or discarded partial frame).
#[derive(Debug, Clone, PartialEq)]
pub enum FrameOutcome {
    /// Valid frame from a known device, decoded into readings.
    Decoded {
        device: String,
        readings: Vec<SensorReading>,
    },
    /// Line noise: checksum or magic did not match.
    Invalid(InvalidFrame),
    /// Valid frame, device code not in the registry (treated as offline).
    UnknownDevice { key: String },
    /// Known device, payload width did not match its type.
    MalformedPayload { device: String, error: PayloadError },
    /// Partial frame dropped after an idle gap or at end of input.
    FramingDesync { discarded: usize },
}

/// Per-category counters for a pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PipelineStats {
    /// Candidate frames assembled.
    pub frames: u64,
    /// Frames decoded into readings.
    pub decoded: u64,
    /// Readings accepted by the sink.
    pub readings_published: u64,
    pub checksum_mismatch: u64,
    pub magic_mismatch: u64,
    pub unknown_device: u64,
    pub malformed_payload: u64,
    /// Partial frames discarded.
    pub desync_discards: u64,
    /// Bytes dropped with those partial frames.
    pub desync_bytes: u64,
    pub sink_failures: u64,
}

impl PipelineStats {
    pub fn record(&mut self, outcome: &FrameOutcome) {
        match outcome {
            FrameOutcome::FramingDesync { discarded } => {
                self.desync_discards += 1;
                self.desync_bytes += *discarded as u64;
                return;
            }
            FrameOutcome::Decoded { .. } => self.decoded += 1,
            FrameOutcome::Invalid(InvalidFrame::ChecksumMismatch { .. }) => {
                self.checksum_mismatch += 1
            }
            FrameOutcome::Invalid(InvalidFrame::MagicMismatch { .. }) => self.magic_mismatch += 1,
            FrameOutcome::UnknownDevice { .. } => self.unknown_device += 1,
            FrameOutcome::MalformedPayload { .. } => self.malformed_payload += 1,
        }
        self.frames += 1;
    }
}

/// Result of a completed `Pipeline::run`.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub stats: PipelineStats,
    /// RFC3339
    pub started_at: String,
    /// RFC3339
    pub finished_at: String,
}
