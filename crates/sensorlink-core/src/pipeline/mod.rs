//! Ingestion loop: byte source -> frames -> readings -> sink.
//!
//! A single cooperative loop owns the assembler and polls the source at a
//! fixed interval; decoding is synchronous and happens in arrival order.
//! Only a failing source ends a run early. Everything else (noise,
//! unprovisioned devices, malformed payloads, sink hiccups) is counted and
//! logged, and the loop carries on.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use thiserror::Error;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use tracing::{debug, info, trace, warn};

use crate::protocols::frame::{FrameAssembler, RawFrame, Validation, validate_frame};
use crate::protocols::payload::decode_payload;
use crate::registry::{DeviceLookup, DeviceRegistry, SharedRegistry, device_key};
use crate::sink::ReadingSink;
use crate::source::{ByteSource, CaptureFileSource, SourceError};
use crate::{DEFAULT_TIMESTAMP, DEFAULT_TOPIC_PREFIX, SensorReading};

mod outcome;

pub use outcome::{FrameOutcome, PipelineStats, RunSummary};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("byte source failed: {0}")]
    Source(#[from] SourceError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Pause between polls in `run`.
    pub poll_interval: Duration,
    /// Consecutive empty polls before a partial frame is discarded; 0 keeps
    /// partial frames indefinitely.
    pub resync_idle_polls: u32,
    pub topic_prefix: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(50),
            resync_idle_polls: 20,
            topic_prefix: DEFAULT_TOPIC_PREFIX.to_string(),
        }
    }
}

/// Cloneable handle that asks a running pipeline to return.
#[derive(Debug, Clone, Default)]
pub struct StopHandle {
    stopped: Arc<AtomicBool>,
}

impl StopHandle {
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::Release);
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }
}

/// Validate, resolve and decode one candidate frame.
///
/// Pure with respect to its inputs: the same frame and registry always give
/// the same outcome.
pub fn process_frame(frame: &RawFrame, registry: &DeviceRegistry) -> FrameOutcome {
    let header = match validate_frame(frame) {
        Validation::Valid(header) => header,
        Validation::Invalid(reason) => return FrameOutcome::Invalid(reason),
    };

    let descriptor = match registry.lookup(header.device_code) {
        DeviceLookup::Known(descriptor) => descriptor,
        DeviceLookup::Unknown { code } => {
            return FrameOutcome::UnknownDevice {
                key: device_key(code),
            };
        }
    };

    match decode_payload(descriptor, frame.payload()) {
        Ok(readings) => FrameOutcome::Decoded {
            device: descriptor.name.clone(),
            readings,
        },
        Err(error) => FrameOutcome::MalformedPayload {
            device: descriptor.name.clone(),
            error,
        },
    }
}

/// Decode a raw serial capture through a full pipeline run.
pub fn replay_capture_file<K: ReadingSink>(
    path: &Path,
    registry: impl Into<SharedRegistry>,
    sink: K,
    config: PipelineConfig,
) -> Result<RunSummary, PipelineError> {
    let source = CaptureFileSource::open(path, CaptureFileSource::DEFAULT_CHUNK_SIZE)?;
    let config = PipelineConfig {
        poll_interval: Duration::ZERO,
        ..config
    };
    Pipeline::new(source, registry, sink, config).run()
}

pub struct Pipeline<S, K> {
    source: S,
    sink: K,
    registry: SharedRegistry,
    config: PipelineConfig,
    assembler: FrameAssembler,
    stats: PipelineStats,
    idle_polls: u32,
    stop: StopHandle,
}

impl<S: ByteSource, K: ReadingSink> Pipeline<S, K> {
    pub fn new(
        source: S,
        registry: impl Into<SharedRegistry>,
        sink: K,
        config: PipelineConfig,
    ) -> Self {
        Self {
            source,
            sink,
            registry: registry.into(),
            config,
            assembler: FrameAssembler::new(),
            stats: PipelineStats::default(),
            idle_polls: 0,
            stop: StopHandle::default(),
        }
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    pub fn stats(&self) -> &PipelineStats {
        &self.stats
    }

    /// Poll the source once and process every frame the new bytes complete.
    ///
    /// Returns `Ok(None)` once the source reports closed.
    pub fn tick(&mut self) -> Result<Option<Vec<FrameOutcome>>, PipelineError> {
        let chunk = match self.source.drain_available()? {
            Some(chunk) => chunk,
            None => return Ok(None),
        };

        let mut outcomes = Vec::new();
        if chunk.is_empty() {
            self.idle_polls = self.idle_polls.saturating_add(1);
            if self.config.resync_idle_polls > 0
                && self.idle_polls >= self.config.resync_idle_polls
            {
                outcomes.extend(self.discard_partial());
            }
            return Ok(Some(outcomes));
        }
        self.idle_polls = 0;

        // One snapshot per poll; a registry swap lands on the next poll.
        let registry = self.registry.snapshot();
        for frame in self.assembler.feed(&chunk) {
            let outcome = process_frame(&frame, &registry);
            if let FrameOutcome::Decoded { readings, .. } = &outcome {
                self.publish(readings);
            }
            self.record(&outcome);
            outcomes.push(outcome);
        }
        Ok(Some(outcomes))
    }

    /// Poll until the source closes, a stop is requested or the link fails.
    ///
    /// Consumes the pipeline, so the source (and its connection) is released
    /// on every exit path.
    pub fn run(mut self) -> Result<RunSummary, PipelineError> {
        let started_at = now_rfc3339();
        info!(
            poll_interval_ms = self.config.poll_interval.as_millis() as u64,
            resync_idle_polls = self.config.resync_idle_polls,
            "pipeline started"
        );

        while !self.stop.is_stopped() {
            match self.tick() {
                Ok(Some(_)) => {}
                Ok(None) => {
                    self.discard_partial();
                    info!("byte source closed");
                    break;
                }
                Err(err) => {
                    warn!(error = %err, "pipeline stopped on link failure");
                    return Err(err);
                }
            }
            if !self.config.poll_interval.is_zero() {
                thread::sleep(self.config.poll_interval);
            }
        }

        info!(
            frames = self.stats.frames,
            decoded = self.stats.decoded,
            published = self.stats.readings_published,
            "pipeline finished"
        );
        Ok(RunSummary {
            stats: self.stats,
            started_at,
            finished_at: now_rfc3339(),
        })
    }

    fn discard_partial(&mut self) -> Option<FrameOutcome> {
        if self.assembler.pending() == 0 {
            return None;
        }
        let synced = self.assembler.is_synced();
        let discarded = self.assembler.discard();
        debug!(discarded, synced, "partial frame discarded");

        let outcome = FrameOutcome::FramingDesync { discarded };
        self.stats.record(&outcome);
        Some(outcome)
    }

    fn publish(&mut self, readings: &[SensorReading]) {
        for reading in readings {
            let topic = reading.state_topic(&self.config.topic_prefix);
            match self.sink.publish(&topic, reading) {
                Ok(()) => self.stats.readings_published += 1,
                Err(err) => {
                    self.stats.sink_failures += 1;
                    warn!(topic = %topic, error = %err, "publish failed");
                }
            }
        }
    }

    fn record(&mut self, outcome: &FrameOutcome) {
        match outcome {
            FrameOutcome::Decoded { device, readings } => {
                trace!(device = %device, readings = readings.len(), "frame decoded")
            }
            FrameOutcome::Invalid(reason) => trace!(%reason, "frame rejected"),
            FrameOutcome::UnknownDevice { key } => {
                debug!(code = %key, "frame from unknown device dropped")
            }
            FrameOutcome::MalformedPayload { device, error } => {
                warn!(device = %device, %error, "malformed payload dropped")
            }
            FrameOutcome::FramingDesync { discarded } => {
                debug!(discarded = *discarded, "partial frame discarded")
            }
        }
        self.stats.record(outcome);
    }
}

fn now_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| DEFAULT_TIMESTAMP.to_string())
}
