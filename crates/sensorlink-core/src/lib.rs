//! SensorLink core library: RF gateway serial ingestion.
//!
//! This crate implements the pipeline that turns the byte stream of a
//! wireless-sensor gateway into normalized readings for a home-automation
//! bus: a byte source feeds the frame assembler, candidate frames are
//! validated (checksum, magic), resolved through the device registry and
//! decoded per device type, and the resulting readings go to a sink.
//! Parsing is byte-oriented and side-effect free; all I/O is isolated in
//! `source` and `sink` modules.
//!
//! Invariants:
//! - Emitted frames depend only on the byte sequence, not on read chunking.
//! - Noise, unprovisioned devices and malformed payloads are typed outcomes;
//!   only a failing byte source stops the pipeline.
//! - A registry snapshot never changes while a frame is being decoded.
//!
//! Version française (résumé):
//! Cette crate fournit le pipeline d'ingestion série : source d'octets ->
//! assemblage des trames -> validation -> registre d'appareils -> décodage ->
//! publication. Les E/S restent dans `source` et `sink`. Le bruit radio et
//! les appareils inconnus sont des résultats typés, pas des erreurs fatales.
//!
//! # Examples
//! ```no_run
//! use std::path::Path;
//!
//! use sensorlink_core::{GatewayConfig, MemorySink, replay_capture_file};
//!
//! let config = GatewayConfig::load(Path::new("sensorlink.toml"))?;
//! let mut sink = MemorySink::new();
//! let summary = replay_capture_file(
//!     Path::new("capture.bin"),
//!     config.registry()?,
//!     &mut sink,
//!     config.pipeline_config(),
//! )?;
//! println!("decoded frames: {}", summary.stats.decoded);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub mod config;
mod pipeline;
pub mod protocols;
pub mod registry;
mod sink;
mod source;

pub use config::{ConfigError, GatewayConfig, PipelineSettings, SerialConfig};
pub use pipeline::{
    FrameOutcome, Pipeline, PipelineConfig, PipelineError, PipelineStats, RunSummary,
    StopHandle, process_frame, replay_capture_file,
};
pub use protocols::frame::{
    FrameAssembler, FrameError, InvalidFrame, ParsedHeader, RawFrame, Validation,
    validate_frame,
};
pub use protocols::payload::{PayloadError, decode_payload};
pub use registry::{
    DeviceDescriptor, DeviceLookup, DeviceRegistry, DeviceType, RegistryError, SharedRegistry,
    device_key,
};
pub use sink::{JsonLinesSink, MemorySink, ReadingSink, SinkError};
pub use source::{ByteSource, CaptureFileSource, SerialByteSource, SourceError};

/// Default topic prefix for published readings.
pub const DEFAULT_TOPIC_PREFIX: &str = "homeassistant";
/// Timestamp used when the wall clock cannot be formatted.
pub const DEFAULT_TIMESTAMP: &str = "1970-01-01T00:00:00Z";

/// How a reading is presented downstream.
///
/// # Examples
/// ```
/// use sensorlink_core::TopicKind;
///
/// assert_eq!(TopicKind::BinarySensor.as_str(), "binary_sensor");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TopicKind {
    /// Continuous-value sensor.
    Sensor,
    /// On/off sensor.
    BinarySensor,
}

impl TopicKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TopicKind::Sensor => "sensor",
            TopicKind::BinarySensor => "binary_sensor",
        }
    }
}

/// Short uppercase metric names used as payload keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MetricKey {
    Volt,
    Amp,
    Watt,
    Temp,
    Humid,
    Batt,
    Sens,
    Undefined,
}

impl MetricKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKey::Volt => "VOLT",
            MetricKey::Amp => "AMP",
            MetricKey::Watt => "WATT",
            MetricKey::Temp => "TEMP",
            MetricKey::Humid => "HUMID",
            MetricKey::Batt => "BATT",
            MetricKey::Sens => "SENS",
            MetricKey::Undefined => "UNDEFINED",
        }
    }
}

/// Metric value as published (untagged in JSON).
///
/// # Examples
/// ```
/// use sensorlink_core::MetricValue;
///
/// assert_eq!(serde_json::to_string(&MetricValue::Float(21.5)).unwrap(), "21.5");
/// assert_eq!(serde_json::to_string(&MetricValue::Text("ON".into())).unwrap(), "\"ON\"");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl MetricValue {
    /// `"ON"` when `on`, `"OFF"` otherwise.
    pub fn on_off(on: bool) -> Self {
        MetricValue::Text(if on { "ON" } else { "OFF" }.to_string())
    }
}

/// Metric mapping in stable key order.
pub type Metrics = BTreeMap<MetricKey, MetricValue>;

/// Normalized, named set of metrics ready for publication.
///
/// # Examples
/// ```
/// use sensorlink_core::{MetricKey, MetricValue, SensorReading, TopicKind};
///
/// let reading = SensorReading::new("kitchen", TopicKind::Sensor)
///     .with_metric(MetricKey::Temp, MetricValue::Float(21.5))
///     .with_metric(MetricKey::Humid, MetricValue::Int(47));
/// assert_eq!(reading.state_topic("homeassistant"), "homeassistant/sensor/kitchen/state");
/// assert_eq!(reading.payload_json()?, r#"{"TEMP":21.5,"HUMID":47}"#);
/// # Ok::<(), serde_json::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    /// Device display name from the registry.
    #[serde(rename = "device")]
    pub device_name: String,
    /// Sensor or binary sensor.
    #[serde(rename = "kind")]
    pub topic_kind: TopicKind,
    /// Metric values keyed by metric name.
    pub metrics: Metrics,
}

impl SensorReading {
    pub fn new(device_name: impl Into<String>, topic_kind: TopicKind) -> Self {
        Self {
            device_name: device_name.into(),
            topic_kind,
            metrics: Metrics::new(),
        }
    }

    pub fn with_metric(mut self, key: MetricKey, value: MetricValue) -> Self {
        self.metrics.insert(key, value);
        self
    }

    pub fn metric(&self, key: MetricKey) -> Option<&MetricValue> {
        self.metrics.get(&key)
    }

    /// `<prefix>/<kind>/<name>/state`.
    pub fn state_topic(&self, prefix: &str) -> String {
        format!(
            "{}/{}/{}/state",
            prefix.trim_end_matches('/'),
            self.topic_kind.as_str(),
            self.device_name
        )
    }

    /// Metric mapping serialized as the message body.
    pub fn payload_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.metrics)
    }
}
