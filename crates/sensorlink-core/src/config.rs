//! Gateway configuration via TOML.
//!
//! One file carries the serial link settings, pipeline tuning and the
//! device-code table used when no live inventory is available.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::DEFAULT_TOPIC_PREFIX;
use crate::pipeline::PipelineConfig;
use crate::registry::{DeviceDescriptor, DeviceRegistry, RegistryError, parse_device_key};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Serial link to the RF gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    /// Device path, e.g. `/dev/ttyUSB0`
    pub port: String,
    pub baud_rate: u32,
    /// Upper bound for a single read, in seconds
    pub read_timeout_secs: f64,
    /// Pause between polls, in seconds
    pub poll_interval_secs: f64,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: "/dev/ttyUSB0".into(),
            baud_rate: 115_200,
            read_timeout_secs: 5.0,
            poll_interval_secs: 0.05,
        }
    }
}

impl SerialConfig {
    pub fn read_timeout(&self) -> Duration {
        positive_duration(self.read_timeout_secs, Duration::from_millis(1))
    }

    pub fn poll_interval(&self) -> Duration {
        positive_duration(self.poll_interval_secs, Duration::from_millis(50))
    }
}

/// Pipeline tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    /// Empty polls after which a partial frame is discarded (0 = never)
    pub resync_idle_polls: u32,
    /// First topic segment of published readings
    pub topic_prefix: String,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            resync_idle_polls: 20,
            topic_prefix: DEFAULT_TOPIC_PREFIX.into(),
        }
    }
}

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub serial: SerialConfig,
    pub pipeline: PipelineSettings,
    /// Listen code (hex) -> descriptor
    pub devices: BTreeMap<String, DeviceDescriptor>,
}

impl GatewayConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        info!(
            path = %path.display(),
            devices = config.devices.len(),
            "configuration loaded"
        );
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check the configuration and return the list of problems.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.serial.port.trim().is_empty() {
            errors.push("serial port must not be empty".into());
        }
        if self.serial.baud_rate == 0 {
            errors.push("serial baud rate must not be 0".into());
        }
        if !(self.serial.read_timeout_secs > 0.0 && self.serial.read_timeout_secs <= 60.0) {
            errors.push(format!(
                "invalid read timeout: {} (0-60 s, exclusive of 0)",
                self.serial.read_timeout_secs
            ));
        }
        if !(0.001..=10.0).contains(&self.serial.poll_interval_secs) {
            errors.push(format!(
                "invalid poll interval: {} (0.001-10.0 s)",
                self.serial.poll_interval_secs
            ));
        }
        for (key, descriptor) in &self.devices {
            if parse_device_key(key).is_err() {
                errors.push(format!("device key '{key}' is not a hexadecimal code"));
            }
            if descriptor.name.trim().is_empty() {
                errors.push(format!("device '{key}' has an empty name"));
            }
        }

        errors
    }

    /// Registry snapshot built from the `[devices]` table.
    pub fn registry(&self) -> Result<DeviceRegistry, RegistryError> {
        DeviceRegistry::from_listen_codes(
            self.devices
                .iter()
                .map(|(key, descriptor)| (key.as_str(), descriptor.clone())),
        )
    }

    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            poll_interval: self.serial.poll_interval(),
            resync_idle_polls: self.pipeline.resync_idle_polls,
            topic_prefix: self.pipeline.topic_prefix.clone(),
        }
    }
}

fn positive_duration(secs: f64, fallback: Duration) -> Duration {
    Duration::try_from_secs_f64(secs)
        .ok()
        .filter(|duration| !duration.is_zero())
        .unwrap_or(fallback)
}
