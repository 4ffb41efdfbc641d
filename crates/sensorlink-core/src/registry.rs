//! Device registry: listen code -> descriptor.
//!
//! The registry is an immutable snapshot. Hosts that refresh device codes
//! (e.g. from a cloud inventory) build a new snapshot and swap it into a
//! [`SharedRegistry`]; the pipeline picks it up at its next poll.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize, Serializer};
use thiserror::Error;

/// Semantic device type, as named by the gateway inventory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DeviceType {
    EnergySwitch,
    Thermometer,
    LeakDetector,
    SmokeDetector,
    Unknown,
}

impl DeviceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceType::EnergySwitch => "hw_energy_switch",
            DeviceType::Thermometer => "hw_thermometer",
            DeviceType::LeakDetector => "sw_leak_detector",
            DeviceType::SmokeDetector => "sw_smoke_detector",
            DeviceType::Unknown => "unknown",
        }
    }
}

impl From<&str> for DeviceType {
    fn from(value: &str) -> Self {
        match value {
            "hw_energy_switch" => DeviceType::EnergySwitch,
            "hw_thermometer" => DeviceType::Thermometer,
            "sw_leak_detector" => DeviceType::LeakDetector,
            "sw_smoke_detector" => DeviceType::SmokeDetector,
            _ => DeviceType::Unknown,
        }
    }
}

impl From<String> for DeviceType {
    fn from(value: String) -> Self {
        DeviceType::from(value.as_str())
    }
}

impl From<DeviceType> for String {
    fn from(value: DeviceType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Registry entry for one device.
///
/// # Examples
/// ```
/// use sensorlink_core::{DeviceDescriptor, DeviceType};
///
/// let descriptor: DeviceDescriptor = serde_json::from_str(
///     r#"{"name": "bathroom", "type": "sw_leak_detector", "code": "4711"}"#,
/// )?;
/// assert_eq!(descriptor.device_type, DeviceType::LeakDetector);
/// # Ok::<(), serde_json::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceDescriptor {
    /// Display name, also used as the topic segment.
    pub name: String,
    #[serde(rename = "type")]
    pub device_type: DeviceType,
    /// Opaque inventory identifier, passed through untouched.
    #[serde(default)]
    pub code: String,
}

impl DeviceDescriptor {
    pub fn new(name: impl Into<String>, device_type: DeviceType) -> Self {
        Self {
            name: name.into(),
            device_type,
            code: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("invalid device code '{key}': expected up to 8 hexadecimal digits")]
    InvalidCode { key: String },
}

/// Result of resolving a device code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceLookup<'a> {
    Known(&'a DeviceDescriptor),
    /// Not provisioned yet (or asleep); the frame is dropped quietly.
    Unknown { code: u32 },
}

/// Render a device code the way registry keys are written: uppercase hex,
/// no padding.
pub fn device_key(code: u32) -> String {
    format!("{:X}", code)
}

/// Parse a registry key back into a device code (case-insensitive, leading
/// zeros allowed).
pub fn parse_device_key(key: &str) -> Result<u32, RegistryError> {
    let trimmed = key.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    if digits.is_empty() {
        return Err(RegistryError::InvalidCode {
            key: key.to_string(),
        });
    }
    u32::from_str_radix(digits, 16).map_err(|_| RegistryError::InvalidCode {
        key: key.to_string(),
    })
}

/// Immutable lookup table from device code to descriptor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceRegistry {
    devices: BTreeMap<u32, DeviceDescriptor>,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from hex listen-code keys.
    pub fn from_listen_codes<'a, I>(entries: I) -> Result<Self, RegistryError>
    where
        I: IntoIterator<Item = (&'a str, DeviceDescriptor)>,
    {
        let mut devices = BTreeMap::new();
        for (key, descriptor) in entries {
            devices.insert(parse_device_key(key)?, descriptor);
        }
        Ok(Self { devices })
    }

    pub fn with_device(mut self, code: u32, descriptor: DeviceDescriptor) -> Self {
        self.devices.insert(code, descriptor);
        self
    }

    pub fn lookup(&self, code: u32) -> DeviceLookup<'_> {
        match self.devices.get(&code) {
            Some(descriptor) => DeviceLookup::Known(descriptor),
            None => DeviceLookup::Unknown { code },
        }
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Entries in ascending code order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &DeviceDescriptor)> {
        self.devices.iter().map(|(code, descriptor)| (*code, descriptor))
    }
}

impl Serialize for DeviceRegistry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(
            self.devices
                .iter()
                .map(|(code, descriptor)| (device_key(*code), descriptor)),
        )
    }
}

/// Swappable handle to the current registry snapshot.
///
/// Readers clone the inner `Arc`, so a snapshot taken for one poll stays
/// unchanged even if a new registry is installed meanwhile.
#[derive(Debug, Clone, Default)]
pub struct SharedRegistry {
    current: Arc<RwLock<Arc<DeviceRegistry>>>,
}

impl SharedRegistry {
    pub fn new(registry: DeviceRegistry) -> Self {
        Self {
            current: Arc::new(RwLock::new(Arc::new(registry))),
        }
    }

    pub fn snapshot(&self) -> Arc<DeviceRegistry> {
        let guard = self
            .current
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Arc::clone(&guard)
    }

    pub fn replace(&self, registry: DeviceRegistry) {
        let mut guard = self
            .current
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = Arc::new(registry);
    }
}

impl From<DeviceRegistry> for SharedRegistry {
    fn from(registry: DeviceRegistry) -> Self {
        SharedRegistry::new(registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn thermometer() -> DeviceDescriptor {
        DeviceDescriptor::new("living_room", DeviceType::Thermometer)
    }

    #[test]
    fn device_type_parses_inventory_names() {
        assert_eq!(DeviceType::from("hw_energy_switch"), DeviceType::EnergySwitch);
        assert_eq!(DeviceType::from("hw_thermometer"), DeviceType::Thermometer);
        assert_eq!(DeviceType::from("sw_leak_detector"), DeviceType::LeakDetector);
        assert_eq!(DeviceType::from("sw_smoke_detector"), DeviceType::SmokeDetector);
        assert_eq!(DeviceType::from("hw_doorbell"), DeviceType::Unknown);
    }

    #[test]
    fn device_key_is_unpadded_uppercase_hex() {
        assert_eq!(device_key(0x00AB_CDEF), "ABCDEF");
        assert_eq!(device_key(0), "0");
    }

    #[test]
    fn parse_device_key_accepts_case_and_padding_variants() {
        assert_eq!(parse_device_key("abcdef").unwrap(), 0xABCDEF);
        assert_eq!(parse_device_key("00ABCDEF").unwrap(), 0xABCDEF);
        assert_eq!(parse_device_key("0xABCDEF").unwrap(), 0xABCDEF);
        assert!(parse_device_key("").is_err());
        assert!(parse_device_key("kitchen").is_err());
        assert!(parse_device_key("123456789").is_err());
    }

    #[test]
    fn lookup_resolves_known_and_reports_unknown() {
        let registry =
            DeviceRegistry::from_listen_codes([("1a2b", thermometer())]).expect("registry");
        assert_eq!(registry.lookup(0x1A2B), DeviceLookup::Known(&thermometer()));
        assert_eq!(registry.lookup(0x1A2C), DeviceLookup::Unknown { code: 0x1A2C });
    }

    #[test]
    fn invalid_listen_code_is_rejected() {
        let err = DeviceRegistry::from_listen_codes([("zz", thermometer())]).unwrap_err();
        assert_eq!(
            err,
            RegistryError::InvalidCode {
                key: "zz".to_string()
            }
        );
    }

    #[test]
    fn registry_serializes_with_hex_keys() {
        let registry = DeviceRegistry::new().with_device(0xBEEF, thermometer());
        let value = serde_json::to_value(&registry).unwrap();
        assert_eq!(value["BEEF"]["name"], "living_room");
        assert_eq!(value["BEEF"]["type"], "hw_thermometer");
    }

    #[test]
    fn shared_registry_swaps_whole_snapshots() {
        let shared = SharedRegistry::new(DeviceRegistry::new());
        let before = shared.snapshot();
        shared.replace(DeviceRegistry::new().with_device(1, thermometer()));
        let after = shared.snapshot();

        assert!(before.is_empty());
        assert_eq!(after.len(), 1);
    }
}
