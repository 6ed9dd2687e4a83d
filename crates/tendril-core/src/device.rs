//! Device identity and per-device configuration

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Unique identifier for a bus device, as reported by the bus itself
/// (e.g. "28-0000054c2e11")
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceId(pub String);

impl DeviceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for DeviceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for DeviceId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Per-cycle classification of a device id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Presence {
    /// Configured and found on the bus this cycle
    #[serde(rename = "PRESENT")]
    Present,
    /// Configured but not found on the bus this cycle
    #[serde(rename = "MISSING")]
    Missing,
    /// Found on the bus but absent from configuration
    #[serde(rename = "NOT CONFIGURED")]
    NotConfigured,
}

/// Configuration entry for one device
///
/// Entries come from the configuration file and are read-only during a run.
/// `name` and `state_topic` are both required for state and discovery
/// publishing; an entry missing either is treated as inconsistent and
/// skipped per cycle. Any additional keys are carried verbatim into the
/// discovery payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeviceSpec {
    /// Human-readable name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// State topic suffix, appended to the configured topic prefix
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_topic: Option<String>,
    /// Extra discovery attributes (device_class, unit_of_measurement, ...)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl DeviceSpec {
    /// Name and state topic together, when the entry is fully configured
    pub fn name_and_topic(&self) -> Option<(&str, &str)> {
        match (self.name.as_deref(), self.state_topic.as_deref()) {
            (Some(name), Some(topic)) => Some((name, topic)),
            _ => None,
        }
    }
}

/// Configured devices keyed by bus id. BTreeMap so reconciliation and
/// discovery iterate in a stable order.
pub type DeviceMap = BTreeMap<DeviceId, DeviceSpec>;
