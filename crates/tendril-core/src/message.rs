//! Outbound state payloads
//!
//! One message per device per cycle. Timestamps are wall-clock epoch
//! seconds taken at message construction, not at measurement.

use crate::device::{DeviceId, Presence};
use chrono::Utc;
use serde::Serialize;

/// Wall-clock timestamp in epoch seconds
pub fn epoch_seconds() -> f64 {
    Utc::now().timestamp_micros() as f64 / 1_000_000.0
}

/// State payload for a configured device found on the bus
///
/// `temperature` is null when the device was enumerated but yielded no
/// valid reading this cycle (conversion pending or transient read failure).
#[derive(Debug, Clone, Serialize)]
pub struct PresentMessage {
    pub temperature: Option<f64>,
    pub status: Presence,
    pub name: String,
    pub device_id: DeviceId,
    pub timestamp: f64,
}

impl PresentMessage {
    pub fn new(temperature: Option<f64>, name: &str, device_id: &DeviceId) -> Self {
        Self {
            temperature,
            status: Presence::Present,
            name: name.to_string(),
            device_id: device_id.clone(),
            timestamp: epoch_seconds(),
        }
    }
}

/// State payload for a bus device absent from configuration
#[derive(Debug, Clone, Serialize)]
pub struct NotConfiguredMessage {
    pub status: Presence,
    pub name: &'static str,
    pub device_id: DeviceId,
    pub timestamp: f64,
}

impl NotConfiguredMessage {
    pub fn new(device_id: &DeviceId) -> Self {
        Self {
            status: Presence::NotConfigured,
            name: "unknown",
            device_id: device_id.clone(),
            timestamp: epoch_seconds(),
        }
    }
}

/// State payload for a configured device not found on the bus
#[derive(Debug, Clone, Serialize)]
pub struct MissingMessage {
    pub temperature: &'static str,
    pub status: Presence,
    pub name: String,
    pub device_id: DeviceId,
    pub timestamp: f64,
}

impl MissingMessage {
    pub fn new(name: &str, device_id: &DeviceId) -> Self {
        Self {
            temperature: "none",
            status: Presence::Missing,
            name: name.to_string(),
            device_id: device_id.clone(),
            timestamp: epoch_seconds(),
        }
    }
}
