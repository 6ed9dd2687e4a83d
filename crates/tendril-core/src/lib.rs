//! Tendril Core - device identity, record parsing, and outbound payloads
//!
//! This crate provides the foundational types for the Tendril bridge:
//! - Device identifiers and per-device configuration entries
//! - Raw w1 sensor record parsing
//! - Presence classification and the JSON payloads published per cycle

pub mod device;
pub mod message;
pub mod reading;

pub use device::{DeviceId, DeviceMap, DeviceSpec, Presence};
pub use message::{epoch_seconds, MissingMessage, NotConfiguredMessage, PresentMessage};
pub use reading::{parse_record, RecordError};
