//! Configuration loading and validation
//!
//! ```toml
//! topic_prefix = "w1/"
//! ha_discovery_topic = "homeassistant/sensor/"
//! ha_discovery_rep = 10
//! period = 30.0
//!
//! [mqtt]
//! broker = "localhost"
//! port = 1883
//!
//! [template]
//! device_class = "temperature"
//! unit_of_measurement = "°C"
//!
//! [devices."28-0000054c2e11"]
//! name = "outdoor"
//! state_topic = "outdoor/temp"
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;
use std::time::Duration;
use tendril_core::DeviceMap;
use tendril_poll::PollSettings;
use tracing::info;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub mqtt: MqttConfig,
    /// Prefix prepended to every state topic
    #[serde(default = "default_topic_prefix")]
    pub topic_prefix: String,
    /// Base topic for Home Assistant discovery messages
    #[serde(default = "default_ha_discovery_topic")]
    pub ha_discovery_topic: String,
    /// Polling cycles between discovery emissions
    #[serde(default = "default_ha_discovery_rep")]
    pub ha_discovery_rep: u32,
    /// Target cycle duration in seconds
    #[serde(default = "default_period")]
    pub period: f64,
    /// Configured devices, keyed by bus id
    #[serde(default)]
    pub devices: DeviceMap,
    /// Common fields shared by all discovery messages
    #[serde(default)]
    pub template: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MqttConfig {
    /// Broker host name or address
    #[serde(default = "default_broker")]
    pub broker: String,
    /// Broker port
    #[serde(default = "default_port")]
    pub port: u16,
    /// Client identifier presented to the broker
    #[serde(default = "default_client_id")]
    pub client_id: String,
    /// QoS for state messages (discovery is always published at QoS 1)
    #[serde(default)]
    pub qos: u8,
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            broker: default_broker(),
            port: default_port(),
            client_id: default_client_id(),
            qos: 0,
        }
    }
}

fn default_broker() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    1883
}

fn default_client_id() -> String {
    "tendril".to_string()
}

fn default_topic_prefix() -> String {
    "w1/".to_string()
}

fn default_ha_discovery_topic() -> String {
    "homeassistant/sensor/".to_string()
}

fn default_ha_discovery_rep() -> u32 {
    10
}

fn default_period() -> f64 {
    30.0
}

impl Config {
    /// Convert to PollSettings
    pub fn to_poll_settings(&self) -> PollSettings {
        PollSettings {
            topic_prefix: self.topic_prefix.clone(),
            ha_discovery_topic: self.ha_discovery_topic.clone(),
            template: self.template.clone(),
            period: Duration::from_secs_f64(self.period),
            ha_discovery_rep: self.ha_discovery_rep,
            qos: self.mqtt.qos,
        }
    }
}

/// Load configuration from file
///
/// A missing or unparsable file is fatal: the bridge is useless without
/// its device definitions.
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read configuration {}", path.display()))?;
    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse configuration {}", path.display()))?;
    anyhow::ensure!(
        config.period > 0.0 && config.period.is_finite(),
        "period must be a positive number of seconds"
    );
    info!(
        path = %path.display(),
        devices = config.devices.len(),
        "Loaded configuration"
    );
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tendril_core::DeviceId;

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
topic_prefix = "house/w1/"
ha_discovery_topic = "homeassistant/sensor/"
ha_discovery_rep = 20
period = 15.0

[mqtt]
broker = "broker.local"
port = 8883
client_id = "bridge-1"
qos = 1

[template]
device_class = "temperature"
unit_of_measurement = "°C"

[devices."28-000001"]
name = "outdoor"
state_topic = "outdoor/temp"
expire_after = 120

[devices."28-000002"]
name = "boiler"
state_topic = "boiler/temp"
"#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.mqtt.broker, "broker.local");
        assert_eq!(config.mqtt.port, 8883);
        assert_eq!(config.mqtt.qos, 1);
        assert_eq!(config.topic_prefix, "house/w1/");
        assert_eq!(config.ha_discovery_rep, 20);
        assert_eq!(config.period, 15.0);
        assert_eq!(config.devices.len(), 2);

        let outdoor = &config.devices[&DeviceId::from("28-000001")];
        assert_eq!(outdoor.name.as_deref(), Some("outdoor"));
        assert_eq!(outdoor.state_topic.as_deref(), Some("outdoor/temp"));
        assert_eq!(
            outdoor.extra.get("expire_after").and_then(|v| v.as_i64()),
            Some(120)
        );

        assert_eq!(
            config.template.get("device_class").and_then(|v| v.as_str()),
            Some("temperature")
        );
    }

    #[test]
    fn test_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.mqtt.broker, "localhost");
        assert_eq!(config.mqtt.port, 1883);
        assert_eq!(config.mqtt.client_id, "tendril");
        assert_eq!(config.mqtt.qos, 0);
        assert_eq!(config.topic_prefix, "w1/");
        assert_eq!(config.ha_discovery_topic, "homeassistant/sensor/");
        assert_eq!(config.ha_discovery_rep, 10);
        assert_eq!(config.period, 30.0);
        assert!(config.devices.is_empty());
        assert!(config.template.is_empty());
    }

    #[test]
    fn test_to_poll_settings() {
        let config: Config = toml::from_str("period = 2.5").unwrap();
        let settings = config.to_poll_settings();
        assert_eq!(settings.period, Duration::from_millis(2500));
        assert_eq!(settings.ha_discovery_rep, 10);
    }
}
