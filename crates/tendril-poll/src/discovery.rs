//! Home Assistant discovery metadata
//!
//! One retained message per fully-configured device, so late-joining
//! subscribers receive the last discovery state without waiting for a
//! fresh cycle.

use serde_json::{json, Map, Value};
use tendril_core::{DeviceId, DeviceSpec};

/// Build the discovery message for one configured device
///
/// Returns the target topic and payload, or `None` when the entry lacks
/// the name or state topic required to address the message. The payload is
/// the template overlaid with the device's own fields; the computed
/// `unique_id`, `object_id` and `state_topic` always win on key conflicts.
pub fn build_discovery(
    id: &DeviceId,
    spec: &DeviceSpec,
    template: &Map<String, Value>,
    topic_prefix: &str,
    ha_discovery_topic: &str,
) -> Option<(String, Value)> {
    let (name, state_topic) = spec.name_and_topic()?;

    let mut body = template.clone();
    if let Ok(Value::Object(fields)) = serde_json::to_value(spec) {
        body.extend(fields);
    }
    body.insert("unique_id".to_string(), json!(id.as_str()));
    body.insert("object_id".to_string(), json!(id.as_str()));
    body.insert(
        "state_topic".to_string(),
        json!(format!("{}{}", topic_prefix, state_topic)),
    );

    let topic = format!("{}{}/config", ha_discovery_topic, name);
    Some((topic, Value::Object(body)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template() -> Map<String, Value> {
        let mut template = Map::new();
        template.insert("device_class".to_string(), json!("temperature"));
        template.insert("unit_of_measurement".to_string(), json!("°C"));
        template
    }

    fn spec(name: &str, state_topic: &str) -> DeviceSpec {
        DeviceSpec {
            name: Some(name.to_string()),
            state_topic: Some(state_topic.to_string()),
            extra: Map::new(),
        }
    }

    #[test]
    fn test_topic_and_computed_fields() {
        let id = DeviceId::from("28-000001");
        let (topic, body) = build_discovery(
            &id,
            &spec("outdoor", "outdoor/temp"),
            &template(),
            "w1/",
            "homeassistant/sensor/",
        )
        .unwrap();

        assert_eq!(topic, "homeassistant/sensor/outdoor/config");
        let body = body.as_object().unwrap();
        assert_eq!(body["unique_id"], "28-000001");
        assert_eq!(body["object_id"], "28-000001");
        assert_eq!(body["state_topic"], "w1/outdoor/temp");
        assert_eq!(body["device_class"], "temperature");
        assert_eq!(body["name"], "outdoor");
    }

    #[test]
    fn test_device_fields_override_template() {
        let mut spec = spec("outdoor", "outdoor/temp");
        spec.extra
            .insert("device_class".to_string(), json!("humidity"));

        let (_, body) = build_discovery(
            &DeviceId::from("28-000001"),
            &spec,
            &template(),
            "w1/",
            "homeassistant/sensor/",
        )
        .unwrap();

        assert_eq!(body.as_object().unwrap()["device_class"], "humidity");
    }

    #[test]
    fn test_computed_fields_override_everything() {
        let mut template = template();
        template.insert("unique_id".to_string(), json!("from-template"));
        let mut spec = spec("outdoor", "outdoor/temp");
        spec.extra
            .insert("state_topic".to_string(), json!("from-device"));

        let (_, body) = build_discovery(
            &DeviceId::from("28-000001"),
            &spec,
            &template,
            "w1/",
            "homeassistant/sensor/",
        )
        .unwrap();

        let body = body.as_object().unwrap();
        assert_eq!(body["unique_id"], "28-000001");
        assert_eq!(body["state_topic"], "w1/outdoor/temp");
    }

    #[test]
    fn test_incomplete_entry_is_skipped() {
        let incomplete = DeviceSpec {
            name: Some("outdoor".to_string()),
            state_topic: None,
            extra: Map::new(),
        };
        assert!(build_discovery(
            &DeviceId::from("28-000001"),
            &incomplete,
            &template(),
            "w1/",
            "homeassistant/sensor/",
        )
        .is_none());
    }
}
