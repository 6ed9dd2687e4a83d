//! Presence reconciliation and the polling loop

use std::collections::HashSet;
use std::time::{Duration, Instant};

use serde::Serialize;
use serde_json::{Map, Value};
use tendril_core::{
    parse_record, DeviceId, DeviceMap, MissingMessage, NotConfiguredMessage, PresentMessage,
};
use tendril_w1::{BusDevice, W1Bus};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::discovery::build_discovery;
use crate::publisher::Publisher;
use crate::schedule::{remaining, DiscoveryThrottle};

/// Settings for the polling loop, derived from configuration
#[derive(Debug, Clone)]
pub struct PollSettings {
    /// Prefix prepended to every state topic
    pub topic_prefix: String,
    /// Base topic for Home Assistant discovery messages
    pub ha_discovery_topic: String,
    /// Common fields shared by all discovery messages
    pub template: Map<String, Value>,
    /// Target cycle duration
    pub period: Duration,
    /// Cycles between discovery emissions
    pub ha_discovery_rep: u32,
    /// QoS for state messages (discovery is always QoS 1, retained)
    pub qos: u8,
}

/// Counts of the messages produced by one reconciliation cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleSummary {
    pub present: usize,
    pub missing: usize,
    pub unconfigured: usize,
}

/// Drives the loop: bus scan, presence reconciliation, throttled discovery
/// emission, drift-compensated sleep
pub struct Poller<B, P> {
    settings: PollSettings,
    devices: DeviceMap,
    bus: B,
    publisher: P,
    throttle: DiscoveryThrottle,
}

impl<B: W1Bus, P: Publisher> Poller<B, P> {
    pub fn new(settings: PollSettings, devices: DeviceMap, bus: B, publisher: P) -> Self {
        let throttle = DiscoveryThrottle::new(settings.ha_discovery_rep);
        Self {
            settings,
            devices,
            bus,
            publisher,
            throttle,
        }
    }

    /// Run one reconciliation cycle
    ///
    /// Every enumerated device produces exactly one outbound message (or a
    /// logged skip for inconsistent configuration), and every configured
    /// device absent from enumeration produces exactly one MISSING message.
    /// Failures are scoped to the device that caused them; the cycle always
    /// completes.
    pub fn poll_cycle(&self) -> CycleSummary {
        let mut summary = CycleSummary::default();
        let mut seen: HashSet<DeviceId> = HashSet::new();

        for found in self.bus.enumerate() {
            let reading = self.read_temperature(&found);
            match self.devices.get(&found.id) {
                Some(spec) => match spec.name_and_topic() {
                    Some((name, state_topic)) => {
                        let topic = format!("{}{}", self.settings.topic_prefix, state_topic);
                        let message = PresentMessage::new(reading, name, &found.id);
                        self.publish_json(&topic, &message, self.settings.qos, false);
                        summary.present += 1;
                    }
                    None => {
                        warn!(device = %found.id, "Inconsistent device configuration");
                    }
                },
                None => {
                    info!(device = %found.id, "Unconfigured device");
                    let topic = format!("{}{}", self.settings.topic_prefix, found.id);
                    let message = NotConfiguredMessage::new(&found.id);
                    self.publish_json(&topic, &message, self.settings.qos, false);
                    summary.unconfigured += 1;
                }
            }
            seen.insert(found.id);
        }

        for (id, spec) in &self.devices {
            if seen.contains(id) {
                continue;
            }
            match spec.name_and_topic() {
                Some((name, state_topic)) => {
                    info!(device = %id, "Missing device");
                    let topic = format!("{}{}", self.settings.topic_prefix, state_topic);
                    let message = MissingMessage::new(name, id);
                    self.publish_json(&topic, &message, self.settings.qos, false);
                    summary.missing += 1;
                }
                None => {
                    warn!(device = %id, "Inconsistent device configuration");
                }
            }
        }

        summary
    }

    /// Publish discovery metadata for every fully-configured device
    pub fn publish_discovery(&self) {
        for (id, spec) in &self.devices {
            match build_discovery(
                id,
                spec,
                &self.settings.template,
                &self.settings.topic_prefix,
                &self.settings.ha_discovery_topic,
            ) {
                Some((topic, body)) => {
                    debug!(device = %id, topic = %topic, "Publishing device discovery");
                    self.publish_json(&topic, &body, 1, true);
                }
                None => {
                    debug!(device = %id, "Skipping discovery for incomplete device entry");
                }
            }
        }
    }

    /// Run the polling loop until the shutdown signal is set
    ///
    /// The sleep between cycles is the only suspension point and races the
    /// shutdown signal, so cancellation is honored promptly rather than at
    /// the next period boundary.
    pub async fn run(&mut self, mut shutdown: watch::Receiver<bool>) {
        info!(
            period_secs = self.settings.period.as_secs_f64(),
            devices = self.devices.len(),
            "Poll loop started"
        );

        loop {
            let started = Instant::now();

            let summary = self.poll_cycle();
            debug!(
                present = summary.present,
                missing = summary.missing,
                unconfigured = summary.unconfigured,
                "Cycle complete"
            );

            if self.throttle.should_emit() {
                self.publish_discovery();
            }

            if *shutdown.borrow() {
                break;
            }
            self.throttle.advance();

            if let Some(pause) = remaining(self.settings.period, started.elapsed()) {
                tokio::select! {
                    _ = tokio::time::sleep(pause) => {}
                    _ = wait_for_shutdown(&mut shutdown) => break,
                }
            }
        }

        info!("Poll loop stopped");
    }

    /// Read and parse one device's raw record
    ///
    /// Failures are scoped to the device and logged; the reading is simply
    /// absent this cycle.
    fn read_temperature(&self, device: &BusDevice) -> Option<f64> {
        let lines = match self.bus.read_raw(device) {
            Ok(lines) => lines,
            Err(e) => {
                warn!(device = %device.id, error = %e, "Reading sensor data failed");
                return None;
            }
        };
        match parse_record(&lines) {
            Ok(Some(celsius)) => Some(celsius),
            Ok(None) => {
                debug!(device = %device.id, "No valid measurement in record");
                None
            }
            Err(e) => {
                warn!(device = %device.id, error = %e, "Malformed sensor record");
                None
            }
        }
    }

    fn publish_json<T: Serialize>(&self, topic: &str, payload: &T, qos: u8, retain: bool) {
        match serde_json::to_string(payload) {
            Ok(body) => self.publisher.publish(topic, body, qos, retain),
            Err(e) => warn!(topic = %topic, error = %e, "Failed to encode payload"),
        }
    }
}

/// Resolves once the shutdown flag turns true (or the sender is gone)
async fn wait_for_shutdown(shutdown: &mut watch::Receiver<bool>) {
    while !*shutdown.borrow_and_update() {
        if shutdown.changed().await.is_err() {
            return;
        }
    }
}
