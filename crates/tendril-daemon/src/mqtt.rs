//! MQTT connection handling
//!
//! One broker connection for the whole process: opened before the poll
//! loop starts, shared by every publish, closed once at shutdown.

use anyhow::{Context, Result};
use rumqttc::{AsyncClient, Event, Incoming, MqttOptions, QoS};
use std::time::Duration;
use tendril_poll::Publisher;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::MqttConfig;

/// Outgoing request queue depth
const CHANNEL_CAPACITY: usize = 64;

/// Handle to the broker connection
#[derive(Clone)]
pub struct MqttClient {
    client: AsyncClient,
}

impl MqttClient {
    /// Connect to the broker and spawn the event-loop drive task
    ///
    /// Returns once the broker has acknowledged the session; a failure here
    /// aborts startup. After that, rumqttc reconnects on its own and the
    /// drive task only logs connection state.
    pub async fn connect(config: &MqttConfig) -> Result<(Self, JoinHandle<()>)> {
        let mut options = MqttOptions::new(&config.client_id, &config.broker, config.port);
        options.set_keep_alive(Duration::from_secs(30));

        let (client, mut eventloop) = AsyncClient::new(options, CHANNEL_CAPACITY);

        loop {
            match eventloop.poll().await {
                Ok(Event::Incoming(Incoming::ConnAck(_))) => {
                    info!(
                        broker = %config.broker,
                        port = config.port,
                        "Connected to MQTT broker"
                    );
                    break;
                }
                Ok(event) => debug!(?event, "MQTT event before session acknowledgment"),
                Err(e) => {
                    return Err(e).with_context(|| {
                        format!(
                            "Failed to connect to MQTT broker {}:{}",
                            config.broker, config.port
                        )
                    });
                }
            }
        }

        let task = tokio::spawn(async move {
            loop {
                match eventloop.poll().await {
                    Ok(Event::Incoming(Incoming::ConnAck(_))) => {
                        info!("MQTT session re-established");
                    }
                    Ok(_) => {}
                    Err(e) => {
                        warn!(error = %e, "MQTT connection error");
                        tokio::time::sleep(Duration::from_secs(1)).await;
                    }
                }
            }
        });

        Ok((Self { client }, task))
    }

    /// Close the broker connection
    pub async fn disconnect(&self) {
        if let Err(e) = self.client.disconnect().await {
            debug!(error = %e, "MQTT disconnect after connection teardown");
        }
    }
}

impl Publisher for MqttClient {
    fn publish(&self, topic: &str, payload: String, qos: u8, retain: bool) {
        let qos = match qos {
            0 => QoS::AtMostOnce,
            1 => QoS::AtLeastOnce,
            _ => QoS::ExactlyOnce,
        };
        // Fire-and-forget: a full or closed queue costs this message only
        if let Err(e) = self.client.try_publish(topic, qos, retain, payload) {
            warn!(topic = %topic, error = %e, "Failed to queue MQTT publish");
        }
    }
}
