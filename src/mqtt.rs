//! MQTT transport for inbound state messages and the outbound trigger

use crate::config::BrokerConfig;
use crate::listener::TriggerSignalListener;
use crate::publisher::TriggerPublisher;
use lightpoint_core::{ChangeReport, Error, Result};
use rumqttc::{Client, Connection, Event, MqttOptions, Packet, QoS};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Publishes the empty outbound trigger without blocking.
pub struct MqttPublisher {
    client: Client,
    topic: String,
}

impl TriggerPublisher for MqttPublisher {
    fn publish_trigger(&mut self, reports: &[ChangeReport]) -> Result<()> {
        self.client
            .try_publish(self.topic.as_str(), QoS::AtMostOnce, false, Vec::<u8>::new())
            .map_err(|e| Error::PublishFailure(e.to_string()))?;
        debug!(topic = %self.topic, reports = reports.len(), "trigger published");
        Ok(())
    }
}

/// The broker connection and the thread servicing it.
pub struct MqttBridge {
    client: Client,
    handle: Option<JoinHandle<()>>,
}

impl MqttBridge {
    /// Connect and start the listener thread. Inbound payloads on the
    /// subscribe topic go to `listener` on that thread; device work never
    /// happens there.
    pub fn start(
        config: &BrokerConfig,
        listener: TriggerSignalListener,
        running: Arc<AtomicBool>,
    ) -> Result<(Self, MqttPublisher)> {
        let mut options = MqttOptions::new(config.client_id.as_str(), config.host.as_str(), config.port);
        options.set_keep_alive(config.keep_alive());
        let (client, connection) = Client::new(options, 16);

        let worker = EventLoopWorker {
            client: client.clone(),
            topic: config.subscribe_topic.clone(),
            reconnect_delay: config.reconnect_delay(),
            listener,
            running,
        };
        let handle = thread::Builder::new()
            .name("mqtt-listener".to_string())
            .spawn(move || worker.run(connection))?;

        info!(host = %config.host, port = config.port, topic = %config.subscribe_topic, "mqtt bridge started");
        let publisher = MqttPublisher {
            client: client.clone(),
            topic: config.publish_topic.clone(),
        };
        Ok((
            Self {
                client,
                handle: Some(handle),
            },
            publisher,
        ))
    }

    /// Disconnect and wait for the listener thread. Call after clearing the
    /// running flag.
    pub fn shutdown(mut self) {
        if let Err(e) = self.client.disconnect() {
            debug!(error = %e, "mqtt disconnect");
        }
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("mqtt listener thread panicked");
            }
        }
    }
}

struct EventLoopWorker {
    client: Client,
    topic: String,
    reconnect_delay: Duration,
    listener: TriggerSignalListener,
    running: Arc<AtomicBool>,
}

impl EventLoopWorker {
    fn run(mut self, mut connection: Connection) {
        for notification in connection.iter() {
            if !self.running.load(Ordering::SeqCst) {
                break;
            }
            match notification {
                Ok(Event::Incoming(Packet::ConnAck(_))) => {
                    // Subscriptions do not survive a reconnect.
                    match self.client.try_subscribe(self.topic.as_str(), QoS::AtMostOnce) {
                        Ok(()) => info!(topic = %self.topic, "subscribed"),
                        Err(e) => warn!(topic = %self.topic, error = %e, "subscribe failed"),
                    }
                }
                Ok(Event::Incoming(Packet::Publish(publish))) => {
                    if publish.topic == self.topic {
                        self.listener.handle_payload(&publish.payload, Instant::now());
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    warn!(error = %e, delay_ms = self.reconnect_delay.as_millis() as u64, "mqtt connection error");
                    thread::sleep(self.reconnect_delay);
                }
            }
        }
        debug!("mqtt listener stopped");
    }
}
