use async_trait::async_trait;
use beacon_core::utils::{DEFAULT_BROKER_HOST, DEFAULT_BROKER_PORT, DEFAULT_TOPIC_NAMESPACE};
use beacon_core::{RoomName, SignalMessage};
use dashmap::DashMap;
use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Packet, QoS};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::Result;
use crate::signaling::SignalingTransport;

const RECONNECT_DELAY: Duration = Duration::from_secs(1);

type Subscribers = Arc<DashMap<String, Vec<mpsc::UnboundedSender<SignalMessage>>>>;

#[derive(Debug, Clone)]
pub struct MqttConfig {
    pub host: String,
    pub port: u16,
    /// Topic prefix; rooms live at `<namespace>/<room>/join`.
    pub namespace: String,
    pub client_id: String,
    pub keep_alive: Duration,
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_BROKER_HOST.to_owned(),
            port: DEFAULT_BROKER_PORT,
            namespace: DEFAULT_TOPIC_NAMESPACE.to_owned(),
            client_id: format!("beacon-{}", Uuid::new_v4().simple()),
            keep_alive: Duration::from_secs(30),
        }
    }
}

/// Signaling over one MQTT broker connection shared by all rooms.
pub struct MqttTransport {
    client: AsyncClient,
    namespace: String,
    subscribers: Subscribers,
    event_loop: JoinHandle<()>,
}

impl MqttTransport {
    /// Spawns the broker event loop; must be called inside a tokio runtime.
    pub fn connect(config: MqttConfig) -> Self {
        let mut options = MqttOptions::new(config.client_id, config.host, config.port);
        options.set_keep_alive(config.keep_alive);

        let (client, event_loop) = AsyncClient::new(options, 64);
        let subscribers: Subscribers = Arc::new(DashMap::new());

        let event_loop = tokio::spawn(run_event_loop(
            event_loop,
            client.clone(),
            subscribers.clone(),
        ));

        Self {
            client,
            namespace: config.namespace,
            subscribers,
            event_loop,
        }
    }

    fn topic(&self, room: &RoomName) -> String {
        room.join_topic(&self.namespace)
    }
}

impl Drop for MqttTransport {
    fn drop(&mut self) {
        self.event_loop.abort();
    }
}

#[async_trait]
impl SignalingTransport for MqttTransport {
    async fn subscribe(&self, room: &RoomName) -> Result<mpsc::UnboundedReceiver<SignalMessage>> {
        let topic = self.topic(room);
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.entry(topic.clone()).or_default().push(tx);

        self.client.subscribe(&topic, QoS::AtMostOnce).await?;
        debug!("Subscribed to {}", topic);
        Ok(rx)
    }

    async fn publish(&self, room: &RoomName, message: &SignalMessage) -> Result<()> {
        let payload = message.encode()?;
        self.client
            .publish(self.topic(room), QoS::AtMostOnce, false, payload.to_vec())
            .await?;
        Ok(())
    }
}

async fn run_event_loop(mut event_loop: EventLoop, client: AsyncClient, subscribers: Subscribers) {
    loop {
        match event_loop.poll().await {
            Ok(Event::Incoming(Packet::ConnAck(_))) => {
                info!("Connected to MQTT broker");
                // A fresh broker session has no subscriptions; restore ours.
                for entry in subscribers.iter() {
                    if let Err(e) = client.try_subscribe(entry.key().as_str(), QoS::AtMostOnce) {
                        warn!("Failed to resubscribe to {}: {}", entry.key(), e);
                    }
                }
            }
            Ok(Event::Incoming(Packet::Publish(publish))) => {
                route_publish(&subscribers, &publish.topic, &publish.payload);
            }
            Ok(_) => {}
            Err(e) => {
                warn!("MQTT connection error: {}", e);
                tokio::time::sleep(RECONNECT_DELAY).await;
            }
        }
    }
}

fn route_publish(subscribers: &Subscribers, topic: &str, payload: &[u8]) {
    let message = match SignalMessage::decode(payload) {
        Ok(message) => message,
        Err(e) => {
            warn!("Dropping undecodable message on {}: {}", topic, e);
            return;
        }
    };

    let Some(mut subs) = subscribers.get_mut(topic) else {
        return;
    };
    subs.retain(|tx| tx.send(message.clone()).is_ok());
}
