use async_trait::async_trait;
use beacon_core::{RoomName, SignalMessage};
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::trace;

use crate::Result;
use crate::signaling::SignalingTransport;

/// In-process signaling hub. Clones share the same subscriber table.
#[derive(Clone, Default)]
pub struct LocalBus {
    rooms: Arc<DashMap<RoomName, Vec<mpsc::UnboundedSender<SignalMessage>>>>,
}

impl LocalBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscriber_count(&self, room: &RoomName) -> usize {
        self.rooms
            .get(room)
            .map(|subs| subs.iter().filter(|tx| !tx.is_closed()).count())
            .unwrap_or(0)
    }
}

#[async_trait]
impl SignalingTransport for LocalBus {
    async fn subscribe(&self, room: &RoomName) -> Result<mpsc::UnboundedReceiver<SignalMessage>> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.rooms.entry(room.clone()).or_default().push(tx);
        Ok(rx)
    }

    async fn publish(&self, room: &RoomName, message: &SignalMessage) -> Result<()> {
        let Some(mut subscribers) = self.rooms.get_mut(room) else {
            trace!("No subscribers in room {}", room);
            return Ok(());
        };
        subscribers.retain(|tx| tx.send(message.clone()).is_ok());
        Ok(())
    }
}
