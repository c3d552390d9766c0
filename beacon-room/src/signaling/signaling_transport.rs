use async_trait::async_trait;
use beacon_core::{RoomName, SignalMessage};
use tokio::sync::mpsc;

use crate::Result;

/// Out-of-band channel rooms use to find each other and relay negotiation.
///
/// Delivery is best effort: no acknowledgement and no retry. A room receives
/// its own broadcasts back and is expected to drop them.
#[async_trait]
pub trait SignalingTransport: Send + Sync {
    /// Starts receiving every message published to `room`.
    async fn subscribe(&self, room: &RoomName) -> Result<mpsc::UnboundedReceiver<SignalMessage>>;

    async fn publish(&self, room: &RoomName, message: &SignalMessage) -> Result<()>;
}
