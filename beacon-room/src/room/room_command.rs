use beacon_core::{PeerId, SignalMessage};
use tokio::sync::oneshot;

use crate::Result;

/// Requests from a [`RoomCoordinator`](crate::room::RoomCoordinator) handle to its room loop.
#[derive(Debug)]
pub enum RoomCommand {
    /// Re-open the room if needed and broadcast a Join.
    Join { reply: oneshot::Sender<Result<()>> },

    /// A signaling message handed in directly instead of through the transport.
    Deliver(SignalMessage),

    /// Close and evict one session. Replies whether it existed.
    ClosePeer {
        remote: PeerId,
        reply: oneshot::Sender<bool>,
    },

    Close { reply: oneshot::Sender<()> },
}
