use async_trait::async_trait;
use beacon_core::{MediaStream, PeerId};

use crate::room::context::RoomContext;

/// Hooks invoked from the room loop. All default to doing nothing.
///
/// Hooks run inline on the room task; long work should be spawned.
#[async_trait]
pub trait RoomObserver: Send + Sync + 'static {
    /// A session for `peer_id` entered the peer list.
    async fn on_peer_joined(&self, _ctx: &RoomContext, _peer_id: PeerId) {}

    async fn on_peer_connected(
        &self,
        _ctx: &RoomContext,
        _peer_id: PeerId,
        _stream: Option<MediaStream>,
    ) {
    }

    /// The session was closed, replaced, or its connection dropped.
    async fn on_peer_left(&self, _ctx: &RoomContext, _peer_id: PeerId) {}
}

pub struct NoopObserver;

impl RoomObserver for NoopObserver {}
