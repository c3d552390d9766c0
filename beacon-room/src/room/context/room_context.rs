use beacon_core::{MediaStream, PeerId};
use tokio::sync::watch;

use crate::room::RoomState;

/// Read-only view of a room handed to observer hooks.
///
/// Cheap to clone; always reflects the latest published snapshot.
#[derive(Clone)]
pub struct RoomContext {
    state: watch::Receiver<RoomState>,
}

impl RoomContext {
    pub(crate) fn new(state: watch::Receiver<RoomState>) -> Self {
        Self { state }
    }

    pub fn local_id(&self) -> PeerId {
        self.state.borrow().local_id
    }

    pub fn state(&self) -> RoomState {
        self.state.borrow().clone()
    }

    pub fn list_peers(&self) -> Vec<PeerId> {
        self.state.borrow().peer_ids()
    }

    pub fn contains_peer(&self, peer_id: &PeerId) -> bool {
        self.state.borrow().peer(*peer_id).is_some()
    }

    pub fn streams(&self) -> Vec<MediaStream> {
        self.state.borrow().streams.clone()
    }
}
