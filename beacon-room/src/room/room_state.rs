use beacon_core::{MediaStream, PeerId, RoomName};
use serde::Serialize;

use crate::peer::PeerSnapshot;

/// Observable room snapshot, republished after every mutation.
#[derive(Debug, Clone, Serialize)]
pub struct RoomState {
    pub room: RoomName,
    pub local_id: PeerId,
    pub nickname: String,
    pub local_stream: Option<MediaStream>,
    pub peers: Vec<PeerSnapshot>,
    /// Remote streams of the currently connected peers.
    pub streams: Vec<MediaStream>,
    pub closed: bool,
}

impl RoomState {
    pub fn new(room: RoomName, local_id: PeerId, nickname: String) -> Self {
        Self {
            room,
            local_id,
            nickname,
            local_stream: None,
            peers: Vec::new(),
            streams: Vec::new(),
            closed: false,
        }
    }

    pub fn peer(&self, remote_id: PeerId) -> Option<&PeerSnapshot> {
        self.peers.iter().find(|p| p.remote_id == remote_id)
    }

    pub fn peer_ids(&self) -> Vec<PeerId> {
        self.peers.iter().map(|p| p.remote_id).collect()
    }
}
