use async_trait::async_trait;
use beacon_core::{IceCandidate, MediaStream, MediaTrack, PeerId, SessionDescription};
use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::debug;

use crate::Result;
use crate::transport::TransportEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IceConnectionState {
    New,
    Checking,
    Connected,
    Completed,
    Disconnected,
    Failed,
    Closed,
}

/// One incarnation of a session with a remote.
///
/// A remote can be replaced by a newer session (re-join, glare); the
/// generation keeps late events of the old connection away from the new one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionTag {
    pub remote: PeerId,
    pub generation: u64,
}

impl fmt::Display for SessionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.remote, self.generation)
    }
}

/// Sender half handed to a connection and its session.
#[derive(Clone)]
pub struct ConnectionEvents {
    tag: SessionTag,
    tx: mpsc::Sender<TransportEvent>,
}

impl ConnectionEvents {
    pub fn new(tag: SessionTag, tx: mpsc::Sender<TransportEvent>) -> Self {
        Self { tag, tx }
    }

    pub fn tag(&self) -> SessionTag {
        self.tag
    }

    pub async fn local_candidate(&self, candidate: IceCandidate) {
        self.send(TransportEvent::CandidateGenerated(self.tag, candidate))
            .await;
    }

    pub async fn ice_state(&self, state: IceConnectionState) {
        self.send(TransportEvent::IceStateChanged(self.tag, state))
            .await;
    }

    pub async fn remote_stream(&self, stream: MediaStream) {
        self.send(TransportEvent::RemoteStream(self.tag, stream)).await;
    }

    pub(crate) async fn local_description(&self, description: SessionDescription) {
        self.send(TransportEvent::LocalDescription(self.tag, description))
            .await;
    }

    pub(crate) async fn joined(&self) {
        self.send(TransportEvent::Joined(self.tag)).await;
    }

    async fn send(&self, event: TransportEvent) {
        if self.tx.send(event).await.is_err() {
            debug!("Room loop gone, dropping event for {}", self.tag);
        }
    }
}

/// Offer/answer/ICE primitive a session negotiates over.
///
/// Candidates added before the remote description must not be lost:
/// implementations either accept them directly or queue them.
#[async_trait]
pub trait PeerConnection: Send + Sync {
    async fn create_offer(&self) -> Result<SessionDescription>;

    async fn create_answer(&self) -> Result<SessionDescription>;

    async fn set_local_description(&self, description: SessionDescription) -> Result<()>;

    async fn set_remote_description(&self, description: SessionDescription) -> Result<()>;

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<()>;

    async fn add_track(&self, track: &MediaTrack, stream_id: &str) -> Result<()>;

    async fn close(&self) -> Result<()>;
}

/// Creates connections wired to report through `events`.
#[async_trait]
pub trait ConnectionFactory: Send + Sync {
    async fn create(&self, events: ConnectionEvents) -> Result<Arc<dyn PeerConnection>>;
}
