use beacon_core::{ConnectionState, MediaStream, PeerId, Role, SignalPayload};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{OnceCell, watch};
use tracing::{debug, info, warn};

use crate::media::LocalStream;
use crate::peer::{ConnectionEvents, IceConnectionState, PeerConnection, SessionTag};
use crate::{Error, Result};

/// What observers get to see of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PeerSnapshot {
    pub local_id: PeerId,
    pub remote_id: PeerId,
    pub role: Role,
    pub connection_state: ConnectionState,
    pub remote_stream: Option<MediaStream>,
}

/// Negotiation state machine for one remote.
///
/// Produced descriptions are handed to the room through the event sender;
/// the session never talks to the signaling transport itself.
pub struct PeerSession {
    local_id: PeerId,
    role: Role,
    tag: SessionTag,
    connection: Arc<dyn PeerConnection>,
    local_stream: Option<LocalStream>,
    tracks_ready: OnceCell<()>,
    events: ConnectionEvents,
    state: watch::Sender<PeerSnapshot>,
}

impl PeerSession {
    pub fn new(
        local_id: PeerId,
        role: Role,
        connection: Arc<dyn PeerConnection>,
        events: ConnectionEvents,
        local_stream: Option<LocalStream>,
    ) -> Self {
        let tag = events.tag();
        let state = watch::Sender::new(PeerSnapshot {
            local_id,
            remote_id: tag.remote,
            role,
            connection_state: ConnectionState::New,
            remote_stream: None,
        });

        Self {
            local_id,
            role,
            tag,
            connection,
            local_stream,
            tracks_ready: OnceCell::new(),
            events,
            state,
        }
    }

    pub fn local_id(&self) -> PeerId {
        self.local_id
    }

    pub fn remote_id(&self) -> PeerId {
        self.tag.remote
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn tag(&self) -> SessionTag {
        self.tag
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.state.borrow().connection_state
    }

    pub fn remote_stream(&self) -> Option<MediaStream> {
        self.state.borrow().remote_stream.clone()
    }

    pub fn snapshot(&self) -> PeerSnapshot {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<PeerSnapshot> {
        self.state.subscribe()
    }

    /// Attaches the local tracks (if any) to the connection, once.
    pub async fn local_tracks_ready(&self) -> Result<()> {
        self.tracks_ready
            .get_or_try_init(|| async {
                let Some(local) = &self.local_stream else {
                    return Ok(());
                };
                let stream = local.ready().await?;
                for track in &stream.tracks {
                    self.connection.add_track(track, &stream.id).await?;
                }
                debug!(
                    "Attached {} local tracks for {}",
                    stream.tracks.len(),
                    self.tag
                );
                Ok::<_, Error>(())
            })
            .await
            .map(|_| ())
    }

    /// Sends the offer. Resolves once it is dispatched, not once connected.
    pub async fn join(&self) -> Result<()> {
        if self.role != Role::Initiator {
            return Err(Error::NotInitiator(self.tag.remote));
        }

        self.mark_negotiating();
        self.local_tracks_ready().await?;

        let offer = self.connection.create_offer().await?;
        self.connection.set_local_description(offer.clone()).await?;

        debug!("Sending offer to {}", self.tag);
        self.events.local_description(offer).await;
        self.events.joined().await;
        Ok(())
    }

    pub async fn on_peer_message(&self, payload: SignalPayload) -> Result<()> {
        match payload {
            SignalPayload::Sdp(description) => {
                debug!("Got {} from {}", description.sdp_type, self.tag);
                self.mark_negotiating();
                self.connection.set_remote_description(description).await?;

                if self.role == Role::Initiator {
                    return Ok(());
                }

                self.local_tracks_ready().await?;
                let answer = self.connection.create_answer().await?;
                self.connection.set_local_description(answer.clone()).await?;

                debug!("Sending answer to {}", self.tag);
                self.events.local_description(answer).await;
            }
            SignalPayload::Candidate(candidate) => {
                self.connection.add_ice_candidate(candidate).await?;
            }
        }
        Ok(())
    }

    /// Applies an ICE state change; returns the new connection state if it moved.
    ///
    /// Disconnected and Failed are final for a session.
    pub fn on_ice_state(&self, ice: IceConnectionState) -> Option<ConnectionState> {
        let next = match ice {
            IceConnectionState::New => return None,
            IceConnectionState::Checking => ConnectionState::Negotiating,
            IceConnectionState::Connected | IceConnectionState::Completed => {
                ConnectionState::Connected
            }
            IceConnectionState::Disconnected | IceConnectionState::Closed => {
                ConnectionState::Disconnected
            }
            IceConnectionState::Failed => ConnectionState::Failed,
        };

        let changed = self.state.send_if_modified(|s| {
            let current = s.connection_state;
            let allowed = match next {
                ConnectionState::Negotiating => current == ConnectionState::New,
                _ => !current.is_terminal() && current != next,
            };
            if allowed {
                s.connection_state = next;
            }
            allowed
        });

        if changed {
            info!("Connection with {} is now {:?}", self.tag, next);
            Some(next)
        } else {
            None
        }
    }

    pub fn set_remote_stream(&self, stream: MediaStream) {
        self.state.send_modify(|s| s.remote_stream = Some(stream));
    }

    /// Marks the session Disconnected and closes the connection in the background.
    pub fn close(&self) {
        self.state
            .send_modify(|s| s.connection_state = ConnectionState::Disconnected);

        let connection = self.connection.clone();
        let tag = self.tag;
        tokio::spawn(async move {
            if let Err(e) = connection.close().await {
                warn!("Failed to close connection with {}: {}", tag, e);
            }
        });
    }

    fn mark_negotiating(&self) {
        self.state.send_if_modified(|s| {
            if s.connection_state != ConnectionState::New {
                return false;
            }
            s.connection_state = ConnectionState::Negotiating;
            true
        });
    }
}
