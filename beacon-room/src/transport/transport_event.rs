use beacon_core::{IceCandidate, MediaStream, SessionDescription};

use crate::peer::{IceConnectionState, SessionTag};

/// Events flowing from sessions and their connections back into the room loop.
#[derive(Debug)]
pub enum TransportEvent {
    /// Offer or answer created by the session, to be sent to the remote.
    LocalDescription(SessionTag, SessionDescription),

    /// Trickle ICE: a local candidate to be sent to the remote.
    CandidateGenerated(SessionTag, IceCandidate),

    IceStateChanged(SessionTag, IceConnectionState),

    /// Remote media arrived (sent again whenever a track is added to it).
    RemoteStream(SessionTag, MediaStream),

    /// The initiator's offer has been dispatched.
    Joined(SessionTag),
}

impl TransportEvent {
    pub fn tag(&self) -> SessionTag {
        match self {
            TransportEvent::LocalDescription(tag, _)
            | TransportEvent::CandidateGenerated(tag, _)
            | TransportEvent::IceStateChanged(tag, _)
            | TransportEvent::RemoteStream(tag, _)
            | TransportEvent::Joined(tag) => *tag,
        }
    }
}
