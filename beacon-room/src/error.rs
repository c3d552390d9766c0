//! Error types for room coordination and peer negotiation

use beacon_core::{CodecError, PeerId, SdpType};
use thiserror::Error;

use crate::media::CaptureError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// Rejected by the underlying peer connection
    #[error("WebRTC error: {0}")]
    WebRtc(#[from] webrtc::Error),

    /// Negotiation step failed outside of the WebRTC stack
    #[error("Negotiation failed: {0}")]
    Negotiation(String),

    /// Description type the connection cannot apply
    #[error("Unsupported session description type: {0}")]
    UnsupportedDescription(SdpType),

    /// `join()` called on a session that answers offers
    #[error("Session with {0} is not the initiator")]
    NotInitiator(PeerId),

    /// Local media could not be produced
    #[error("Capture error: {0}")]
    Capture(#[from] CaptureError),

    /// Signaling message could not be encoded or decoded
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    /// MQTT client rejected a request
    #[error("MQTT error: {0}")]
    Mqtt(#[from] rumqttc::ClientError),

    /// Signaling transport is gone
    #[error("Transport error: {0}")]
    Transport(String),

    /// Room event loop has stopped
    #[error("Room is no longer running")]
    RoomStopped,
}
