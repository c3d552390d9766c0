use crate::model::peer::PeerId;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IceServerConfig {
    pub urls: Vec<String>,
    pub username: Option<String>,
    pub credential: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SdpType {
    Offer,
    Answer,
    Pranswer,
    Rollback,
}

impl fmt::Display for SdpType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SdpType::Offer => "offer",
            SdpType::Answer => "answer",
            SdpType::Pranswer => "pranswer",
            SdpType::Rollback => "rollback",
        };
        f.write_str(name)
    }
}

/// Same JSON shape as the browser's `RTCSessionDescriptionInit`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionDescription {
    #[serde(rename = "type")]
    pub sdp_type: SdpType,
    pub sdp: String,
}

impl SessionDescription {
    pub fn offer(sdp: impl Into<String>) -> Self {
        Self {
            sdp_type: SdpType::Offer,
            sdp: sdp.into(),
        }
    }

    pub fn answer(sdp: impl Into<String>) -> Self {
        Self {
            sdp_type: SdpType::Answer,
            sdp: sdp.into(),
        }
    }

    pub fn is_offer(&self) -> bool {
        self.sdp_type == SdpType::Offer
    }
}

/// Same JSON shape as the browser's `RTCIceCandidateInit`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IceCandidate {
    pub candidate: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sdp_mid: Option<String>,
    #[serde(
        rename = "sdpMLineIndex",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub sdp_m_line_index: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username_fragment: Option<String>,
}

impl IceCandidate {
    pub fn new(candidate: impl Into<String>) -> Self {
        Self {
            candidate: candidate.into(),
            ..Default::default()
        }
    }
}

/// What a negotiation message carries from one session to its counterpart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignalPayload {
    Sdp(SessionDescription),
    Candidate(IceCandidate),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignalBody {
    /// Announces the sender. Broadcast when `to` is empty, a reply otherwise.
    ///
    /// `epoch` grows each time the sender's room is closed, so a peer that
    /// comes back can be told apart from one repeating itself.
    Join { epoch: u64 },
    Negotiation(SignalPayload),
}

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("negotiation message without a recipient")]
    MissingRecipient,

    #[error("negotiation message carries neither sdp nor candidate")]
    EmptyPayload,

    #[error("unknown message type '{0}'")]
    UnknownType(String),
}

/// Envelope exchanged between room members over a signaling transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "WireMessage", into = "WireMessage")]
pub struct SignalMessage {
    pub from: PeerId,
    pub to: Option<PeerId>,
    pub body: SignalBody,
}

impl SignalMessage {
    pub fn join(from: PeerId) -> Self {
        Self {
            from,
            to: None,
            body: SignalBody::Join { epoch: 0 },
        }
    }

    pub fn join_reply(from: PeerId, to: PeerId) -> Self {
        Self {
            from,
            to: Some(to),
            body: SignalBody::Join { epoch: 0 },
        }
    }

    pub fn negotiation(from: PeerId, to: PeerId, payload: SignalPayload) -> Self {
        Self {
            from,
            to: Some(to),
            body: SignalBody::Negotiation(payload),
        }
    }

    /// Stamps a Join with the sender's epoch. Other messages are unchanged.
    pub fn with_epoch(mut self, epoch: u64) -> Self {
        if let SignalBody::Join { epoch: e } = &mut self.body {
            *e = epoch;
        }
        self
    }

    pub fn is_join(&self) -> bool {
        matches!(self.body, SignalBody::Join { .. })
    }

    pub fn encode(&self) -> Result<Bytes, CodecError> {
        Ok(Bytes::from(serde_json::to_vec(self)?))
    }

    pub fn decode(data: &[u8]) -> Result<Self, CodecError> {
        Ok(serde_json::from_slice(data)?)
    }
}

const JOIN_TYPE: &str = "join";

// The sender travels as `room_id` for compatibility with the browser widgets.
#[derive(Serialize, Deserialize)]
struct WireMessage {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    kind: Option<String>,
    room_id: PeerId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    to: Option<PeerId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    epoch: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sdp: Option<SessionDescription>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    candidate: Option<IceCandidate>,
}

impl TryFrom<WireMessage> for SignalMessage {
    type Error = CodecError;

    fn try_from(wire: WireMessage) -> Result<Self, Self::Error> {
        let body = match wire.kind.as_deref() {
            Some(JOIN_TYPE) => SignalBody::Join {
                epoch: wire.epoch.unwrap_or(0),
            },
            Some(other) => return Err(CodecError::UnknownType(other.to_owned())),
            None => {
                if wire.to.is_none() {
                    return Err(CodecError::MissingRecipient);
                }
                let payload = match (wire.sdp, wire.candidate) {
                    (Some(sdp), _) => SignalPayload::Sdp(sdp),
                    (None, Some(candidate)) => SignalPayload::Candidate(candidate),
                    (None, None) => return Err(CodecError::EmptyPayload),
                };
                SignalBody::Negotiation(payload)
            }
        };

        Ok(Self {
            from: wire.room_id,
            to: wire.to,
            body,
        })
    }
}

impl From<SignalMessage> for WireMessage {
    fn from(msg: SignalMessage) -> Self {
        let mut wire = WireMessage {
            kind: None,
            room_id: msg.from,
            to: msg.to,
            epoch: None,
            sdp: None,
            candidate: None,
        };
        match msg.body {
            SignalBody::Join { epoch } => {
                wire.kind = Some(JOIN_TYPE.to_owned());
                wire.epoch = Some(epoch);
            }
            SignalBody::Negotiation(SignalPayload::Sdp(sdp)) => wire.sdp = Some(sdp),
            SignalBody::Negotiation(SignalPayload::Candidate(c)) => wire.candidate = Some(c),
        }
        wire
    }
}
