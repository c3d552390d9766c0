mod media;
mod peer;
mod room;
mod signaling;
mod state;

pub use media::{MediaStream, MediaTrack, TrackKind};
pub use peer::{ParsePeerIdError, PeerId};
pub use room::RoomName;
pub use signaling::{
    CodecError, IceCandidate, IceServerConfig, SdpType, SessionDescription, SignalBody,
    SignalMessage, SignalPayload,
};
pub use state::{ConnectionState, Role};
