//! Room signaling and peer-connection lifecycle on top of webrtc-rs.
//!
//! A [`RoomCoordinator`] joins a named room over a [`SignalingTransport`],
//! discovers other participants and drives one [`PeerSession`] per remote
//! through offer/answer/ICE negotiation.

pub mod error;
pub mod media;
pub mod peer;
pub mod room;
pub mod signaling;
pub mod transport;

pub use error::{Error, Result};
pub use media::{CaptureBackend, CaptureError, LocalStream, MediaConstraints, MediaSource};
pub use peer::{ConnectionEvents, ConnectionFactory, PeerConnection, PeerSession, PeerSnapshot};
pub use room::{RoomConfig, RoomContext, RoomCoordinator, RoomObserver, RoomState};
pub use signaling::{LocalBus, MqttConfig, MqttTransport, SignalingTransport};
pub use transport::{ConnectionWrapper, TransportConfig, WebRtcFactory};
