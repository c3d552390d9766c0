use serde::{Deserialize, Serialize};

/// Which side of a pair sends the offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Initiator,
    Responder,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionState {
    New,
    Negotiating,
    Connected,
    Disconnected,
    Failed,
}

impl ConnectionState {
    /// A session in this state is evicted from its room.
    pub fn is_terminal(self) -> bool {
        matches!(self, ConnectionState::Disconnected | ConnectionState::Failed)
    }
}
