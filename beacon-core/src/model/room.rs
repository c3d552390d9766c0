use serde::{Deserialize, Serialize};
use std::fmt;

use crate::utils::DEFAULT_ROOM;

/// Name of a rendezvous point shared by everyone who should find each other.
#[derive(Debug, Clone, Hash, Eq, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomName(pub String);

impl RoomName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Broker topic carrying every signaling message of this room.
    pub fn join_topic(&self, namespace: &str) -> String {
        format!("{}/{}/join", namespace, self.0)
    }
}

impl Default for RoomName {
    fn default() -> Self {
        Self::new(DEFAULT_ROOM)
    }
}

impl From<&str> for RoomName {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for RoomName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for RoomName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
