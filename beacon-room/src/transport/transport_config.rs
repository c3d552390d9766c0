use beacon_core::IceServerConfig;
use beacon_core::utils::{DEFAULT_STUN_ADDR, DEFAULT_STUN_ADDR_2, DEFAULT_STUN_ADDR_3};

/// WebRTC settings shared by every connection of a room.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub ice_servers: Vec<IceServerConfig>,
    /// Offers ask for remote audio and video even without local tracks.
    pub offer_to_receive: bool,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            ice_servers: vec![IceServerConfig {
                urls: vec![
                    DEFAULT_STUN_ADDR.to_owned(),
                    DEFAULT_STUN_ADDR_2.to_owned(),
                    DEFAULT_STUN_ADDR_3.to_owned(),
                ],
                username: None,
                credential: None,
            }],
            offer_to_receive: true,
        }
    }
}

impl TransportConfig {
    /// No ICE servers: host candidates only, for tests and LAN setups.
    pub fn local_only() -> Self {
        Self {
            ice_servers: Vec::new(),
            ..Self::default()
        }
    }
}
