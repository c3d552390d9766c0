use beacon_core::RoomName;
use beacon_core::utils::DEFAULT_NICKNAME;

#[derive(Debug, Clone)]
pub struct RoomConfig {
    pub room: RoomName,
    /// Display label, informational only.
    pub nickname: String,
    pub command_buffer: usize,
    pub event_buffer: usize,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            room: RoomName::default(),
            nickname: DEFAULT_NICKNAME.to_owned(),
            command_buffer: 64,
            event_buffer: 256,
        }
    }
}

impl RoomConfig {
    pub fn new(room: impl Into<RoomName>) -> Self {
        Self {
            room: room.into(),
            ..Self::default()
        }
    }

    pub fn with_nickname(mut self, nickname: impl Into<String>) -> Self {
        self.nickname = nickname.into();
        self
    }
}
