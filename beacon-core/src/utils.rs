pub const DEFAULT_STUN_ADDR: &str = "stun:stun.l.google.com:19302";
pub const DEFAULT_STUN_ADDR_2: &str = "stun:stun1.l.google.com:19302";
pub const DEFAULT_STUN_ADDR_3: &str = "stun:stun2.l.google.com:19302";

/// Topic prefix shared with the browser widgets so both can meet on one broker.
pub const DEFAULT_TOPIC_NAMESPACE: &str = "jupyter-webrtc";

pub const DEFAULT_ROOM: &str = "room";
pub const DEFAULT_NICKNAME: &str = "anonymous";

pub const DEFAULT_BROKER_HOST: &str = "localhost";
pub const DEFAULT_BROKER_PORT: u16 = 1883;
