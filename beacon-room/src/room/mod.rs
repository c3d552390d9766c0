mod context;
mod room;
mod room_command;
mod room_config;
mod room_coordinator;
mod room_observer;
mod room_state;

pub use context::*;
pub use room::*;
pub use room_command::*;
pub use room_config::*;
pub use room_coordinator::*;
pub use room_observer::*;
pub use room_state::*;
