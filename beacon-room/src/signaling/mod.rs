mod local_bus;
mod mqtt_transport;
mod signaling_transport;

pub use local_bus::*;
pub use mqtt_transport::*;
pub use signaling_transport::*;
