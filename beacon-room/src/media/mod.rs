mod capture_backend;
mod local_stream;
mod media_source;

pub use capture_backend::*;
pub use local_stream::*;
pub use media_source::*;
