use beacon_core::MediaStream;
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};

use crate::media::{CaptureError, MediaSource};

/// A room's local media, captured once and shared by every session.
///
/// Capture starts on the first `ready()` call; later calls get the same result.
#[derive(Clone)]
pub struct LocalStream {
    capture: Shared<BoxFuture<'static, Result<MediaStream, CaptureError>>>,
}

impl LocalStream {
    pub fn new(source: MediaSource) -> Self {
        let capture = async move { source.capture().await }.boxed().shared();
        Self { capture }
    }

    pub async fn ready(&self) -> Result<MediaStream, CaptureError> {
        self.capture.clone().await
    }

    /// The captured stream, if capture already finished successfully.
    pub fn peek(&self) -> Option<MediaStream> {
        self.capture.peek().and_then(|res| res.as_ref().ok().cloned())
    }
}
