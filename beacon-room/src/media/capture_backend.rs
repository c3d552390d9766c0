use async_trait::async_trait;
use beacon_core::{MediaStream, MediaTrack, TrackKind};
use thiserror::Error;
use uuid::Uuid;
use webrtc::api::media_engine::{MIME_TYPE_OPUS, MIME_TYPE_VP8};

use crate::media::MediaConstraints;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CaptureError {
    /// The device exists but refused to produce media (e.g. permission denied)
    #[error("Media source unavailable: {0}")]
    Unavailable(String),

    /// The backend has no way to capture this kind of source
    #[error("{0} is not supported by this capture backend")]
    Unsupported(&'static str),
}

/// Platform hook that actually produces media.
///
/// Every method rejects with [`CaptureError::Unsupported`] unless the backend
/// overrides it.
#[async_trait]
pub trait CaptureBackend: Send + Sync {
    async fn user_media(
        &self,
        _constraints: &MediaConstraints,
    ) -> Result<MediaStream, CaptureError> {
        Err(CaptureError::Unsupported("getUserMedia"))
    }

    async fn capture_widget(
        &self,
        _widget_id: &str,
        _max_fps: Option<f64>,
    ) -> Result<MediaStream, CaptureError> {
        Err(CaptureError::Unsupported("captureStream"))
    }
}

/// Backend for hosts without any capture API.
pub struct NoCapture;

impl CaptureBackend for NoCapture {}

/// Produces track descriptors (VP8 video, Opus audio) without touching a device.
#[derive(Default)]
pub struct SyntheticBackend {
    deny_permission: bool,
}

impl SyntheticBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every user-media request fails as if the user had denied access.
    pub fn denying() -> Self {
        Self {
            deny_permission: true,
        }
    }

    fn track(kind: TrackKind) -> MediaTrack {
        let codec = match kind {
            TrackKind::Audio => MIME_TYPE_OPUS,
            TrackKind::Video => MIME_TYPE_VP8,
        };
        MediaTrack {
            id: Uuid::new_v4().to_string(),
            kind,
            codec: codec.to_owned(),
        }
    }
}

#[async_trait]
impl CaptureBackend for SyntheticBackend {
    async fn user_media(
        &self,
        constraints: &MediaConstraints,
    ) -> Result<MediaStream, CaptureError> {
        if self.deny_permission {
            return Err(CaptureError::Unavailable("permission denied".into()));
        }

        let mut stream = MediaStream::new(Uuid::new_v4().to_string());
        if constraints.audio {
            stream.upsert_track(Self::track(TrackKind::Audio));
        }
        if constraints.video {
            stream.upsert_track(Self::track(TrackKind::Video));
        }
        Ok(stream)
    }

    async fn capture_widget(
        &self,
        widget_id: &str,
        _max_fps: Option<f64>,
    ) -> Result<MediaStream, CaptureError> {
        Ok(MediaStream::new(format!("widget-{}", widget_id))
            .with_track(Self::track(TrackKind::Video)))
    }
}
