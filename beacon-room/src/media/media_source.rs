use beacon_core::MediaStream;
use std::fmt;
use std::sync::Arc;

use crate::media::{CaptureBackend, CaptureError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediaConstraints {
    pub audio: bool,
    pub video: bool,
}

impl Default for MediaConstraints {
    fn default() -> Self {
        Self {
            audio: true,
            video: true,
        }
    }
}

pub struct CameraSource {
    pub constraints: MediaConstraints,
    backend: Arc<dyn CaptureBackend>,
}

/// Stream grabbed from a rendered widget (canvas, video element, ...).
pub struct WidgetCapture {
    pub widget_id: String,
    pub max_fps: Option<f64>,
    backend: Arc<dyn CaptureBackend>,
}

/// Anything that can produce a media stream for a room.
pub enum MediaSource {
    Camera(CameraSource),
    WidgetCapture(WidgetCapture),
    /// A stream that already exists, e.g. one received from another peer.
    Relayed(MediaStream),
}

impl MediaSource {
    pub fn camera(backend: Arc<dyn CaptureBackend>, constraints: MediaConstraints) -> Self {
        Self::Camera(CameraSource {
            constraints,
            backend,
        })
    }

    pub fn widget(
        backend: Arc<dyn CaptureBackend>,
        widget_id: impl Into<String>,
        max_fps: Option<f64>,
    ) -> Self {
        Self::WidgetCapture(WidgetCapture {
            widget_id: widget_id.into(),
            max_fps,
            backend,
        })
    }

    pub fn relayed(stream: MediaStream) -> Self {
        Self::Relayed(stream)
    }

    pub async fn capture(&self) -> Result<MediaStream, CaptureError> {
        match self {
            MediaSource::Camera(camera) => {
                let constraints = &camera.constraints;
                if !constraints.audio && !constraints.video {
                    return Err(CaptureError::Unavailable(
                        "constraints request neither audio nor video".into(),
                    ));
                }
                camera.backend.user_media(constraints).await
            }
            MediaSource::WidgetCapture(widget) => {
                widget
                    .backend
                    .capture_widget(&widget.widget_id, widget.max_fps)
                    .await
            }
            MediaSource::Relayed(stream) => Ok(stream.clone()),
        }
    }
}

impl fmt::Debug for MediaSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaSource::Camera(c) => write!(f, "Camera({:?})", c.constraints),
            MediaSource::WidgetCapture(w) => write!(f, "WidgetCapture({})", w.widget_id),
            MediaSource::Relayed(s) => write!(f, "Relayed({})", s.id),
        }
    }
}
