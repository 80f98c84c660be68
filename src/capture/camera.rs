use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::ImageFormat;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Facing {
    User,
    Environment,
}

/// What the widget asks the device for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureConstraints {
    pub width: u32,
    pub height: u32,
    pub facing: Facing,
}

impl Default for CaptureConstraints {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            facing: Facing::User,
        }
    }
}

/// One encoded still pulled from a live stream.
#[derive(Debug, Clone)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub format: ImageFormat,
    pub data: Vec<u8>,
    pub captured_at: DateTime<Utc>,
}

#[derive(Debug, Error)]
pub enum CameraError {
    #[error("camera permission denied")]
    PermissionDenied,
    #[error("no camera device available: {0}")]
    NoDevice(String),
    #[error("camera stream failed: {0}")]
    Stream(String),
}

#[allow(async_fn_in_trait)]
pub trait Camera {
    type Stream: CameraStream;

    async fn acquire(&self, constraints: &CaptureConstraints) -> Result<Self::Stream, CameraError>;
}

#[allow(async_fn_in_trait)]
pub trait CameraStream {
    async fn grab_frame(&mut self) -> Result<Frame, CameraError>;

    /// Stops every track of the stream.
    fn stop(&mut self);
}

/// Owns a live stream and stops it exactly once, on `release` or on drop.
pub(crate) struct StreamGuard<S: CameraStream> {
    stream: Option<S>,
}

impl<S: CameraStream> StreamGuard<S> {
    pub(crate) fn new(stream: S) -> Self {
        Self {
            stream: Some(stream),
        }
    }

    pub(crate) fn get_mut(&mut self) -> Option<&mut S> {
        self.stream.as_mut()
    }

    pub(crate) fn release(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            stream.stop();
        }
    }
}

impl<S: CameraStream> Drop for StreamGuard<S> {
    fn drop(&mut self) {
        self.release();
    }
}
