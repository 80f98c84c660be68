//! In-process camera that records what the widget did to it.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use chrono::Utc;

use super::camera::{Camera, CameraError, CameraStream, CaptureConstraints, Frame};
use crate::model::ImageFormat;

/// A tiny but structurally complete JPEG, distinct per `n`.
pub(crate) fn jpeg_frame(n: usize) -> Vec<u8> {
    vec![0xFF, 0xD8, 0xFF, 0xE0, n as u8, 0x10, 0xFF, 0xD9]
}

#[derive(Clone, Default)]
pub(crate) struct Probe {
    pub acquires: Arc<AtomicUsize>,
    pub grabs: Arc<AtomicUsize>,
    pub stops: Arc<AtomicUsize>,
}

#[derive(Clone, Default)]
pub(crate) struct StubCamera {
    pub probe: Probe,
    deny: Arc<AtomicBool>,
    corrupt: Arc<AtomicBool>,
    hang: bool,
}

impl StubCamera {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hanging() -> Self {
        Self {
            hang: true,
            ..Self::default()
        }
    }

    pub fn deny(&self, deny: bool) {
        self.deny.store(deny, Ordering::SeqCst);
    }

    pub fn corrupt_frames(&self, corrupt: bool) {
        self.corrupt.store(corrupt, Ordering::SeqCst);
    }
}

impl Camera for StubCamera {
    type Stream = StubStream;

    async fn acquire(&self, _constraints: &CaptureConstraints) -> Result<StubStream, CameraError> {
        self.probe.acquires.fetch_add(1, Ordering::SeqCst);
        if self.hang {
            std::future::pending::<()>().await;
        }
        if self.deny.load(Ordering::SeqCst) {
            return Err(CameraError::PermissionDenied);
        }
        Ok(StubStream {
            probe: self.probe.clone(),
            corrupt: self.corrupt.clone(),
        })
    }
}

pub(crate) struct StubStream {
    probe: Probe,
    corrupt: Arc<AtomicBool>,
}

impl CameraStream for StubStream {
    async fn grab_frame(&mut self) -> Result<Frame, CameraError> {
        let n = self.probe.grabs.fetch_add(1, Ordering::SeqCst) + 1;
        let mut data = jpeg_frame(n);
        if self.corrupt.load(Ordering::SeqCst) {
            data.truncate(4);
        }
        Ok(Frame {
            width: 640,
            height: 480,
            format: ImageFormat::Jpeg,
            data,
            captured_at: Utc::now(),
        })
    }

    fn stop(&mut self) {
        self.probe.stops.fetch_add(1, Ordering::SeqCst);
    }
}
