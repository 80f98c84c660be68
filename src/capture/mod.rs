//! Capture Widget: turns a live camera feed into one confirmed still image.
//!
//! ```text
//! Initializing -> Live -> Countdown(n) -> Captured -> Confirmed
//!      |            ^                        |
//!      v            +------- retake ---------+
//! Unavailable --retry--> Initializing
//! ```
//! Every non-terminal state can be cancelled. The camera stream is released
//! on confirm, cancel, stream failure and drop.

pub mod camera;
pub mod snapshot;

#[cfg(test)]
pub(crate) mod testing;

use std::time::Duration;

use thiserror::Error;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::model::{FaceImage, ImageError};
use camera::StreamGuard;

pub use camera::{Camera, CameraError, CameraStream, CaptureConstraints, Facing, Frame};
pub use snapshot::SnapshotCamera;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureState {
    Initializing,
    Live,
    Countdown(u8),
    Captured,
    Confirmed,
    Cancelled,
    Unavailable(String),
}

impl CaptureState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, CaptureState::Confirmed | CaptureState::Cancelled)
    }
}

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("cannot {action} while {state:?}")]
    InvalidTransition {
        action: &'static str,
        state: CaptureState,
    },
    #[error("capture cancelled")]
    Cancelled,
    #[error("camera unavailable: {0}")]
    Unavailable(String),
    #[error("captured frame rejected: {0}")]
    Frame(#[from] ImageError),
}

#[derive(Debug, Clone)]
pub struct CaptureConfig {
    pub constraints: CaptureConstraints,
    /// Number of one-`tick` steps shown before the frame is taken.
    pub countdown_from: u8,
    pub tick: Duration,
    pub acquire_timeout: Duration,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            constraints: CaptureConstraints::default(),
            countdown_from: 3,
            tick: Duration::from_secs(1),
            acquire_timeout: Duration::from_secs(10),
        }
    }
}

/// Aborts camera acquisition or a running countdown from another task.
#[derive(Debug, Clone)]
pub struct CancelHandle(CancellationToken);

impl CancelHandle {
    pub fn cancel(&self) {
        self.0.cancel();
    }
}

pub struct CaptureWidget<C: Camera> {
    camera: C,
    config: CaptureConfig,
    stream: Option<StreamGuard<C::Stream>>,
    captured: Option<FaceImage>,
    state: watch::Sender<CaptureState>,
    cancel: CancellationToken,
}

impl<C: Camera> CaptureWidget<C> {
    /// A widget in `Initializing` that has not touched the camera yet.
    pub fn new(camera: C, config: CaptureConfig) -> Self {
        let (state, _) = watch::channel(CaptureState::Initializing);
        Self {
            camera,
            config,
            stream: None,
            captured: None,
            state,
            cancel: CancellationToken::new(),
        }
    }

    /// `new` followed by `start`.
    pub async fn open(camera: C, config: CaptureConfig) -> Self {
        let mut widget = Self::new(camera, config);
        widget.start().await;
        widget
    }

    pub fn state(&self) -> CaptureState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<CaptureState> {
        self.state.subscribe()
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle(self.cancel.clone())
    }

    /// The still waiting for confirm or retake.
    pub fn preview(&self) -> Option<&FaceImage> {
        self.captured.as_ref()
    }

    /// Requests the camera. Ends in `Live`, `Unavailable` or `Cancelled`.
    pub async fn start(&mut self) {
        if self.check_cancelled().is_err() {
            return;
        }
        if !matches!(self.state(), CaptureState::Initializing) {
            return;
        }
        self.acquire().await;
    }

    /// Re-attempts acquisition after `Unavailable`.
    pub async fn retry(&mut self) -> Result<(), CaptureError> {
        self.check_cancelled()?;
        self.expect("retry", |s| matches!(s, CaptureState::Unavailable(_)))?;
        self.acquire().await;

        match self.state() {
            CaptureState::Live => Ok(()),
            CaptureState::Unavailable(reason) => Err(CaptureError::Unavailable(reason)),
            _ => Err(CaptureError::Cancelled),
        }
    }

    /// Runs the countdown and freezes the current frame.
    ///
    /// If the returned future is dropped mid-countdown the widget only
    /// accepts `cancel` afterwards.
    pub async fn capture(&mut self) -> Result<&FaceImage, CaptureError> {
        self.check_cancelled()?;
        self.expect("capture", |s| matches!(s, CaptureState::Live))?;

        let cancel = self.cancel.clone();
        for n in (1..=self.config.countdown_from).rev() {
            self.set_state(CaptureState::Countdown(n));
            let aborted = tokio::select! {
                biased;
                _ = cancel.cancelled() => true,
                _ = tokio::time::sleep(self.config.tick) => false,
            };
            if aborted {
                info!(remaining = n, "Capture countdown cancelled");
                self.shutdown(CaptureState::Cancelled);
                return Err(CaptureError::Cancelled);
            }
        }

        let grabbed = match self.stream.as_mut().and_then(|g| g.get_mut()) {
            Some(stream) => stream.grab_frame().await,
            None => Err(CameraError::Stream("stream already released".into())),
        };
        let frame = match grabbed {
            Ok(frame) => frame,
            Err(e) => {
                warn!(error = %e, "Frame grab failed");
                let reason = e.to_string();
                self.shutdown(CaptureState::Unavailable(reason.clone()));
                return Err(CaptureError::Unavailable(reason));
            }
        };

        match FaceImage::from_bytes(frame.format, &frame.data) {
            Ok(image) => {
                debug!(
                    width = frame.width,
                    height = frame.height,
                    bytes = frame.data.len(),
                    "Frame captured"
                );
                self.set_state(CaptureState::Captured);
                Ok(self.captured.insert(image))
            }
            Err(e) => {
                // stay live so the user can simply try again
                warn!(error = %e, "Captured frame is not a usable still");
                self.set_state(CaptureState::Live);
                Err(e.into())
            }
        }
    }

    /// Discards the captured still and goes back to the live feed without
    /// asking for the camera again.
    pub fn retake(&mut self) -> Result<(), CaptureError> {
        self.check_cancelled()?;
        self.expect("retake", |s| matches!(s, CaptureState::Captured))?;
        self.captured = None;
        self.set_state(CaptureState::Live);
        Ok(())
    }

    /// Yields the captured still and releases the camera.
    pub fn confirm(&mut self) -> Result<FaceImage, CaptureError> {
        self.check_cancelled()?;
        self.expect("confirm", |s| matches!(s, CaptureState::Captured))?;

        let image = self.captured.take().ok_or(CaptureError::InvalidTransition {
            action: "confirm",
            state: CaptureState::Captured,
        })?;
        self.shutdown(CaptureState::Confirmed);
        Ok(image)
    }

    pub fn cancel(&mut self) {
        if self.state().is_terminal() {
            return;
        }
        self.cancel.cancel();
        self.shutdown(CaptureState::Cancelled);
    }

    async fn acquire(&mut self) {
        self.set_state(CaptureState::Initializing);

        let cancel = self.cancel.clone();
        let wait = self.config.acquire_timeout;
        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            attempt = tokio::time::timeout(wait, self.camera.acquire(&self.config.constraints)) => Some(attempt),
        };

        match outcome {
            None => self.shutdown(CaptureState::Cancelled),
            Some(Ok(Ok(stream))) => {
                self.stream = Some(StreamGuard::new(stream));
                self.set_state(CaptureState::Live);
            }
            Some(Ok(Err(e))) => {
                warn!(error = %e, "Camera acquisition failed");
                self.set_state(CaptureState::Unavailable(e.to_string()));
            }
            Some(Err(_)) => {
                warn!(timeout_secs = wait.as_secs(), "Camera acquisition timed out");
                self.set_state(CaptureState::Unavailable(format!(
                    "camera did not respond within {}s",
                    wait.as_secs()
                )));
            }
        }
    }

    fn check_cancelled(&mut self) -> Result<(), CaptureError> {
        if !self.cancel.is_cancelled() {
            return Ok(());
        }
        if !self.state().is_terminal() {
            self.shutdown(CaptureState::Cancelled);
        }
        Err(CaptureError::Cancelled)
    }

    fn expect(
        &self,
        action: &'static str,
        allowed: impl Fn(&CaptureState) -> bool,
    ) -> Result<(), CaptureError> {
        let state = self.state();
        if allowed(&state) {
            Ok(())
        } else {
            Err(CaptureError::InvalidTransition { action, state })
        }
    }

    fn shutdown(&mut self, state: CaptureState) {
        if let Some(mut guard) = self.stream.take() {
            guard.release();
        }
        if matches!(state, CaptureState::Cancelled) {
            self.captured = None;
        }
        self.set_state(state);
    }

    fn set_state(&self, state: CaptureState) {
        debug!(?state, "Capture state");
        self.state.send_replace(state);
    }
}
