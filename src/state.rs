use std::time::Duration;

use crate::admin::AdminGate;
use crate::capture::{CaptureConfig, SnapshotCamera};
use crate::store::Store;
use crate::workflow::AttendanceWorkflow;

/// A camera wired to the service itself. One kiosk takes one person at a
/// time, so it shares a single workflow.
pub struct Kiosk {
    pub camera: SnapshotCamera,
    pub capture: CaptureConfig,
    pub workflow: AttendanceWorkflow<Store>,
}

impl Kiosk {
    pub fn capture_config(camera_timeout_secs: u64) -> CaptureConfig {
        CaptureConfig {
            acquire_timeout: Duration::from_secs(camera_timeout_secs),
            ..CaptureConfig::default()
        }
    }
}

pub struct AppState {
    pub store: Store,
    pub gate: Box<dyn AdminGate>,
    pub kiosk: Option<Kiosk>,
}
