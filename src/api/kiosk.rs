use actix_web::{HttpResponse, web};
use serde::Deserialize;
use tracing::{info, instrument};
use utoipa::ToSchema;

use crate::capture::{CaptureState, CaptureWidget};
use crate::error::AppError;
use crate::model::{AttendanceRecord, AttendanceStatus};
use crate::state::{AppState, Kiosk};

#[derive(Deserialize, ToSchema)]
pub struct KioskAttendance {
    #[schema(example = "Budi")]
    pub name: String,
    #[schema(value_type = String, example = "keluar")]
    pub status: AttendanceStatus,
}

fn kiosk(state: &AppState) -> Result<&Kiosk, AppError> {
    state
        .kiosk
        .as_ref()
        .ok_or_else(|| AppError::NotFound("Kiosk camera is not configured".into()))
}

/// Take the photo with the kiosk camera and record attendance
#[utoipa::path(
    post,
    path = "/api/kiosk/attendance",
    request_body = KioskAttendance,
    responses(
        (status = 201, description = "Attendance recorded with a kiosk photo", body = AttendanceRecord),
        (status = 400, description = "Empty name"),
        (status = 404, description = "No kiosk camera configured"),
        (status = 409, description = "Another kiosk submission is in progress"),
        (status = 503, description = "Camera unavailable", body = Object, example = json!({
            "error": "Camera unavailable: camera did not respond within 10s"
        }))
    ),
    tag = "Kiosk"
)]
#[instrument(name = "kiosk_submit", skip(state, payload), fields(status = %payload.status))]
pub async fn kiosk_attendance(
    state: web::Data<AppState>,
    payload: web::Json<KioskAttendance>,
) -> Result<HttpResponse, AppError> {
    let kiosk = kiosk(&state)?;
    let pending = kiosk.workflow.submit(&payload.name, payload.status)?;

    // dropping the widget on any early return releases the camera
    let mut widget = CaptureWidget::open(kiosk.camera.clone(), kiosk.capture.clone()).await;
    if let CaptureState::Unavailable(reason) = widget.state() {
        kiosk.workflow.cancel(pending);
        return Err(AppError::CameraUnavailable(reason));
    }

    widget.capture().await?;
    let image = widget.confirm()?;
    info!(camera = %kiosk.camera.url(), "Kiosk photo confirmed");

    let record = kiosk.workflow.complete(pending, Some(image)).await?;
    Ok(HttpResponse::Created().json(record))
}

/// The kiosk screen's list, as of its last submission
#[utoipa::path(
    get,
    path = "/api/kiosk/attendance",
    responses(
        (status = 200, description = "Kiosk list", body = [AttendanceRecord]),
        (status = 404, description = "No kiosk camera configured")
    ),
    tag = "Kiosk"
)]
pub async fn kiosk_records(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let kiosk = kiosk(&state)?;
    Ok(HttpResponse::Ok().json(kiosk.workflow.records()))
}
