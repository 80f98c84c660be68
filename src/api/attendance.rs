use actix_web::{HttpResponse, web};
use serde::Deserialize;
use tracing::{debug, instrument};
use utoipa::ToSchema;

use crate::error::AppError;
use crate::location::FixedLocation;
use crate::model::{AttendanceRecord, AttendanceStatus, FaceImage};
use crate::state::AppState;
use crate::store::RecordStore;
use crate::workflow::{AttendanceWorkflow, RefreshPolicy};

#[derive(Deserialize, ToSchema)]
pub struct SubmitAttendance {
    #[schema(example = "Ana")]
    pub name: String,
    #[schema(value_type = String, example = "masuk")]
    pub status: AttendanceStatus,
    /// Photo taken in the browser, as a base64 JPEG or PNG data URI
    #[schema(example = "data:image/jpeg;base64,/9j/4AAQ...", nullable = true)]
    pub face_image: Option<String>,
    /// Browser geolocation, when the user allowed it
    #[schema(example = json!(-6.2), nullable = true)]
    pub latitude: Option<f64>,
    #[schema(example = 106.8166, nullable = true)]
    pub longitude: Option<f64>,
}

/// Record a check-in or check-out
#[utoipa::path(
    post,
    path = "/api/attendance",
    request_body = SubmitAttendance,
    responses(
        (status = 201, description = "Attendance recorded", body = AttendanceRecord),
        (status = 400, description = "Empty name or unusable photo", body = Object, example = json!({
            "error": "Please enter your name"
        })),
        (status = 500, description = "Internal server error")
    ),
    tag = "Attendance"
)]
#[instrument(name = "attendance_submit", skip(state, payload), fields(status = %payload.status))]
pub async fn submit_attendance(
    state: web::Data<AppState>,
    payload: web::Json<SubmitAttendance>,
) -> Result<HttpResponse, AppError> {
    let payload = payload.into_inner();
    let locator = FixedLocation::from_parts(payload.latitude, payload.longitude);

    // clients reload the list themselves, no refetch needed here
    let workflow = AttendanceWorkflow::start(&state.store, &locator, RefreshPolicy::Prepend).await;

    let pending = workflow.submit(&payload.name, payload.status)?;
    let face_image = payload
        .face_image
        .as_deref()
        .map(FaceImage::from_data_uri)
        .transpose()?;
    if face_image.is_none() {
        debug!("Attendance submitted without a photo");
    }

    let record = workflow.complete(pending, face_image).await?;
    Ok(HttpResponse::Created().json(record))
}

/// All attendance records, newest first
#[utoipa::path(
    get,
    path = "/api/attendance",
    responses(
        (status = 200, description = "Attendance list", body = [AttendanceRecord]),
        (status = 500, description = "Internal server error")
    ),
    tag = "Attendance"
)]
pub async fn list_attendance(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let records = state.store.list().await?;
    Ok(HttpResponse::Ok().json(records))
}
