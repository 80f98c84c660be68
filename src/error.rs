use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use derive_more::Display;
use serde_json::json;

use crate::admin::ReviewError;
use crate::capture::CaptureError;
use crate::model::ImageError;
use crate::store::StoreError;
use crate::workflow::WorkflowError;

/// Every failure a handler can hand back to a client.
#[derive(Debug, Display)]
pub enum AppError {
    #[display(fmt = "{}", _0)]
    BadRequest(String),

    #[display(fmt = "{}", _0)]
    Unauthorized(String),

    #[display(fmt = "{}", _0)]
    NotFound(String),

    #[display(fmt = "{}", _0)]
    Conflict(String),

    #[display(fmt = "{}", _0)]
    ConfirmationRequired(String),

    #[display(fmt = "Camera unavailable: {}", _0)]
    CameraUnavailable(String),

    #[display(fmt = "Internal Server Error")]
    Internal,
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::ConfirmationRequired(_) => StatusCode::PRECONDITION_REQUIRED,
            AppError::CameraUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({
            "error": self.to_string()
        }))
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(id) => AppError::NotFound(format!("Attendance record `{id}` not found")),
            StoreError::Database(_) | StoreError::Corrupt { .. } => AppError::Internal,
        }
    }
}

impl From<WorkflowError> for AppError {
    fn from(e: WorkflowError) -> Self {
        match e {
            WorkflowError::EmptyName => AppError::BadRequest("Please enter your name".into()),
            WorkflowError::NameTooLong => AppError::BadRequest(e.to_string()),
            WorkflowError::Busy => AppError::Conflict(e.to_string()),
            WorkflowError::Persist(store) => store.into(),
        }
    }
}

impl From<ReviewError> for AppError {
    fn from(e: ReviewError) -> Self {
        match e {
            ReviewError::NotFound(id) => AppError::NotFound(format!("Attendance record `{id}` not found")),
            ReviewError::Store(store) => store.into(),
        }
    }
}

impl From<ImageError> for AppError {
    fn from(e: ImageError) -> Self {
        AppError::BadRequest(e.to_string())
    }
}

impl From<CaptureError> for AppError {
    fn from(e: CaptureError) -> Self {
        match e {
            CaptureError::Unavailable(reason) => AppError::CameraUnavailable(reason),
            CaptureError::Frame(image) => AppError::CameraUnavailable(image.to_string()),
            CaptureError::Cancelled => AppError::Conflict("Capture cancelled".into()),
            CaptureError::InvalidTransition { .. } => AppError::Internal,
        }
    }
}
