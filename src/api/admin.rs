use actix_web::http::header::{ContentDisposition, DispositionParam, DispositionType};
use actix_web::{HttpResponse, web};
use chrono::Local;
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info, instrument};
use utoipa::IntoParams;

use crate::admin::gate::INVALID_PASSWORD;
use crate::admin::session::{issue_admin_token, revoke};
use crate::admin::{AdminReview, AdminSession, AttendanceStats, RecordFilter};
use crate::config::Config;
use crate::error::AppError;
use crate::model::{AttendanceRecord, RecordId};
use crate::models::{AdminLoginReq, AdminLoginResponse};
use crate::state::AppState;

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DeleteQuery {
    /// Must be `true`; deleted records cannot be restored
    pub confirm: Option<bool>,
}

/// Exchange the admin password for a session token
#[utoipa::path(
    post,
    path = "/api/admin/login",
    request_body = AdminLoginReq,
    responses(
        (status = 200, description = "Admin session opened", body = AdminLoginResponse),
        (status = 401, description = "Wrong password", body = Object, example = json!({
            "error": "Invalid admin password"
        }))
    ),
    tag = "Admin"
)]
#[instrument(name = "admin_login", skip(state, config, payload))]
pub async fn login(
    state: web::Data<AppState>,
    config: web::Data<Config>,
    payload: web::Json<AdminLoginReq>,
) -> Result<HttpResponse, AppError> {
    if !state.gate.verify(&payload.password) {
        info!("Admin login rejected");
        return Err(AppError::Unauthorized(INVALID_PASSWORD.into()));
    }

    let (access_token, claims) = issue_admin_token(&config.jwt_secret, config.admin_session_ttl)
        .map_err(|e| {
            error!(error = %e, "Failed to issue admin token");
            AppError::Internal
        })?;
    info!(jti = %claims.jti, "Admin session opened");

    Ok(HttpResponse::Ok().json(AdminLoginResponse {
        access_token,
        expires_in: config.admin_session_ttl,
    }))
}

/// End the current admin session
#[utoipa::path(
    post,
    path = "/api/admin/logout",
    responses(
        (status = 204, description = "Session ended"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn logout(session: AdminSession) -> HttpResponse {
    revoke(&session.claims).await;
    info!(jti = %session.claims.jti, "Admin session closed");
    HttpResponse::NoContent().finish()
}

/// Search and filter attendance records
#[utoipa::path(
    get,
    path = "/api/admin/records",
    params(RecordFilter),
    responses(
        (status = 200, description = "Matching records, newest first", body = [AttendanceRecord]),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_records(
    _session: AdminSession,
    state: web::Data<AppState>,
    query: web::Query<RecordFilter>,
) -> Result<HttpResponse, AppError> {
    let review = AdminReview::load(&state.store).await?;
    Ok(HttpResponse::Ok().json(review.filtered(&query)))
}

/// Download the filtered records as CSV
#[utoipa::path(
    get,
    path = "/api/admin/records/export",
    params(RecordFilter),
    responses(
        (status = 200, description = "CSV attachment named attendance-<date>.csv", content_type = "text/csv"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn export_records(
    _session: AdminSession,
    state: web::Data<AppState>,
    query: web::Query<RecordFilter>,
) -> Result<HttpResponse, AppError> {
    let review = AdminReview::load(&state.store).await?;
    let export = review.export(&query, Local::now().date_naive());

    Ok(HttpResponse::Ok()
        .content_type("text/csv; charset=utf-8")
        .insert_header(ContentDisposition {
            disposition: DispositionType::Attachment,
            parameters: vec![DispositionParam::Filename(export.filename)],
        })
        .body(export.content))
}

/// One record with every field, photo included
#[utoipa::path(
    get,
    path = "/api/admin/records/{record_id}",
    params(
        ("record_id" = String, Path, description = "Attendance record ID")
    ),
    responses(
        (status = 200, description = "Record found", body = AttendanceRecord),
        (status = 404, description = "Record not found"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn get_record(
    _session: AdminSession,
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let id = RecordId::from(path.into_inner());
    let review = AdminReview::load(&state.store).await?;

    match review.detail(&id) {
        Some(record) => Ok(HttpResponse::Ok().json(record)),
        None => Err(AppError::NotFound(format!("Attendance record `{id}` not found"))),
    }
}

/// Delete a record; needs `confirm=true`
#[utoipa::path(
    delete,
    path = "/api/admin/records/{record_id}",
    params(
        ("record_id" = String, Path, description = "Attendance record ID"),
        DeleteQuery
    ),
    responses(
        (status = 200, description = "Deleted; body carries fresh statistics", body = Object, example = json!({
            "message": "Successfully deleted",
            "stats": {"total": 1, "check_in": 1, "check_out": 0, "today": 1, "today_check_in": 1, "today_check_out": 0, "with_photo": 0}
        })),
        (status = 404, description = "Record not found"),
        (status = 428, description = "Deletion not confirmed", body = Object, example = json!({
            "error": "Deleted records cannot be restored, repeat with confirm=true"
        })),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn delete_record(
    _session: AdminSession,
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<DeleteQuery>,
) -> Result<HttpResponse, AppError> {
    let id = RecordId::from(path.into_inner());
    let mut review = AdminReview::load(&state.store).await?;
    let pending = review.request_delete(&id)?;

    if query.confirm != Some(true) {
        return Err(AppError::ConfirmationRequired(
            "Deleted records cannot be restored, repeat with confirm=true".into(),
        ));
    }

    review.confirm_delete(pending).await?;
    Ok(HttpResponse::Ok().json(json!({
        "message": "Successfully deleted",
        "stats": review.stats(Local::now().date_naive())
    })))
}

/// Totals by status and for today
#[utoipa::path(
    get,
    path = "/api/admin/stats",
    responses(
        (status = 200, description = "Statistics over all records", body = AttendanceStats),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn stats(
    _session: AdminSession,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let review = AdminReview::load(&state.store).await?;
    Ok(HttpResponse::Ok().json(review.stats(Local::now().date_naive())))
}
