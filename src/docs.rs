use crate::admin::AttendanceStats;
use crate::api::attendance::SubmitAttendance;
use crate::api::kiosk::KioskAttendance;
use crate::model::{AttendanceRecord, AttendanceStatus};
use crate::models::{AdminLoginReq, AdminLoginResponse};
use utoipa::Modify;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Attendance API",
        version = "1.0.0",
        description = r#"
## Employee Attendance

Employees record a **check-in** (`masuk`) or **check-out** (`keluar`) with their name,
an optional face photo and the location the browser reported.

### Admin
The admin endpoints sit behind a shared password. `POST /api/admin/login` returns a
**Bearer** token for the rest of `/api/admin`.

- search and filter by name or status
- CSV export of the current filter
- record detail with photo
- delete (needs `confirm=true`)

### Kiosk
When a camera snapshot URL is configured, `/api/kiosk/attendance` takes the photo
server-side after a short countdown.
"#,
    ),
    paths(
        crate::api::attendance::submit_attendance,
        crate::api::attendance::list_attendance,

        crate::api::kiosk::kiosk_attendance,
        crate::api::kiosk::kiosk_records,

        crate::api::admin::login,
        crate::api::admin::logout,
        crate::api::admin::list_records,
        crate::api::admin::export_records,
        crate::api::admin::get_record,
        crate::api::admin::delete_record,
        crate::api::admin::stats
    ),
    components(
        schemas(
            AttendanceRecord,
            AttendanceStatus,
            SubmitAttendance,
            KioskAttendance,
            AdminLoginReq,
            AdminLoginResponse,
            AttendanceStats
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Attendance", description = "Check-in and check-out"),
        (name = "Kiosk", description = "Attendance with the kiosk camera"),
        (name = "Admin", description = "Password-gated review of attendance records"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}
