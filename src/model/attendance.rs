use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use utoipa::ToSchema;

use super::face_image::FaceImage;

/// Local time as shown to users, e.g. `08.05.09`.
pub const TIME_FORMAT: &str = "%H.%M.%S";
/// Local date as shown to users, e.g. `9/1/2026`.
pub const DATE_FORMAT: &str = "%-d/%-m/%Y";

pub fn format_time(time: NaiveTime) -> String {
    time.format(TIME_FORMAT).to_string()
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// The two attendance event kinds.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
pub enum AttendanceStatus {
    #[serde(rename = "masuk", alias = "check-in")]
    #[strum(to_string = "masuk", serialize = "check-in")]
    CheckIn,
    #[serde(rename = "keluar", alias = "check-out")]
    #[strum(to_string = "keluar", serialize = "check-out")]
    CheckOut,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for RecordId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A record that has not been persisted yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAttendanceRecord {
    pub name: String,
    pub time: String,
    pub date: String,
    pub location: String,
    pub status: AttendanceStatus,
    pub face_image: Option<FaceImage>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(
    example = json!({
        "id": "1f0e2b8c-5d6a-4c39-9a57-2f1f5f3c2b10",
        "name": "Ana",
        "time": "08.05.09",
        "date": "19/10/2026",
        "location": "-6.2000, 106.8166",
        "status": "masuk",
        "face_image": "data:image/jpeg;base64,/9j/4AAQ...",
        "created_at": "2026-10-19T01:05:09Z"
    })
)]
pub struct AttendanceRecord {
    #[schema(value_type = String)]
    pub id: RecordId,
    pub name: String,
    pub time: String,
    pub date: String,
    pub location: String,
    pub status: AttendanceStatus,
    #[schema(value_type = Option<String>, nullable = true)]
    pub face_image: Option<FaceImage>,
    #[schema(value_type = Option<String>, format = DateTime, nullable = true)]
    pub created_at: Option<DateTime<Utc>>,
}

impl AttendanceRecord {
    pub fn from_new(
        id: RecordId,
        record: NewAttendanceRecord,
        created_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            id,
            name: record.name,
            time: record.time,
            date: record.date,
            location: record.location,
            status: record.status,
            face_image: record.face_image,
            created_at,
        }
    }

    pub fn is_verified(&self) -> bool {
        self.face_image.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn status_uses_indonesian_wire_names() {
        assert_eq!(AttendanceStatus::CheckIn.to_string(), "masuk");
        assert_eq!(AttendanceStatus::CheckOut.to_string(), "keluar");
        assert_eq!(
            serde_json::to_string(&AttendanceStatus::CheckOut).unwrap(),
            "\"keluar\""
        );
    }

    #[test]
    fn status_parses_english_aliases() {
        assert_eq!(
            AttendanceStatus::from_str("check-in").unwrap(),
            AttendanceStatus::CheckIn
        );
        assert_eq!(
            serde_json::from_str::<AttendanceStatus>("\"check-out\"").unwrap(),
            AttendanceStatus::CheckOut
        );
        assert!(AttendanceStatus::from_str("lunch").is_err());
    }

    #[test]
    fn local_formats_drop_zero_padding_on_date_only() {
        let date = NaiveDate::from_ymd_opt(2026, 1, 9).unwrap();
        let time = NaiveTime::from_hms_opt(8, 5, 9).unwrap();
        assert_eq!(format_date(date), "9/1/2026");
        assert_eq!(format_time(time), "08.05.09");
    }
}
