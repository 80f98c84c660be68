use std::str::FromStr;

use chrono::{DateTime, Utc};
use sqlx::{FromRow, MySqlPool};
use tracing::{debug, error, warn};

use super::{RecordStore, StoreError};
use crate::model::{AttendanceRecord, AttendanceStatus, FaceImage, NewAttendanceRecord, RecordId};

#[derive(FromRow)]
struct AttendanceRow {
    id: String,
    name: String,
    time: String,
    date: String,
    location: String,
    status: String,
    face_image: Option<String>,
    created_at: Option<DateTime<Utc>>,
}

impl TryFrom<AttendanceRow> for AttendanceRecord {
    type Error = StoreError;

    fn try_from(row: AttendanceRow) -> Result<Self, Self::Error> {
        let status = AttendanceStatus::from_str(&row.status).map_err(|_| StoreError::Corrupt {
            id: row.id.clone(),
            reason: format!("unknown status `{}`", row.status),
        })?;

        // a bad photo should not hide the attendance row itself
        let face_image = row.face_image.and_then(|uri| match FaceImage::from_data_uri(&uri) {
            Ok(image) => Some(image),
            Err(e) => {
                warn!(error = %e, id = %row.id, "Dropping unreadable face image");
                None
            }
        });

        Ok(AttendanceRecord {
            id: RecordId::from(row.id),
            name: row.name,
            time: row.time,
            date: row.date,
            location: row.location,
            status,
            face_image,
            created_at: row.created_at,
        })
    }
}

#[derive(Clone)]
pub struct MySqlRecordStore {
    pool: MySqlPool,
}

impl MySqlRecordStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    async fn fetch_one(&self, id: &RecordId) -> Result<AttendanceRecord, StoreError> {
        let row = sqlx::query_as::<_, AttendanceRow>(
            r#"
            SELECT id, name, time, date, location, status, face_image, created_at
            FROM attendance_records
            WHERE id = ?
            "#,
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => row.try_into(),
            None => Err(StoreError::NotFound(id.clone())),
        }
    }
}

impl RecordStore for MySqlRecordStore {
    async fn create(&self, record: NewAttendanceRecord) -> Result<AttendanceRecord, StoreError> {
        let id = RecordId::generate();

        sqlx::query(
            r#"
            INSERT INTO attendance_records
                (id, name, time, date, location, status, face_image)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(id.as_str())
        .bind(&record.name)
        .bind(&record.time)
        .bind(&record.date)
        .bind(&record.location)
        .bind(record.status.to_string())
        .bind(record.face_image.as_ref().map(|f| f.as_str()))
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!(error = %e, name = %record.name, "Failed to insert attendance record");
            StoreError::from(e)
        })?;

        // read back for the server-assigned created_at
        self.fetch_one(&id).await
    }

    async fn list(&self) -> Result<Vec<AttendanceRecord>, StoreError> {
        let rows = sqlx::query_as::<_, AttendanceRow>(
            r#"
            SELECT id, name, time, date, location, status, face_image, created_at
            FROM attendance_records
            ORDER BY created_at DESC, seq DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to list attendance records");
            StoreError::from(e)
        })?;

        debug!(count = rows.len(), "Fetched attendance records");
        rows.into_iter().map(AttendanceRecord::try_from).collect()
    }

    async fn delete(&self, id: &RecordId) -> Result<(), StoreError> {
        let result = sqlx::query(r#"DELETE FROM attendance_records WHERE id = ?"#)
            .bind(id.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| {
                error!(error = %e, id = %id, "Failed to delete attendance record");
                StoreError::from(e)
            })?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(id.clone()));
        }
        Ok(())
    }
}
