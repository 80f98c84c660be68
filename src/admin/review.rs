use chrono::NaiveDate;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;
use tracing::info;
use utoipa::{IntoParams, ToSchema};

use super::export::{CsvExport, export_csv};
use crate::model::attendance::format_date;
use crate::model::{AttendanceRecord, AttendanceStatus, RecordId};
use crate::store::{RecordStore, StoreError};

#[derive(Debug, Error)]
pub enum ReviewError {
    #[error("attendance record `{0}` not found")]
    NotFound(RecordId),
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RecordFilter {
    /// Case-insensitive substring of the name
    #[param(example = "an")]
    pub search: Option<String>,
    /// Exact status, `masuk` or `keluar`; empty or `all` means any
    #[param(value_type = Option<String>, example = "masuk")]
    #[serde(default, deserialize_with = "status_or_all")]
    pub status: Option<AttendanceStatus>,
}

impl RecordFilter {
    pub fn matches(&self, record: &AttendanceRecord) -> bool {
        let matches_search = match self.search.as_deref() {
            None | Some("") => true,
            Some(query) => record
                .name
                .to_lowercase()
                .contains(&query.to_lowercase()),
        };
        let matches_status = self.status.is_none_or(|status| record.status == status);

        matches_search && matches_status
    }
}

fn status_or_all<'de, D>(deserializer: D) -> Result<Option<AttendanceStatus>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)?.as_deref() {
        None | Some("") | Some("all") => Ok(None),
        Some(raw) => AttendanceStatus::from_str(raw)
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("unknown status `{raw}`"))),
    }
}

pub fn filter_records<'a>(
    records: &'a [AttendanceRecord],
    filter: &RecordFilter,
) -> Vec<&'a AttendanceRecord> {
    records.iter().filter(|r| filter.matches(r)).collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct AttendanceStats {
    pub total: usize,
    pub check_in: usize,
    pub check_out: usize,
    pub today: usize,
    pub today_check_in: usize,
    pub today_check_out: usize,
    pub with_photo: usize,
}

impl AttendanceStats {
    pub fn compute(records: &[AttendanceRecord], today: NaiveDate) -> Self {
        let today = format_date(today);

        records.iter().fold(Self::default(), |mut stats, r| {
            let is_today = r.date == today;
            stats.total += 1;
            match r.status {
                AttendanceStatus::CheckIn => {
                    stats.check_in += 1;
                    stats.today_check_in += usize::from(is_today);
                }
                AttendanceStatus::CheckOut => {
                    stats.check_out += 1;
                    stats.today_check_out += usize::from(is_today);
                }
            }
            stats.today += usize::from(is_today);
            stats.with_photo += usize::from(r.is_verified());
            stats
        })
    }
}

/// Proof that a delete was asked for and then explicitly confirmed.
#[derive(Debug)]
pub struct PendingDelete {
    id: RecordId,
}

impl PendingDelete {
    pub fn id(&self) -> &RecordId {
        &self.id
    }
}

/// Admin Review Surface over one store snapshot. The snapshot is replaced
/// wholesale after every mutation.
pub struct AdminReview<S> {
    store: S,
    records: Vec<AttendanceRecord>,
}

impl<S: RecordStore> AdminReview<S> {
    pub async fn load(store: S) -> Result<Self, StoreError> {
        let records = store.list().await?;
        Ok(Self { store, records })
    }

    pub async fn refresh(&mut self) -> Result<(), StoreError> {
        self.records = self.store.list().await?;
        Ok(())
    }

    pub fn records(&self) -> &[AttendanceRecord] {
        &self.records
    }

    pub fn filtered(&self, filter: &RecordFilter) -> Vec<&AttendanceRecord> {
        filter_records(&self.records, filter)
    }

    pub fn detail(&self, id: &RecordId) -> Option<&AttendanceRecord> {
        self.records.iter().find(|r| &r.id == id)
    }

    pub fn stats(&self, today: NaiveDate) -> AttendanceStats {
        AttendanceStats::compute(&self.records, today)
    }

    pub fn export(&self, filter: &RecordFilter, today: NaiveDate) -> CsvExport {
        export_csv(self.filtered(filter), today)
    }

    /// First half of a delete; nothing is removed yet.
    pub fn request_delete(&self, id: &RecordId) -> Result<PendingDelete, ReviewError> {
        match self.detail(id) {
            Some(record) => Ok(PendingDelete {
                id: record.id.clone(),
            }),
            None => Err(ReviewError::NotFound(id.clone())),
        }
    }

    pub async fn confirm_delete(&mut self, pending: PendingDelete) -> Result<(), ReviewError> {
        match self.store.delete(&pending.id).await {
            Ok(()) => {}
            Err(StoreError::NotFound(id)) => return Err(ReviewError::NotFound(id)),
            Err(e) => return Err(e.into()),
        }
        info!(id = %pending.id, "Attendance record deleted");

        self.refresh().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;
    use crate::model::NewAttendanceRecord;
    use crate::store::MemoryRecordStore;

    fn record(id: &str, name: &str, status: AttendanceStatus, date: &str) -> AttendanceRecord {
        AttendanceRecord {
            id: RecordId::from(id),
            name: name.into(),
            time: "08.00.00".into(),
            date: date.into(),
            location: "-6.2000, 106.8166".into(),
            status,
            face_image: None,
            created_at: None,
        }
    }

    fn ana_and_budi() -> Vec<AttendanceRecord> {
        vec![
            record("1", "Ana", AttendanceStatus::CheckIn, "19/10/2026"),
            record("2", "Budi", AttendanceStatus::CheckOut, "18/10/2026"),
        ]
    }

    fn names(records: Vec<&AttendanceRecord>) -> Vec<&str> {
        records.into_iter().map(|r| r.name.as_str()).collect()
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    #[rstest]
    #[case(Some("an"), None, vec!["Ana"])]
    #[case(Some("AN"), None, vec!["Ana"])]
    #[case(Some(""), Some(AttendanceStatus::CheckOut), vec!["Budi"])]
    #[case(None, None, vec!["Ana", "Budi"])]
    #[case(Some("bu"), Some(AttendanceStatus::CheckIn), vec![])]
    #[case(Some("ana "), None, vec![])]
    fn filter_by_name_and_status(
        #[case] search: Option<&str>,
        #[case] status: Option<AttendanceStatus>,
        #[case] expected: Vec<&str>,
    ) {
        let records = ana_and_budi();
        let filter = RecordFilter {
            search: search.map(String::from),
            status,
        };
        assert_eq!(names(filter_records(&records, &filter)), expected);
    }

    #[rstest]
    #[case("search=&status=", None)]
    #[case("status=all", None)]
    #[case("", None)]
    #[case("status=keluar", Some(AttendanceStatus::CheckOut))]
    #[case("status=check-in", Some(AttendanceStatus::CheckIn))]
    fn blank_or_all_status_means_any(
        #[case] query: &str,
        #[case] expected: Option<AttendanceStatus>,
    ) {
        let filter = actix_web::web::Query::<RecordFilter>::from_query(query)
            .unwrap()
            .into_inner();
        assert_eq!(filter.status, expected);
        if expected.is_none() {
            assert_eq!(filter_records(&ana_and_budi(), &filter).len(), 2);
        }
    }

    #[test]
    fn unknown_status_is_rejected() {
        assert!(actix_web::web::Query::<RecordFilter>::from_query("status=lunch").is_err());
    }

    #[test]
    fn export_rows_follow_filtered_order() {
        let records = ana_and_budi();
        let export = export_csv(&records, today());
        let lines: Vec<_> = export.content.lines().collect();

        assert_eq!(lines[0], "ID,Name,Date,Time,Status,Location,Verification");
        assert_eq!(
            lines[1],
            "1,Ana,19/10/2026,08.00.00,masuk,\"-6.2000, 106.8166\",no photo"
        );
        assert_eq!(
            lines[2],
            "2,Budi,18/10/2026,08.00.00,keluar,\"-6.2000, 106.8166\",no photo"
        );
        assert_eq!(lines.len(), 3);
        assert_eq!(export.filename, "attendance-2026-10-19.csv");
    }

    #[test]
    fn export_adds_created_at_column_when_known() {
        let mut records = ana_and_budi();
        records[0].created_at = Some(Utc.with_ymd_and_hms(2026, 10, 19, 1, 0, 0).unwrap());

        let export = export_csv(&records, today());
        let lines: Vec<_> = export.content.lines().collect();
        assert!(lines[0].ends_with(",Created At"));
        assert!(lines[1].ends_with(",2026-10-19T01:00:00+00:00"));
        assert!(lines[2].ends_with(",no photo,"));
    }

    #[test]
    fn stats_count_status_and_today() {
        let stats = AttendanceStats::compute(&ana_and_budi(), today());
        assert_eq!(
            stats,
            AttendanceStats {
                total: 2,
                check_in: 1,
                check_out: 1,
                today: 1,
                today_check_in: 1,
                today_check_out: 0,
                with_photo: 0,
            }
        );
    }

    #[tokio::test]
    async fn confirmed_delete_disappears_from_list_and_stats() {
        let store = MemoryRecordStore::new();
        for (name, status) in [
            ("Ana", AttendanceStatus::CheckIn),
            ("Budi", AttendanceStatus::CheckOut),
        ] {
            store
                .create(NewAttendanceRecord {
                    name: name.into(),
                    time: "08.00.00".into(),
                    date: "19/10/2026".into(),
                    location: "x".into(),
                    status,
                    face_image: None,
                })
                .await
                .unwrap();
        }

        let mut review = AdminReview::load(store.clone()).await.unwrap();
        let budi = review
            .filtered(&RecordFilter {
                search: Some("budi".into()),
                status: None,
            })[0]
            .id
            .clone();

        let pending = review.request_delete(&budi).unwrap();
        assert_eq!(store.len(), 2, "requesting must not delete");
        review.confirm_delete(pending).await.unwrap();

        assert!(review.detail(&budi).is_none());
        assert!(
            review
                .filtered(&RecordFilter::default())
                .iter()
                .all(|r| r.id != budi)
        );
        let stats = review.stats(today());
        assert_eq!((stats.total, stats.check_out, stats.today), (1, 0, 1));
    }

    #[tokio::test]
    async fn unknown_id_cannot_be_requested_for_delete() {
        let review = AdminReview::load(MemoryRecordStore::new()).await.unwrap();
        assert!(matches!(
            review.request_delete(&RecordId::from("nope")),
            Err(ReviewError::NotFound(_))
        ));
    }
}
