use chrono::NaiveDate;

use crate::model::AttendanceRecord;

const HEADER: [&str; 7] = [
    "ID",
    "Name",
    "Date",
    "Time",
    "Status",
    "Location",
    "Verification",
];
const CREATED_AT: &str = "Created At";

pub const VERIFIED: &str = "verified";
pub const NO_PHOTO: &str = "no photo";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvExport {
    pub filename: String,
    pub content: String,
}

pub fn export_filename(today: NaiveDate) -> String {
    format!("attendance-{}.csv", today.format("%Y-%m-%d"))
}

/// Serialises records in the given order, header first.
///
/// The `Created At` column is added only when at least one record has a
/// creation timestamp.
pub fn export_csv<'a, I>(records: I, today: NaiveDate) -> CsvExport
where
    I: IntoIterator<Item = &'a AttendanceRecord>,
{
    let records: Vec<&AttendanceRecord> = records.into_iter().collect();
    let with_created = records.iter().any(|r| r.created_at.is_some());

    let mut header: Vec<&str> = HEADER.to_vec();
    if with_created {
        header.push(CREATED_AT);
    }

    let mut lines = Vec::with_capacity(records.len() + 1);
    lines.push(join_row(header.iter().copied()));

    for record in records {
        let status = record.status.to_string();
        let mut row = vec![
            record.id.as_str(),
            record.name.as_str(),
            record.date.as_str(),
            record.time.as_str(),
            status.as_str(),
            record.location.as_str(),
            if record.is_verified() { VERIFIED } else { NO_PHOTO },
        ];
        let created = record
            .created_at
            .map(|ts| ts.to_rfc3339())
            .unwrap_or_default();
        if with_created {
            row.push(created.as_str());
        }
        lines.push(join_row(row));
    }

    let mut content = lines.join("\r\n");
    content.push_str("\r\n");

    CsvExport {
        filename: export_filename(today),
        content,
    }
}

fn join_row<'a>(fields: impl IntoIterator<Item = &'a str>) -> String {
    fields
        .into_iter()
        .map(escape_field)
        .collect::<Vec<_>>()
        .join(",")
}

fn escape_field(field: &str) -> String {
    if field.contains([',', '"', '\r', '\n']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("Ana", "Ana")]
    #[case("-6.2000, 106.8167", "\"-6.2000, 106.8167\"")]
    #[case("Ana \"Ann\" B", "\"Ana \"\"Ann\"\" B\"")]
    #[case("line\nbreak", "\"line\nbreak\"")]
    fn escapes_only_when_needed(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(escape_field(raw), expected);
    }

    #[test]
    fn filename_uses_iso_date() {
        let today = NaiveDate::from_ymd_opt(2026, 3, 7).unwrap();
        assert_eq!(export_filename(today), "attendance-2026-03-07.csv");
    }
}
