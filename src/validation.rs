//! Entry validation: [`MappedRow`] → [`Entry`].
//!
//! Each row is validated on its own:
//!
//! 1. Null values are dropped (treated as "not provided").
//! 2. Remaining values are coerced to the field types; every coercion failure of the row is
//!    collected, together with any missing required field.
//! 3. The coerced candidate goes through [`crate::model::EntryBuilder::build`], which applies the
//!    field-level and then the cross-field invariants.
//!
//! A failure never stops sibling rows: [`validate_rows`] returns every valid entry and every
//! [`RowError`]. Turning row errors into a batch failure is the caller's decision.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use thiserror::Error;

use crate::mapping::{EntryField, MappedRow};
use crate::model::{Entry, Issue, Status, ValidationError};
use crate::types::Value;

/// Magnitude above which a numeric timestamp is read as milliseconds rather than seconds.
const MS_TIMESTAMP_THRESHOLD: f64 = 2e10;

/// Validation failure of one row.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("Row {row}: {error}")]
pub struct RowError {
    /// 1-based spreadsheet row number.
    pub row: usize,
    pub error: ValidationError,
}

/// Result of validating a batch of rows.
#[derive(Debug, Clone, Default)]
pub struct BatchOutcome {
    /// Valid entries, in row order.
    pub entries: Vec<Entry>,
    /// Failed rows, in row order.
    pub errors: Vec<RowError>,
}

impl BatchOutcome {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Validate every row, isolating failures per row.
pub fn validate_rows<'a>(rows: impl IntoIterator<Item = &'a MappedRow>) -> BatchOutcome {
    let mut outcome = BatchOutcome::default();
    for row in rows {
        match validate_row(row) {
            Ok(entry) => outcome.entries.push(entry),
            Err(err) => outcome.errors.push(err),
        }
    }
    outcome
}

/// Build and validate one [`Entry`] from a mapped row.
pub fn validate_row(row: &MappedRow) -> Result<Entry, RowError> {
    build_entry(row).map_err(|error| RowError {
        row: row.row_number,
        error,
    })
}

fn build_entry(row: &MappedRow) -> Result<Entry, ValidationError> {
    let mut issues = Vec::new();
    let provided = |field: EntryField| row.field(field).filter(|v| !v.is_null());

    let company = required(provided(EntryField::CompanyName), EntryField::CompanyName, &mut issues)
        .and_then(|v| collect(coerce_text(EntryField::CompanyName, v), &mut issues));
    let project = required(provided(EntryField::ProjectName), EntryField::ProjectName, &mut issues)
        .and_then(|v| collect(coerce_text(EntryField::ProjectName, v), &mut issues));
    let value = required(provided(EntryField::Value), EntryField::Value, &mut issues)
        .and_then(|v| collect(coerce_number(EntryField::Value, v), &mut issues));

    let id = provided(EntryField::Id).and_then(|v| collect(coerce_text(EntryField::Id, v), &mut issues));
    let probability = provided(EntryField::Probability)
        .and_then(|v| collect(coerce_number(EntryField::Probability, v), &mut issues));
    let status = provided(EntryField::Status).and_then(|v| collect(coerce_status(v), &mut issues));
    let start_date = provided(EntryField::StartDate)
        .and_then(|v| collect(coerce_datetime(EntryField::StartDate, v), &mut issues));
    let expected_close = provided(EntryField::ExpectedCloseDate)
        .and_then(|v| collect(coerce_datetime(EntryField::ExpectedCloseDate, v), &mut issues));
    let notes = provided(EntryField::Notes).and_then(|v| collect(coerce_text(EntryField::Notes, v), &mut issues));
    let last_updated = provided(EntryField::LastUpdated)
        .and_then(|v| collect(coerce_datetime(EntryField::LastUpdated, v), &mut issues));

    // A required field that is absent or failed coercion has already recorded an issue.
    let (Some(company), Some(project), Some(value)) = (company, project, value) else {
        return Err(ValidationError { issues });
    };
    ValidationError::check(issues)?;

    let mut builder = Entry::builder(company, project, value);
    if let Some(id) = id {
        builder = builder.id(id);
    }
    if let Some(p) = probability {
        builder = builder.probability(p);
    }
    if let Some(s) = status {
        builder = builder.status(s);
    }
    if let Some(d) = start_date {
        builder = builder.start_date(d);
    }
    if let Some(d) = expected_close {
        builder = builder.expected_close_date(d);
    }
    if let Some(n) = notes {
        builder = builder.notes(n);
    }
    if let Some(d) = last_updated {
        builder = builder.last_updated(d);
    }
    for (name, v) in row.custom.iter().filter(|(_, v)| !v.is_null()) {
        builder = builder.custom_field(name.clone(), v.clone());
    }
    builder.build()
}

fn required<'a>(value: Option<&'a Value>, field: EntryField, issues: &mut Vec<Issue>) -> Option<&'a Value> {
    if value.is_none() {
        issues.push(Issue::Missing { field: field.name() });
    }
    value
}

fn collect<T>(result: Result<T, Issue>, issues: &mut Vec<Issue>) -> Option<T> {
    result.map_err(|issue| issues.push(issue)).ok()
}

fn invalid(field: EntryField, expected: &'static str, v: &Value) -> Issue {
    Issue::InvalidType {
        field: field.name(),
        expected,
        raw: format!("{} '{}'", v.kind(), v),
    }
}

/// Text fields take strings verbatim and render numbers and booleans.
fn coerce_text(field: EntryField, v: &Value) -> Result<String, Issue> {
    match v {
        Value::Utf8(s) => Ok(s.clone()),
        Value::Int64(_) | Value::Float64(_) | Value::Bool(_) => Ok(v.to_string()),
        _ => Err(invalid(field, "string", v)),
    }
}

fn coerce_number(field: EntryField, v: &Value) -> Result<f64, Issue> {
    match v {
        Value::Int64(i) => Ok(*i as f64),
        Value::Float64(f) => Ok(*f),
        Value::Utf8(s) => s.trim().parse::<f64>().map_err(|_| invalid(field, "number", v)),
        _ => Err(invalid(field, "number", v)),
    }
}

fn coerce_status(v: &Value) -> Result<Status, Issue> {
    match v {
        Value::Utf8(s) => s.parse(),
        other => Err(Issue::InvalidStatus(other.to_string())),
    }
}

/// Dates accept date-time cells, ISO-8601 text and Unix timestamps (seconds or milliseconds).
fn coerce_datetime(field: EntryField, v: &Value) -> Result<NaiveDateTime, Issue> {
    match v {
        Value::DateTime(dt) => Ok(*dt),
        Value::Utf8(s) => parse_datetime_text(s.trim()).ok_or_else(|| invalid(field, "date", v)),
        Value::Int64(_) | Value::Float64(_) => v
            .as_f64()
            .and_then(timestamp_to_datetime)
            .ok_or_else(|| invalid(field, "date", v)),
        _ => Err(invalid(field, "date", v)),
    }
}

fn parse_datetime_text(s: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = s.parse::<NaiveDateTime>() {
        return Some(dt);
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") {
        return Some(dt);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    s.parse::<NaiveDate>()
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

fn timestamp_to_datetime(ts: f64) -> Option<NaiveDateTime> {
    if !ts.is_finite() {
        return None;
    }
    let secs = if ts.abs() > MS_TIMESTAMP_THRESHOLD {
        ts / 1000.0
    } else {
        ts
    };
    let whole = secs.floor();
    let nanos = ((secs - whole) * 1e9).round() as u32;
    DateTime::from_timestamp(whole as i64, nanos.min(999_999_999)).map(|dt| dt.naive_utc())
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveDateTime};

    use super::{validate_row, validate_rows};
    use crate::mapping::{EntryField, MappedRow};
    use crate::model::{Issue, Status};
    use crate::types::Value;

    fn day(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn mapped(row_number: usize, fields: Vec<(EntryField, Value)>) -> MappedRow {
        MappedRow {
            row_number,
            fields: fields.into_iter().collect(),
            ..MappedRow::default()
        }
    }

    fn base(row_number: usize) -> MappedRow {
        mapped(
            row_number,
            vec![
                (EntryField::CompanyName, Value::from("ABC Corp")),
                (EntryField::ProjectName, Value::from("Website Redesign")),
                (EntryField::Value, Value::Float64(50000.0)),
            ],
        )
    }

    #[test]
    fn coerces_typed_fields() {
        let mut row = base(2);
        row.fields.insert(EntryField::Probability, Value::from(" 80 "));
        row.fields.insert(EntryField::Status, Value::from("Closed Won"));
        row.fields.insert(EntryField::StartDate, Value::from("2025-01-01"));
        row.fields.insert(EntryField::ExpectedCloseDate, Value::DateTime(day(2025, 3, 31)));
        row.fields.insert(EntryField::Id, Value::Int64(17));

        let entry = validate_row(&row).unwrap();
        assert_eq!(entry.probability(), Some(80.0));
        assert_eq!(entry.status(), Some(Status::ClosedWon));
        assert_eq!(entry.start_date(), Some(day(2025, 1, 1)));
        assert_eq!(entry.expected_close_date(), Some(day(2025, 3, 31)));
        assert_eq!(entry.id(), Some("17"));
    }

    #[test]
    fn nulls_count_as_not_provided() {
        let mut row = base(2);
        row.fields.insert(EntryField::Probability, Value::Null);
        row.fields.insert(EntryField::Status, Value::Null);
        row.custom.insert("extra".into(), Value::Null);

        let entry = validate_row(&row).unwrap();
        assert_eq!(entry.probability(), None);
        assert_eq!(entry.status(), None);
        assert!(entry.custom_fields().is_empty());
    }

    #[test]
    fn null_required_field_is_missing() {
        let mut row = base(4);
        row.fields.insert(EntryField::CompanyName, Value::Null);
        let err = validate_row(&row).unwrap_err();
        assert_eq!(err.row, 4);
        assert_eq!(
            err.error.issues,
            vec![Issue::Missing {
                field: "company_name"
            }]
        );
        assert!(err.to_string().starts_with("Row 4: company_name: field required"));
    }

    #[test]
    fn unknown_status_is_rejected_not_coerced() {
        let mut row = base(2);
        row.fields.insert(EntryField::Status, Value::from("Very High"));
        let err = validate_row(&row).unwrap_err();
        assert_eq!(err.error.issues, vec![Issue::InvalidStatus("Very High".into())]);
    }

    #[test]
    fn coercion_issues_are_collected_per_row() {
        let row = mapped(
            7,
            vec![
                (EntryField::ProjectName, Value::from("P")),
                (EntryField::Value, Value::from("lots")),
                (EntryField::StartDate, Value::Bool(true)),
            ],
        );
        let err = validate_row(&row).unwrap_err();
        assert_eq!(err.error.issues.len(), 3);
        assert!(err.error.has(|i| matches!(i, Issue::Missing { field: "company_name" })));
        assert!(err.error.has(|i| matches!(i, Issue::InvalidType { field: "value", .. })));
        assert!(err.error.has(|i| matches!(i, Issue::InvalidType { field: "start_date", .. })));
    }

    #[test]
    fn out_of_range_probability_fails() {
        for p in [-1.0, 101.0] {
            let mut row = base(3);
            row.fields.insert(EntryField::Probability, Value::Float64(p));
            let err = validate_row(&row).unwrap_err();
            assert_eq!(err.error.issues, vec![Issue::ProbabilityOutOfRange(p)]);
        }
    }

    #[test]
    fn reversed_dates_fail() {
        let mut row = base(2);
        row.fields.insert(EntryField::StartDate, Value::DateTime(day(2025, 4, 1)));
        row.fields.insert(EntryField::ExpectedCloseDate, Value::from("2025-03-01"));
        let err = validate_row(&row).unwrap_err();
        assert!(err.error.has(|i| matches!(i, Issue::DatesOutOfOrder { .. })));
    }

    #[test]
    fn numeric_dates_are_unix_timestamps() {
        let mut row = base(2);
        row.fields.insert(EntryField::LastUpdated, Value::Int64(1_735_689_600));
        let entry = validate_row(&row).unwrap();
        assert_eq!(entry.last_updated(), Some(day(2025, 1, 1)));

        let mut row = base(2);
        row.fields.insert(EntryField::LastUpdated, Value::Float64(1_735_689_600_000.0));
        let entry = validate_row(&row).unwrap();
        assert_eq!(entry.last_updated(), Some(day(2025, 1, 1)));
    }

    #[test]
    fn custom_values_are_kept_verbatim() {
        let mut row = base(2);
        row.custom.insert("probability_pct".into(), Value::Float64(80.0));
        row.custom.insert("status_text".into(), Value::from("High"));
        let entry = validate_row(&row).unwrap();
        assert_eq!(entry.custom_field("probability_pct"), Some(&Value::Float64(80.0)));
        assert_eq!(entry.custom_field("status_text"), Some(&Value::from("High")));
    }

    #[test]
    fn batch_isolates_failures() {
        let mut bad = base(3);
        bad.fields.insert(EntryField::Probability, Value::Float64(120.0));
        let rows = vec![base(2), bad, base(4)];

        let outcome = validate_rows(&rows);
        assert_eq!(outcome.entries.len(), 2);
        assert_eq!(outcome.errors.len(), 1);
        assert_eq!(outcome.errors[0].row, 3);
        assert!(!outcome.is_clean());
    }
}
