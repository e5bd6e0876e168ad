#![cfg(feature = "excel")]

//! Workbook reading through `calamine`.

use std::error::Error as StdError;
use std::path::Path;

use calamine::{open_workbook_auto, Data, Range, Reader};
use chrono::{NaiveDate, NaiveDateTime};

use super::{stat_local_file, FileStat, ReadOptions, SourceError, TabularSource};
use crate::types::{RawRow, Table, Value};

/// [`TabularSource`] over workbook files on disk (`.xlsx`, `.xlsm`, `.xlsb`, `.xls`, `.ods`).
///
/// Every call opens the workbook afresh and holds no handle afterwards, so one instance can be
/// shared freely.
///
/// Behavior:
/// - The first non-empty row of a sheet is the header row
/// - Blank header cells are named `Unnamed: <column index>`
/// - Row numbers are 1-based sheet rows
#[derive(Debug, Clone, Copy, Default)]
pub struct CalamineSource;

impl CalamineSource {
    pub fn new() -> Self {
        Self
    }

    fn open_range(&self, path: &Path, sheet: &str) -> Result<Range<Data>, SourceError> {
        check_exists(path)?;
        let mut workbook = open_workbook_auto(path).map_err(|e| classify(path, e))?;
        if !workbook.sheet_names().iter().any(|s| s == sheet) {
            return Err(SourceError::SheetNotFound {
                path: path.to_path_buf(),
                sheet: sheet.to_string(),
            });
        }
        workbook.worksheet_range(sheet).map_err(|e| classify(path, e))
    }
}

impl TabularSource for CalamineSource {
    fn exists(&self, path: &Path) -> bool {
        check_exists(path).is_ok()
    }

    fn list_sheets(&self, path: &Path) -> Result<Vec<String>, SourceError> {
        check_exists(path)?;
        let workbook = open_workbook_auto(path).map_err(|e| classify(path, e))?;
        Ok(workbook.sheet_names().to_vec())
    }

    fn read_sheet(&self, path: &Path, sheet: &str, options: &ReadOptions) -> Result<Table, SourceError> {
        let range = self.open_range(path, sheet)?;
        Ok(range_to_table(&range, options))
    }

    fn read_header(&self, path: &Path, sheet: &str) -> Result<Vec<String>, SourceError> {
        let range = self.open_range(path, sheet)?;
        Ok(find_header(&range)
            .map(|(_, headers)| headers)
            .unwrap_or_default())
    }

    fn stat_file(&self, path: &Path) -> Result<FileStat, SourceError> {
        stat_local_file(path)
    }
}

/// Convert a sheet range into a [`Table`]. A range without a non-empty row yields an empty table.
fn range_to_table(range: &Range<Data>, options: &ReadOptions) -> Table {
    let Some((header_idx0, headers)) = find_header(range) else {
        return Table::default();
    };
    let first_sheet_row = range.start().map(|(row, _)| row as usize).unwrap_or(0);

    let mut rows: Vec<RawRow> = Vec::new();
    for (idx0, cells) in range.rows().enumerate() {
        if idx0 <= header_idx0 {
            continue;
        }
        if options.max_rows.is_some_and(|max| rows.len() >= max) {
            break;
        }

        // Report 1-based row number (Excel-like).
        let row_number = first_sheet_row + idx0 + 1;
        let values = headers
            .iter()
            .enumerate()
            .map(|(col, name)| {
                let cell = cells.get(col).unwrap_or(&Data::Empty);
                (name.clone(), convert_cell(cell))
            })
            .collect();
        let row = RawRow::new(row_number, values);
        if options.skip_blank_rows && row.is_blank() {
            continue;
        }
        rows.push(row);
    }

    Table::new(headers, rows)
}

fn find_header(range: &Range<Data>) -> Option<(usize, Vec<String>)> {
    range.rows().enumerate().find_map(|(idx0, row)| {
        let non_empty = row.iter().any(|c| !matches!(c, Data::Empty));
        non_empty.then(|| {
            let headers = row
                .iter()
                .enumerate()
                .map(|(col, c)| {
                    let name = convert_cell(c).to_string().trim().to_string();
                    if name.is_empty() {
                        format!("Unnamed: {col}")
                    } else {
                        name
                    }
                })
                .collect();
            (idx0, headers)
        })
    })
}

fn convert_cell(c: &Data) -> Value {
    match c {
        Data::Empty | Data::Error(_) => Value::Null,
        Data::Int(i) => Value::Int64(*i),
        Data::Float(f) => Value::Float64(*f),
        Data::Bool(b) => Value::Bool(*b),
        Data::String(s) => Value::Utf8(s.clone()),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(Value::DateTime)
            .unwrap_or(Value::Float64(dt.as_f64())),
        Data::DateTimeIso(s) => parse_iso_datetime(s)
            .map(Value::DateTime)
            .unwrap_or_else(|| Value::Utf8(s.clone())),
        Data::DurationIso(s) => Value::Utf8(s.clone()),
    }
}

fn parse_iso_datetime(s: &str) -> Option<NaiveDateTime> {
    s.parse::<NaiveDateTime>()
        .ok()
        .or_else(|| {
            s.parse::<NaiveDate>()
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// `NotFound` only when the path is known to be absent; a path that cannot be inspected (e.g. a
/// share the user may not traverse) keeps its I/O classification.
fn check_exists(path: &Path) -> Result<(), SourceError> {
    match path.try_exists() {
        Ok(true) => Ok(()),
        Ok(false) => Err(SourceError::NotFound {
            path: path.to_path_buf(),
        }),
        Err(e) => Err(SourceError::from_io(path, &e)),
    }
}

/// Map a calamine failure onto [`SourceError`], preferring any I/O cause in its chain.
fn classify(path: &Path, err: calamine::Error) -> SourceError {
    if let calamine::Error::Io(io) = &err {
        return SourceError::from_io(path, io);
    }
    let mut cur: Option<&(dyn StdError + 'static)> = err.source();
    while let Some(e) = cur {
        if let Some(io) = e.downcast_ref::<std::io::Error>() {
            return SourceError::from_io(path, io);
        }
        cur = e.source();
    }
    SourceError::Unreadable {
        path: path.to_path_buf(),
        message: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use calamine::Data;

    use super::{check_exists, convert_cell, parse_iso_datetime, CalamineSource};
    use crate::source::{SourceError, TabularSource};
    use crate::types::Value;

    #[test]
    fn missing_workbook_is_not_found() {
        let src = CalamineSource::new();
        let p = Path::new("definitely/not/here.xlsx");
        assert!(!src.exists(p));
        assert!(matches!(src.list_sheets(p), Err(SourceError::NotFound { .. })));
        assert!(matches!(
            src.read_header(p, "Sheet1"),
            Err(SourceError::NotFound { .. })
        ));
    }

    #[test]
    fn existence_check_classifies_paths() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("book.xlsx");
        std::fs::write(&file, b"x").unwrap();

        assert!(check_exists(&file).is_ok());
        assert!(matches!(
            check_exists(&dir.path().join("missing.xlsx")),
            Err(SourceError::NotFound { .. })
        ));
        // A regular file used as a directory cannot hold the workbook.
        assert!(matches!(
            check_exists(&file.join("inner.xlsx")),
            Err(SourceError::NotFound { .. })
        ));
    }

    #[test]
    fn cells_convert_to_values() {
        assert_eq!(convert_cell(&Data::Empty), Value::Null);
        assert_eq!(convert_cell(&Data::Int(3)), Value::Int64(3));
        assert_eq!(convert_cell(&Data::Float(2.5)), Value::Float64(2.5));
        assert_eq!(
            convert_cell(&Data::String("High".into())),
            Value::Utf8("High".into())
        );
        assert!(matches!(
            convert_cell(&Data::DateTimeIso("2025-01-01T08:30:00".into())),
            Value::DateTime(_)
        ));
    }

    #[test]
    fn iso_dates_parse_with_or_without_time() {
        assert!(parse_iso_datetime("2025-03-31").is_some());
        assert!(parse_iso_datetime("2025-03-31T12:00:00").is_some());
        assert!(parse_iso_datetime("next tuesday").is_none());
    }
}
