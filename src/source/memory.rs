//! In-memory [`TabularSource`].
//!
//! Useful for callers that already hold rows (e.g. fetched from another system) and for tests
//! that exercise the pipeline without a workbook on disk.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use super::{FileStat, ReadOptions, SourceError, TabularSource};
use crate::types::{RawRow, Table, Value};

#[derive(Debug, Clone, Default)]
struct MemoryWorkbook {
    sheets: Vec<(String, Table)>,
    stat: FileStat,
    locked: bool,
}

/// A set of named workbooks, each a list of sheets.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    workbooks: BTreeMap<PathBuf, MemoryWorkbook>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a sheet to the workbook at `path` (creating the workbook if needed).
    ///
    /// Adding a sheet name twice replaces the earlier table.
    pub fn with_sheet(mut self, path: impl AsRef<Path>, sheet: impl Into<String>, table: Table) -> Self {
        let wb = self.workbooks.entry(path.as_ref().to_path_buf()).or_default();
        let sheet = sheet.into();
        match wb.sheets.iter_mut().find(|(name, _)| *name == sheet) {
            Some((_, existing)) => *existing = table,
            None => wb.sheets.push((sheet, table)),
        }
        self
    }

    /// Convenience for [`Self::with_sheet`] with positional records under a header row.
    pub fn with_records(
        self,
        path: impl AsRef<Path>,
        sheet: impl Into<String>,
        headers: &[&str],
        records: Vec<Vec<Value>>,
    ) -> Self {
        let headers = headers.iter().map(|h| h.to_string()).collect();
        self.with_sheet(path, sheet, Table::from_records(headers, records))
    }

    /// Set the file facts reported by [`TabularSource::stat_file`].
    pub fn with_stat(mut self, path: impl AsRef<Path>, stat: FileStat) -> Self {
        self.workbooks
            .entry(path.as_ref().to_path_buf())
            .or_default()
            .stat = stat;
        self
    }

    /// Make every read of `path` fail with [`SourceError::PermissionDenied`].
    pub fn deny_access(mut self, path: impl AsRef<Path>) -> Self {
        self.workbooks
            .entry(path.as_ref().to_path_buf())
            .or_default()
            .locked = true;
        self
    }

    fn workbook(&self, path: &Path) -> Result<&MemoryWorkbook, SourceError> {
        let wb = self.workbooks.get(path).ok_or_else(|| SourceError::NotFound {
            path: path.to_path_buf(),
        })?;
        if wb.locked {
            return Err(SourceError::PermissionDenied {
                path: path.to_path_buf(),
            });
        }
        Ok(wb)
    }

    fn table(&self, path: &Path, sheet: &str) -> Result<&Table, SourceError> {
        self.workbook(path)?
            .sheets
            .iter()
            .find(|(name, _)| name == sheet)
            .map(|(_, t)| t)
            .ok_or_else(|| SourceError::SheetNotFound {
                path: path.to_path_buf(),
                sheet: sheet.to_string(),
            })
    }
}

impl TabularSource for MemorySource {
    fn exists(&self, path: &Path) -> bool {
        self.workbooks.contains_key(path)
    }

    fn list_sheets(&self, path: &Path) -> Result<Vec<String>, SourceError> {
        Ok(self
            .workbook(path)?
            .sheets
            .iter()
            .map(|(name, _)| name.clone())
            .collect())
    }

    fn read_sheet(&self, path: &Path, sheet: &str, options: &ReadOptions) -> Result<Table, SourceError> {
        let table = self.table(path, sheet)?;
        let rows: Vec<RawRow> = table
            .rows
            .iter()
            .filter(|r| !(options.skip_blank_rows && r.is_blank()))
            .take(options.max_rows.unwrap_or(usize::MAX))
            .cloned()
            .collect();
        Ok(Table::new(table.headers.clone(), rows))
    }

    fn read_header(&self, path: &Path, sheet: &str) -> Result<Vec<String>, SourceError> {
        Ok(self.table(path, sheet)?.headers.clone())
    }

    fn stat_file(&self, path: &Path) -> Result<FileStat, SourceError> {
        Ok(self.workbook(path)?.stat)
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::MemorySource;
    use crate::source::{ReadOptions, SourceError, TabularSource};
    use crate::types::Value;

    fn source() -> MemorySource {
        MemorySource::new()
            .with_records(
                "book.xlsx",
                "Sheet1",
                &["a", "b"],
                vec![
                    vec![Value::Int64(1), Value::from("x")],
                    vec![Value::Null, Value::Null],
                    vec![Value::Int64(3), Value::from("z")],
                ],
            )
            .with_records("book.xlsx", "Second", &["c"], vec![])
    }

    #[test]
    fn lists_sheets_in_insertion_order() {
        let src = source();
        assert_eq!(
            src.list_sheets(Path::new("book.xlsx")).unwrap(),
            vec!["Sheet1".to_string(), "Second".to_string()]
        );
    }

    #[test]
    fn read_options_skip_blank_and_limit_rows() {
        let src = source();
        let p = Path::new("book.xlsx");
        let all = src.read_sheet(p, "Sheet1", &ReadOptions::default()).unwrap();
        assert_eq!(all.row_count(), 2);
        assert_eq!(all.rows[1].row_number, 4);

        let keep_blank = ReadOptions {
            skip_blank_rows: false,
            max_rows: Some(2),
        };
        let limited = src.read_sheet(p, "Sheet1", &keep_blank).unwrap();
        assert_eq!(limited.row_count(), 2);
        assert!(limited.rows[1].is_blank());
    }

    #[test]
    fn missing_resources_are_reported() {
        let src = source().deny_access("locked.xlsx");
        assert!(matches!(
            src.list_sheets(Path::new("nope.xlsx")),
            Err(SourceError::NotFound { .. })
        ));
        assert!(matches!(
            src.read_header(Path::new("book.xlsx"), "Nope"),
            Err(SourceError::SheetNotFound { .. })
        ));
        assert!(matches!(
            src.list_sheets(Path::new("locked.xlsx")),
            Err(SourceError::PermissionDenied { .. })
        ));
        assert!(src.exists(Path::new("locked.xlsx")));
    }
}
