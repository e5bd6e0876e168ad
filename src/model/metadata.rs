use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::Serialize;

use super::{Issue, ValidationError};

/// Shape of one sheet: name, counts and headers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SheetMetadata {
    sheet_name: String,
    row_count: usize,
    column_count: usize,
    column_headers: Vec<String>,
}

impl SheetMetadata {
    /// Both counts must be strictly positive; each zero count is reported.
    pub fn new(
        sheet_name: impl Into<String>,
        row_count: usize,
        column_count: usize,
        column_headers: Vec<String>,
    ) -> Result<Self, ValidationError> {
        let mut issues = Vec::new();
        if row_count == 0 {
            issues.push(Issue::NonPositiveCount {
                field: "row_count",
                count: row_count,
            });
        }
        if column_count == 0 {
            issues.push(Issue::NonPositiveCount {
                field: "column_count",
                count: column_count,
            });
        }
        ValidationError::check(issues)?;
        Ok(Self {
            sheet_name: sheet_name.into(),
            row_count,
            column_count,
            column_headers,
        })
    }

    pub fn sheet_name(&self) -> &str {
        &self.sheet_name
    }

    /// Number of data rows (header excluded).
    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn column_count(&self) -> usize {
        self.column_count
    }

    pub fn column_headers(&self) -> &[String] {
        &self.column_headers
    }
}

/// Descriptive metadata of one workbook file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileMetadata {
    file_path: PathBuf,
    file_size: Option<u64>,
    last_modified: Option<DateTime<Local>>,
    sheets: Vec<SheetMetadata>,
}

impl FileMetadata {
    pub fn new(
        file_path: impl AsRef<Path>,
        file_size: Option<u64>,
        last_modified: Option<DateTime<Local>>,
        sheets: Vec<SheetMetadata>,
    ) -> Self {
        Self {
            file_path: file_path.as_ref().to_path_buf(),
            file_size,
            last_modified,
            sheets,
        }
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    /// Size in bytes, when the source could stat the file.
    pub fn file_size(&self) -> Option<u64> {
        self.file_size
    }

    pub fn last_modified(&self) -> Option<DateTime<Local>> {
        self.last_modified
    }

    /// One entry per sheet, in workbook order.
    pub fn sheets(&self) -> &[SheetMetadata] {
        &self.sheets
    }

    /// Find a sheet's metadata by name.
    pub fn sheet(&self, name: &str) -> Option<&SheetMetadata> {
        self.sheets.iter().find(|s| s.sheet_name == name)
    }
}
