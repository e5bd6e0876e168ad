//! Tabular source adapters.
//!
//! The pipeline never opens workbooks itself; it goes through the narrow [`TabularSource`]
//! interface:
//!
//! - [`excel::CalamineSource`] (Cargo feature `excel`): `.xlsx`, `.xlsm`, `.xlsb`, `.xls`, `.ods`
//!   via `calamine`
//! - [`memory::MemorySource`]: workbooks held in memory
//!
//! Adapters report failures as [`SourceError`]; the extractor lifts them into
//! [`crate::error::ExtractionError`] with call context.

#[cfg(feature = "excel")]
pub mod excel;
pub mod memory;

use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use thiserror::Error;

use crate::types::Table;

/// Workbook file extensions recognised as spreadsheets (lowercase).
pub const WORKBOOK_EXTENSIONS: [&str; 5] = ["xlsx", "xlsm", "xlsb", "xls", "ods"];

/// Returns `true` if `path` has a workbook extension (case-insensitive).
pub fn is_workbook_path(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| {
            let e = e.to_ascii_lowercase();
            WORKBOOK_EXTENSIONS.contains(&e.as_str())
        })
        .unwrap_or(false)
}

/// Failure reported by a [`TabularSource`].
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("file not found: {}", .path.display())]
    NotFound { path: PathBuf },

    #[error("sheet '{sheet}' not found in {}", .path.display())]
    SheetNotFound { path: PathBuf, sheet: String },

    #[error("permission denied: {}", .path.display())]
    PermissionDenied { path: PathBuf },

    /// The resource exists but could not be parsed or read.
    #[error("cannot read {}: {message}", .path.display())]
    Unreadable { path: PathBuf, message: String },
}

impl SourceError {
    /// Classify an I/O error raised while touching `path`.
    pub fn from_io(path: &Path, err: &io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound | io::ErrorKind::NotADirectory => SourceError::NotFound {
                path: path.to_path_buf(),
            },
            io::ErrorKind::PermissionDenied => SourceError::PermissionDenied {
                path: path.to_path_buf(),
            },
            _ => SourceError::Unreadable {
                path: path.to_path_buf(),
                message: err.to_string(),
            },
        }
    }
}

/// Options for [`TabularSource::read_sheet`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadOptions {
    /// Stop after this many data rows.
    pub max_rows: Option<usize>,
    /// Leave out rows whose cells are all empty.
    pub skip_blank_rows: bool,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            max_rows: None,
            skip_blank_rows: true,
        }
    }
}

/// File system facts about a workbook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FileStat {
    /// Size in bytes.
    pub size: Option<u64>,
    /// Last modification time.
    pub modified: Option<DateTime<Local>>,
}

/// Read-only access to workbook-like resources.
///
/// Implementations must be safe to call repeatedly; the pipeline keeps no state between calls.
pub trait TabularSource {
    /// Returns `true` if `path` names an existing, inspectable resource.
    ///
    /// Informational only: the read operations report a missing or inaccessible resource
    /// themselves, with the precise [`SourceError`].
    fn exists(&self, path: &Path) -> bool;

    /// Sheet names in workbook order.
    fn list_sheets(&self, path: &Path) -> Result<Vec<String>, SourceError>;

    /// Read a sheet into a [`Table`]. The first non-empty row is the header.
    fn read_sheet(&self, path: &Path, sheet: &str, options: &ReadOptions) -> Result<Table, SourceError>;

    /// Read only the header of a sheet. Empty for a sheet without any non-empty row.
    fn read_header(&self, path: &Path, sheet: &str) -> Result<Vec<String>, SourceError>;

    /// Size and modification time of `path`.
    fn stat_file(&self, path: &Path) -> Result<FileStat, SourceError>;
}

impl<S: TabularSource + ?Sized> TabularSource for &S {
    fn exists(&self, path: &Path) -> bool {
        (**self).exists(path)
    }

    fn list_sheets(&self, path: &Path) -> Result<Vec<String>, SourceError> {
        (**self).list_sheets(path)
    }

    fn read_sheet(&self, path: &Path, sheet: &str, options: &ReadOptions) -> Result<Table, SourceError> {
        (**self).read_sheet(path, sheet, options)
    }

    fn read_header(&self, path: &Path, sheet: &str) -> Result<Vec<String>, SourceError> {
        (**self).read_header(path, sheet)
    }

    fn stat_file(&self, path: &Path) -> Result<FileStat, SourceError> {
        (**self).stat_file(path)
    }
}

/// Stat a path on the local file system.
pub(crate) fn stat_local_file(path: &Path) -> Result<FileStat, SourceError> {
    let meta = std::fs::metadata(path).map_err(|e| SourceError::from_io(path, &e))?;
    Ok(FileStat {
        size: Some(meta.len()),
        modified: meta.modified().ok().map(DateTime::<Local>::from),
    })
}
