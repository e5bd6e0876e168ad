use std::path::PathBuf;

use thiserror::Error;

use crate::model::ValidationError;
use crate::source::SourceError;
use crate::validation::RowError;

/// Convenience result type for extraction operations.
pub type ExtractionResult<T> = Result<T, ExtractionError>;

/// Error type returned by extraction, metadata and discovery operations.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// The workbook file or scanned folder does not exist.
    #[error("not found: {}. Make sure the path is correct", .path.display())]
    NotFound { path: PathBuf },

    /// The workbook exists but has no sheet with this name.
    #[error("sheet '{sheet}' not found in {}", .path.display())]
    SheetNotFound { path: PathBuf, sheet: String },

    /// The resource exists but cannot be read (permissions, unreachable network share).
    #[error(
        "cannot access {}. Check your network/VPN connection and permissions, then try again",
        .path.display()
    )]
    PermissionDenied { path: PathBuf },

    /// Caller-supplied input is unusable (e.g. a scanned path that is not a directory).
    #[error("invalid input: {message}")]
    InvalidInput { message: String },

    /// Opaque failure from the tabular source, with the operation it interrupted.
    #[error("{context}: {source}")]
    Adapter {
        context: String,
        #[source]
        source: SourceError,
    },

    /// One or more rows failed validation; every failing row is listed.
    #[error("data validation errors: {}", join_rows(.errors))]
    Validation { errors: Vec<RowError> },

    /// Validation left no entries, so no dataset can be formed.
    #[error(
        "no valid entries extracted from {}{}",
        .source_file.display(),
        sheet_suffix(.sheet)
    )]
    EmptyDataset {
        source_file: PathBuf,
        sheet: Option<String>,
    },

    /// A sheet's shape does not form valid metadata (no data rows, no columns, ...).
    #[error("invalid metadata for sheet '{sheet}': {error}")]
    InvalidSheetMetadata {
        sheet: String,
        error: ValidationError,
    },

    /// Malformed discovery glob pattern.
    #[error("invalid pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    /// Malformed column mapping document.
    #[error("invalid column mapping: {0}")]
    MappingConfig(#[from] serde_json::Error),

    /// Underlying I/O error outside the tabular source (e.g. reading a mapping file).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ExtractionError {
    /// Lift a [`SourceError`] into the extraction taxonomy.
    ///
    /// Missing and unreadable resources keep their identity; anything else becomes
    /// [`ExtractionError::Adapter`] tagged with `context`.
    pub fn from_source(context: impl Into<String>, err: SourceError) -> Self {
        match err {
            SourceError::NotFound { path } => ExtractionError::NotFound { path },
            SourceError::SheetNotFound { path, sheet } => {
                ExtractionError::SheetNotFound { path, sheet }
            }
            SourceError::PermissionDenied { path } => ExtractionError::PermissionDenied { path },
            other => ExtractionError::Adapter {
                context: context.into(),
                source: other,
            },
        }
    }

    /// Row failures carried by a [`ExtractionError::Validation`] error.
    pub fn row_errors(&self) -> &[RowError] {
        match self {
            ExtractionError::Validation { errors } => errors,
            _ => &[],
        }
    }
}

fn join_rows(errors: &[RowError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

fn sheet_suffix(sheet: &Option<String>) -> String {
    sheet
        .as_deref()
        .map(|s| format!(" (sheet '{s}')"))
        .unwrap_or_default()
}
