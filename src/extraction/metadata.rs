//! Metadata collection: file facts plus the shape of every sheet.
//!
//! Independent of validation. Every sheet is read in full: rows are counted under the
//! extractor's blank-row setting, with no `max_rows` limit.

use std::path::Path;

use crate::diagnostics::{DiagnosticsSink, LogContext, Severity};
use crate::error::{ExtractionError, ExtractionResult};
use crate::model::{FileMetadata, Issue, SheetMetadata, ValidationError};
use crate::source::{ReadOptions, TabularSource};

/// Collect [`FileMetadata`] for the workbook at `path`.
///
/// A sheet with no data rows, no columns, or a header that disagrees with its column count
/// fails the whole call with [`ExtractionError::InvalidSheetMetadata`].
pub fn collect_file_metadata<S: TabularSource + ?Sized>(
    source: &S,
    path: &Path,
    skip_blank_rows: bool,
    sink: &dyn DiagnosticsSink,
    ctx: &LogContext,
) -> ExtractionResult<FileMetadata> {
    let read = ReadOptions {
        max_rows: None,
        skip_blank_rows,
    };
    let names = source
        .list_sheets(path)
        .map_err(|e| ExtractionError::from_source("reading sheet names", e))?;

    let mut sheets = Vec::with_capacity(names.len());
    for name in names {
        let sheet_ctx = ctx.with("sheet_name", &name);
        let sheet = describe_sheet(source, path, &name, &read)?;
        sink.log(
            Severity::Debug,
            &format!(
                "sheet has {} rows and {} columns",
                sheet.row_count(),
                sheet.column_count()
            ),
            &sheet_ctx,
        );
        sheets.push(sheet);
    }

    let stat = source
        .stat_file(path)
        .map_err(|e| ExtractionError::from_source("reading file metadata", e))?;

    Ok(FileMetadata::new(path, stat.size, stat.modified, sheets))
}

fn describe_sheet<S: TabularSource + ?Sized>(
    source: &S,
    path: &Path,
    name: &str,
    read: &ReadOptions,
) -> ExtractionResult<SheetMetadata> {
    let headers = source
        .read_header(path, name)
        .map_err(|e| ExtractionError::from_source("reading sheet header", e))?;
    let table = source
        .read_sheet(path, name, read)
        .map_err(|e| ExtractionError::from_source("reading sheet", e))?;

    let invalid = |error: ValidationError| ExtractionError::InvalidSheetMetadata {
        sheet: name.to_string(),
        error,
    };

    if !headers.is_empty() && headers.len() != table.column_count() {
        return Err(invalid(ValidationError::single(Issue::HeaderMismatch {
            headers: headers.len(),
            columns: table.column_count(),
        })));
    }

    SheetMetadata::new(name, table.row_count(), table.column_count(), headers).map_err(invalid)
}
