//! The extraction pipeline.
//!
//! [`Extractor`] is bound to one workbook path and a [`TabularSource`]. It exposes the public
//! operations of the crate:
//!
//! - [`Extractor::extract_raw`]: rows of one sheet, unvalidated
//! - [`Extractor::sheet_names`]: sheet names in workbook order
//! - [`Extractor::file_metadata`]: file and per-sheet shape, see [`metadata`]
//! - [`Extractor::extract_validated`]: map → validate → aggregate into a [`Dataset`]
//! - [`Extractor::scan_folder`]: [`crate::discovery::scan_folder`] with diagnostics
//!
//! Each call is independent: the extractor holds its configuration only, so it can be invoked
//! repeatedly and shared by reference.

pub mod metadata;

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Local;

use crate::diagnostics::{DiagnosticsSink, LogContext, Severity, TracingSink};
use crate::discovery;
use crate::error::{ExtractionError, ExtractionResult};
use crate::mapping::{map_row, ColumnMapping, MappedRow};
use crate::model::{Dataset, FileMetadata};
use crate::source::{ReadOptions, TabularSource};
use crate::types::Table;
use crate::validation::validate_rows;

#[cfg(feature = "excel")]
use crate::source::excel::CalamineSource;

/// Options controlling extraction behavior.
///
/// Use [`Default`] for common cases.
#[derive(Clone)]
pub struct ExtractorOptions {
    /// Receiver of diagnostics events.
    pub sink: Arc<dyn DiagnosticsSink>,
    /// How sheets are read.
    pub read: ReadOptions,
    /// Mapping used when [`Extractor::extract_validated`] is called without one.
    pub mapping: ColumnMapping,
}

impl fmt::Debug for ExtractorOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractorOptions")
            .field("read", &self.read)
            .field("mapping_len", &self.mapping.len())
            .finish_non_exhaustive()
    }
}

impl Default for ExtractorOptions {
    fn default() -> Self {
        Self {
            sink: Arc::new(TracingSink),
            read: ReadOptions::default(),
            mapping: ColumnMapping::default(),
        }
    }
}

/// Extracts funnel data from one workbook.
///
/// ```no_run
/// use funnel_extract::extraction::Extractor;
///
/// # fn main() -> Result<(), funnel_extract::ExtractionError> {
/// let extractor = Extractor::open("FUNNEL with PROBABILITY TRACKING.xlsx");
/// let dataset = extractor.extract_validated(Some("Sheet1"), None)?;
/// println!("{} entries, total {}", dataset.len(), dataset.total_value());
/// # Ok(())
/// # }
/// ```
pub struct Extractor<S> {
    path: PathBuf,
    source: S,
    options: ExtractorOptions,
}

impl<S> fmt::Debug for Extractor<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Extractor")
            .field("path", &self.path)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

#[cfg(feature = "excel")]
impl Extractor<CalamineSource> {
    /// Extractor over a workbook file on disk. Nothing is read until an operation is called.
    pub fn open(path: impl AsRef<Path>) -> Self {
        Self::with_source(path, CalamineSource::new())
    }
}

impl<S: TabularSource> Extractor<S> {
    /// Extractor reading `path` through `source`.
    pub fn with_source(path: impl AsRef<Path>, source: S) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            source,
            options: ExtractorOptions::default(),
        }
    }

    /// Replace the options.
    pub fn with_options(mut self, options: ExtractorOptions) -> Self {
        self.options = options;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn options(&self) -> &ExtractorOptions {
        &self.options
    }

    /// Sheet names in workbook order.
    pub fn sheet_names(&self) -> ExtractionResult<Vec<String>> {
        let ctx = self.context();
        self.log(Severity::Info, "getting sheet names", &ctx);

        let names = self.list_sheets(&ctx)?;
        self.log(Severity::Info, &format!("found {} sheets", names.len()), &ctx);
        Ok(names)
    }

    /// Read one sheet (the first one if `sheet` is `None`) without validation.
    pub fn extract_raw(&self, sheet: Option<&str>) -> ExtractionResult<Table> {
        let ctx = self.context_for(sheet);
        self.log(Severity::Info, "extracting data", &ctx);

        let (_, table) = self.read_table(sheet, &ctx)?;
        self.log(
            Severity::Info,
            &format!(
                "extracted data with shape ({}, {})",
                table.row_count(),
                table.column_count()
            ),
            &ctx,
        );
        Ok(table)
    }

    /// Extract one sheet, map its columns, validate every row and aggregate the result.
    ///
    /// `mapping = None` uses [`ExtractorOptions::mapping`].
    ///
    /// All rows are validated before deciding: if any row fails, the call fails with
    /// [`ExtractionError::Validation`] listing every failed row (by spreadsheet row number),
    /// and no dataset is returned. If no row yields an entry, the call fails with
    /// [`ExtractionError::EmptyDataset`].
    pub fn extract_validated(
        &self,
        sheet: Option<&str>,
        mapping: Option<&ColumnMapping>,
    ) -> ExtractionResult<Dataset> {
        let ctx = self.context_for(sheet);
        self.log(Severity::Info, "extracting and validating data", &ctx);

        let mapping = match mapping {
            Some(m) => {
                self.log(Severity::Info, "using custom column mapping", &ctx);
                m
            }
            None => {
                self.log(Severity::Info, "using default column mapping", &ctx);
                &self.options.mapping
            }
        };

        let (sheet_name, table) = self.read_table(sheet, &ctx)?;
        let ctx = ctx.with("sheet_name", &sheet_name);
        self.log(
            Severity::Info,
            &format!("extracted {} rows of raw data", table.row_count()),
            &ctx,
        );
        self.log(
            Severity::Info,
            &format!(
                "mapped columns: {}",
                mapping.matched_columns(&table.headers).join(", ")
            ),
            &ctx,
        );

        let mapped: Vec<MappedRow> = table.rows.iter().map(|r| map_row(r, mapping)).collect();
        let outcome = validate_rows(&mapped);

        for err in &outcome.errors {
            self.log(
                Severity::Warning,
                &format!("validation error: {err}"),
                &ctx.with("row", err.row),
            );
        }
        if !outcome.is_clean() {
            self.log(
                Severity::Error,
                &format!("found {} validation errors", outcome.errors.len()),
                &ctx,
            );
            return Err(ExtractionError::Validation {
                errors: outcome.errors,
            });
        }

        let dataset = Dataset::new(outcome.entries, Local::now(), &self.path, Some(sheet_name.clone()))
            .map_err(|_| {
                self.fail(
                    &ctx,
                    ExtractionError::EmptyDataset {
                        source_file: self.path.clone(),
                        sheet: Some(sheet_name),
                    },
                )
            })?;

        self.log(
            Severity::Info,
            &format!(
                "validated {} entries with total value {}",
                dataset.len(),
                dataset.total_value()
            ),
            &ctx,
        );
        Ok(dataset)
    }

    /// File size, modification time and the shape of every sheet.
    pub fn file_metadata(&self) -> ExtractionResult<FileMetadata> {
        let ctx = self.context();
        self.log(Severity::Info, "getting file metadata", &ctx);

        let result = metadata::collect_file_metadata(
            &self.source,
            &self.path,
            self.options.read.skip_blank_rows,
            self.options.sink.as_ref(),
            &ctx,
        );
        let meta = result.map_err(|e| self.fail(&ctx, e))?;
        self.log(
            Severity::Info,
            &format!(
                "gathered metadata for {} sheets ({} bytes)",
                meta.sheets().len(),
                meta.file_size()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "unknown".to_string())
            ),
            &ctx,
        );
        Ok(meta)
    }

    /// List workbook candidates in `folder`; see [`crate::discovery::scan_folder`].
    pub fn scan_folder(&self, folder: impl AsRef<Path>, pattern: Option<&str>) -> ExtractionResult<Vec<PathBuf>> {
        let folder = folder.as_ref();
        let ctx = self
            .context()
            .with("folder_path", folder.display())
            .with("pattern", pattern.unwrap_or("<workbook extensions>"));
        self.log(Severity::Info, "scanning folder for workbook files", &ctx);

        let found = discovery::scan_folder(folder, pattern).map_err(|e| self.fail(&ctx, e))?;
        self.log(Severity::Info, &format!("found {} files", found.len()), &ctx);
        for path in &found {
            self.log(Severity::Debug, &format!("found file: {}", path.display()), &ctx);
        }
        Ok(found)
    }

    fn list_sheets(&self, ctx: &LogContext) -> ExtractionResult<Vec<String>> {
        self.source
            .list_sheets(&self.path)
            .map_err(|e| self.fail(ctx, ExtractionError::from_source("reading sheet names", e)))
    }

    /// Resolve the sheet (first one when `None`) and read it.
    fn read_table(&self, sheet: Option<&str>, ctx: &LogContext) -> ExtractionResult<(String, Table)> {
        let sheet_name = match sheet {
            Some(s) => s.to_string(),
            None => self.list_sheets(ctx)?.into_iter().next().ok_or_else(|| {
                self.fail(
                    ctx,
                    ExtractionError::InvalidInput {
                        message: format!("workbook has no sheets: {}", self.path.display()),
                    },
                )
            })?,
        };

        let table = self
            .source
            .read_sheet(&self.path, &sheet_name, &self.options.read)
            .map_err(|e| self.fail(ctx, ExtractionError::from_source("reading sheet", e)))?;
        Ok((sheet_name, table))
    }

    fn context(&self) -> LogContext {
        LogContext::new().with("file_path", self.path.display())
    }

    fn context_for(&self, sheet: Option<&str>) -> LogContext {
        match sheet {
            Some(s) => self.context().with("sheet_name", s),
            None => self.context(),
        }
    }

    fn log(&self, severity: Severity, message: &str, ctx: &LogContext) {
        self.options.sink.log(severity, message, ctx);
    }

    /// Log `err` at its severity and hand it back for propagation.
    fn fail(&self, ctx: &LogContext, err: ExtractionError) -> ExtractionError {
        self.log(Severity::for_error(&err), &err.to_string(), ctx);
        err
    }
}
