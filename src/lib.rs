//! `funnel-extract` turns sales-funnel spreadsheets into a validated, aggregated in-memory
//! [`model::Dataset`].
//!
//! The primary entrypoint is [`extraction::Extractor`], bound to one workbook path. A call to
//! [`extraction::Extractor::extract_validated`] runs the whole pipeline:
//!
//! 1. **Extraction**: read one sheet through a [`source::TabularSource`] into a [`types::Table`]
//! 2. **Column mapping**: route source columns to entry fields or custom fields
//!    ([`mapping::ColumnMapping`])
//! 3. **Entry validation**: coerce and check every row on its own ([`validation`])
//! 4. **Aggregation**: collect valid entries into a [`model::Dataset`] with its `total_value`
//!
//! Either every row is valid and a dataset is returned, or the call fails with a single
//! [`ExtractionError::Validation`] listing every failed row by its spreadsheet row number.
//!
//! Alongside the pipeline:
//!
//! - [`extraction::Extractor::file_metadata`]: file size, modification time and sheet shapes
//! - [`discovery::scan_folder`]: list candidate workbooks in a folder
//! - [`diagnostics`]: the side channel every operation reports to (`tracing` by default)
//!
//! ## Quick example
//!
//! ```no_run
//! use funnel_extract::extraction::Extractor;
//!
//! # fn main() -> Result<(), funnel_extract::ExtractionError> {
//! funnel_extract::logging::init_logging("funnel_extract=info");
//!
//! let extractor = Extractor::open("FUNNEL with PROBABILITY TRACKING.xlsx");
//! for name in extractor.sheet_names()? {
//!     println!("sheet: {name}");
//! }
//! let dataset = extractor.extract_validated(None, None)?;
//! println!("entries={} total={}", dataset.len(), dataset.total_value());
//! # Ok(())
//! # }
//! ```
//!
//! ## Custom mappings
//!
//! A mapping routes a source column either to a fixed field or into the custom-fields bag:
//!
//! ```no_run
//! use funnel_extract::extraction::Extractor;
//! use funnel_extract::mapping::ColumnMapping;
//!
//! # fn main() -> Result<(), funnel_extract::ExtractionError> {
//! let mapping = ColumnMapping::from_json_str(
//!     r#"{
//!         "Company": "company_name",
//!         "Project": "project_name",
//!         "Value": "value",
//!         "Probability (%)": "custom_fields.probability_pct"
//!     }"#,
//! )?;
//! let dataset = Extractor::open("funnel.xlsx").extract_validated(Some("Sheet1"), Some(&mapping))?;
//! # let _ = dataset;
//! # Ok(())
//! # }
//! ```
//!
//! ## Without a workbook on disk
//!
//! [`source::memory::MemorySource`] holds sheets in memory and plugs into the same pipeline:
//!
//! ```
//! use funnel_extract::extraction::Extractor;
//! use funnel_extract::source::memory::MemorySource;
//!
//! let source = MemorySource::new().with_records(
//!     "funnel.xlsx",
//!     "Sheet1",
//!     &["Company", "Project", "Value"],
//!     vec![vec!["ABC Corp".into(), "Website Redesign".into(), 50000.0.into()]],
//! );
//! let dataset = Extractor::with_source("funnel.xlsx", source)
//!     .extract_validated(None, None)
//!     .unwrap();
//! assert_eq!(dataset.total_value(), 50000.0);
//! ```

pub mod diagnostics;
pub mod discovery;
pub mod error;
pub mod extraction;
pub mod logging;
pub mod mapping;
pub mod model;
pub mod source;
pub mod types;
pub mod validation;

pub use error::{ExtractionError, ExtractionResult};
