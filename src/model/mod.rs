//! Validated domain model.
//!
//! Every type here is a value object that is checked once, on construction, and never mutated
//! afterwards:
//!
//! - [`Entry`] (with its [`Contact`]s and [`CustomFields`]): one funnel opportunity
//! - [`Dataset`]: the entries of one extraction call plus provenance and `total_value`
//! - [`SheetMetadata`] / [`FileMetadata`]: workbook shape, independent of validation
//!
//! Construction failures are reported as a [`ValidationError`] listing every [`Issue`] found.

mod dataset;
mod entry;
mod metadata;

use thiserror::Error;

pub use dataset::Dataset;
pub use entry::{Contact, CustomFields, Entry, EntryBuilder, Status};
pub use metadata::{FileMetadata, SheetMetadata};

/// A single broken field-level or cross-field invariant.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Issue {
    /// A required field was not provided.
    #[error("{field}: field required")]
    Missing { field: &'static str },

    /// A required text field is blank.
    #[error("{field}: must not be empty")]
    Empty { field: &'static str },

    /// A provided value could not be coerced to the field's type.
    #[error("{field}: expected {expected}, got {raw}")]
    InvalidType {
        field: &'static str,
        expected: &'static str,
        raw: String,
    },

    /// Status text outside the closed set of labels.
    #[error("status: '{0}' is not one of Low, Medium, High, Closed Won, Closed Lost")]
    InvalidStatus(String),

    #[error("probability: must be between 0 and 100 (got {0})")]
    ProbabilityOutOfRange(f64),

    #[error("contact email: invalid email format '{0}'")]
    InvalidEmail(String),

    /// Start date falls after the expected close date.
    #[error("start date {start} must not be after expected close date {close}")]
    DatesOutOfOrder { start: String, close: String },

    #[error("entries: at least one entry is required")]
    NoEntries,

    /// Row or column count of a sheet is zero.
    #[error("{field}: count must be positive (got {count})")]
    NonPositiveCount { field: &'static str, count: usize },

    /// Header row and full read disagree on the number of columns.
    #[error("column count {columns} does not match {headers} header(s)")]
    HeaderMismatch { headers: usize, columns: usize },
}

/// One or more [`Issue`]s found while constructing a model value.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{}", join_issues(.issues))]
pub struct ValidationError {
    /// Issues in check order; never empty.
    pub issues: Vec<Issue>,
}

impl ValidationError {
    /// Wrap a single issue.
    pub fn single(issue: Issue) -> Self {
        Self {
            issues: vec![issue],
        }
    }

    /// `Ok(())` if `issues` is empty, otherwise an error carrying all of them.
    pub fn check(issues: Vec<Issue>) -> Result<(), Self> {
        if issues.is_empty() {
            Ok(())
        } else {
            Err(Self { issues })
        }
    }

    /// Returns `true` if any issue matches `predicate`.
    pub fn has(&self, predicate: impl Fn(&Issue) -> bool) -> bool {
        self.issues.iter().any(predicate)
    }
}

impl From<Issue> for ValidationError {
    fn from(issue: Issue) -> Self {
        Self::single(issue)
    }
}

fn join_issues(issues: &[Issue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
