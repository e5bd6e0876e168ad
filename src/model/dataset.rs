use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::Serialize;

use super::{Entry, Issue, ValidationError};

/// The validated result of one extraction call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dataset {
    entries: Vec<Entry>,
    extracted_at: DateTime<Local>,
    source_file: PathBuf,
    sheet_name: Option<String>,
    total_value: f64,
}

impl Dataset {
    /// Assemble a dataset from a finished list of entries.
    ///
    /// Fails with [`Issue::NoEntries`] if `entries` is empty. `total_value` is the sum of all
    /// entry values, accumulated in entry order.
    pub fn new(
        entries: Vec<Entry>,
        extracted_at: DateTime<Local>,
        source_file: impl AsRef<Path>,
        sheet_name: Option<String>,
    ) -> Result<Self, ValidationError> {
        if entries.is_empty() {
            return Err(Issue::NoEntries.into());
        }
        let total_value = entries.iter().fold(0.0, |acc, e| acc + e.value());
        Ok(Self {
            entries,
            extracted_at,
            source_file: source_file.as_ref().to_path_buf(),
            sheet_name,
            total_value,
        })
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Consume the dataset, keeping only its entries.
    pub fn into_entries(self) -> Vec<Entry> {
        self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` if the dataset holds no entries, which [`Dataset::new`] never allows.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn extracted_at(&self) -> DateTime<Local> {
        self.extracted_at
    }

    pub fn source_file(&self) -> &Path {
        &self.source_file
    }

    pub fn sheet_name(&self) -> Option<&str> {
        self.sheet_name.as_deref()
    }

    pub fn total_value(&self) -> f64 {
        self.total_value
    }
}
