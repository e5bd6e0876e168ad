//! Column mapping: renames/routes raw sheet columns onto entry fields.
//!
//! A [`ColumnMapping`] maps a source column name to a [`MappingTarget`], which is either a fixed
//! [`EntryField`] or a named slot in the entry's custom-fields bag. Targets can be written as
//! plain field names (`"company_name"`) or as dotted custom paths (`"custom_fields.status_text"`).
//!
//! [`map_row`] applies a mapping to one [`RawRow`]. It never validates: unmapped source columns
//! are dropped and unmapped targets are simply absent from the resulting [`MappedRow`].

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::error::{ExtractionError, ExtractionResult};
use crate::types::{RawRow, Value};

/// Prefix of dotted targets routed into the custom-fields bag.
pub const CUSTOM_FIELDS_PREFIX: &str = "custom_fields.";

/// Fixed fields of an [`crate::model::Entry`] that a column can be mapped onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EntryField {
    Id,
    CompanyName,
    ProjectName,
    Value,
    Probability,
    Status,
    StartDate,
    ExpectedCloseDate,
    Notes,
    LastUpdated,
}

impl EntryField {
    /// All mappable fields.
    pub const ALL: [EntryField; 10] = [
        EntryField::Id,
        EntryField::CompanyName,
        EntryField::ProjectName,
        EntryField::Value,
        EntryField::Probability,
        EntryField::Status,
        EntryField::StartDate,
        EntryField::ExpectedCloseDate,
        EntryField::Notes,
        EntryField::LastUpdated,
    ];

    /// The field name used in mapping tables and error messages.
    pub fn name(self) -> &'static str {
        match self {
            EntryField::Id => "id",
            EntryField::CompanyName => "company_name",
            EntryField::ProjectName => "project_name",
            EntryField::Value => "value",
            EntryField::Probability => "probability",
            EntryField::Status => "status",
            EntryField::StartDate => "start_date",
            EntryField::ExpectedCloseDate => "expected_close_date",
            EntryField::Notes => "notes",
            EntryField::LastUpdated => "last_updated",
        }
    }

    /// Parse a field name (exact match).
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.name() == name)
    }
}

impl fmt::Display for EntryField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Where a mapped column's value goes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MappingTarget {
    /// A fixed entry field.
    Field(EntryField),
    /// A key in the entry's custom-fields bag.
    Custom(String),
}

impl FromStr for MappingTarget {
    type Err = ExtractionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(name) = s.strip_prefix(CUSTOM_FIELDS_PREFIX) {
            if name.is_empty() {
                return Err(ExtractionError::InvalidInput {
                    message: format!("mapping target '{s}' has an empty custom field name"),
                });
            }
            return Ok(MappingTarget::Custom(name.to_string()));
        }
        EntryField::from_name(s)
            .map(MappingTarget::Field)
            .ok_or_else(|| ExtractionError::InvalidInput {
                message: format!(
                    "unknown mapping target '{s}' (expected one of {} or '{CUSTOM_FIELDS_PREFIX}<name>')",
                    EntryField::ALL.map(EntryField::name).join(", ")
                ),
            })
    }
}

impl fmt::Display for MappingTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MappingTarget::Field(field) => write!(f, "{field}"),
            MappingTarget::Custom(name) => write!(f, "{CUSTOM_FIELDS_PREFIX}{name}"),
        }
    }
}

/// Source column → [`MappingTarget`] table.
///
/// When two source columns target the same field, the one added later wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMapping {
    entries: Vec<(String, MappingTarget)>,
}

impl Default for ColumnMapping {
    /// The built-in table for the funnel workbook layout.
    fn default() -> Self {
        let mut mapping = Self::empty();
        for (column, field) in [
            ("Company", EntryField::CompanyName),
            ("Project", EntryField::ProjectName),
            ("Value", EntryField::Value),
            ("Probability (%)", EntryField::Probability),
            ("Status", EntryField::Status),
            ("Start Date", EntryField::StartDate),
            ("Expected Close", EntryField::ExpectedCloseDate),
            ("Notes", EntryField::Notes),
            ("Last Updated", EntryField::LastUpdated),
        ] {
            mapping = mapping.with(column, MappingTarget::Field(field));
        }
        mapping
    }
}

impl ColumnMapping {
    /// A mapping with no columns.
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Add (or replace) the target of `source`.
    pub fn with(mut self, source: impl Into<String>, target: MappingTarget) -> Self {
        let source = source.into();
        self.entries.retain(|(s, _)| *s != source);
        self.entries.push((source, target));
        self
    }

    /// Build from `(source column, target path)` pairs, parsing each target path.
    pub fn from_pairs<I, S, T>(pairs: I) -> ExtractionResult<Self>
    where
        I: IntoIterator<Item = (S, T)>,
        S: Into<String>,
        T: AsRef<str>,
    {
        let mut mapping = Self::empty();
        for (source, target) in pairs {
            mapping = mapping.with(source, target.as_ref().parse()?);
        }
        Ok(mapping)
    }

    /// Parse a JSON object of `"source column": "target path"` pairs.
    pub fn from_json_str(json: &str) -> ExtractionResult<Self> {
        let pairs: BTreeMap<String, String> = serde_json::from_str(json)?;
        Self::from_pairs(pairs)
    }

    /// Read a JSON mapping file (see [`Self::from_json_str`]).
    pub fn from_json_path(path: impl AsRef<Path>) -> ExtractionResult<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Iterate `(source column, target)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &MappingTarget)> {
        self.entries.iter().map(|(s, t)| (s.as_str(), t))
    }

    /// Target of a source column, if mapped.
    pub fn target(&self, source: &str) -> Option<&MappingTarget> {
        self.entries
            .iter()
            .find(|(s, _)| s == source)
            .map(|(_, t)| t)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Mapped source columns that are present in `headers`, in mapping order.
    pub fn matched_columns<'a>(&'a self, headers: &[String]) -> Vec<&'a str> {
        self.entries
            .iter()
            .filter(|(s, _)| headers.iter().any(|h| h == s))
            .map(|(s, _)| s.as_str())
            .collect()
    }
}

/// A row keyed by target field instead of source column.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MappedRow {
    /// 1-based sheet row number of the source row.
    pub row_number: usize,
    /// Values routed to fixed entry fields.
    pub fields: BTreeMap<EntryField, Value>,
    /// Values routed to the custom-fields bag.
    pub custom: BTreeMap<String, Value>,
}

impl MappedRow {
    pub fn field(&self, field: EntryField) -> Option<&Value> {
        self.fields.get(&field)
    }
}

/// Route the cells of `row` through `mapping`.
///
/// Cells are copied verbatim (nulls included); source columns without a mapping are dropped.
pub fn map_row(row: &RawRow, mapping: &ColumnMapping) -> MappedRow {
    let mut out = MappedRow {
        row_number: row.row_number,
        ..MappedRow::default()
    };
    for (source, target) in mapping.iter() {
        let Some(value) = row.get(source) else {
            continue;
        };
        match target {
            MappingTarget::Field(field) => {
                out.fields.insert(*field, value.clone());
            }
            MappingTarget::Custom(name) => {
                out.custom.insert(name.clone(), value.clone());
            }
        }
    }
    out
}
