//! Raw tabular data as produced by a [`crate::source::TabularSource`].
//!
//! A sheet is read into a [`Table`]: an ordered list of header names plus one [`RawRow`] per
//! data row. Cells are loosely typed [`Value`]s; nothing here is validated yet.

use std::fmt;

use chrono::NaiveDateTime;
use serde::Serialize;

/// A single scalar cell value.
///
/// This is also the value type of an entry's custom-fields bag.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    /// Missing/empty cell.
    Null,
    /// Boolean.
    Bool(bool),
    /// 64-bit signed integer.
    Int64(i64),
    /// 64-bit float.
    Float64(f64),
    /// Date and time (no timezone, as stored in workbooks).
    DateTime(NaiveDateTime),
    /// UTF-8 string.
    Utf8(String),
}

impl Value {
    /// `true` for [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Numeric view of the value, if it is an integer or a float.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int64(i) => Some(*i as f64),
            Value::Float64(f) => Some(*f),
            _ => None,
        }
    }

    /// Short name of the variant, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int64(_) => "integer",
            Value::Float64(_) => "number",
            Value::DateTime(_) => "datetime",
            Value::Utf8(_) => "string",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str(""),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int64(i) => write!(f, "{i}"),
            Value::Float64(v) => {
                if v.fract() == 0.0 && v.abs() < 1e15 {
                    write!(f, "{}", *v as i64)
                } else {
                    write!(f, "{v}")
                }
            }
            Value::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
            Value::Utf8(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Utf8(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Utf8(s)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float64(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int64(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Value::DateTime(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

/// One data row: source column name → raw value, in sheet column order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RawRow {
    /// 1-based row number in the sheet (header row included in the count).
    pub row_number: usize,
    /// Cells keyed by column header.
    pub cells: Vec<(String, Value)>,
}

impl RawRow {
    /// Create a row from its sheet row number and cells.
    pub fn new(row_number: usize, cells: Vec<(String, Value)>) -> Self {
        Self { row_number, cells }
    }

    /// Returns the value of `column`, if the row has that column.
    ///
    /// If a header is duplicated, the last occurrence wins.
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.cells
            .iter()
            .rev()
            .find(|(name, _)| name == column)
            .map(|(_, v)| v)
    }

    /// `true` if every cell is [`Value::Null`] or blank text.
    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(|(_, v)| match v {
            Value::Null => true,
            Value::Utf8(s) => s.trim().is_empty(),
            _ => false,
        })
    }
}

/// The rows of one sheet.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Table {
    /// Column headers in sheet order.
    pub headers: Vec<String>,
    /// Data rows (header excluded).
    pub rows: Vec<RawRow>,
}

impl Table {
    /// Create a table from headers and rows.
    pub fn new(headers: Vec<String>, rows: Vec<RawRow>) -> Self {
        Self { headers, rows }
    }

    /// Build a table from positional records laid out under a header on sheet row 1.
    ///
    /// Record `i` becomes sheet row `i + 2`. Short records are padded with [`Value::Null`].
    pub fn from_records(headers: Vec<String>, records: Vec<Vec<Value>>) -> Self {
        let rows = records
            .into_iter()
            .enumerate()
            .map(|(idx0, mut values)| {
                values.resize(headers.len(), Value::Null);
                let cells = headers.iter().cloned().zip(values).collect();
                RawRow::new(idx0 + 2, cells)
            })
            .collect();
        Self { headers, rows }
    }

    /// Number of data rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns.
    pub fn column_count(&self) -> usize {
        self.headers.len()
    }
}
