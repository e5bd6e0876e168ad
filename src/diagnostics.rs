//! Diagnostics side channel.
//!
//! The extractor reports what it is doing to a [`DiagnosticsSink`]: a message, a [`Severity`]
//! and a [`LogContext`] (file path, sheet name, row, ...). Sinks are fire-and-forget; nothing
//! they do can change the outcome of an extraction call.
//!
//! - [`TracingSink`] (default): emits `tracing` events
//! - [`FileSink`]: appends lines to a local file
//! - [`CompositeSink`]: fans out to several sinks

use std::collections::BTreeMap;
use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::Local;

use crate::error::ExtractionError;

/// Severity of a diagnostics event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Debug,
    Info,
    /// Non-fatal problem (e.g. one row failed validation).
    Warning,
    /// Operation failed.
    Error,
    /// Infrastructure failure (file missing, access denied, I/O).
    Critical,
}

impl Severity {
    /// Severity used when reporting `error`.
    pub fn for_error(error: &ExtractionError) -> Self {
        match error {
            ExtractionError::NotFound { .. }
            | ExtractionError::PermissionDenied { .. }
            | ExtractionError::Io(_) => Severity::Critical,
            _ => Severity::Error,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Debug => "DEBUG",
            Severity::Info => "INFO",
            Severity::Warning => "WARNING",
            Severity::Error => "ERROR",
            Severity::Critical => "CRITICAL",
        };
        f.write_str(s)
    }
}

/// Key/value context attached to a diagnostics event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogContext {
    fields: BTreeMap<String, String>,
}

impl LogContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return a copy of this context with `key` set to `value`.
    pub fn with(&self, key: impl Into<String>, value: impl ToString) -> Self {
        let mut next = self.clone();
        next.fields.insert(key.into(), value.to_string());
        next
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl fmt::Display for LogContext {
    /// `key=value | key=value`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (k, v)) in self.fields.iter().enumerate() {
            if i > 0 {
                f.write_str(" | ")?;
            }
            write!(f, "{k}={v}")?;
        }
        Ok(())
    }
}

/// Receiver of diagnostics events.
///
/// Implementations must not panic and must swallow their own failures.
pub trait DiagnosticsSink: Send + Sync {
    fn log(&self, severity: Severity, message: &str, context: &LogContext);
}

/// Forwards events to `tracing`, with the context rendered into a `context` field.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticsSink for TracingSink {
    fn log(&self, severity: Severity, message: &str, context: &LogContext) {
        let context = context.to_string();
        match severity {
            Severity::Debug => tracing::debug!(target: "funnel_extract", %context, "{message}"),
            Severity::Info => tracing::info!(target: "funnel_extract", %context, "{message}"),
            Severity::Warning => tracing::warn!(target: "funnel_extract", %context, "{message}"),
            Severity::Error | Severity::Critical => {
                tracing::error!(target: "funnel_extract", %severity, %context, "{message}")
            }
        }
    }
}

/// An observer that fans out events to a list of sinks.
#[derive(Default)]
pub struct CompositeSink {
    sinks: Vec<Arc<dyn DiagnosticsSink>>,
}

impl CompositeSink {
    pub fn new(sinks: Vec<Arc<dyn DiagnosticsSink>>) -> Self {
        Self { sinks }
    }
}

impl fmt::Debug for CompositeSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeSink")
            .field("sinks_len", &self.sinks.len())
            .finish()
    }
}

impl DiagnosticsSink for CompositeSink {
    fn log(&self, severity: Severity, message: &str, context: &LogContext) {
        for s in &self.sinks {
            s.log(severity, message, context);
        }
    }
}

/// Appends events to a local log file, one line each.
#[derive(Debug)]
pub struct FileSink {
    path: PathBuf,
    min_severity: Severity,
    lock: Mutex<()>,
}

impl FileSink {
    /// Create a file sink that appends events at or above `min_severity` to `path`.
    ///
    /// Writes are best-effort; failures to open/write the log file are ignored.
    pub fn new(path: impl AsRef<Path>, min_severity: Severity) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            min_severity,
            lock: Mutex::new(()),
        }
    }

    fn append_line(&self, line: &str) {
        let _guard = self.lock.lock().ok();
        if let Ok(mut f) = OpenOptions::new().create(true).append(true).open(&self.path) {
            let _ = writeln!(f, "{line}");
        }
    }
}

impl DiagnosticsSink for FileSink {
    fn log(&self, severity: Severity, message: &str, context: &LogContext) {
        if severity < self.min_severity {
            return;
        }
        let ts = Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
        if context.is_empty() {
            self.append_line(&format!("{ts} - {severity} - {message}"));
        } else {
            self.append_line(&format!("{ts} - {severity} - {message} [Context: {context}]"));
        }
    }
}
