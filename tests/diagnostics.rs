use std::sync::{Arc, Mutex};

use funnel_extract::diagnostics::{
    CompositeSink, DiagnosticsSink, FileSink, LogContext, Severity,
};
use funnel_extract::extraction::{Extractor, ExtractorOptions};
use funnel_extract::source::memory::MemorySource;
use funnel_extract::types::Value;

#[derive(Default)]
struct RecordingSink {
    severities: Mutex<Vec<Severity>>,
}

impl DiagnosticsSink for RecordingSink {
    fn log(&self, severity: Severity, _message: &str, _context: &LogContext) {
        self.severities.lock().unwrap().push(severity);
    }
}

fn options(sink: Arc<dyn DiagnosticsSink>) -> ExtractorOptions {
    ExtractorOptions {
        sink,
        ..Default::default()
    }
}

#[test]
fn missing_workbook_is_reported_as_critical() {
    let sink = Arc::new(RecordingSink::default());
    let extractor =
        Extractor::with_source("tests/fixtures/does_not_exist.xlsx", MemorySource::new())
            .with_options(options(sink.clone()));

    let _ = extractor.extract_raw(None).unwrap_err();

    let severities = sink.severities.lock().unwrap().clone();
    assert_eq!(severities.last(), Some(&Severity::Critical));
    assert!(!severities.contains(&Severity::Warning));
}

#[test]
fn successful_extraction_logs_no_problems() {
    let source = MemorySource::new().with_records(
        "funnel.xlsx",
        "Sheet1",
        &["Company", "Project", "Value"],
        vec![vec!["ABC Corp".into(), "Website".into(), Value::Int64(5)]],
    );
    let sink = Arc::new(RecordingSink::default());
    let extractor = Extractor::with_source("funnel.xlsx", source).with_options(options(sink.clone()));

    extractor.extract_validated(None, None).unwrap();

    let severities = sink.severities.lock().unwrap();
    assert!(!severities.is_empty());
    assert!(severities.iter().all(|s| *s <= Severity::Info));
}

#[test]
fn file_and_recording_sinks_both_receive_row_failures() {
    let dir = tempfile::tempdir().unwrap();
    let log_path = dir.path().join("funnel_extractor.log");
    let recording = Arc::new(RecordingSink::default());
    let composite = CompositeSink::new(vec![
        recording.clone(),
        Arc::new(FileSink::new(&log_path, Severity::Warning)),
    ]);

    let source = MemorySource::new().with_records(
        "funnel.xlsx",
        "Sheet1",
        &["Company", "Project", "Value"],
        vec![
            vec!["ABC Corp".into(), "Website".into(), 1.0.into()],
            vec!["XYZ Ltd".into(), Value::Null, 2.0.into()],
        ],
    );
    let extractor =
        Extractor::with_source("funnel.xlsx", source).with_options(options(Arc::new(composite)));

    let _ = extractor.extract_validated(None, None).unwrap_err();

    let severities = recording.severities.lock().unwrap().clone();
    assert_eq!(
        severities.iter().filter(|s| **s == Severity::Warning).count(),
        1
    );

    let text = std::fs::read_to_string(&log_path).unwrap();
    let lines: Vec<_> = text.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].contains(" - WARNING - validation error: Row 3: project_name: field required"));
    assert!(lines[0].contains("row=3"));
    assert!(lines[1].contains(" - ERROR - found 1 validation errors"));
}
