use std::fmt::Write as _;

use chrono::{DateTime, SecondsFormat, Utc};

/// Name of the stored pseudo-entry summarizing failed files.
pub const REPORT_FILE_NAME: &str = "FAILED_FILES_REPORT.txt";

/// One file that could not be included in the archive.
#[derive(Debug, Clone)]
pub struct FailedFile {
    /// File name as it would have appeared in the archive, or `<unresolved>`
    /// when metadata lookup never produced a name.
    pub file_name: String,
    /// Where the failure came from: a storage backend kind, or `metadata`.
    pub source_kind: String,
    /// Storage key, URL, or id that was being fetched.
    pub source_key: String,
    /// Human-readable failure reason.
    pub reason: String,
    /// When the failure was recorded.
    pub failed_at: DateTime<Utc>,
}

impl FailedFile {
    pub fn new(
        file_name: impl Into<String>,
        source_kind: impl Into<String>,
        source_key: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            source_kind: source_kind.into(),
            source_key: source_key.into(),
            reason: reason.into(),
            failed_at: Utc::now(),
        }
    }
}

fn rfc3339(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Render the failure report as UTF-8 text.
///
/// Failures appear in the order they were recorded. The generation timestamp
/// is a parameter so the rest of the report stays deterministic for a given
/// failure list.
pub fn render_report(failures: &[FailedFile], generated_at: DateTime<Utc>) -> String {
    let mut report = String::new();
    report.push_str("DOWNLOAD FAILURE REPORT\n");
    report.push_str("======================\n\n");
    report.push_str(
        "The following files could not be included in this archive due to download failures:\n\n",
    );

    for (i, failed) in failures.iter().enumerate() {
        let _ = writeln!(report, "{}. File: {}", i + 1, failed.file_name);
        let _ = writeln!(report, "   Source: {}", failed.source_kind);
        let _ = writeln!(report, "   Path: {}", failed.source_key);
        let _ = writeln!(report, "   Error: {}", failed.reason);
        let _ = writeln!(report, "   Time: {}", rfc3339(failed.failed_at));
        report.push('\n');
    }

    let _ = writeln!(report, "Total failed files: {}", failures.len());
    let _ = writeln!(report, "Report generated: {}", rfc3339(generated_at));
    report
}
