use crate::error::{FailureScope, ProcessingError};
use crate::storage::{AggregationScope, Resolution};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// A file or archive that was abandoned, and why.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedUnit {
    pub path: PathBuf,
    pub scope: FailureScope,
    pub error: String,
}

/// What happened to one station file that made it to commit.
#[derive(Debug, Clone, PartialEq)]
pub struct FileOutcome {
    pub path: PathBuf,
    pub station_id: i64,
    pub station_created: bool,
    pub rows_inserted: u64,
    pub rows_rejected: u64,
}

impl FileOutcome {
    pub fn new(path: &Path, resolution: Resolution) -> Self {
        Self {
            path: path.to_path_buf(),
            station_id: resolution.id,
            station_created: resolution.created,
            rows_inserted: 0,
            rows_rejected: 0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IngestReport {
    pub archives_processed: usize,
    pub archives_failed: usize,
    pub files_ingested: usize,
    pub files_skipped: usize,
    pub rows_inserted: u64,
    pub rows_rejected: u64,
    pub stations_created: usize,
    pub cancelled: bool,
    pub skipped: Vec<SkippedUnit>,
}

impl IngestReport {
    pub fn record_file(&mut self, outcome: &FileOutcome) {
        self.files_ingested += 1;
        self.rows_inserted += outcome.rows_inserted;
        self.rows_rejected += outcome.rows_rejected;
        if outcome.station_created {
            self.stations_created += 1;
        }
    }

    /// Record an abandoned unit under the scope its error reaches.
    pub fn record_failure(&mut self, path: &Path, error: &ProcessingError) {
        let scope = error.scope();
        match scope {
            FailureScope::Archive => self.archives_failed += 1,
            FailureScope::File | FailureScope::Run => self.files_skipped += 1,
        }
        self.skipped.push(SkippedUnit {
            path: path.to_path_buf(),
            scope,
            error: error.to_string(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.archives_processed == 0
            && self.archives_failed == 0
            && self.files_ingested == 0
            && self.files_skipped == 0
    }

    /// True when any unit or row was dropped, or the run was interrupted.
    pub fn has_warnings(&self) -> bool {
        self.archives_failed > 0 || self.files_skipped > 0 || self.rows_rejected > 0 || self.cancelled
    }

    pub fn summary(&self) -> String {
        let mut summary = String::new();

        summary.push_str("=== Ingestion Report ===\n");
        summary.push_str(&format!(
            "Archives: {} processed, {} failed\n",
            self.archives_processed, self.archives_failed
        ));
        summary.push_str(&format!(
            "Files: {} ingested, {} skipped\n",
            self.files_ingested, self.files_skipped
        ));
        summary.push_str(&format!(
            "Rows: {} inserted, {} rejected\n",
            self.rows_inserted, self.rows_rejected
        ));
        summary.push_str(&format!("New stations: {}\n", self.stations_created));

        if self.cancelled {
            summary.push_str("\nRun was cancelled; files committed before the interrupt are kept.\n");
        }

        if !self.skipped.is_empty() {
            summary.push_str("\nSkipped:\n");
            for (i, unit) in self.skipped.iter().take(20).enumerate() {
                let scope = match unit.scope {
                    FailureScope::Archive => "archive",
                    FailureScope::File => "file",
                    FailureScope::Run => "run",
                };
                summary.push_str(&format!(
                    "  {}. [{}] {}: {}\n",
                    i + 1,
                    scope,
                    unit.path.display(),
                    unit.error
                ));
            }
            if self.skipped.len() > 20 {
                summary.push_str(&format!("  ... and {} more\n", self.skipped.len() - 20));
            }
        }

        summary
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AggregationReport {
    pub scope: AggregationScope,
    pub measurements_read: u64,
    pub rows_ignored: u64,
    pub stations: usize,
    pub days_written: u64,
    pub days_replaced: u64,
}

impl AggregationReport {
    pub fn summary(&self) -> String {
        let mut summary = String::new();

        summary.push_str("=== Daily Aggregation Report ===\n");
        summary.push_str(&format!("Scope: {}\n", self.scope));
        summary.push_str(&format!("Measurements read: {}\n", self.measurements_read));
        if self.rows_ignored > 0 {
            summary.push_str(&format!(
                "Measurements without station or date: {}\n",
                self.rows_ignored
            ));
        }
        summary.push_str(&format!("Stations: {}\n", self.stations));
        summary.push_str(&format!(
            "Daily rows: {} written ({} previous rows replaced)\n",
            self.days_written, self.days_replaced
        ));

        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FormatError;

    fn outcome(created: bool, inserted: u64, rejected: u64) -> FileOutcome {
        let mut outcome = FileOutcome::new(
            Path::new("a.csv"),
            Resolution { id: 1, created },
        );
        outcome.rows_inserted = inserted;
        outcome.rows_rejected = rejected;
        outcome
    }

    #[test]
    fn test_empty_report() {
        let report = IngestReport::default();
        assert!(report.is_empty());
        assert!(!report.has_warnings());
        assert!(report.summary().contains("Files: 0 ingested, 0 skipped"));
    }

    #[test]
    fn test_record_files() {
        let mut report = IngestReport::default();
        report.record_file(&outcome(true, 10, 0));
        report.record_file(&outcome(false, 5, 2));

        assert_eq!(report.files_ingested, 2);
        assert_eq!(report.rows_inserted, 15);
        assert_eq!(report.rows_rejected, 2);
        assert_eq!(report.stations_created, 1);
        assert!(report.has_warnings());
    }

    #[test]
    fn test_skipped_units_are_listed() {
        let mut report = IngestReport::default();
        report.record_failure(
            Path::new("bad.csv"),
            &ProcessingError::format("bad.csv", FormatError::MissingLine { line: 4 }),
        );
        report.record_failure(
            Path::new("broken.zip"),
            &ProcessingError::Archive {
                path: PathBuf::from("broken.zip"),
                reason: "invalid Zip archive".to_string(),
            },
        );

        assert_eq!(report.files_skipped, 1);
        assert_eq!(report.archives_failed, 1);
        assert_eq!(report.skipped[0].scope, FailureScope::File);
        assert_eq!(report.skipped[1].scope, FailureScope::Archive);

        let summary = report.summary();
        assert!(summary.contains("[file] bad.csv"));
        assert!(summary.contains("[archive] broken.zip"));
    }

    #[test]
    fn test_failure_is_counted_by_error_scope() {
        let mut report = IngestReport::default();
        report.record_failure(
            Path::new("a.csv"),
            &ProcessingError::Io(std::io::Error::new(std::io::ErrorKind::Other, "disk gone")),
        );
        report.record_failure(Path::new("b.csv"), &ProcessingError::StoredValue("x".to_string()));

        assert_eq!(report.archives_failed, 0);
        assert_eq!(report.files_skipped, 2);
        assert_eq!(report.skipped[0].scope, FailureScope::File);
        assert_eq!(report.skipped[1].scope, FailureScope::Run);
        assert!(report.summary().contains("[run] b.csv"));
    }

    #[test]
    fn test_report_serializes_scope_lowercase() {
        let mut report = IngestReport::default();
        report.record_failure(
            Path::new("broken.zip"),
            &ProcessingError::Archive {
                path: PathBuf::from("broken.zip"),
                reason: "truncated".to_string(),
            },
        );

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["skipped"][0]["scope"], "archive");
        assert_eq!(json["archives_failed"], 1);
    }
}
