//! Outcome of a reconciliation run.

use crate::reconcile::{ChangeStatus, Correspondence, ImportChange, MatchStrategy};
use crate::verify::TestOutcome;
use serde::Serialize;
use std::path::PathBuf;

/// Result of rewriting one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileOutcome {
    pub file_path: PathBuf,
    /// Number of changes requested for the file
    pub changes: usize,
    /// Error text when the rewrite failed
    pub error: Option<String>,
}

impl FileOutcome {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// Everything one reconciliation run decided and did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    pub strategy: MatchStrategy,
    pub correspondence: Correspondence,
    pub changes: Vec<ImportChange>,
    pub files: Vec<FileOutcome>,
    /// Renamed modules whose old path is never imported verbatim
    pub unreferenced: Vec<String>,
    /// New import targets with no matching file under the source-truth directory
    pub unlocated: Vec<String>,
    /// True when no file was written
    pub dry_run: bool,
    pub verification: Option<TestOutcome>,
}

impl ReconcileReport {
    /// Number of changes with the given status.
    pub fn count(&self, status: ChangeStatus) -> usize {
        self.changes.iter().filter(|c| c.status == status).count()
    }

    /// Files that were rewritten successfully.
    pub fn succeeded_files(&self) -> impl Iterator<Item = &FileOutcome> {
        self.files.iter().filter(|f| f.succeeded())
    }

    /// Files whose rewrite failed.
    pub fn failed_files(&self) -> impl Iterator<Item = &FileOutcome> {
        self.files.iter().filter(|f| !f.succeeded())
    }

    /// One-line summary.
    pub fn summary(&self) -> String {
        let mut line = format!(
            "{} modules mapped, {} import changes, {} files updated, {} files failed",
            self.correspondence.len(),
            self.changes.len(),
            self.succeeded_files().count(),
            self.failed_files().count(),
        );
        if self.dry_run {
            line.push_str(" (dry run)");
        }
        match &self.verification {
            Some(outcome) if outcome.success => line.push_str(", tests passed"),
            Some(_) => line.push_str(", tests failed"),
            None => {}
        }
        line
    }

    /// Pretty JSON rendering of the report.
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
