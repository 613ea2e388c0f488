//! Run summary types.

use std::path::PathBuf;

use serde::Serialize;

use crate::error::FileError;

/// One modified (or, in dry-run, would-be modified) file.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FileChange {
    pub path: PathBuf,
    pub substitutions: usize,
    /// Where the previous content was saved, when a backup was written.
    pub backup: Option<PathBuf>,
}

/// Aggregate result of a rewrite run.
///
/// `files_scanned` counts files that were read and transformed; each of
/// them is either modified or skipped. Files that could not be read or
/// written are counted in `files_failed` and listed in `errors`.
#[derive(Debug, Clone, Default, Serialize)]
#[non_exhaustive]
pub struct RunSummary {
    pub files_scanned: usize,
    pub files_modified: usize,
    pub files_skipped: usize,
    pub files_failed: usize,
    pub total_substitutions: usize,
    /// Whether this run was a preview; if so nothing was written.
    pub dry_run: bool,
    pub changes: Vec<FileChange>,
    pub errors: Vec<FileError>,
}

impl RunSummary {
    #[must_use]
    pub fn new(dry_run: bool) -> Self {
        Self {
            dry_run,
            ..Self::default()
        }
    }

    /// Total number of files attempted (scanned + failed).
    #[must_use]
    pub fn files_attempted(&self) -> usize {
        self.files_scanned + self.files_failed
    }

    pub(crate) fn record_change(&mut self, change: FileChange) {
        self.files_scanned += 1;
        self.files_modified += 1;
        self.total_substitutions += change.substitutions;
        self.changes.push(change);
    }

    pub(crate) fn record_skip(&mut self) {
        self.files_scanned += 1;
        self.files_skipped += 1;
    }

    pub(crate) fn record_error(&mut self, error: FileError) {
        self.files_failed += 1;
        self.errors.push(error);
    }
}
