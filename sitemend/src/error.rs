//! Error types for rewrite runs.

use std::path::PathBuf;

use serde::Serialize;

/// The kind of per-file failure that prevented a file from being processed.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[non_exhaustive]
pub enum FileErrorKind {
    /// An I/O error occurred while reading the file.
    IoError,
    /// The file exceeded the configured maximum size limit.
    FileTooLarge,
    /// The file content is not valid UTF-8.
    InvalidEncoding,
    /// A directory traversal error (permission denied, loop detected, etc.).
    WalkError,
    /// An exclude glob pattern could not be parsed.
    InvalidExcludePattern,
    /// The backup copy could not be created; the target was left untouched.
    BackupError,
    /// The new content could not be written; the target was left untouched.
    WriteError,
    /// A page referenced by the catalog does not exist.
    NotFound,
}

/// A per-file error: the file was skipped and the run continued.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[non_exhaustive]
pub struct FileError {
    /// The file path that could not be processed.
    pub file: PathBuf,
    /// The kind of failure.
    pub kind: FileErrorKind,
    /// Human-readable description of the failure.
    pub message: String,
}

impl FileError {
    #[must_use]
    pub fn new(file: impl Into<PathBuf>, kind: FileErrorKind, message: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            kind,
            message: message.into(),
        }
    }

    /// Format the error for human-readable output.
    #[must_use]
    pub fn format_human_readable(&self) -> String {
        format!("{}: [{}] {}", self.file.display(), self.kind.label(), self.message)
    }
}

impl FileErrorKind {
    /// Short label used in console output.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::IoError => "io error",
            Self::FileTooLarge => "too large",
            Self::InvalidEncoding => "encoding",
            Self::WalkError => "walk error",
            Self::InvalidExcludePattern => "bad exclude",
            Self::BackupError => "backup failed",
            Self::WriteError => "write failed",
            Self::NotFound => "not found",
        }
    }
}
