//! Candidate discovery.
//!
//! Only the filesystem source exists (`fs` module). Everything downstream
//! works on [`FileTask`] values, so another source would only need to yield
//! those.

pub mod fs;

use std::path::{Path, PathBuf};

use serde::Serialize;

/// Broad content category of a candidate file, derived from its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FileCategory {
    /// `html`, `htm`, `xhtml`, `xml`, `svg`
    Markup,
    /// `js`, `mjs`, `cjs`
    Script,
    /// `css`
    Style,
    /// Any other extension the caller asked for.
    Other,
}

impl FileCategory {
    /// Category for a lowercase extension.
    #[must_use]
    pub fn for_extension(ext: &str) -> Self {
        match ext {
            "html" | "htm" | "xhtml" | "xml" | "svg" => Self::Markup,
            "js" | "mjs" | "cjs" => Self::Script,
            "css" => Self::Style,
            _ => Self::Other,
        }
    }
}

/// A single discovered file, consumed once by the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileTask {
    pub path: PathBuf,
    pub category: FileCategory,
}

impl FileTask {
    /// Build a task for `path`, classifying it by extension.
    #[must_use]
    pub fn for_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let category = lowercase_extension(&path)
            .map_or(FileCategory::Other, |ext| FileCategory::for_extension(&ext));
        Self { path, category }
    }
}

/// The file extension of `path`, lowercased.
pub(crate) fn lowercase_extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
}
