//! Filesystem source.
//!
//! Discovers candidate files under a root directory and reads them safely:
//! - Symlinks are not followed by default (`follow_links: false`)
//! - Excluded directory names are pruned before descending
//! - Maximum directory depth is enforced
//! - Bounded reads reject oversized files without loading them whole

use std::io::Read;
use std::path::{Path, PathBuf};

use glob::Pattern;
use walkdir::{DirEntry, WalkDir};

use crate::config::FsSourceConfig;
use crate::error::{FileError, FileErrorKind};
use crate::source::{FileCategory, FileTask, lowercase_extension};

/// Lazy walker over the candidate files of one root.
///
/// Each call to [`FileWalker::iter`] starts a fresh traversal, so the
/// sequence can be restarted at will. Walk failures are yielded as `Err`
/// items instead of ending the sequence.
#[derive(Debug)]
pub struct FileWalker {
    root: PathBuf,
    extensions: Vec<String>,
    exclude_dirs: Vec<String>,
    exclude_patterns: Vec<Pattern>,
    pattern_errors: Vec<FileError>,
    follow_links: bool,
    max_depth: usize,
    sorted: bool,
}

impl FileWalker {
    #[must_use]
    pub fn new(config: &FsSourceConfig) -> Self {
        let mut exclude_patterns = Vec::with_capacity(config.exclude.len());
        let mut pattern_errors = Vec::new();
        for pat_str in &config.exclude {
            match Pattern::new(pat_str) {
                Ok(pat) => exclude_patterns.push(pat),
                Err(e) => pattern_errors.push(FileError::new(
                    pat_str.as_str(),
                    FileErrorKind::InvalidExcludePattern,
                    format!("Invalid exclude glob pattern '{pat_str}': {e}"),
                )),
            }
        }

        Self {
            root: config.root.clone(),
            extensions: config
                .extensions
                .iter()
                .map(|e| e.trim_start_matches('.').to_ascii_lowercase())
                .collect(),
            exclude_dirs: config.exclude_dirs.clone(),
            exclude_patterns,
            pattern_errors,
            follow_links: config.follow_links,
            max_depth: config.max_depth,
            sorted: config.sorted,
        }
    }

    /// Start a traversal of the root.
    pub fn iter(&self) -> impl Iterator<Item = Result<FileTask, FileError>> + '_ {
        let mut walk = WalkDir::new(&self.root)
            .follow_links(self.follow_links)
            .max_depth(self.max_depth);
        if self.sorted {
            walk = walk.sort_by_file_name();
        }

        self.pattern_errors.iter().cloned().map(Err).chain(
            walk.into_iter()
                .filter_entry(|entry| !self.is_excluded_dir(entry))
                .filter_map(|entry_result| match entry_result {
                    Ok(entry) => self.candidate(&entry).map(Ok),
                    Err(walk_err) => {
                        let path = walk_err
                            .path()
                            .map_or_else(|| self.root.clone(), Path::to_path_buf);
                        Some(Err(FileError::new(
                            path,
                            FileErrorKind::WalkError,
                            format!("Directory traversal error: {walk_err}"),
                        )))
                    }
                }),
        )
    }

    /// Returns `true` for directories that must not be descended into.
    /// The root itself is never excluded.
    fn is_excluded_dir(&self, entry: &DirEntry) -> bool {
        if entry.depth() == 0 || !entry.file_type().is_dir() {
            return false;
        }
        entry
            .file_name()
            .to_str()
            .is_some_and(|name| self.exclude_dirs.iter().any(|d| d == name))
    }

    fn candidate(&self, entry: &DirEntry) -> Option<FileTask> {
        if !entry.file_type().is_file() {
            return None;
        }
        let path = entry.path();
        let ext = lowercase_extension(path)?;
        if !self.extensions.contains(&ext) {
            return None;
        }
        if matches_exclude(path, &self.exclude_patterns) {
            return None;
        }
        Some(FileTask {
            path: path.to_path_buf(),
            category: FileCategory::for_extension(&ext),
        })
    }
}

/// Check if a path matches any of the exclude patterns
fn matches_exclude(path: &Path, exclude_patterns: &[Pattern]) -> bool {
    let path_str = path.to_string_lossy();
    exclude_patterns.iter().any(|pattern| {
        pattern.matches(&path_str)
            || path
                .file_name()
                .is_some_and(|name| pattern.matches(&name.to_string_lossy()))
    })
}

/// Read a file using a bounded read, enforcing `max_file_size`.
///
/// # Errors
///
/// Returns a [`FileError`] if:
/// - The file exceeds `max_file_size`
/// - An I/O error occurs
/// - The content is not valid UTF-8
pub fn read_file_bounded(path: &Path, max_file_size: u64) -> Result<String, FileError> {
    let file = std::fs::File::open(path).map_err(|e| {
        FileError::new(path, FileErrorKind::IoError, format!("Failed to open file: {e}"))
    })?;

    // Read at most max_file_size + 1 bytes to detect oversized files
    let mut buffer = Vec::new();
    file.take(max_file_size.saturating_add(1))
        .read_to_end(&mut buffer)
        .map_err(|e| {
            FileError::new(path, FileErrorKind::IoError, format!("Failed to read file: {e}"))
        })?;

    if u64::try_from(buffer.len()).unwrap_or(u64::MAX) > max_file_size {
        return Err(FileError::new(
            path,
            FileErrorKind::FileTooLarge,
            format!("File exceeds maximum size of {max_file_size} bytes"),
        ));
    }

    String::from_utf8(buffer).map_err(|_| {
        FileError::new(path, FileErrorKind::InvalidEncoding, "File is not valid UTF-8")
    })
}
