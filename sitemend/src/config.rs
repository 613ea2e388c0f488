//! Configuration types for rewrite runs.
//!
//! Split into source config (how candidate files are discovered) and rewrite
//! config (what happens to each file). Every run receives both explicitly;
//! nothing is read from global state.

use std::path::PathBuf;

use crate::transform::Transform;

/// Directories skipped by default during discovery.
pub const DEFAULT_EXCLUDED_DIRS: &[&str] = &[".git", "node_modules"];

/// Files larger than this are rejected unread (10 MB).
pub const DEFAULT_MAX_FILE_SIZE: u64 = 10_485_760;

/// Whether modified files keep a copy of their previous content.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BackupPolicy {
    /// Copy the original bytes to `<file>.bak` (or the next free `.bakN`) before overwriting.
    #[default]
    Enabled,
    /// Overwrite in place without keeping a copy.
    Disabled,
}

impl BackupPolicy {
    /// Build a policy from a "no backup" command-line switch.
    #[must_use]
    pub fn from_no_backup(no_backup: bool) -> Self {
        if no_backup {
            Self::Disabled
        } else {
            Self::Enabled
        }
    }

    #[must_use]
    pub fn is_enabled(self) -> bool {
        self == Self::Enabled
    }
}

/// Filesystem-specific source options.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct FsSourceConfig {
    /// Directory (or single file) to scan. Must exist.
    pub root: PathBuf,
    /// Accepted file extensions, without the leading dot. Matched case-insensitively.
    pub extensions: Vec<String>,
    /// Directory names that are never descended into (e.g. an output-only folder).
    pub exclude_dirs: Vec<String>,
    /// Exclude patterns (glob format), matched against the full path and the file name.
    pub exclude: Vec<String>,
    /// Whether to follow symbolic links (default: `false`).
    pub follow_links: bool,
    /// Maximum directory traversal depth (default: 64).
    pub max_depth: usize,
    /// Maximum file size in bytes (default: 10 MB).
    pub max_file_size: u64,
    /// Sort directory entries by file name so runs are reproducible (default: `true`).
    pub sorted: bool,
}

impl FsSourceConfig {
    /// Config rooted at `root` with every other option at its default.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }
}

impl Default for FsSourceConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            extensions: vec!["html".to_owned()],
            exclude_dirs: DEFAULT_EXCLUDED_DIRS
                .iter()
                .map(|d| (*d).to_owned())
                .collect(),
            exclude: Vec::new(),
            follow_links: false,
            max_depth: 64,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            sorted: true,
        }
    }
}

/// What a run does to each discovered file.
#[derive(Debug)]
#[non_exhaustive]
pub struct RewriteConfig {
    /// The content transformation applied to every candidate.
    pub transform: Box<dyn Transform>,
    /// Backup behaviour for modified files.
    pub backup: BackupPolicy,
    /// Compute and report changes without writing anything.
    pub dry_run: bool,
}

impl RewriteConfig {
    /// Config with backups enabled and dry-run off.
    #[must_use]
    pub fn new(transform: Box<dyn Transform>) -> Self {
        Self {
            transform,
            backup: BackupPolicy::default(),
            dry_run: false,
        }
    }

    #[must_use]
    pub fn with_backup(mut self, backup: BackupPolicy) -> Self {
        self.backup = backup;
        self
    }

    #[must_use]
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }
}
