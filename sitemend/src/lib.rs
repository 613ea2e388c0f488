//! # sitemend
//!
//! Maintenance tooling for static HTML sites.
//!
//! The core is a bulk rewrite engine: walk a directory tree, pick files by
//! extension, run a pure [`Transform`] over each one and write back only
//! what changed, with optional backups and a dry-run mode. Around it sit
//! the site chores that share the same persistence step: SEO tag injection
//! ([`seo`]), sitemap generation ([`sitemap`]) and poster URL lookup
//! ([`poster`]).
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use sitemend::{FsSourceConfig, RewriteConfig, rewrite_fs};
//! use sitemend::transform::{LiteralReplace, Replacement};
//!
//! let mut fs_config = FsSourceConfig::new("public");
//! fs_config.extensions = vec!["html".to_owned(), "js".to_owned()];
//!
//! let swap = LiteralReplace::new(vec![Replacement::new(
//!     "https://new7.gdflix.net",
//!     "https://new9.gdflix.net",
//! )]);
//! let config = RewriteConfig::new(Box::new(swap)).with_dry_run(true);
//!
//! let summary = rewrite_fs(&fs_config, &config).unwrap();
//! println!("Files modified: {}", summary.files_modified);
//! ```

mod config;
mod error;
pub mod output;
pub mod persist;
pub mod poster;
mod report;
pub mod rules;
pub mod seo;
pub mod sitemap;
pub mod source;
pub mod transform;

pub use config::{
    BackupPolicy, DEFAULT_EXCLUDED_DIRS, DEFAULT_MAX_FILE_SIZE, FsSourceConfig, RewriteConfig,
};
pub use error::{FileError, FileErrorKind};
pub use report::{FileChange, RunSummary};
pub use transform::{Transform, TransformResult};

use std::path::Path;

use glob::Pattern;
use tracing::{debug, info, warn};

use persist::{PersistError, PersistOutcome, persist};
use source::FileTask;
use source::fs::{FileWalker, read_file_bounded};

/// Rewrite every candidate file under `fs_config.root`.
///
/// This is the primary public API. Files are processed one at a time; a
/// file that cannot be read or written is logged, recorded in
/// `RunSummary::errors` and skipped, and the run goes on.
///
/// # Errors
///
/// Returns an error if the root does not exist, no extensions are
/// configured, or an exclude pattern is not a valid glob. Nothing is
/// touched in that case. Per-file problems never produce an `Err`.
pub fn rewrite_fs(
    fs_config: &FsSourceConfig,
    rewrite_config: &RewriteConfig,
) -> anyhow::Result<RunSummary> {
    if !fs_config.root.exists() {
        anyhow::bail!("Path does not exist: {}", fs_config.root.display());
    }
    if fs_config.extensions.is_empty() {
        anyhow::bail!("No file extensions provided");
    }
    if let Some((pattern, err)) = fs_config
        .exclude
        .iter()
        .find_map(|p| Pattern::new(p).err().map(|e| (p, e)))
    {
        anyhow::bail!("Invalid exclude glob pattern '{pattern}': {err}");
    }

    info!(
        root = %fs_config.root.display(),
        transform = rewrite_config.transform.name(),
        dry_run = rewrite_config.dry_run,
        "starting rewrite run"
    );

    let mut summary = RunSummary::new(rewrite_config.dry_run);
    let walker = FileWalker::new(fs_config);
    for item in walker.iter() {
        match item {
            Ok(task) => process_file(
                &task,
                &*rewrite_config.transform,
                rewrite_config.backup,
                rewrite_config.dry_run,
                fs_config.max_file_size,
                &mut summary,
            ),
            Err(e) => {
                warn!(file = %e.file.display(), "{}", e.message);
                summary.record_error(e);
            }
        }
    }

    info!(
        scanned = summary.files_scanned,
        modified = summary.files_modified,
        failed = summary.files_failed,
        "rewrite run finished"
    );
    Ok(summary)
}

/// Read, transform and persist a single file, folding the outcome into `summary`.
pub(crate) fn process_file(
    task: &FileTask,
    transform: &dyn Transform,
    backup: BackupPolicy,
    dry_run: bool,
    max_file_size: u64,
    summary: &mut RunSummary,
) {
    let content = match read_file_bounded(&task.path, max_file_size) {
        Ok(c) => c,
        Err(e) => {
            warn!(file = %task.path.display(), "{}", e.message);
            summary.record_error(e);
            return;
        }
    };

    let result = transform.apply(&content);
    match persist(task, &result, backup, dry_run) {
        Ok(PersistOutcome::Unchanged) => {
            debug!(file = %task.path.display(), "unchanged");
            summary.record_skip();
        }
        Ok(PersistOutcome::DryRun) => {
            info!(
                file = %task.path.display(),
                substitutions = result.substitutions,
                "would modify"
            );
            summary.record_change(FileChange {
                path: task.path.clone(),
                substitutions: result.substitutions,
                backup: None,
            });
        }
        Ok(PersistOutcome::Written { backup: saved }) => {
            info!(
                file = %task.path.display(),
                substitutions = result.substitutions,
                "modified"
            );
            summary.record_change(FileChange {
                path: task.path.clone(),
                substitutions: result.substitutions,
                backup: saved,
            });
        }
        Err(e) => {
            warn!(file = %task.path.display(), "{e}");
            summary.record_error(persist_error_to_file_error(&task.path, &e));
        }
    }
}

fn persist_error_to_file_error(path: &Path, err: &PersistError) -> FileError {
    let kind = match err {
        PersistError::Backup { .. } => FileErrorKind::BackupError,
        PersistError::Write { .. } => FileErrorKind::WriteError,
    };
    FileError::new(path, kind, err.to_string())
}
