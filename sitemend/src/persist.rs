//! Persistence step: write changed content back, with optional backups.
//!
//! A target is only ever replaced by renaming a fully written temp file from
//! the same directory over it, so a failed write leaves the original intact.
//! Backups are linked into the first free `.bakN` slot without clobbering,
//! so an older backup is never overwritten.

use std::ffi::OsString;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;

use crate::config::BackupPolicy;
use crate::source::FileTask;
use crate::transform::TransformResult;

/// Upper bound on `.bakN` probing; reaching it means something is badly wrong.
const MAX_BACKUP_SLOTS: usize = 10_000;

/// Errors from the persistence step. The target file is unchanged in every case.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("Failed to create backup of {}: {source}", .path.display())]
    Backup {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// What the persistence step did with a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistOutcome {
    /// The transform changed nothing; no write.
    Unchanged,
    /// The transform changed the content but dry-run suppressed the write.
    DryRun,
    /// The file was rewritten; `backup` is where the old content went, if anywhere.
    Written { backup: Option<PathBuf> },
}

/// Write the transform result for `task` back to disk when it changed.
///
/// # Errors
///
/// Returns [`PersistError::Backup`] if the backup copy cannot be created
/// (the target is not touched), or [`PersistError::Write`] if the new
/// content cannot be written.
pub fn persist(
    task: &FileTask,
    result: &TransformResult,
    backup: BackupPolicy,
    dry_run: bool,
) -> Result<PersistOutcome, PersistError> {
    if !result.changed {
        return Ok(PersistOutcome::Unchanged);
    }
    if dry_run {
        return Ok(PersistOutcome::DryRun);
    }

    let backup_path = if backup.is_enabled() {
        let written = write_backup(&task.path, result.original.as_bytes()).map_err(|source| {
            PersistError::Backup {
                path: task.path.clone(),
                source,
            }
        })?;
        Some(written)
    } else {
        None
    };

    write_atomic(&task.path, result.content.as_bytes()).map_err(|source| PersistError::Write {
        path: task.path.clone(),
        source,
    })?;

    Ok(PersistOutcome::Written {
        backup: backup_path,
    })
}

/// Candidate backup path number `slot`: `<file>.bak`, `<file>.bak1`, `<file>.bak2`, ...
#[must_use]
pub fn backup_candidate(path: &Path, slot: usize) -> PathBuf {
    let mut name: OsString = path.as_os_str().to_owned();
    if slot == 0 {
        name.push(".bak");
    } else {
        name.push(format!(".bak{slot}"));
    }
    PathBuf::from(name)
}

/// Store `original` at the first unused backup path for `path`.
///
/// The bytes go to a temp file first and are only linked into a backup slot
/// once complete, so a failed write never leaves a partial `.bakN` behind.
fn write_backup(path: &Path, original: &[u8]) -> io::Result<PathBuf> {
    let mut tmp = NamedTempFile::new_in(parent_dir(path))?;
    tmp.write_all(original)?;
    tmp.as_file().sync_all()?;
    if let Ok(meta) = fs::metadata(path) {
        fs::set_permissions(tmp.path(), meta.permissions())?;
    }

    for slot in 0..MAX_BACKUP_SLOTS {
        let candidate = backup_candidate(path, slot);
        match tmp.persist_noclobber(&candidate) {
            Ok(_) => return Ok(candidate),
            Err(e) if e.error.kind() == io::ErrorKind::AlreadyExists => tmp = e.file,
            Err(e) => return Err(e.error),
        }
    }
    Err(io::Error::other(format!(
        "no free backup slot after {MAX_BACKUP_SLOTS} attempts"
    )))
}

/// Replace `path` with `content` via a temp file in the same directory.
///
/// Existing permissions are carried over to the new file.
///
/// # Errors
///
/// Returns an error if the temp file cannot be created or written, or if
/// the final rename fails. The previous content of `path` is untouched then.
pub fn write_atomic(path: &Path, content: &[u8]) -> io::Result<()> {
    let mut tmp = NamedTempFile::new_in(parent_dir(path))?;
    tmp.write_all(content)?;
    tmp.as_file().sync_all()?;
    if let Ok(meta) = fs::metadata(path) {
        fs::set_permissions(tmp.path(), meta.permissions())?;
    }
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

fn parent_dir(path: &Path) -> &Path {
    path.parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
}
