//! Shared output formatting for run summaries.
//!
//! Provides JSON and plain-text formatters for `RunSummary`.
//! Color/terminal formatting lives in the CLI.

use std::io::Write;

use crate::report::RunSummary;

/// Format a `RunSummary` as JSON to a writer.
///
/// # Errors
///
/// Returns an error if serialization or writing fails.
pub fn write_json(summary: &RunSummary, writer: &mut dyn Write) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(summary)?;
    writeln!(writer, "{json}")?;
    Ok(())
}

/// Format a `RunSummary` as human-readable plain text to a writer.
///
/// The last line is a one-line verdict (see [`verdict`]) and is always
/// written, even when every file failed or nothing matched.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_human(summary: &RunSummary, writer: &mut dyn Write) -> anyhow::Result<()> {
    write_human_details(summary, writer)?;
    writeln!(writer)?;
    writeln!(writer, "{}", verdict(summary))?;
    Ok(())
}

/// The counters and per-file lines of [`write_human`], without the verdict.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_human_details(summary: &RunSummary, writer: &mut dyn Write) -> anyhow::Result<()> {
    writeln!(writer)?;
    if summary.dry_run {
        writeln!(writer, "Summary [DRY RUN, no files were written]:")?;
    } else {
        writeln!(writer, "Summary:")?;
    }
    writeln!(writer, "{}", "-".repeat(40))?;
    writeln!(writer, "Total files scanned: {}", summary.files_scanned)?;
    writeln!(writer, "Files modified: {}", summary.files_modified)?;
    for change in &summary.changes {
        write!(
            writer,
            "  - {}: {} replacement(s)",
            change.path.display(),
            change.substitutions
        )?;
        if let Some(backup) = &change.backup {
            write!(writer, " (backup: {})", backup.display())?;
        }
        writeln!(writer)?;
    }
    writeln!(writer, "Files skipped (no match): {}", summary.files_skipped)?;
    writeln!(writer, "Files failed: {}", summary.files_failed)?;
    for err in &summary.errors {
        writeln!(writer, "  ! {}", err.format_human_readable())?;
    }
    writeln!(writer, "Total replacements made: {}", summary.total_substitutions)?;
    Ok(())
}

/// One-line outcome of a run.
#[must_use]
pub fn verdict(summary: &RunSummary) -> String {
    if summary.files_modified == 0 && summary.files_failed == 0 {
        return "No occurrences found. No files were modified.".to_owned();
    }
    let action = if summary.dry_run {
        "would be modified"
    } else {
        "modified"
    };
    if summary.files_failed == 0 {
        format!("{} file(s) {action}.", summary.files_modified)
    } else {
        format!(
            "{} file(s) {action}, {} file(s) could not be processed.",
            summary.files_modified, summary.files_failed
        )
    }
}
