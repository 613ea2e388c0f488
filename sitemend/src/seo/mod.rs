//! SEO metadata injection for catalog pages.
//!
//! Each catalog item names a page under the site root. The page gets a
//! block of meta tags (description, canonical, Open Graph, Twitter) and a
//! JSON-LD script, inserted after `</title>`, else after the opening
//! `<head>` tag, else at the top of the document.
//!
//! The two parts are detected separately: a page that already has a meta
//! description but no structured data only receives the JSON-LD script,
//! and the other way round.

pub mod catalog;
pub mod jsonld;
pub mod meta;

use std::path::{Component, Path};
use std::sync::LazyLock;

use regex::Regex;
use tracing::{info, warn};

pub use catalog::{Catalog, CatalogItem};
pub use jsonld::{build_jsonld, jsonld_script};
pub use meta::{build_meta_tags, truncate_description};

use crate::config::{BackupPolicy, DEFAULT_MAX_FILE_SIZE};
use crate::error::{FileError, FileErrorKind};
use crate::report::RunSummary;
use crate::source::FileTask;
use crate::transform::inject::insert_at_anchor;
use crate::transform::{Anchor, Transform, TransformResult};

static META_DESCRIPTION: LazyLock<Regex> = LazyLock::new(|| {
    match Regex::new(r#"(?i)<meta\s+name\s*=\s*["']description["']"#) {
        Ok(regex) => regex,
        Err(err) => panic!("Invalid meta description regex: {err}"),
    }
});

static JSONLD_SCRIPT: LazyLock<Regex> = LazyLock::new(|| {
    match Regex::new(r#"(?i)<script\s+type\s*=\s*["']application/ld\+json["']"#) {
        Ok(regex) => regex,
        Err(err) => panic!("Invalid JSON-LD script regex: {err}"),
    }
});

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Public URL of a catalog link.
#[must_use]
pub fn page_url(origin: &str, link: &str) -> String {
    format!(
        "{}/{}",
        origin.trim_end_matches('/'),
        link.trim_start_matches('/')
    )
}

/// Injects one page's meta tags and JSON-LD script, each only if missing.
#[derive(Debug, Clone)]
pub struct SeoInjection {
    meta_tags: String,
    jsonld: String,
}

impl SeoInjection {
    #[must_use]
    pub fn new(meta_tags: impl Into<String>, jsonld: impl Into<String>) -> Self {
        Self {
            meta_tags: meta_tags.into(),
            jsonld: jsonld.into(),
        }
    }

    /// Build the injection for `item` served at `page_url`.
    #[must_use]
    pub fn for_item(item: &CatalogItem, page_url: &str) -> Self {
        Self::new(build_meta_tags(item, page_url), jsonld_script(item))
    }

    fn anchors() -> [Anchor; 2] {
        [Anchor::after("</title>"), Anchor::after("<head")]
    }
}

impl Transform for SeoInjection {
    fn name(&self) -> &'static str {
        "seo"
    }

    fn apply(&self, content: &str) -> TransformResult {
        let mut parts = Vec::with_capacity(2);
        if !META_DESCRIPTION.is_match(content) {
            parts.push(self.meta_tags.as_str());
        }
        if !JSONLD_SCRIPT.is_match(content) {
            parts.push(self.jsonld.as_str());
        }
        if parts.is_empty() {
            return TransformResult::unchanged(content);
        }

        let block = parts.join("\n");
        insert_at_anchor(content, &block, &Self::anchors(), true).map_or_else(
            || TransformResult::unchanged(content),
            |updated| TransformResult::from_content(content, updated, parts.len()),
        )
    }
}

/// Inject SEO metadata into every catalog page under `root`.
///
/// Items without a `link` are ignored. A link that does not resolve to a
/// file inside `root` is recorded as a `NotFound` error and the run goes
/// on.
///
/// # Errors
///
/// Returns an error if `root` is not a directory.
pub fn inject_catalog(
    root: &Path,
    catalog: &Catalog,
    origin: &str,
    backup: BackupPolicy,
    dry_run: bool,
) -> anyhow::Result<RunSummary> {
    if !root.is_dir() {
        anyhow::bail!("Path is not a directory: {}", root.display());
    }
    info!(root = %root.display(), items = catalog.items.len(), dry_run, "starting SEO injection");

    let mut summary = RunSummary::new(dry_run);
    for item in &catalog.items {
        let Some(link) = item.link.as_deref().filter(|l| !l.trim().is_empty()) else {
            continue;
        };
        let page = root.join(link.trim_start_matches('/'));
        if !stays_inside(link) || !page.is_file() {
            warn!(link, "page not found");
            summary.record_error(FileError::new(
                &page,
                FileErrorKind::NotFound,
                format!("page not found for link: {link}"),
            ));
            continue;
        }

        let transform = SeoInjection::for_item(item, &page_url(origin, link));
        crate::process_file(
            &FileTask::for_path(page),
            &transform,
            backup,
            dry_run,
            DEFAULT_MAX_FILE_SIZE,
            &mut summary,
        );
    }

    info!(
        modified = summary.files_modified,
        skipped = summary.files_skipped,
        failed = summary.files_failed,
        "SEO injection finished"
    );
    Ok(summary)
}

/// Whether a relative link stays below the directory it is joined to.
fn stays_inside(link: &str) -> bool {
    Path::new(link.trim_start_matches('/'))
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}
