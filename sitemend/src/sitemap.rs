//! sitemap.xml generation for a directory of static pages.

use std::path::{Component, Path, PathBuf};

use anyhow::{Context, bail};
use chrono::NaiveDate;
use serde::Serialize;
use tracing::{info, warn};

use crate::config::FsSourceConfig;
use crate::persist::write_atomic;
use crate::source::fs::FileWalker;

const SITEMAP_NS: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";

/// Sitemap generation options.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct SitemapConfig {
    /// Website root directory.
    pub root: PathBuf,
    /// Public origin the pages are served from, e.g. `https://example.org/`.
    pub base_url: String,
    /// Page file names that never appear in the sitemap.
    pub exclude_files: Vec<String>,
    /// Directory names skipped when `recursive` is set.
    pub exclude_dirs: Vec<String>,
    /// Include pages in subdirectories (default: top-level pages only).
    pub recursive: bool,
    pub changefreq: String,
    pub priority: f32,
}

impl SitemapConfig {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            base_url: base_url.into(),
            ..Self::default()
        }
    }
}

impl Default for SitemapConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            base_url: String::new(),
            exclude_files: vec!["404.html".to_owned(), "error.html".to_owned()],
            exclude_dirs: FsSourceConfig::default().exclude_dirs,
            recursive: false,
            changefreq: "weekly".to_owned(),
            priority: 0.8,
        }
    }
}

/// Result of a sitemap run.
#[derive(Debug, Clone, Serialize)]
pub struct SitemapReport {
    pub output: PathBuf,
    pub urls: Vec<String>,
    /// `false` for dry runs.
    pub written: bool,
}

/// Collect the public URL of every eligible page, sorted and deduplicated.
///
/// A page named `index.html` maps to its directory URL.
///
/// # Errors
///
/// Returns an error if the root is not a directory or `base_url` is empty.
pub fn collect_urls(config: &SitemapConfig) -> anyhow::Result<Vec<String>> {
    if !config.root.is_dir() {
        bail!("Path is not a directory: {}", config.root.display());
    }
    if config.base_url.trim().is_empty() {
        bail!("A base URL is required to build a sitemap");
    }

    let mut source = FsSourceConfig::new(&config.root);
    source.exclude_dirs.clone_from(&config.exclude_dirs);
    if !config.recursive {
        source.max_depth = 1;
    }

    let mut urls = Vec::new();
    for item in FileWalker::new(&source).iter() {
        let task = match item {
            Ok(t) => t,
            Err(e) => {
                warn!(file = %e.file.display(), "{}", e.message);
                continue;
            }
        };
        let excluded = task
            .path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|name| config.exclude_files.iter().any(|x| x == name));
        if excluded {
            continue;
        }
        if let Some(rel) = relative_url_path(&config.root, &task.path) {
            urls.push(join_url(&config.base_url, &rel));
        }
    }

    urls.sort();
    urls.dedup();
    Ok(urls)
}

/// `/`-separated path of `page` below `root`, with a trailing `index.html` dropped.
fn relative_url_path(root: &Path, page: &Path) -> Option<String> {
    let rel = page.strip_prefix(root).ok()?;
    let mut parts = Vec::new();
    for component in rel.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_str()?.to_owned()),
            Component::CurDir => {}
            _ => return None,
        }
    }
    if parts.last().is_some_and(|last| last == "index.html") {
        parts.pop();
        let mut dir = parts.join("/");
        if !dir.is_empty() {
            dir.push('/');
        }
        return Some(dir);
    }
    Some(parts.join("/"))
}

fn join_url(base: &str, rel: &str) -> String {
    format!("{}/{}", base.trim().trim_end_matches('/'), rel)
}

/// Render the sitemap document for `urls`, in the given order.
#[must_use]
pub fn render_sitemap(urls: &[String], lastmod: NaiveDate, changefreq: &str, priority: f32) -> String {
    let lastmod = lastmod.format("%Y-%m-%d");
    let changefreq = xml_escape(changefreq);
    let entries: String = urls
        .iter()
        .map(|url| {
            format!(
                "  <url>\n    <loc>{}</loc>\n    <lastmod>{lastmod}</lastmod>\n    \
                 <changefreq>{changefreq}</changefreq>\n    <priority>{priority:.1}</priority>\n  </url>\n",
                xml_escape(url)
            )
        })
        .collect();
    format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<urlset xmlns=\"{SITEMAP_NS}\">\n{entries}</urlset>\n")
}

/// Collect pages under `config.root` and write the sitemap to `output`.
///
/// # Errors
///
/// Returns an error if URL collection fails (see [`collect_urls`]) or the
/// sitemap cannot be written.
pub fn generate_sitemap(
    config: &SitemapConfig,
    lastmod: NaiveDate,
    output: &Path,
    dry_run: bool,
) -> anyhow::Result<SitemapReport> {
    let urls = collect_urls(config)?;
    let xml = render_sitemap(&urls, lastmod, &config.changefreq, config.priority);

    if dry_run {
        info!(output = %output.display(), urls = urls.len(), "sitemap preview");
    } else {
        write_atomic(output, xml.as_bytes())
            .with_context(|| format!("Failed to write sitemap {}", output.display()))?;
        info!(output = %output.display(), urls = urls.len(), "sitemap generated");
    }

    Ok(SitemapReport {
        output: output.to_path_buf(),
        urls,
        written: !dry_run,
    })
}

fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn site() -> TempDir {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("linkpages")).unwrap();
        fs::create_dir_all(tmp.path().join("movies")).unwrap();
        for page in ["index.html", "about.html", "404.html", "error.html", "zeta.html"] {
            fs::write(tmp.path().join(page), "<html></html>").unwrap();
        }
        fs::write(tmp.path().join("linkpages/go.html"), "x").unwrap();
        fs::write(tmp.path().join("movies/index.html"), "x").unwrap();
        fs::write(tmp.path().join("movies/dune.html"), "x").unwrap();
        fs::write(tmp.path().join("styles.css"), "x").unwrap();
        tmp
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 9).unwrap()
    }

    #[test]
    fn test_top_level_pages_only_by_default() {
        let tmp = site();
        let config = SitemapConfig::new(tmp.path(), "https://thistv.linkpc.net/");
        let urls = collect_urls(&config).unwrap();
        assert_eq!(
            urls,
            vec![
                "https://thistv.linkpc.net/",
                "https://thistv.linkpc.net/about.html",
                "https://thistv.linkpc.net/zeta.html",
            ]
        );
    }

    #[test]
    fn test_recursive_skips_excluded_dirs() {
        let tmp = site();
        let mut config = SitemapConfig::new(tmp.path(), "https://example.org");
        config.recursive = true;
        config.exclude_dirs.push("linkpages".to_owned());
        let urls = collect_urls(&config).unwrap();
        assert!(urls.contains(&"https://example.org/movies/".to_owned()));
        assert!(urls.contains(&"https://example.org/movies/dune.html".to_owned()));
        assert!(!urls.iter().any(|u| u.contains("linkpages")));
        assert!(!urls.iter().any(|u| u.ends_with("404.html")));
        let mut sorted = urls.clone();
        sorted.sort();
        assert_eq!(urls, sorted);
    }

    #[test]
    fn test_render_document() {
        let urls = vec!["https://example.org/a?x=1&y=2".to_owned()];
        let xml = render_sitemap(&urls, date(), "weekly", 0.8);
        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n"));
        assert!(xml.contains("<urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">"));
        assert!(xml.contains("<loc>https://example.org/a?x=1&amp;y=2</loc>"));
        assert!(xml.contains("<lastmod>2025-03-09</lastmod>"));
        assert!(xml.contains("<changefreq>weekly</changefreq>"));
        assert!(xml.contains("<priority>0.8</priority>"));
        assert_eq!(xml.matches("<url>").count(), 1);
        assert!(xml.trim_end().ends_with("</urlset>"));
    }

    #[test]
    fn test_render_exact_layout() {
        let urls = vec!["https://example.org/".to_owned(), "https://example.org/b.html".to_owned()];
        let xml = render_sitemap(&urls, date(), "daily", 1.0);
        let entry = |loc: &str| {
            format!(
                "  <url>\n    <loc>{loc}</loc>\n    <lastmod>2025-03-09</lastmod>\n    \
                 <changefreq>daily</changefreq>\n    <priority>1.0</priority>\n  </url>\n"
            )
        };
        let expected = format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
             <urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n{}{}</urlset>\n",
            entry("https://example.org/"),
            entry("https://example.org/b.html")
        );
        assert_eq!(xml, expected);
        assert_eq!(render_sitemap(&[], date(), "daily", 1.0).matches("<url>").count(), 0);
    }

    #[test]
    fn test_generate_writes_and_dry_run_does_not() {
        let tmp = site();
        let config = SitemapConfig::new(tmp.path(), "https://example.org/");
        let out = tmp.path().join("sitemap.xml");

        let report = generate_sitemap(&config, date(), &out, true).unwrap();
        assert!(!report.written);
        assert!(!out.exists());

        let report = generate_sitemap(&config, date(), &out, false).unwrap();
        assert!(report.written);
        assert_eq!(report.urls.len(), 3);
        let xml = fs::read_to_string(&out).unwrap();
        assert_eq!(xml.matches("<url>").count(), 3);
    }

    #[test]
    fn test_requires_base_url_and_directory() {
        let tmp = site();
        let err = collect_urls(&SitemapConfig::new(tmp.path(), "  ")).unwrap_err();
        assert!(err.to_string().contains("base URL"));

        let missing = SitemapConfig::new(tmp.path().join("nope"), "https://example.org");
        assert!(collect_urls(&missing).is_err());
    }

    #[test]
    fn test_index_in_name_is_not_stripped() {
        let root = Path::new("/site");
        assert_eq!(
            relative_url_path(root, Path::new("/site/myindex.html")).as_deref(),
            Some("myindex.html")
        );
        assert_eq!(relative_url_path(root, Path::new("/site/index.html")).as_deref(), Some(""));
    }
}
