#![allow(clippy::unwrap_used, clippy::expect_used)]

//! Integration tests for `sitemend::rewrite_fs`.

use std::fs;
use std::path::Path;

use sitemend::transform::{BlankLineCollapse, Injection, LiteralReplace, Removal, Replacement};
use sitemend::{BackupPolicy, FileErrorKind, FsSourceConfig, RewriteConfig, Transform, rewrite_fs};
use tempfile::TempDir;

const AD_TAG: &str = r#"<script src="https://pl27.example-ads.com/old/invoke.js"></script>"#;
const NEW_TAG: &str = r#"<script src="https://pl99.example-ads.com/new/invoke.js"></script>"#;

fn swap_ads() -> Box<dyn Transform> {
    Box::new(LiteralReplace::new(vec![Replacement::new(AD_TAG, NEW_TAG)]))
}

fn page(body: &str) -> String {
    format!("<html><head><title>t</title></head><body>{body}</body></html>\n")
}

fn write(dir: &Path, name: &str, content: &str) {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

#[test]
fn test_rewrite_fs_nonexistent_root_errors() {
    let tmp = TempDir::new().unwrap();
    let fs_config = FsSourceConfig::new(tmp.path().join("does_not_exist"));
    let result = rewrite_fs(&fs_config, &RewriteConfig::new(swap_ads()));
    let msg = result.unwrap_err().to_string();
    assert!(msg.contains("does not exist"), "got: {msg}");
}

#[test]
fn test_rewrite_fs_empty_extensions_errors() {
    let tmp = TempDir::new().unwrap();
    let mut fs_config = FsSourceConfig::new(tmp.path());
    fs_config.extensions.clear();
    let msg = rewrite_fs(&fs_config, &RewriteConfig::new(swap_ads()))
        .unwrap_err()
        .to_string();
    assert!(msg.contains("No file extensions"), "got: {msg}");
}

#[test]
fn test_two_of_three_files_modified() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "a.html", &page(AD_TAG));
    write(tmp.path(), "b.html", &page(&format!("{AD_TAG}<p>x</p>{AD_TAG}")));
    let untouched = page("<p>clean</p>");
    write(tmp.path(), "c.html", &untouched);

    let summary = rewrite_fs(&FsSourceConfig::new(tmp.path()), &RewriteConfig::new(swap_ads())).unwrap();

    assert_eq!(summary.files_scanned, 3);
    assert_eq!(summary.files_modified, 2);
    assert_eq!(summary.files_skipped, 1);
    assert_eq!(summary.files_failed, 0);
    assert_eq!(summary.total_substitutions, 3);
    assert_eq!(fs::read_to_string(tmp.path().join("c.html")).unwrap(), untouched);
    assert!(!tmp.path().join("c.html.bak").exists());

    let b = fs::read_to_string(tmp.path().join("b.html")).unwrap();
    assert_eq!(b.matches(NEW_TAG).count(), 2);
    assert_eq!(b.matches(AD_TAG).count(), 0);
    assert_eq!(
        fs::read_to_string(tmp.path().join("b.html.bak")).unwrap(),
        page(&format!("{AD_TAG}<p>x</p>{AD_TAG}"))
    );
}

#[test]
fn test_dry_run_leaves_files_byte_identical() {
    let tmp = TempDir::new().unwrap();
    let original = page(AD_TAG);
    write(tmp.path(), "a.html", &original);
    write(tmp.path(), "nested/b.js", &format!("document.write('{AD_TAG}');\n"));

    let mut fs_config = FsSourceConfig::new(tmp.path());
    fs_config.extensions = vec!["html".to_owned(), "js".to_owned()];
    let config = RewriteConfig::new(swap_ads()).with_dry_run(true);
    let summary = rewrite_fs(&fs_config, &config).unwrap();

    assert!(summary.dry_run);
    assert_eq!(summary.files_modified, 2);
    assert!(summary.changes.iter().all(|c| c.backup.is_none()));
    assert_eq!(fs::read_to_string(tmp.path().join("a.html")).unwrap(), original);
    assert!(!tmp.path().join("a.html.bak").exists());
}

#[test]
fn test_backup_does_not_overwrite_older_backup() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "a.html", &page(AD_TAG));
    write(tmp.path(), "a.html.bak", "older backup");

    let summary = rewrite_fs(&FsSourceConfig::new(tmp.path()), &RewriteConfig::new(swap_ads())).unwrap();

    assert_eq!(summary.files_modified, 1);
    assert_eq!(fs::read_to_string(tmp.path().join("a.html.bak")).unwrap(), "older backup");
    let fresh = tmp.path().join("a.html.bak1");
    assert_eq!(fs::read_to_string(&fresh).unwrap(), page(AD_TAG));
    assert_eq!(summary.changes[0].backup.as_deref(), Some(fresh.as_path()));
}

#[test]
fn test_no_backup_policy() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "a.html", &page(AD_TAG));

    let config = RewriteConfig::new(swap_ads()).with_backup(BackupPolicy::Disabled);
    rewrite_fs(&FsSourceConfig::new(tmp.path()), &config).unwrap();

    assert!(!tmp.path().join("a.html.bak").exists());
    assert_eq!(fs::read_to_string(tmp.path().join("a.html")).unwrap(), page(NEW_TAG));
}

#[test]
fn test_collapse_three_blank_lines() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "a.html", "<p>one</p>   \n\n\n\n<p>two</p>\n\n\n");

    let config = RewriteConfig::new(Box::new(BlankLineCollapse)).with_backup(BackupPolicy::Disabled);
    let summary = rewrite_fs(&FsSourceConfig::new(tmp.path()), &config).unwrap();
    assert_eq!(summary.files_modified, 1);
    assert_eq!(
        fs::read_to_string(tmp.path().join("a.html")).unwrap(),
        "<p>one</p>\n\n<p>two</p>\n"
    );

    let again = rewrite_fs(&FsSourceConfig::new(tmp.path()), &config).unwrap();
    assert_eq!(again.files_modified, 0);
    assert_eq!(again.files_skipped, 1);
}

#[test]
fn test_injection_twice_is_noop() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "index.html", &page("<p>x</p>"));
    write(tmp.path(), "no-head.html", "<p>fragment</p>\n");

    let block = r#"<script src="https://ads.example/tag.js"></script>"#;
    let config = RewriteConfig::new(Box::new(Injection::before_head_close(block)))
        .with_backup(BackupPolicy::Disabled);
    let fs_config = FsSourceConfig::new(tmp.path());

    let first = rewrite_fs(&fs_config, &config).unwrap();
    assert_eq!(first.files_modified, 1);
    assert_eq!(first.files_skipped, 1);
    let after_first = fs::read_to_string(tmp.path().join("index.html")).unwrap();
    assert!(after_first.contains(&format!("{block}\n</head>")));

    let second = rewrite_fs(&fs_config, &config).unwrap();
    assert_eq!(second.files_modified, 0);
    assert_eq!(fs::read_to_string(tmp.path().join("index.html")).unwrap(), after_first);
}

#[test]
fn test_removal_strips_every_copy() {
    let tmp = TempDir::new().unwrap();
    let block = r#"<script src="//hilltop.example/a.js"></script>"#;
    write(tmp.path(), "a.html", &page(&format!("{block}<p>x</p>{block}")));

    let config = RewriteConfig::new(Box::new(Removal::new(block))).with_backup(BackupPolicy::Disabled);
    let summary = rewrite_fs(&FsSourceConfig::new(tmp.path()), &config).unwrap();

    assert_eq!(summary.total_substitutions, 2);
    assert_eq!(fs::read_to_string(tmp.path().join("a.html")).unwrap(), page("<p>x</p>"));
}

#[test]
fn test_unreadable_file_fails_alone() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "a.html", &page(AD_TAG));
    fs::write(tmp.path().join("broken.html"), [0xff, 0xfe, 0x00, 0x80]).unwrap();

    let summary = rewrite_fs(&FsSourceConfig::new(tmp.path()), &RewriteConfig::new(swap_ads())).unwrap();

    assert_eq!(summary.files_modified, 1);
    assert_eq!(summary.files_failed, 1);
    assert_eq!(summary.errors[0].kind, FileErrorKind::InvalidEncoding);
    assert!(summary.errors[0].file.ends_with("broken.html"));
}

#[test]
fn test_excluded_directories_are_not_touched() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "a.html", &page(AD_TAG));
    write(tmp.path(), "linkpages/b.html", &page(AD_TAG));
    write(tmp.path(), "node_modules/pkg/c.html", &page(AD_TAG));

    let mut fs_config = FsSourceConfig::new(tmp.path());
    fs_config.exclude_dirs.push("linkpages".to_owned());
    let summary = rewrite_fs(&fs_config, &RewriteConfig::new(swap_ads())).unwrap();

    assert_eq!(summary.files_scanned, 1);
    assert_eq!(
        fs::read_to_string(tmp.path().join("linkpages/b.html")).unwrap(),
        page(AD_TAG)
    );
    assert_eq!(
        fs::read_to_string(tmp.path().join("node_modules/pkg/c.html")).unwrap(),
        page(AD_TAG)
    );
}

#[test]
fn test_invalid_exclude_pattern_aborts_before_any_write() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "[draft].html", &page(AD_TAG));

    let mut fs_config = FsSourceConfig::new(tmp.path());
    fs_config.exclude.push("[draft*".to_owned());
    let msg = rewrite_fs(&fs_config, &RewriteConfig::new(swap_ads()))
        .unwrap_err()
        .to_string();

    assert!(msg.contains("Invalid exclude glob pattern"), "got: {msg}");
    assert_eq!(
        fs::read_to_string(tmp.path().join("[draft].html")).unwrap(),
        page(AD_TAG)
    );
    assert!(!tmp.path().join("[draft].html.bak").exists());
}
