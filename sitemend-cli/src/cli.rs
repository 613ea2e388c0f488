use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{ArgAction, Args, Parser, Subcommand};
use colored::Colorize;
use serde_json::json;
use tracing::debug;

use sitemend::output::{verdict, write_human_details, write_json};
use sitemend::poster::client::DEFAULT_BASE_URL;
use sitemend::poster::{AmazonSized, PosterClient, QualityFit, default_chain, fit_quality};
use sitemend::rules::RuleFile;
use sitemend::seo::{Catalog, inject_catalog};
use sitemend::sitemap::{SitemapConfig, generate_sitemap};
use sitemend::transform::{
    Anchor, BlankLineCollapse, Injection, LiteralReplace, Removal, Replacement,
};
use sitemend::{BackupPolicy, FsSourceConfig, RewriteConfig, RunSummary, Transform, rewrite_fs};

use crate::logging;

const CHANGEFREQ_VALUES: [&str; 7] = [
    "always", "hourly", "daily", "weekly", "monthly", "yearly", "never",
];

#[derive(Parser, Debug)]
#[command(
    name = "sitemend",
    version,
    about = "Maintenance tooling for static HTML sites"
)]
pub struct Cli {
    /// Print results as JSON instead of the text report
    #[arg(long, global = true)]
    pub json: bool,

    /// Verbosity level (-v info, -vv debug); `RUST_LOG` takes precedence
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Replace marker strings (ad tags, old domains) with their replacements
    Replace(ReplaceArgs),
    /// Collapse blank-line runs and strip trailing whitespace
    Clean(TargetArgs),
    /// Insert a block at an anchor tag unless it is already present
    Inject(InjectArgs),
    /// Remove every occurrence of a block
    Remove(RemoveArgs),
    /// Add meta tags and JSON-LD to the pages listed in a catalog
    Seo(SeoArgs),
    /// Generate sitemap.xml for the site
    Sitemap(SitemapArgs),
    /// Look up the poster image URL of a title
    Poster(PosterArgs),
}

/// Where a rewrite runs and how it persists.
#[derive(Args, Debug)]
pub struct TargetArgs {
    /// Site root directory (or a single file)
    #[arg(default_value = ".")]
    pub root: PathBuf,

    /// File extensions to process (comma-separated or repeated)
    #[arg(long = "ext", value_delimiter = ',', default_value = "html")]
    pub extensions: Vec<String>,

    /// Directory names to skip, in addition to .git and `node_modules`
    #[arg(long = "exclude-dir")]
    pub exclude_dirs: Vec<String>,

    /// Glob patterns for files to skip
    #[arg(long)]
    pub exclude: Vec<String>,

    /// Show what would change without writing anything
    #[arg(long)]
    pub dry_run: bool,

    /// Do not keep .bak copies of modified files
    #[arg(long)]
    pub no_backup: bool,
}

impl TargetArgs {
    fn source_config(&self) -> FsSourceConfig {
        let mut config = FsSourceConfig::new(&self.root);
        config.extensions.clone_from(&self.extensions);
        config.exclude_dirs.extend(self.exclude_dirs.iter().cloned());
        config.exclude.clone_from(&self.exclude);
        config
    }

    fn rewrite_config(&self, transform: Box<dyn Transform>) -> RewriteConfig {
        RewriteConfig::new(transform)
            .with_backup(BackupPolicy::from_no_backup(self.no_backup))
            .with_dry_run(self.dry_run)
    }
}

#[derive(Args, Debug)]
pub struct ReplaceArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Marker to replace; pairs with the --to at the same position
    #[arg(long = "from")]
    pub from: Vec<String>,

    /// Replacement text
    #[arg(long = "to")]
    pub to: Vec<String>,

    /// JSON or YAML file with replacement rules
    #[arg(long, conflicts_with_all = ["from", "to"])]
    pub rules: Option<PathBuf>,

    /// Match markers ignoring ASCII case
    #[arg(long)]
    pub ignore_case: bool,
}

/// The block an inject or remove command works with.
#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
pub struct BlockArgs {
    /// Block text
    #[arg(long)]
    pub block: Option<String>,

    /// File holding the block text
    #[arg(long)]
    pub block_file: Option<PathBuf>,
}

impl BlockArgs {
    fn load(&self) -> Result<String> {
        let block = match (&self.block, &self.block_file) {
            (Some(text), _) => text.clone(),
            (None, Some(path)) => std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read block file {}", path.display()))?,
            (None, None) => bail!("Either --block or --block-file is required"),
        };
        let block = block.trim_end_matches(['\r', '\n']).to_owned();
        if block.trim().is_empty() {
            bail!("The block is empty");
        }
        Ok(block)
    }
}

#[derive(Args, Debug)]
pub struct InjectArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    #[command(flatten)]
    pub block: BlockArgs,

    /// Anchor tag, matched ignoring case
    #[arg(long, default_value = "</head>")]
    pub anchor: String,

    /// Insert after the anchor instead of before it
    #[arg(long)]
    pub after: bool,

    /// Put the block at the top of files that lack the anchor
    #[arg(long)]
    pub prepend_if_missing: bool,
}

#[derive(Args, Debug)]
pub struct RemoveArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    #[command(flatten)]
    pub block: BlockArgs,
}

#[derive(Args, Debug)]
pub struct SeoArgs {
    /// Site root directory
    #[arg(default_value = ".")]
    pub root: PathBuf,

    /// Catalog JSON file (default: <root>/data/movies.json)
    #[arg(long)]
    pub data: Option<PathBuf>,

    /// Public origin of the site, e.g. <https://example.org>
    #[arg(long)]
    pub origin: String,

    #[arg(long)]
    pub dry_run: bool,

    #[arg(long)]
    pub no_backup: bool,
}

#[derive(Args, Debug)]
pub struct SitemapArgs {
    /// Site root directory
    #[arg(default_value = ".")]
    pub root: PathBuf,

    /// Public base URL of the site
    #[arg(long)]
    pub base_url: String,

    /// Output file (default: <root>/sitemap.xml)
    #[arg(long, short)]
    pub output: Option<PathBuf>,

    /// Page file names to leave out, in addition to 404.html and error.html
    #[arg(long = "exclude-file")]
    pub exclude_files: Vec<String>,

    /// Directory names to skip when recursing
    #[arg(long = "exclude-dir")]
    pub exclude_dirs: Vec<String>,

    /// Include pages in subdirectories
    #[arg(long)]
    pub recursive: bool,

    #[arg(long, default_value = "weekly", value_parser = CHANGEFREQ_VALUES)]
    pub changefreq: String,

    /// Priority between 0.0 and 1.0
    #[arg(long, default_value_t = 0.8, value_parser = parse_priority)]
    pub priority: f32,

    /// Print the URLs instead of writing the file
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Args, Debug)]
pub struct PosterArgs {
    /// Title id, e.g. tt0109686
    pub imdb_id: String,

    /// Prefer the Amazon rendition closest to this height
    #[arg(long, num_args = 0..=1, default_missing_value = "562")]
    pub target_height: Option<u32>,

    /// Lower the image quality until it fits this many kilobytes
    #[arg(long)]
    pub max_size_kb: Option<u64>,

    /// Save the image as <IMDB_ID>.jpg
    #[arg(long)]
    pub download: bool,

    /// Directory for --download
    #[arg(long, default_value = ".")]
    pub output_dir: PathBuf,

    #[arg(long, default_value = DEFAULT_BASE_URL, hide = true)]
    pub base_url: String,
}

fn parse_priority(value: &str) -> std::result::Result<f32, String> {
    let priority: f32 = value
        .parse()
        .map_err(|_| format!("'{value}' is not a number"))?;
    if (0.0..=1.0).contains(&priority) {
        Ok(priority)
    } else {
        Err(format!("priority must be between 0.0 and 1.0, got {value}"))
    }
}

/// Parse arguments, set up logging and run the selected command on stdout.
///
/// # Errors
///
/// Returns an error for unrecoverable failures (bad arguments, missing
/// root, unreadable rule or catalog file, poster lookup failure).
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);
    debug!(json = cli.json, verbose = cli.verbose, "parsed arguments");
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    execute(&cli, &mut out)
}

/// Run an already-parsed command, writing its report to `out`.
///
/// # Errors
///
/// See [`run`].
pub fn execute(cli: &Cli, out: &mut dyn Write) -> Result<()> {
    match &cli.command {
        Command::Replace(args) => {
            let transform = replace_transform(args)?;
            rewrite(&args.target, Box::new(transform), cli.json, out)
        }
        Command::Clean(target) => rewrite(target, Box::new(BlankLineCollapse), cli.json, out),
        Command::Inject(args) => {
            let anchor = if args.after {
                Anchor::after(&args.anchor)
            } else {
                Anchor::before(&args.anchor)
            };
            let injection = Injection::new(args.block.load()?, vec![anchor])
                .prepend_if_missing(args.prepend_if_missing);
            rewrite(&args.target, Box::new(injection), cli.json, out)
        }
        Command::Remove(args) => {
            let removal = Removal::new(args.block.load()?);
            rewrite(&args.target, Box::new(removal), cli.json, out)
        }
        Command::Seo(args) => seo(args, cli.json, out),
        Command::Sitemap(args) => sitemap(args, cli.json, out),
        Command::Poster(args) => poster(args, cli.json, out),
    }
}

fn replace_transform(args: &ReplaceArgs) -> Result<LiteralReplace> {
    if let Some(path) = &args.rules {
        let rules = RuleFile::load(path)?;
        let ignore_case = rules.ignore_case || args.ignore_case;
        return Ok(rules.into_transform().ignore_case(ignore_case));
    }
    if args.from.is_empty() {
        bail!("Nothing to replace: pass --from/--to pairs or --rules");
    }
    if args.from.len() != args.to.len() {
        bail!(
            "Got {} --from value(s) but {} --to value(s); they must pair up",
            args.from.len(),
            args.to.len()
        );
    }
    if args.from.iter().any(String::is_empty) {
        bail!("--from must not be empty");
    }
    let pairs = args
        .from
        .iter()
        .zip(&args.to)
        .map(|(from, to)| Replacement::new(from.as_str(), to.as_str()))
        .collect();
    Ok(LiteralReplace::new(pairs).ignore_case(args.ignore_case))
}

fn rewrite(
    target: &TargetArgs,
    transform: Box<dyn Transform>,
    json: bool,
    out: &mut dyn Write,
) -> Result<()> {
    let summary = rewrite_fs(&target.source_config(), &target.rewrite_config(transform))?;
    print_summary(&summary, json, out)
}

fn print_summary(summary: &RunSummary, json: bool, out: &mut dyn Write) -> Result<()> {
    if json {
        return write_json(summary, out);
    }
    write_human_details(summary, out)?;
    writeln!(out)?;
    let line = verdict(summary);
    let styled = if summary.files_failed > 0 {
        line.red()
    } else if summary.files_modified > 0 {
        line.green()
    } else {
        line.yellow()
    };
    writeln!(out, "{styled}")?;
    Ok(())
}

fn seo(args: &SeoArgs, json: bool, out: &mut dyn Write) -> Result<()> {
    let data = args
        .data
        .clone()
        .unwrap_or_else(|| args.root.join("data").join("movies.json"));
    let catalog = Catalog::load(&data)?;
    let summary = inject_catalog(
        &args.root,
        &catalog,
        &args.origin,
        BackupPolicy::from_no_backup(args.no_backup),
        args.dry_run,
    )?;
    print_summary(&summary, json, out)
}

fn sitemap(args: &SitemapArgs, json: bool, out: &mut dyn Write) -> Result<()> {
    let mut config = SitemapConfig::new(&args.root, args.base_url.as_str());
    config.exclude_files.extend(args.exclude_files.iter().cloned());
    config.exclude_dirs.extend(args.exclude_dirs.iter().cloned());
    config.recursive = args.recursive;
    config.changefreq.clone_from(&args.changefreq);
    config.priority = args.priority;

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| args.root.join("sitemap.xml"));
    let lastmod = chrono::Local::now().date_naive();
    let report = generate_sitemap(&config, lastmod, &output, args.dry_run)?;

    if json {
        writeln!(out, "{}", serde_json::to_string_pretty(&report)?)?;
        return Ok(());
    }
    if report.written {
        writeln!(
            out,
            "{} {} ({} URLs)",
            "Sitemap generated:".green(),
            report.output.display(),
            report.urls.len()
        )?;
    } else {
        for url in &report.urls {
            writeln!(out, "  {url}")?;
        }
        writeln!(
            out,
            "{} {} URL(s) would be written to {}",
            "[DRY RUN]".yellow(),
            report.urls.len(),
            report.output.display()
        )?;
    }
    Ok(())
}

fn poster(args: &PosterArgs, json: bool, out: &mut dyn Write) -> Result<()> {
    let imdb_id = args.imdb_id.trim();
    let client = PosterClient::new()?
        .with_base_url(args.base_url.as_str())
        .with_extractors(default_chain(args.target_height));

    let url = client.fetch_poster(imdb_id)?;
    let fit = match args.max_size_kb {
        Some(max_kb) => fit_quality(&url, max_kb, |u| client.content_length(u)),
        None => QualityFit {
            url,
            size_bytes: None,
            quality: None,
        },
    };

    let saved = if args.download {
        let dest = download_path(&args.output_dir, imdb_id);
        client.download(&fit.url, &dest)?;
        Some(dest)
    } else {
        None
    };

    if json {
        let value = json!({
            "imdb_id": imdb_id,
            "url": fit.url,
            "size_bytes": fit.size_bytes,
            "quality": fit.quality,
            "saved": saved,
        });
        writeln!(out, "{}", serde_json::to_string_pretty(&value)?)?;
        return Ok(());
    }

    writeln!(out, "{} {}", "Poster URL:".green(), fit.url)?;
    if let Some(size) = fit.size_bytes {
        writeln!(out, "Size: {size} bytes")?;
        if let Some(max_kb) = args.max_size_kb
            && !fit.within(max_kb)
        {
            writeln!(
                out,
                "{}",
                format!("Still above {max_kb} KB at the lowest quality").yellow()
            )?;
        }
    }
    if let Some(path) = saved {
        writeln!(out, "Saved as {}", path.display())?;
    }
    Ok(())
}

fn download_path(dir: &Path, imdb_id: &str) -> PathBuf {
    dir.join(format!("{imdb_id}.jpg"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_range() {
        assert!((parse_priority("0.5").unwrap() - 0.5).abs() < f32::EPSILON);
        assert!(parse_priority("1.5").is_err());
        assert!(parse_priority("high").is_err());
    }

    #[test]
    fn test_target_height_flag_without_value() {
        let cli = Cli::try_parse_from(["sitemend", "poster", "tt0109686", "--target-height"]).unwrap();
        let Command::Poster(args) = cli.command else {
            panic!("expected poster command");
        };
        assert_eq!(args.target_height, Some(AmazonSized::DEFAULT_HEIGHT));
    }

    #[test]
    fn test_block_args_are_exclusive() {
        let err = Cli::try_parse_from(["sitemend", "remove", "--block", "a", "--block-file", "b"]);
        assert!(err.is_err());
        let err = Cli::try_parse_from(["sitemend", "remove"]);
        assert!(err.is_err());
    }

    #[test]
    fn test_ext_list_is_split() {
        let cli = Cli::try_parse_from(["sitemend", "clean", "site", "--ext", "html,js", "--ext", "xml"])
            .unwrap();
        let Command::Clean(target) = cli.command else {
            panic!("expected clean command");
        };
        assert_eq!(target.extensions, vec!["html", "js", "xml"]);
        assert_eq!(target.root, PathBuf::from("site"));
    }
}
