//! Catalog commands: update, show, check

use anyhow::{bail, Context, Result};
use clap::Args;
use std::path::{Path, PathBuf};
use tabled::{
    settings::{object::Rows, Alignment, Modify, Style},
    Table, Tabled,
};
use tracing::{debug, warn};

use relcat_core::upstream::MAX_PAGE_SIZE;
use relcat_core::{
    Aggregator, AggregatorConfig, Catalog, CatalogStore, FetchMode, HttpTransport, PlatformKey,
    VersionRecord,
};

#[derive(Args, Debug)]
pub struct UpdateArgs {
    /// YAML config file (defaults < file < environment < flags)
    #[clap(long)]
    pub config: Option<PathBuf>,

    /// Upstream repository as owner/repo
    #[clap(long)]
    pub repo: Option<String>,

    /// Catalog file to rewrite
    #[clap(long)]
    pub output: Option<PathBuf>,

    /// Download binaries to compute digests when no checksum file exists
    #[clap(long)]
    pub compute_digests: bool,

    /// Only fetch the newest published release and merge it into the catalog
    #[clap(long)]
    pub latest_only: bool,

    /// Releases per upstream page (1-100)
    #[clap(long)]
    pub page_size: Option<u32>,

    /// Print the resulting catalog instead of writing it
    #[clap(long)]
    pub dry_run: bool,
}

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Catalog file to read
    #[clap(long)]
    pub output: Option<PathBuf>,

    /// Output as JSON
    #[clap(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Catalog file to read
    #[clap(long)]
    pub output: Option<PathBuf>,
}

/// Layer config file, environment and flags over the defaults
fn resolve_config<F>(args: &UpdateArgs, env: F) -> Result<AggregatorConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let base = match &args.config {
        Some(path) => AggregatorConfig::load_from_path(path)?,
        None => AggregatorConfig::default(),
    };
    let mut config = base.with_env_from(env);

    if let Some(repo) = &args.repo {
        config.upstream_source = repo.clone();
    }
    if let Some(output) = &args.output {
        config.output_path = output.clone();
    }
    if args.compute_digests {
        config.compute_digest_locally = true;
    }
    if let Some(page_size) = args.page_size {
        if page_size == 0 || page_size > MAX_PAGE_SIZE {
            warn!("Page size {} out of range, clamping to 1..={}", page_size, MAX_PAGE_SIZE);
        }
        config.page_size = page_size;
    }

    Ok(config)
}

fn catalog_path(output: Option<PathBuf>) -> PathBuf {
    output.unwrap_or_else(|| AggregatorConfig::default().with_env().output_path)
}

pub async fn execute_update(args: UpdateArgs) -> Result<()> {
    let config = resolve_config(&args, |key| std::env::var(key).ok())?;
    debug!(
        "Resolved config: source={} output={} compute_digests={}",
        config.upstream_source,
        config.output_path.display(),
        config.compute_digest_locally
    );

    let transport = HttpTransport::from_config(&config)?;
    let aggregator = Aggregator::new(config, &transport);
    let mode = if args.latest_only {
        FetchMode::LatestOnly
    } else {
        FetchMode::Full
    };

    if args.dry_run {
        let (catalog, summary) = aggregator
            .plan(mode)
            .await
            .context("Failed to build release catalog")?;
        print!("{}", catalog.to_yaml()?);
        eprintln!(
            "Dry run: {} releases; latest={} (draft={}){}",
            summary.release_count,
            summary.latest_version,
            summary.latest_draft,
            if summary.unchanged { ", no changes" } else { "" }
        );
        return Ok(());
    }

    let summary = aggregator
        .run(mode)
        .await
        .context("Failed to update release catalog")?;
    println!("{summary}");
    Ok(())
}

fn load_catalog(path: &Path, strict: bool) -> Result<Catalog> {
    let store = CatalogStore::new(path);
    let loaded = if strict {
        store.load_checked()?
    } else {
        store.load()?
    };
    match loaded {
        Some(catalog) => Ok(catalog),
        None => bail!("No release catalog at {}", path.display()),
    }
}

#[derive(Tabled)]
struct ReleaseRow {
    #[tabled(rename = "Version")]
    version: String,
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Draft")]
    draft: String,
    #[tabled(rename = "Mac")]
    mac: usize,
    #[tabled(rename = "Win")]
    win: usize,
    #[tabled(rename = "Linux")]
    linux: usize,
    #[tabled(rename = "Checksums")]
    checksums: String,
}

impl ReleaseRow {
    fn from_record(record: &VersionRecord, is_latest: bool) -> Self {
        let version = if is_latest {
            format!("{} (latest)", record.version)
        } else {
            record.version.clone()
        };
        Self {
            version,
            date: record.date.clone(),
            draft: if record.draft { "yes" } else { "" }.to_string(),
            mac: record.downloads.bucket(PlatformKey::Mac).len(),
            win: record.downloads.bucket(PlatformKey::Win).len(),
            linux: record.downloads.bucket(PlatformKey::Linux).len(),
            checksums: format!(
                "{}/{}",
                record.checksummed_count(),
                record.downloads.len()
            ),
        }
    }
}

fn release_rows(catalog: &Catalog) -> Vec<ReleaseRow> {
    catalog
        .records()
        .enumerate()
        .map(|(idx, record)| {
            ReleaseRow::from_record(record, idx == 0 && catalog.latest.is_some())
        })
        .collect()
}

pub fn execute_show(args: ShowArgs) -> Result<()> {
    let path = catalog_path(args.output);
    let catalog = load_catalog(&path, false)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&catalog)?);
        return Ok(());
    }

    if catalog.release_count() == 0 {
        println!("\nNo releases in {}.", path.display());
        return Ok(());
    }

    println!("\n{} release(s) in {}:\n", catalog.release_count(), path.display());
    let table = Table::new(release_rows(&catalog))
        .with(Style::rounded())
        .with(Modify::new(Rows::first()).with(Alignment::center()))
        .to_string();
    println!("{table}");
    Ok(())
}

pub fn execute_check(args: CheckArgs) -> Result<()> {
    let path = catalog_path(args.output);
    let catalog = load_catalog(&path, true)
        .with_context(|| format!("Catalog check failed for {}", path.display()))?;

    if catalog.latest.is_none() && !catalog.previous.is_empty() {
        bail!("{}: previous releases listed without a latest", path.display());
    }

    println!(
        "{} is consistent ({} releases)",
        path.display(),
        catalog.release_count()
    );
    Ok(())
}
