//! End-to-end catalog update
//!
//! A run fetches upstream, builds the new catalog in memory and only then
//! replaces the file on disk. Any fatal error leaves the previous file as
//! it was.

use std::fmt;
use std::path::PathBuf;
use tracing::{info, warn};

use crate::checksum::ChecksumResolver;
use crate::classify::ClassificationTable;
use crate::config::AggregatorConfig;
use crate::error::{CatalogError, Result};
use crate::model::Catalog;
use crate::normalize::Normalizer;
use crate::reconcile::{assemble, drop_untagged, promote, select_latest};
use crate::store::CatalogStore;
use crate::upstream::{fetch_all_releases, latest_release_url, releases_url, ReleaseTransport};

/// How much of upstream a run looks at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchMode {
    /// Rebuild the catalog from every upstream release
    #[default]
    Full,
    /// Fetch only the newest published release and merge it into the
    /// persisted catalog
    LatestOnly,
}

/// Outcome of a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub output_path: PathBuf,
    pub release_count: usize,
    pub latest_version: String,
    pub latest_draft: bool,
    /// The new catalog equals the one already on disk
    pub unchanged: bool,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Updated {} with {} releases; latest={} (draft={})",
            self.output_path.display(),
            self.release_count,
            self.latest_version,
            self.latest_draft
        )
    }
}

pub struct Aggregator<'t> {
    config: AggregatorConfig,
    transport: &'t dyn ReleaseTransport,
    table: &'static ClassificationTable,
}

impl<'t> Aggregator<'t> {
    pub fn new(config: AggregatorConfig, transport: &'t dyn ReleaseTransport) -> Self {
        Self {
            config,
            transport,
            table: ClassificationTable::standard(),
        }
    }

    pub fn config(&self) -> &AggregatorConfig {
        &self.config
    }

    pub fn store(&self) -> CatalogStore {
        CatalogStore::new(&self.config.output_path)
    }

    /// Build the new catalog and write it
    pub async fn run(&self, mode: FetchMode) -> Result<RunSummary> {
        let (catalog, summary) = self.plan(mode).await?;

        if summary.unchanged {
            info!(
                "Catalog content unchanged, rewriting {}",
                summary.output_path.display()
            );
        }
        self.store().save(&catalog)?;

        info!("{}", summary);
        Ok(summary)
    }

    /// Build the new catalog without touching the file
    pub async fn plan(&self, mode: FetchMode) -> Result<(Catalog, RunSummary)> {
        self.config.validate()?;

        info!(
            "Aggregating releases of {} ({:?}, via {})",
            self.config.upstream_source,
            mode,
            self.transport.name()
        );

        let (catalog, persisted) = match mode {
            FetchMode::Full => {
                let catalog = self.build_full().await?;
                (catalog, self.load_for_comparison())
            }
            FetchMode::LatestOnly => {
                let persisted = self.store().load()?;
                let catalog = self.build_latest_only(persisted.clone()).await?;
                (catalog, persisted)
            }
        };

        let latest = catalog
            .latest
            .as_ref()
            .ok_or(CatalogError::NoPublishedRelease)?;

        let summary = RunSummary {
            output_path: self.config.output_path.clone(),
            release_count: catalog.release_count(),
            latest_version: latest.version.clone(),
            latest_draft: latest.draft,
            unchanged: persisted.as_ref() == Some(&catalog),
        };

        Ok((catalog, summary))
    }

    async fn build_full(&self) -> Result<Catalog> {
        let url = releases_url(
            &self.config.api_base,
            &self.config.upstream_source,
            self.config.page_size,
        );
        let releases = drop_untagged(fetch_all_releases(self.transport, &url).await?);

        let latest_idx = select_latest(&releases).ok_or(CatalogError::NoPublishedRelease)?;

        let resolver = ChecksumResolver::new(self.transport, self.config.compute_digest_locally);
        let normalizer = Normalizer::new(&self.config, self.table, &resolver);

        let mut latest = None;
        let mut others = Vec::with_capacity(releases.len().saturating_sub(1));
        for (idx, release) in releases.iter().enumerate() {
            let record = normalizer.normalize(release).await;
            if idx == latest_idx {
                latest = Some(record);
            } else {
                others.push(record);
            }
        }

        let latest = latest.ok_or(CatalogError::NoPublishedRelease)?;
        info!(
            "Selected {} as latest (draft={}) out of {} releases",
            latest.version,
            latest.draft,
            releases.len()
        );

        Ok(assemble(latest, others))
    }

    async fn build_latest_only(&self, persisted: Option<Catalog>) -> Result<Catalog> {
        let url = latest_release_url(&self.config.api_base, &self.config.upstream_source);
        let release = self
            .transport
            .fetch_release(&url)
            .await?
            .filter(|r| !r.tag_name.is_empty())
            .ok_or(CatalogError::NoPublishedRelease)?;

        let resolver = ChecksumResolver::new(self.transport, self.config.compute_digest_locally);
        let normalizer = Normalizer::new(&self.config, self.table, &resolver);
        let record = normalizer.normalize(&release).await;

        info!("Merging {} into the persisted catalog", record.version);
        Ok(promote(persisted.unwrap_or_default(), record))
    }

    fn load_for_comparison(&self) -> Option<Catalog> {
        match self.store().load() {
            Ok(catalog) => catalog,
            Err(e) => {
                warn!("Ignoring unreadable persisted catalog: {}", e);
                None
            }
        }
    }
}
