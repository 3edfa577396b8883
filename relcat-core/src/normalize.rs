//! Conversion of raw upstream releases into catalog records

use tracing::debug;

use crate::checksum::ChecksumResolver;
use crate::classify::ClassificationTable;
use crate::config::AggregatorConfig;
use crate::model::{DownloadEntry, Downloads, VersionRecord};
use crate::upstream::RawRelease;

/// First non-empty timestamp, cut down to its `YYYY-MM-DD` prefix
pub fn release_date(release: &RawRelease) -> String {
    [
        &release.published_at,
        &release.updated_at,
        &release.created_at,
    ]
    .into_iter()
    .find(|ts| !ts.is_empty())
    .map(|ts| ts.chars().take(10).collect())
    .unwrap_or_default()
}

/// Builds `VersionRecord`s for one run
pub struct Normalizer<'a> {
    config: &'a AggregatorConfig,
    table: &'a ClassificationTable,
    resolver: &'a ChecksumResolver<'a>,
}

impl<'a> Normalizer<'a> {
    pub fn new(
        config: &'a AggregatorConfig,
        table: &'a ClassificationTable,
        resolver: &'a ChecksumResolver<'a>,
    ) -> Self {
        Self {
            config,
            table,
            resolver,
        }
    }

    /// Notes link: listing page for drafts, details page otherwise
    pub fn notes_url(&self, release: &RawRelease) -> String {
        if release.draft {
            self.config.releases_page_url()
        } else if !release.html_url.is_empty() {
            release.html_url.clone()
        } else {
            self.config.tag_page_url(&release.tag_name)
        }
    }

    /// Classify assets and resolve their checksums, keeping upstream order
    pub async fn downloads(&self, release: &RawRelease) -> Downloads {
        let mut downloads = Downloads::default();

        for asset in &release.assets {
            let Some(key) = self.table.classify(&asset.name) else {
                debug!("Skipping unclassified asset {}", asset.name);
                continue;
            };

            let checksum = self.resolver.resolve(asset, &release.assets).await;
            downloads.bucket_mut(key).push(DownloadEntry {
                label: ClassificationTable::label(key, &asset.name),
                url: asset.browser_download_url.clone(),
                checksum,
            });
        }

        downloads
    }

    pub async fn normalize(&self, release: &RawRelease) -> VersionRecord {
        VersionRecord {
            version: release.tag_name.clone(),
            date: release_date(release),
            notes_url: self.notes_url(release),
            downloads: self.downloads(release).await,
            draft: release.draft,
        }
    }
}
