//! Shared helpers for relcat-core integration tests
//!
//! `FakeUpstream` stands in for the releases API: paginated release lists,
//! the latest-release endpoint, checksum files and binaries are all served
//! from memory, and every request is recorded.

#![allow(dead_code)]

use async_trait::async_trait;
use relcat_core::error::{CatalogError, Result};
use relcat_core::upstream::{RawAsset, RawRelease, ReleasePage, ReleaseTransport};
use relcat_core::AggregatorConfig;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Mutex, Once};

pub const API: &str = "https://api.test";
pub const SOURCE: &str = "acme/widgets";

static INIT: Once = Once::new();

pub fn init_test_logging() {
    INIT.call_once(|| {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

        let _ = tracing_subscriber::registry()
            .with(tracing_subscriber::fmt::layer().with_test_writer())
            .with(tracing_subscriber::filter::EnvFilter::from_default_env())
            .try_init();
    });
}

/// Config pointing at the fake upstream and writing into `dir`
pub fn test_config(dir: &Path) -> AggregatorConfig {
    AggregatorConfig {
        upstream_source: SOURCE.to_string(),
        output_path: dir.join("docs/data/releases.yml"),
        api_base: API.to_string(),
        page_size: 2,
        ..Default::default()
    }
}

pub fn first_page_url() -> String {
    format!("{API}/repos/{SOURCE}/releases?per_page=2")
}

pub fn page_url(n: usize) -> String {
    format!("{API}/repos/{SOURCE}/releases?per_page=2&page={n}")
}

pub fn latest_url() -> String {
    format!("{API}/repos/{SOURCE}/releases/latest")
}

pub fn asset(name: &str) -> RawAsset {
    RawAsset::new(name, format!("https://dl.test/{name}"))
}

pub fn published(tag: &str, published_at: &str, assets: Vec<RawAsset>) -> RawRelease {
    RawRelease {
        tag_name: tag.to_string(),
        published_at: published_at.to_string(),
        created_at: published_at.to_string(),
        html_url: format!("https://github.com/{SOURCE}/releases/tag/{tag}"),
        assets,
        ..Default::default()
    }
}

pub fn draft(tag: &str, updated_at: &str) -> RawRelease {
    RawRelease {
        tag_name: tag.to_string(),
        draft: true,
        updated_at: updated_at.to_string(),
        created_at: updated_at.to_string(),
        html_url: format!("https://github.com/{SOURCE}/releases/tag/untagged-{tag}"),
        ..Default::default()
    }
}

pub fn sha256_of(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

#[derive(Default)]
pub struct FakeUpstream {
    pages: HashMap<String, ReleasePage>,
    latest: Option<RawRelease>,
    texts: HashMap<String, String>,
    binaries: HashMap<String, Vec<u8>>,
    failing: Vec<String>,
    requests: Mutex<Vec<String>>,
}

impl FakeUpstream {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `releases` split into pages of `per_page`, linked by `next`
    pub fn with_releases(mut self, releases: Vec<RawRelease>, per_page: usize) -> Self {
        let chunks: Vec<Vec<RawRelease>> = if releases.is_empty() {
            vec![Vec::new()]
        } else {
            releases.chunks(per_page).map(|c| c.to_vec()).collect()
        };
        let count = chunks.len();

        for (idx, chunk) in chunks.into_iter().enumerate() {
            let url = if idx == 0 {
                first_page_url()
            } else {
                page_url(idx + 1)
            };
            let next = (idx + 1 < count).then(|| page_url(idx + 2));
            self.pages.insert(
                url,
                ReleasePage {
                    releases: chunk,
                    next,
                },
            );
        }
        self
    }

    pub fn with_latest(mut self, release: RawRelease) -> Self {
        self.latest = Some(release);
        self
    }

    pub fn with_text(mut self, asset_name: &str, text: &str) -> Self {
        self.texts
            .insert(format!("https://dl.test/{asset_name}"), text.to_string());
        self
    }

    pub fn with_binary(mut self, asset_name: &str, data: &[u8]) -> Self {
        self.binaries
            .insert(format!("https://dl.test/{asset_name}"), data.to_vec());
        self
    }

    /// Make every request to `url` fail
    pub fn failing_on(mut self, url: impl Into<String>) -> Self {
        self.failing.push(url.into());
        self
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self, url: &str) -> usize {
        self.requests().iter().filter(|u| u.as_str() == url).count()
    }

    fn record(&self, url: &str) -> Result<()> {
        self.requests.lock().unwrap().push(url.to_string());
        if self.failing.iter().any(|u| u == url) {
            return Err(CatalogError::Transport {
                url: url.to_string(),
                reason: "HTTP 502 Bad Gateway".to_string(),
            });
        }
        Ok(())
    }

    fn not_found(url: &str) -> CatalogError {
        CatalogError::Transport {
            url: url.to_string(),
            reason: "HTTP 404 Not Found".to_string(),
        }
    }
}

#[async_trait]
impl ReleaseTransport for FakeUpstream {
    async fn fetch_page(&self, url: &str) -> Result<ReleasePage> {
        self.record(url)?;
        self.pages.get(url).cloned().ok_or_else(|| Self::not_found(url))
    }

    async fn fetch_release(&self, url: &str) -> Result<Option<RawRelease>> {
        self.record(url)?;
        if url == latest_url() {
            Ok(self.latest.clone())
        } else {
            Ok(None)
        }
    }

    async fn fetch_text(&self, url: &str) -> Result<String> {
        self.record(url)?;
        self.texts.get(url).cloned().ok_or_else(|| Self::not_found(url))
    }

    async fn sha256_hex(&self, url: &str) -> Result<String> {
        self.record(url)?;
        self.binaries
            .get(url)
            .map(|data| sha256_of(data))
            .ok_or_else(|| Self::not_found(url))
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}
