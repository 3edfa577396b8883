//! Upstream transport trait - abstraction over the releases API
//!
//! Every network read a run performs goes through this trait:
//! - HTTP (reqwest, see `HttpTransport`)
//! - In-memory fakes (tests)

use async_trait::async_trait;

use super::types::{RawRelease, ReleasePage};
use crate::error::Result;

/// Trait for upstream release sources
///
/// Implementations perform exactly one attempt per call. A failure is
/// reported as `CatalogError::Transport`; retry policy, if any, belongs to
/// the caller (and there is none today).
#[async_trait]
pub trait ReleaseTransport: Send + Sync {
    /// Fetch one page of the release list
    async fn fetch_page(&self, url: &str) -> Result<ReleasePage>;

    /// Fetch a single release record.
    ///
    /// Returns `Ok(None)` when upstream reports that the record does not
    /// exist (HTTP 404).
    async fn fetch_release(&self, url: &str) -> Result<Option<RawRelease>>;

    /// Fetch a small text document (checksum files)
    async fn fetch_text(&self, url: &str) -> Result<String>;

    /// Stream a binary artifact and return its lowercase hex SHA-256
    async fn sha256_hex(&self, url: &str) -> Result<String>;

    /// Transport identifier for logging
    fn name(&self) -> &'static str;
}
