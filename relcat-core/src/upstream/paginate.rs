//! Pagination over the release list
//!
//! Follows `rel="next"` links until upstream stops supplying one. The
//! result is all-or-nothing: a failure on any page discards the pages
//! already fetched.

use std::collections::HashSet;
use tracing::{debug, info};

use super::transport::ReleaseTransport;
use super::types::RawRelease;
use crate::error::{CatalogError, Result};

/// Upstream page size cap
pub const MAX_PAGE_SIZE: u32 = 100;

/// URL of the first release-list page
pub fn releases_url(api_base: &str, upstream_source: &str, page_size: u32) -> String {
    let per_page = page_size.clamp(1, MAX_PAGE_SIZE);
    format!(
        "{}/repos/{}/releases?per_page={}",
        api_base.trim_end_matches('/'),
        upstream_source,
        per_page
    )
}

/// URL of the newest published release
pub fn latest_release_url(api_base: &str, upstream_source: &str) -> String {
    format!(
        "{}/repos/{}/releases/latest",
        api_base.trim_end_matches('/'),
        upstream_source
    )
}

/// Fetch every page starting at `first_url`, in upstream order
pub async fn fetch_all_releases(
    transport: &dyn ReleaseTransport,
    first_url: &str,
) -> Result<Vec<RawRelease>> {
    let mut releases = Vec::new();
    let mut visited = HashSet::new();
    let mut next = Some(first_url.to_string());
    let mut pages = 0usize;

    while let Some(url) = next.take() {
        if !visited.insert(url.clone()) {
            return Err(CatalogError::transport(
                url,
                "pagination cycle: continuation link points to an already fetched page",
            ));
        }

        let page = transport.fetch_page(&url).await?;
        pages += 1;
        debug!("Page {}: {} releases", pages, page.releases.len());

        releases.extend(page.releases);
        next = page.next;
    }

    info!(
        "Fetched {} releases across {} page(s) via {}",
        releases.len(),
        pages,
        transport.name()
    );
    Ok(releases)
}
