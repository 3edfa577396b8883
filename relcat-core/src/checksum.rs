//! Checksum resolution for release assets
//!
//! Best effort: a digest is looked up in a checksum-carrying sibling asset,
//! optionally computed by streaming the binary, and otherwise left empty.
//! Nothing in here fails a release's inclusion in the catalog.
//!
//! Sibling pairing is fuzzy (name prefix, then substring of the binary's
//! base name). Two binaries sharing a base name prefix can pick up each
//! other's checksum file; an exact manifest mapping would remove that risk
//! if upstream ever publishes one.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::{debug, info};

use crate::error::{CatalogError, Result};
use crate::upstream::{RawAsset, ReleaseTransport};

/// Prefix of every non-empty checksum field
pub const CHECKSUM_PREFIX: &str = "sha256:";

static CHECKSUM_FILE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(sha256|checksum|\.sha256|\.txt)$").expect("valid regex"));

static SHA256_HEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[A-Fa-f0-9]{64}").expect("valid regex"));

static CHECKSUM_FIELD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^sha256:[0-9a-f]{64}$").expect("valid regex"));

/// Whether an asset name looks like a checksum file
pub fn is_checksum_file(name: &str) -> bool {
    CHECKSUM_FILE.is_match(name)
}

/// File name up to its first `.`
pub fn base_name(name: &str) -> &str {
    name.split('.').next().unwrap_or(name)
}

/// Whether a checksum field is empty or well formed
pub fn is_valid_checksum(value: &str) -> bool {
    value.is_empty() || CHECKSUM_FIELD.is_match(value)
}

/// Format a hex digest as a checksum field
pub fn format_checksum(hex_digest: &str) -> String {
    format!("{CHECKSUM_PREFIX}{}", hex_digest.to_ascii_lowercase())
}

/// Choose the checksum-carrying sibling for `asset_name`.
///
/// Candidates whose name starts with the base name win over candidates
/// that merely contain it; ties go to upstream order.
pub fn pick_checksum_sibling<'a>(
    asset_name: &str,
    siblings: &'a [RawAsset],
) -> Option<&'a RawAsset> {
    let base = base_name(asset_name);
    if base.is_empty() {
        return None;
    }

    let candidates = siblings
        .iter()
        .filter(|s| s.name != asset_name && is_checksum_file(&s.name));

    let mut contains_match = None;
    for candidate in candidates {
        if candidate.name.starts_with(base) {
            return Some(candidate);
        }
        if contains_match.is_none() && candidate.name.contains(base) {
            contains_match = Some(candidate);
        }
    }
    contains_match
}

/// Extract a lowercase SHA-256 hex digest from checksum file text.
///
/// A line naming `asset_name` is preferred (multi-entry manifests such as
/// `sha256sum` output); otherwise the first 64-hex run in the text is used.
pub fn extract_sha256(text: &str, asset_name: &str) -> Option<String> {
    let named_line = text
        .lines()
        .filter(|line| !asset_name.is_empty() && line.contains(asset_name))
        .find_map(|line| SHA256_HEX.find(line));

    named_line
        .or_else(|| SHA256_HEX.find(text))
        .map(|m| m.as_str().to_ascii_lowercase())
}

/// Resolves checksums for the assets of one run
pub struct ChecksumResolver<'t> {
    transport: &'t dyn ReleaseTransport,
    compute_locally: bool,
    text_cache: Mutex<HashMap<String, String>>,
}

impl<'t> ChecksumResolver<'t> {
    pub fn new(transport: &'t dyn ReleaseTransport, compute_locally: bool) -> Self {
        Self {
            transport,
            compute_locally,
            text_cache: Mutex::new(HashMap::new()),
        }
    }

    /// Resolve the checksum field for `asset`; empty when unavailable
    pub async fn resolve(&self, asset: &RawAsset, siblings: &[RawAsset]) -> String {
        match self.lookup(asset, siblings).await {
            Ok(hex_digest) => format_checksum(&hex_digest),
            Err(e) => {
                debug!("{}", e);
                String::new()
            }
        }
    }

    async fn lookup(&self, asset: &RawAsset, siblings: &[RawAsset]) -> Result<String> {
        let mut reasons = Vec::new();

        match pick_checksum_sibling(&asset.name, siblings) {
            Some(sibling) => match self.sibling_text(sibling).await {
                Ok(text) => match extract_sha256(&text, &asset.name) {
                    Some(digest) => {
                        debug!("Checksum for {} found in {}", asset.name, sibling.name);
                        return Ok(digest);
                    }
                    None => reasons.push(format!("no digest in {}", sibling.name)),
                },
                Err(e) => {
                    info!("Checksum file {} unavailable: {}", sibling.name, e);
                    reasons.push(e.to_string());
                }
            },
            None => reasons.push("no checksum file".to_string()),
        }

        if self.compute_locally {
            match self.transport.sha256_hex(&asset.browser_download_url).await {
                Ok(digest) if SHA256_HEX.is_match(&digest) && digest.len() == 64 => {
                    debug!("Computed checksum for {}", asset.name);
                    return Ok(digest.to_ascii_lowercase());
                }
                Ok(digest) => reasons.push(format!("unexpected digest '{digest}'")),
                Err(e) => {
                    info!("Could not compute checksum for {}: {}", asset.name, e);
                    reasons.push(e.to_string());
                }
            }
        }

        Err(CatalogError::ChecksumUnavailable {
            asset: asset.name.clone(),
            reason: reasons.join("; "),
        })
    }

    async fn sibling_text(&self, sibling: &RawAsset) -> Result<String> {
        let url = &sibling.browser_download_url;
        if let Some(text) = self.cached_text(url) {
            return Ok(text);
        }

        let text = self.transport.fetch_text(url).await?;
        if let Ok(mut cache) = self.text_cache.lock() {
            cache.insert(url.clone(), text.clone());
        }
        Ok(text)
    }

    fn cached_text(&self, url: &str) -> Option<String> {
        self.text_cache
            .lock()
            .ok()
            .and_then(|cache| cache.get(url).cloned())
    }
}
