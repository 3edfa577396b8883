//! Error types for a catalog run with clear, actionable messages

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while aggregating and persisting the release catalog
#[derive(Error, Debug)]
pub enum CatalogError {
    /// A mandatory upstream fetch failed (network, timeout, non-2xx, bad body)
    #[error("Upstream request failed for {url}: {reason}")]
    Transport { url: String, reason: String },

    /// No checksum could be resolved for an asset.
    ///
    /// Never escapes the checksum resolver; it is logged and turned into an
    /// empty checksum field.
    #[error("Checksum unavailable for {asset}: {reason}")]
    ChecksumUnavailable { asset: String, reason: String },

    /// No upstream record satisfies the selection policy
    #[error("No published release found upstream; the catalog was left untouched")]
    NoPublishedRelease,

    /// The catalog could not be written
    #[error("Failed to write release catalog to {path}")]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The persisted catalog exists but is unreadable or inconsistent
    #[error("Failed to read release catalog from {path}: {reason}")]
    CatalogRead { path: PathBuf, reason: String },

    /// Invalid configuration
    #[error("Invalid configuration: {reason}")]
    Config { reason: String },
}

impl CatalogError {
    pub(crate) fn transport(url: impl Into<String>, reason: impl ToString) -> Self {
        CatalogError::Transport {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    /// Whether this error aborts a run.
    ///
    /// Only `ChecksumUnavailable` is recoverable.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, CatalogError::ChecksumUnavailable { .. })
    }
}

pub type Result<T, E = CatalogError> = std::result::Result<T, E>;
