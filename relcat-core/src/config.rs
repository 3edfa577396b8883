//! Run configuration
//!
//! ## Configuration Sources (in precedence order)
//!
//! 1. CLI flags (applied by the caller)
//! 2. Environment: `GH_REPO`, `GG_YAML_PATH`, `GITHUB_TOKEN` / `GH_TOKEN`,
//!    `RELCAT_COMPUTE_DIGESTS`
//! 3. Optional YAML config file
//! 4. Built-in defaults
//!
//! The credential is only ever taken from the environment or the caller,
//! never from (or into) a config file.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{CatalogError, Result};

pub const ENV_REPO: &str = "GH_REPO";
pub const ENV_OUTPUT_PATH: &str = "GG_YAML_PATH";
pub const ENV_TOKEN: &str = "GITHUB_TOKEN";
pub const ENV_TOKEN_FALLBACK: &str = "GH_TOKEN";
pub const ENV_COMPUTE_DIGESTS: &str = "RELCAT_COMPUTE_DIGESTS";

/// Configuration for one aggregation run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregatorConfig {
    /// Upstream repository, `owner/repo`
    #[serde(default = "default_upstream_source")]
    pub upstream_source: String,

    /// Catalog file to read and replace
    #[serde(default = "default_output_path")]
    pub output_path: PathBuf,

    /// Bearer credential forwarded to upstream
    #[serde(skip)]
    pub credential: Option<String>,

    /// Stream binaries to compute digests when no checksum file exists
    #[serde(default)]
    pub compute_digest_locally: bool,

    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Base for release page URLs
    #[serde(default = "default_web_base")]
    pub web_base: String,

    #[serde(default = "default_page_size")]
    pub page_size: u32,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Per-chunk read timeout while streaming a binary for its digest
    #[serde(default = "default_digest_read_timeout")]
    pub digest_read_timeout_secs: u64,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            upstream_source: default_upstream_source(),
            output_path: default_output_path(),
            credential: None,
            compute_digest_locally: false,
            api_base: default_api_base(),
            web_base: default_web_base(),
            page_size: default_page_size(),
            request_timeout_secs: default_request_timeout(),
            digest_read_timeout_secs: default_digest_read_timeout(),
        }
    }
}

fn default_upstream_source() -> String {
    "Monash-FIT3170/2025W1-Commitment".to_string()
}

fn default_output_path() -> PathBuf {
    PathBuf::from("docs/data/releases.yml")
}

fn default_api_base() -> String {
    "https://api.github.com".to_string()
}

fn default_web_base() -> String {
    "https://github.com".to_string()
}

fn default_page_size() -> u32 {
    100
}

fn default_request_timeout() -> u64 {
    30
}

fn default_digest_read_timeout() -> u64 {
    60
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

impl AggregatorConfig {
    /// Load a YAML config file, falling back to defaults for absent keys
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| CatalogError::Config {
            reason: format!("Failed to read config file {}: {e}", path.display()),
        })?;

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        serde_yaml_ng::from_str(&content).map_err(|e| CatalogError::Config {
            reason: format!("Failed to parse config file {}: {e}", path.display()),
        })
    }

    /// Overlay values from the process environment
    pub fn with_env(self) -> Self {
        self.with_env_from(|key| std::env::var(key).ok())
    }

    /// Overlay values from an arbitrary variable lookup
    pub fn with_env_from<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(repo) = non_empty(ENV_REPO) {
            self.upstream_source = repo.trim().to_string();
        }
        if let Some(path) = non_empty(ENV_OUTPUT_PATH) {
            self.output_path = PathBuf::from(path);
        }
        if let Some(token) = non_empty(ENV_TOKEN).or_else(|| non_empty(ENV_TOKEN_FALLBACK)) {
            self.credential = Some(token);
        }
        if let Some(flag) = non_empty(ENV_COMPUTE_DIGESTS) {
            self.compute_digest_locally = parse_flag(&flag);
        }
        self
    }

    /// Reject configurations a run cannot use
    pub fn validate(&self) -> Result<()> {
        let mut parts = self.upstream_source.split('/');
        let owner = parts.next().unwrap_or_default();
        let repo = parts.next().unwrap_or_default();
        if owner.is_empty() || repo.is_empty() || parts.next().is_some() {
            return Err(CatalogError::Config {
                reason: format!(
                    "upstream source must be 'owner/repo', got '{}'",
                    self.upstream_source
                ),
            });
        }

        if self.output_path.as_os_str().is_empty() {
            return Err(CatalogError::Config {
                reason: "output path is empty".to_string(),
            });
        }

        if self.request_timeout_secs == 0 || self.digest_read_timeout_secs == 0 {
            return Err(CatalogError::Config {
                reason: "timeouts must be at least one second".to_string(),
            });
        }

        Ok(())
    }

    /// Release listing page, used for drafts
    pub fn releases_page_url(&self) -> String {
        format!(
            "{}/{}/releases",
            self.web_base.trim_end_matches('/'),
            self.upstream_source
        )
    }

    /// Per-tag release page
    pub fn tag_page_url(&self, tag: &str) -> String {
        format!("{}/tag/{}", self.releases_page_url(), tag)
    }
}
