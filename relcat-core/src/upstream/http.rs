//! HTTP transport for the upstream releases API
//!
//! Plain GET requests with an optional bearer credential. Pagination
//! continuation is read from the `Link` response header. Binary digests are
//! streamed chunk by chunk so memory use does not depend on artifact size.

use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION, LINK};
use reqwest::{Response, StatusCode};
use sha2::{Digest, Sha256};
use std::time::Duration;
use tracing::{debug, trace};

use super::link::next_link;
use super::transport::ReleaseTransport;
use super::types::{RawRelease, ReleasePage};
use crate::config::AggregatorConfig;
use crate::error::{CatalogError, Result};

const GITHUB_JSON: &str = "application/vnd.github+json";

/// reqwest-backed transport
pub struct HttpTransport {
    client: reqwest::Client,
    credential: Option<String>,
    request_timeout: Duration,
    digest_read_timeout: Duration,
}

impl HttpTransport {
    /// Create a transport with explicit settings
    pub fn new(
        credential: Option<String>,
        request_timeout: Duration,
        digest_read_timeout: Duration,
    ) -> Result<Self> {
        // No client-wide total timeout: digest downloads may legitimately
        // run long and are bounded per chunk instead.
        let client = reqwest::Client::builder()
            .user_agent(concat!("relcat/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(request_timeout)
            .build()
            .map_err(|e| CatalogError::Config {
                reason: format!("Failed to create HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            credential: credential.filter(|c| !c.is_empty()),
            request_timeout,
            digest_read_timeout,
        })
    }

    /// Create a transport from run configuration
    pub fn from_config(config: &AggregatorConfig) -> Result<Self> {
        Self::new(
            config.credential.clone(),
            Duration::from_secs(config.request_timeout_secs),
            Duration::from_secs(config.digest_read_timeout_secs),
        )
    }

    fn request(&self, url: &str) -> reqwest::RequestBuilder {
        let builder = self.client.get(url).header(ACCEPT, GITHUB_JSON);
        match &self.credential {
            Some(token) => builder.header(AUTHORIZATION, format!("Bearer {token}")),
            None => builder,
        }
    }

    /// Send a GET bounded by the request timeout
    async fn get(&self, url: &str) -> Result<Response> {
        debug!("GET {}", url);
        self.request(url)
            .timeout(self.request_timeout)
            .send()
            .await
            .map_err(|e| CatalogError::transport(url, describe(&e)))
    }

    async fn text_body(url: &str, response: Response) -> Result<String> {
        ensure_success(url, &response)?;
        response
            .text()
            .await
            .map_err(|e| CatalogError::transport(url, describe(&e)))
    }
}

fn ensure_success(url: &str, response: &Response) -> Result<()> {
    let status = response.status();
    if status.is_success() {
        Ok(())
    } else {
        Err(CatalogError::transport(url, format!("HTTP {status}")))
    }
}

fn describe(error: &reqwest::Error) -> String {
    if error.is_timeout() {
        format!("timed out: {error}")
    } else if error.is_connect() {
        format!("connection failed: {error}")
    } else {
        error.to_string()
    }
}

#[async_trait]
impl ReleaseTransport for HttpTransport {
    async fn fetch_page(&self, url: &str) -> Result<ReleasePage> {
        let response = self.get(url).await?;
        let next = response
            .headers()
            .get(LINK)
            .and_then(|value| value.to_str().ok())
            .and_then(next_link);

        let body = Self::text_body(url, response).await?;
        let releases: Vec<RawRelease> = serde_json::from_str(&body).map_err(|e| {
            CatalogError::transport(url, format!("response is not a release list: {e}"))
        })?;

        debug!(
            "Fetched {} releases from {} (next page: {})",
            releases.len(),
            url,
            next.is_some()
        );
        Ok(ReleasePage { releases, next })
    }

    async fn fetch_release(&self, url: &str) -> Result<Option<RawRelease>> {
        let response = self.get(url).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let body = Self::text_body(url, response).await?;
        let release = serde_json::from_str(&body).map_err(|e| {
            CatalogError::transport(url, format!("response is not a release: {e}"))
        })?;
        Ok(Some(release))
    }

    async fn fetch_text(&self, url: &str) -> Result<String> {
        let response = self.get(url).await?;
        Self::text_body(url, response).await
    }

    async fn sha256_hex(&self, url: &str) -> Result<String> {
        let mut response = tokio::time::timeout(self.digest_read_timeout, self.request(url).send())
            .await
            .map_err(|_| CatalogError::transport(url, "timed out waiting for response"))?
            .map_err(|e| CatalogError::transport(url, describe(&e)))?;
        ensure_success(url, &response)?;

        let mut hasher = Sha256::new();
        let mut total: u64 = 0;
        loop {
            let chunk = tokio::time::timeout(self.digest_read_timeout, response.chunk())
                .await
                .map_err(|_| CatalogError::transport(url, "timed out reading body"))?
                .map_err(|e| CatalogError::transport(url, describe(&e)))?;

            match chunk {
                Some(bytes) => {
                    total += bytes.len() as u64;
                    hasher.update(&bytes);
                }
                None => break,
            }
        }

        trace!("Hashed {} bytes from {}", total, url);
        Ok(hex::encode(hasher.finalize()))
    }

    fn name(&self) -> &'static str {
        "http"
    }
}
