//! Archive transfer over HTTP.
//!
//! The downloader only needs "bytes for a URL", so the transport sits behind
//! the [`HttpFetcher`] trait and can be swapped out in tests.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::config::DEFAULT_REQUEST_TIMEOUT_SECS;
use crate::error::{DownloadError, Error, Result};

/// Fetches raw bytes for a URL.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HttpFetcher: Send + Sync {
    /// Fetch the full response body.
    ///
    /// # Errors
    ///
    /// Returns a transfer error if the request fails or the server answers
    /// with a non-success status.
    async fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// [`HttpFetcher`] backed by a `reqwest` client.
#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    client: reqwest::Client,
}

impl ReqwestFetcher {
    /// Create a fetcher with the default timeout.
    pub fn new() -> Result<Self> {
        Self::with_timeout(Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS))
    }

    /// Create a fetcher whose requests give up after `timeout`.
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("beatmanager/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Configuration(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpFetcher for ReqwestFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        debug!("Fetching {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::transfer_failed(url, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Download(DownloadError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            }));
        }

        let data = response
            .bytes()
            .await
            .map_err(|e| Error::transfer_failed(url, format!("Failed to read body: {e}")))?;

        info!("Fetched {} ({} bytes)", url, data.len());
        Ok(data.to_vec())
    }
}
