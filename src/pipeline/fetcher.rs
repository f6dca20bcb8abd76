//! HTTP fetcher implementation
//!
//! This module performs the single network retrieval of an image:
//! - Building the HTTP client with the configured user agent and timeout
//! - One GET per call, no retries
//! - Streaming the body to disk
//! - Error classification

use crate::config::FetchConfig;
use crate::{FetchError, FetchResult};
use reqwest::{Client, StatusCode};
use std::path::Path;
use std::time::{Duration, Instant};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

/// Builds an HTTP client with proper configuration
///
/// The timeout covers the whole request, body included. Redirects follow
/// reqwest's default policy.
///
/// # Example
///
/// ```no_run
/// use montage_creator::config::FetchConfig;
/// use montage_creator::pipeline::build_http_client;
///
/// let client = build_http_client(&FetchConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &FetchConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.clone())
        .timeout(Duration::from_secs(config.timeout_secs))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Downloads single images to local files
///
/// Cloning is cheap; the underlying connection pool is shared.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Creates a fetcher from fetch settings
    pub fn new(config: &FetchConfig) -> Result<Self, reqwest::Error> {
        Ok(Self::with_client(build_http_client(config)?))
    }

    /// Wraps an already configured client
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    /// Retrieves `url` and streams the body into `destination`
    ///
    /// # Response Handling
    ///
    /// | Condition | Result |
    /// |-----------|--------|
    /// | HTTP 200 | Body written, `Ok(bytes)` |
    /// | Any other status | `FetchError::Status`, nothing written |
    /// | Timeout | `FetchError::Timeout` |
    /// | Other transport error | `FetchError::Http` |
    /// | Local write error | `FetchError::Io` |
    ///
    /// A failure while streaming can leave `destination` partially written.
    pub async fn fetch(&self, url: &str, destination: &Path) -> FetchResult<u64> {
        tracing::debug!("[DOWNLOAD] Starting download for {} -> {}", url, destination.display());

        let start = Instant::now();
        let mut response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| classify_error(url, e))?;

        let status = response.status();
        tracing::debug!(
            "[DOWNLOAD] Received response in {:?}: status={}, content-length={:?}",
            start.elapsed(),
            status,
            response.content_length()
        );

        if status != StatusCode::OK {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let io_error = |source: std::io::Error| FetchError::Io {
            path: destination.to_path_buf(),
            source,
        };

        let mut file = File::create(destination).await.map_err(io_error)?;
        let mut written: u64 = 0;

        while let Some(chunk) = response.chunk().await.map_err(|e| classify_error(url, e))? {
            file.write_all(&chunk).await.map_err(io_error)?;
            written += chunk.len() as u64;
        }
        file.flush().await.map_err(io_error)?;

        tracing::debug!(
            "[DOWNLOAD] Successfully saved {} bytes to {}",
            written,
            destination.display()
        );

        Ok(written)
    }
}

/// Maps a transport error onto the fetch error taxonomy
fn classify_error(url: &str, error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else {
        FetchError::Http {
            url: url.to_string(),
            source: error,
        }
    }
}
