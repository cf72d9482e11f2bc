//! Page fetch strategies
//!
//! This module defines the [`PageFetcher`] capability used by the crawl
//! frontier, and its lightweight HTTP-only implementation:
//! - Building HTTP clients with proper user agent strings
//! - One GET per page, bounded by the per-page timeout
//! - Byte count from `Content-Length` (body length when absent)
//! - DOM size from a linear markup scan, execution time from request duration
//! - Error classification into [`FetchError`]

use crate::config::UserAgentConfig;
use crate::crawler::parser::count_markup_tags;
use crate::FetchError;
use async_trait::async_trait;
use reqwest::{header::CONTENT_LENGTH, redirect::Policy, Client};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use url::Url;

/// Measurements for one successfully fetched page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageResult {
    /// The URL that was requested
    pub url: Url,
    pub byte_count: u64,
    pub dom_node_count: u64,
    pub execution_time_ms: u64,
}

/// A fetched page: its measurements plus what the frontier needs to continue
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub result: PageResult,

    /// URL after redirects
    pub final_url: Url,

    /// Markup used for link extraction (raw body or rendered DOM)
    pub body: String,

    /// PNG snapshot, only when requested and supported
    pub snapshot: Option<Vec<u8>>,
}

/// Capability to fetch and measure a single page
///
/// Every call is independent of crawl state. Implementations never retry.
/// When [`PageFetcher::page_timeout`] is `Some`, the frontier enforces it
/// around each call; fetchers that queue for a shared session return `None`
/// and bound the page load themselves once the session is held, so time
/// spent waiting on other scans is never charged to this page.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Upper bound the frontier places on a single fetch
    fn page_timeout(&self) -> Option<Duration>;

    /// Fetches `url`; `capture_snapshot` asks for a visual snapshot of the page
    async fn fetch(&self, url: &Url, capture_snapshot: bool) -> Result<FetchedPage, FetchError>;

    /// Releases external resources (browser sessions)
    async fn shutdown(&self) {}
}

/// Builds an HTTP client with proper configuration
///
/// Redirects are followed (up to 10 hops) so the final URL can serve as proof
/// of visit. Compressed responses are decoded transparently.
///
/// # Example
///
/// ```no_run
/// use greenscan::config::UserAgentConfig;
/// use greenscan::crawler::build_http_client;
/// use std::time::Duration;
///
/// let client = build_http_client(&UserAgentConfig::default(), Duration::from_secs(10)).unwrap();
/// ```
pub fn build_http_client(config: &UserAgentConfig, timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.header_value())
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .redirect(Policy::limited(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Lightweight fetch strategy: plain HTTP, no rendering, no snapshots
pub struct HttpFetcher {
    client: Client,
    timeout: Duration,
}

impl HttpFetcher {
    pub fn new(config: &UserAgentConfig, timeout: Duration) -> Result<Self, FetchError> {
        let client = build_http_client(config, timeout)
            .map_err(|e| FetchError::Setup(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { client, timeout })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    fn name(&self) -> &'static str {
        "http"
    }

    fn page_timeout(&self) -> Option<Duration> {
        Some(self.timeout)
    }

    async fn fetch(&self, url: &Url, _capture_snapshot: bool) -> Result<FetchedPage, FetchError> {
        let start = Instant::now();

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| classify_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let final_url = response.url().clone();
        let content_length = response
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok());

        let body = response.text().await.map_err(|e| classify_error(url, e))?;
        let elapsed = start.elapsed();

        let byte_count = content_length.unwrap_or(body.len() as u64);
        let dom_node_count = count_markup_tags(&body);

        tracing::debug!(
            url = %url,
            bytes = byte_count,
            tags = dom_node_count,
            ms = elapsed.as_millis() as u64,
            "fetched page"
        );

        Ok(FetchedPage {
            result: PageResult {
                url: url.clone(),
                byte_count,
                dom_node_count,
                execution_time_ms: elapsed.as_millis() as u64,
            },
            final_url,
            body,
            snapshot: None,
        })
    }
}

/// Maps a reqwest error onto the fetch error taxonomy
fn classify_error(url: &Url, e: reqwest::Error) -> FetchError {
    if e.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else if e.is_decode() || e.is_body() {
        FetchError::Content {
            url: url.to_string(),
            message: e.to_string(),
        }
    } else {
        FetchError::Network {
            url: url.to_string(),
            message: e.to_string(),
        }
    }
}
