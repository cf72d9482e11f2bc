//! Full-rendering fetch strategy
//!
//! Drives a headless browser over WebDriver. Each page is loaded, allowed to
//! reach network idle, and then measured from inside the rendered document:
//! - DOM size from the live element count
//! - Bytes from resource/navigation timing entries, taking the larger of
//!   transfer size and encoded body size so compressed transfers are not
//!   undercounted
//! - Execution time as load-to-idle wall clock
//!
//! The first page of a scan is also captured as a full-document screenshot:
//! the window is stretched to the document height (capped at
//! [`SNAPSHOT_MAX_HEIGHT`]) for the capture and restored afterwards. If the
//! resize is refused, the viewport is captured instead.
//!
//! One WebDriver session is shared by every scan using this fetcher; page
//! loads are serialized through an async mutex so measurements never mix.
//! The page timeout starts once the session is held, so waiting behind
//! another scan's page load never counts against this page.

use crate::config::UserAgentConfig;
use crate::crawler::fetcher::{FetchedPage, PageFetcher, PageResult};
use crate::FetchError;
use async_trait::async_trait;
use fantoccini::{Client, ClientBuilder};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use url::Url;

/// Interval between resource-count polls while waiting for network idle
const IDLE_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Consecutive unchanged polls that count as network idle
const IDLE_STABLE_POLLS: u32 = 2;

/// Upper bound on the idle wait after the load event
const IDLE_MAX_WAIT: Duration = Duration::from_secs(10);

/// Tallest window used for a full-document snapshot, in CSS pixels
const SNAPSHOT_MAX_HEIGHT: u32 = 16_384;

const DOCUMENT_HEIGHT_SCRIPT: &str =
    "return Math.max(document.body.scrollHeight, document.documentElement.scrollHeight);";

const RESOURCE_COUNT_SCRIPT: &str = "return performance.getEntriesByType('resource').length;";

const MEASURE_SCRIPT: &str = r#"
const entries = performance.getEntriesByType('resource')
    .concat(performance.getEntriesByType('navigation'));
let transfer = 0;
let encoded = 0;
for (const entry of entries) {
    transfer += entry.transferSize || 0;
    encoded += entry.encodedBodySize || 0;
}
const nav = performance.getEntriesByType('navigation')[0];
return {
    transfer: transfer,
    encoded: encoded,
    status: (nav && nav.responseStatus) || 0,
    nodes: document.getElementsByTagName('*').length
};
"#;

/// Values reported by [`MEASURE_SCRIPT`]
#[derive(Debug, Deserialize)]
struct PageProbe {
    transfer: f64,
    encoded: f64,
    status: u16,
    nodes: u64,
}

impl PageProbe {
    fn byte_count(&self) -> u64 {
        self.transfer.max(self.encoded).max(0.0) as u64
    }
}

/// Browser-rendered fetch strategy backed by a WebDriver session
pub struct BrowserFetcher {
    client: Mutex<Client>,
    timeout: Duration,
}

impl BrowserFetcher {
    /// Opens a headless session against the WebDriver server at `webdriver_url`
    pub async fn connect(
        webdriver_url: &str,
        user_agent: &UserAgentConfig,
        timeout: Duration,
    ) -> Result<Self, FetchError> {
        let mut builder = ClientBuilder::native();
        builder.capabilities(headless_capabilities(user_agent));
        let client = builder
            .connect(webdriver_url)
            .await
            .map_err(|e| {
                FetchError::Setup(format!(
                    "failed to connect to WebDriver at {}: {}",
                    webdriver_url, e
                ))
            })?;

        tracing::info!("Connected to WebDriver at {}", webdriver_url);

        Ok(Self {
            client: Mutex::new(client),
            timeout,
        })
    }

    async fn wait_for_network_idle(client: &Client) {
        let deadline = Instant::now() + IDLE_MAX_WAIT;
        let mut last_count = None;
        let mut stable = 0;

        while Instant::now() < deadline && stable < IDLE_STABLE_POLLS {
            tokio::time::sleep(IDLE_POLL_INTERVAL).await;
            let count = match client.execute(RESOURCE_COUNT_SCRIPT, vec![]).await {
                Ok(value) => value.as_u64(),
                Err(_) => return,
            };
            if count.is_some() && count == last_count {
                stable += 1;
            } else {
                stable = 0;
            }
            last_count = count;
        }
    }
}

fn headless_capabilities(user_agent: &UserAgentConfig) -> Map<String, Value> {
    let ua_arg = format!("--user-agent={}", user_agent.header_value());
    let mut caps = Map::new();
    caps.insert(
        "goog:chromeOptions".to_string(),
        json!({ "args": ["--headless=new", "--disable-gpu", "--no-sandbox", ua_arg] }),
    );
    caps.insert(
        "moz:firefoxOptions".to_string(),
        json!({ "args": ["-headless"] }),
    );
    caps
}

/// Loads and measures `url` on a session the caller already holds
async fn load_page(client: &Client, url: &Url, capture_snapshot: bool) -> Result<FetchedPage, FetchError> {
    let start = Instant::now();

    client
        .goto(url.as_str())
        .await
        .map_err(|e| browser_error(url, e))?;
    BrowserFetcher::wait_for_network_idle(client).await;
    let elapsed = start.elapsed();

    let probe_value = client
        .execute(MEASURE_SCRIPT, vec![])
        .await
        .map_err(|e| browser_error(url, e))?;
    let probe: PageProbe =
        serde_json::from_value(probe_value).map_err(|e| FetchError::Content {
            url: url.to_string(),
            message: format!("unexpected measurement payload: {}", e),
        })?;

    // responseStatus is 0 when the browser does not expose it
    if probe.status >= 400 {
        return Err(FetchError::Status {
            url: url.to_string(),
            status: probe.status,
        });
    }

    let final_url = client
        .current_url()
        .await
        .map_err(|e| browser_error(url, e))?;
    let body = client.source().await.map_err(|e| browser_error(url, e))?;

    let snapshot = if capture_snapshot {
        capture_full_document(client, url).await
    } else {
        None
    };

    tracing::debug!(
        url = %url,
        bytes = probe.byte_count(),
        nodes = probe.nodes,
        ms = elapsed.as_millis() as u64,
        "rendered page"
    );

    Ok(FetchedPage {
        result: PageResult {
            url: url.clone(),
            byte_count: probe.byte_count(),
            dom_node_count: probe.nodes,
            execution_time_ms: elapsed.as_millis() as u64,
        },
        final_url,
        body,
        snapshot,
    })
}

/// Screenshots the whole document by stretching the window for the capture
async fn capture_full_document(client: &Client, url: &Url) -> Option<Vec<u8>> {
    let original = client.get_window_size().await.ok();
    let height = client
        .execute(DOCUMENT_HEIGHT_SCRIPT, vec![])
        .await
        .ok()
        .and_then(|value| value.as_u64());

    let resized = match (original, height) {
        (Some((width, viewport)), Some(document)) => match snapshot_height(viewport, document) {
            Some(height) => client.set_window_size(width as u32, height).await.is_ok(),
            None => false,
        },
        _ => false,
    };

    let png = match client.screenshot().await {
        Ok(png) => Some(png),
        Err(e) => {
            tracing::warn!("Snapshot of {} failed: {}", url, e);
            None
        }
    };

    if let (true, Some((width, viewport))) = (resized, original) {
        if let Err(e) = client.set_window_size(width as u32, viewport as u32).await {
            tracing::warn!("Failed to restore window size: {}", e);
        }
    }

    png
}

/// Window height needed to capture the whole document, if taller than the viewport
fn snapshot_height(viewport: u64, document: u64) -> Option<u32> {
    (document > viewport).then(|| document.min(u64::from(SNAPSHOT_MAX_HEIGHT)) as u32)
}

fn browser_error(url: &Url, e: impl std::fmt::Display) -> FetchError {
    FetchError::Browser {
        url: url.to_string(),
        message: e.to_string(),
    }
}

#[async_trait]
impl PageFetcher for BrowserFetcher {
    fn name(&self) -> &'static str {
        "browser"
    }

    fn page_timeout(&self) -> Option<Duration> {
        None
    }

    async fn fetch(&self, url: &Url, capture_snapshot: bool) -> Result<FetchedPage, FetchError> {
        let client = self.client.lock().await;
        let load = load_page(&client, url, capture_snapshot);
        tokio::time::timeout(self.timeout, load)
            .await
            .unwrap_or_else(|_| {
                Err(FetchError::Timeout {
                    url: url.to_string(),
                })
            })
    }

    async fn shutdown(&self) {
        let client = self.client.lock().await.clone();
        if let Err(e) = client.close().await {
            tracing::warn!("Failed to close WebDriver session: {}", e);
        }
    }
}
