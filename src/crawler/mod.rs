//! Crawler module: bounded, same-origin site traversal and page measurement
//!
//! This module contains the measuring side of a scan, including:
//! - The `PageFetcher` seam with lightweight HTTP and full-browser strategies
//! - HTML parsing and same-origin link extraction
//! - The breadth-first crawl frontier with page and depth budgets
//! - Aggregation of per-page results into crawl metrics

mod browser;
mod fetcher;
mod frontier;
mod metrics;
mod parser;

pub use browser::BrowserFetcher;
pub use fetcher::{build_http_client, FetchedPage, HttpFetcher, PageFetcher, PageResult};
pub use frontier::{CrawlBudget, CrawlProgress, CrawlReport, Frontier, ProgressObserver};
pub use metrics::{CrawlMetrics, MetricsAggregator};
pub use parser::{count_markup_tags, extract_links};

use crate::config::{Config, FetchStrategyKind};
use crate::FetchError;
use std::sync::Arc;
use std::time::Duration;

/// Builds the page fetcher selected by `crawler.fetch_strategy`
///
/// `auto` prefers the browser when a WebDriver endpoint is configured and
/// reachable, and falls back to plain HTTP otherwise.
pub async fn build_fetcher(config: &Config) -> Result<Arc<dyn PageFetcher>, FetchError> {
    let http_timeout = Duration::from_secs(config.crawler.http_timeout_secs);
    let browser_timeout = Duration::from_secs(config.crawler.browser_timeout_secs);

    match (config.crawler.fetch_strategy, &config.browser.webdriver_url) {
        (FetchStrategyKind::Http, _) | (FetchStrategyKind::Auto, None) => {
            Ok(Arc::new(HttpFetcher::new(&config.user_agent, http_timeout)?))
        }
        (FetchStrategyKind::Browser, None) => Err(FetchError::Setup(
            "browser strategy selected but browser.webdriver_url is not set".to_string(),
        )),
        (FetchStrategyKind::Browser, Some(webdriver_url)) => Ok(Arc::new(
            BrowserFetcher::connect(webdriver_url, &config.user_agent, browser_timeout).await?,
        )),
        (FetchStrategyKind::Auto, Some(webdriver_url)) => {
            match BrowserFetcher::connect(webdriver_url, &config.user_agent, browser_timeout).await
            {
                Ok(fetcher) => Ok(Arc::new(fetcher)),
                Err(e) => {
                    tracing::warn!("{}; falling back to HTTP fetching", e);
                    Ok(Arc::new(HttpFetcher::new(&config.user_agent, http_timeout)?))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_auto_without_webdriver_uses_http() {
        let fetcher = build_fetcher(&Config::default()).await.unwrap();
        assert_eq!(fetcher.name(), "http");
        assert_eq!(fetcher.page_timeout(), Some(Duration::from_secs(10)));
    }

    #[tokio::test]
    async fn test_auto_falls_back_when_webdriver_unreachable() {
        let mut config = Config::default();
        config.browser.webdriver_url = Some("http://127.0.0.1:9".to_string());
        let fetcher = build_fetcher(&config).await.unwrap();
        assert_eq!(fetcher.name(), "http");
    }

    #[tokio::test]
    async fn test_explicit_browser_without_webdriver_fails() {
        let mut config = Config::default();
        config.crawler.fetch_strategy = FetchStrategyKind::Browser;
        assert!(matches!(
            build_fetcher(&config).await,
            Err(FetchError::Setup(_))
        ));
    }
}
