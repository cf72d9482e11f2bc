//! Crawl frontier: breadth-first, budget-bounded site traversal
//!
//! The frontier owns the pending-URL queue, the visited set and the metrics
//! aggregator for exactly one crawl. It drives the page fetcher, the link
//! extractor and the skip filter, and reports progress to an optional
//! observer after every successful page.

use crate::config::CrawlerConfig;
use crate::crawler::fetcher::{FetchedPage, PageFetcher};
use crate::crawler::metrics::{CrawlMetrics, MetricsAggregator};
use crate::crawler::parser::extract_links;
use crate::url::{is_same_origin, normalize_url, SkipFilter};
use crate::{ConfigError, CrawlError, FetchError};
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};
use url::Url;

/// Page and depth limits for one crawl
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrawlBudget {
    max_pages: u32,
    max_depth: u32,
}

impl CrawlBudget {
    pub fn new(max_pages: u32, max_depth: u32) -> Result<Self, ConfigError> {
        if max_pages == 0 {
            return Err(ConfigError::Validation(
                "max_pages must be greater than zero".to_string(),
            ));
        }
        Ok(Self {
            max_pages,
            max_depth,
        })
    }

    pub fn from_config(config: &CrawlerConfig) -> Result<Self, ConfigError> {
        Self::new(config.max_pages, config.max_depth)
    }

    pub fn max_pages(&self) -> u32 {
        self.max_pages
    }

    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }
}

/// Snapshot of crawl progress, reported after each successful page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawlProgress {
    pub pages_scanned: u32,

    /// Best-effort estimate: scanned plus queued, capped at the page budget
    pub pages_total: u32,
    pub current_url: String,
}

/// Receives progress reports from the frontier
///
/// Called inline on the crawl task, so implementations must return promptly
/// and must not fail; hand the value off (e.g. into a `watch` channel) rather
/// than doing I/O here. Any closure `Fn(&CrawlProgress)` qualifies.
pub trait ProgressObserver: Send + Sync {
    fn on_progress(&self, progress: &CrawlProgress);
}

impl<F> ProgressObserver for F
where
    F: Fn(&CrawlProgress) + Send + Sync,
{
    fn on_progress(&self, progress: &CrawlProgress) {
        self(progress)
    }
}

/// A pending URL and the link depth it was discovered at
#[derive(Debug, Clone)]
struct FrontierEntry {
    url: Url,
    depth: u32,
}

/// Result of a completed crawl
#[derive(Debug, Clone)]
pub struct CrawlReport {
    pub metrics: CrawlMetrics,

    /// Visual snapshot of the first page, when the fetcher supports it
    pub snapshot: Option<Vec<u8>>,
}

/// Breadth-first crawler over a single origin
pub struct Frontier<'a> {
    fetcher: &'a dyn PageFetcher,
    budget: CrawlBudget,
    filter: SkipFilter,
    observer: Option<&'a dyn ProgressObserver>,
}

impl<'a> Frontier<'a> {
    pub fn new(fetcher: &'a dyn PageFetcher, budget: CrawlBudget) -> Self {
        Self {
            fetcher,
            budget,
            filter: SkipFilter::default(),
            observer: None,
        }
    }

    pub fn with_observer(mut self, observer: &'a dyn ProgressObserver) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn with_filter(mut self, filter: SkipFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Crawls from `seed` until the queue drains or the page budget is spent
    ///
    /// # Algorithm
    ///
    /// FIFO queue seeded with `(seed, 0)`. Each dequeued entry is discarded if
    /// it is deeper than `max_depth`, already visited, cross-origin, or
    /// skip-listed; otherwise it is marked visited and fetched under the
    /// fetcher's per-page timeout. A failed fetch is logged and skipped. A
    /// successful one is aggregated, and when the entry is shallower than
    /// `max_depth` its same-origin links are queued at `depth + 1`.
    ///
    /// # Errors
    ///
    /// * [`CrawlError::InvalidSeed`] - `seed` is not an HTTP(S) URL
    /// * [`CrawlError::NoPagesReachable`] - every fetch failed
    pub async fn crawl(&self, seed: &str) -> Result<CrawlReport, CrawlError> {
        let seed = normalize_url(seed).map_err(|e| CrawlError::InvalidSeed {
            url: seed.to_string(),
            reason: e.to_string(),
        })?;

        let max_pages = self.budget.max_pages as usize;
        let max_depth = self.budget.max_depth;

        let mut queue = VecDeque::new();
        let mut queued: HashSet<String> = HashSet::new();
        let mut visited: HashSet<String> = HashSet::new();
        let mut aggregator = MetricsAggregator::new();
        let mut snapshot = None;

        queued.insert(seed.as_str().to_string());
        queue.push_back(FrontierEntry {
            url: seed.clone(),
            depth: 0,
        });

        tracing::info!(
            "Crawling {} with {} fetcher (max {} pages, depth {})",
            seed,
            self.fetcher.name(),
            max_pages,
            max_depth
        );

        while aggregator.pages_scanned() < max_pages {
            let Some(entry) = queue.pop_front() else {
                break;
            };
            queued.remove(entry.url.as_str());

            if entry.depth > max_depth {
                continue;
            }

            if visited.contains(entry.url.as_str()) {
                continue;
            }

            if !is_same_origin(&entry.url, &seed) || self.filter.should_skip(&entry.url) {
                tracing::trace!("Skipping {}", entry.url);
                continue;
            }

            visited.insert(entry.url.as_str().to_string());

            let capture_snapshot = snapshot.is_none() && aggregator.pages_scanned() == 0;
            let page = match self.fetch_page(&entry.url, capture_snapshot).await {
                Ok(page) => page,
                Err(e) => {
                    tracing::warn!("Skipping page: {}", e);
                    continue;
                }
            };

            aggregator.record(&page.result, &page.final_url);
            if page.snapshot.is_some() {
                snapshot = page.snapshot;
            }

            if entry.depth < max_depth && aggregator.pages_scanned() < max_pages {
                for link in extract_links(&page.body, &page.final_url, &seed) {
                    if self.filter.should_skip(&link)
                        || visited.contains(link.as_str())
                        || queued.contains(link.as_str())
                    {
                        continue;
                    }
                    queued.insert(link.as_str().to_string());
                    queue.push_back(FrontierEntry {
                        url: link,
                        depth: entry.depth + 1,
                    });
                }
            }

            let pages_scanned = aggregator.pages_scanned();
            tracing::debug!(
                "Scanned {} ({} done, {} queued)",
                entry.url,
                pages_scanned,
                queue.len()
            );

            if let Some(observer) = self.observer {
                observer.on_progress(&CrawlProgress {
                    pages_scanned: pages_scanned as u32,
                    pages_total: max_pages.min(pages_scanned + queue.len()) as u32,
                    current_url: entry.url.to_string(),
                });
            }
        }

        let metrics = aggregator.finish(&seed)?;
        tracing::info!(
            "Crawl of {} finished: {} pages, {} bytes",
            seed,
            metrics.pages_scanned,
            metrics.total_bytes
        );

        Ok(CrawlReport { metrics, snapshot })
    }

    /// One fetch, bounded by the fetcher's page timeout when it declares one
    async fn fetch_page(&self, url: &Url, capture_snapshot: bool) -> Result<FetchedPage, FetchError> {
        let fetch = self.fetcher.fetch(url, capture_snapshot);
        match self.fetcher.page_timeout() {
            Some(limit) => tokio::time::timeout(limit, fetch)
                .await
                .unwrap_or_else(|_| {
                    Err(FetchError::Timeout {
                        url: url.to_string(),
                    })
                }),
            None => fetch.await,
        }
    }
}
