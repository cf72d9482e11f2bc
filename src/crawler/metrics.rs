//! Metrics aggregation across the pages of one crawl

use crate::crawler::fetcher::PageResult;
use crate::CrawlError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

/// Aggregate measurements for a finished crawl
///
/// Every total is at least 1: downstream estimators divide by these values and
/// a site that produced no measurable signal must not read as free.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawlMetrics {
    pub total_bytes: u64,
    pub total_dom_nodes: u64,
    pub total_execution_ms: u64,
    pub pages_scanned: u64,

    /// Successfully fetched pages, in visit order
    pub pages_visited: Vec<Url>,

    /// Resolved URL of the first successful page (proof of visit)
    pub visited_url: Url,
    pub visited_at: DateTime<Utc>,
}

/// Accumulates per-page results as the frontier drains
#[derive(Debug, Default)]
pub struct MetricsAggregator {
    total_bytes: u64,
    total_dom_nodes: u64,
    total_execution_ms: u64,
    pages_visited: Vec<Url>,
    first_visit: Option<(Url, DateTime<Utc>)>,
}

impl MetricsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one successfully fetched page
    ///
    /// `resolved_url` is where the request finally landed; the first one
    /// recorded becomes the crawl's proof of visit.
    pub fn record(&mut self, page: &PageResult, resolved_url: &Url) {
        self.total_bytes = self.total_bytes.saturating_add(page.byte_count);
        self.total_dom_nodes = self.total_dom_nodes.saturating_add(page.dom_node_count);
        self.total_execution_ms = self
            .total_execution_ms
            .saturating_add(page.execution_time_ms);
        self.pages_visited.push(page.url.clone());

        if self.first_visit.is_none() {
            self.first_visit = Some((resolved_url.clone(), Utc::now()));
        }
    }

    /// Number of pages recorded so far
    pub fn pages_scanned(&self) -> usize {
        self.pages_visited.len()
    }

    /// Finalizes the totals, flooring each to 1
    ///
    /// Fails with [`CrawlError::NoPagesReachable`] when nothing was recorded.
    pub fn finish(self, seed: &Url) -> Result<CrawlMetrics, CrawlError> {
        let Some((visited_url, visited_at)) = self.first_visit else {
            return Err(CrawlError::NoPagesReachable {
                url: seed.to_string(),
            });
        };

        Ok(CrawlMetrics {
            total_bytes: self.total_bytes.max(1),
            total_dom_nodes: self.total_dom_nodes.max(1),
            total_execution_ms: self.total_execution_ms.max(1),
            pages_scanned: (self.pages_visited.len() as u64).max(1),
            pages_visited: self.pages_visited,
            visited_url,
            visited_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(path: &str, bytes: u64, nodes: u64, ms: u64) -> PageResult {
        PageResult {
            url: Url::parse(&format!("https://example.com{}", path)).unwrap(),
            byte_count: bytes,
            dom_node_count: nodes,
            execution_time_ms: ms,
        }
    }

    fn seed() -> Url {
        Url::parse("https://example.com/").unwrap()
    }

    #[test]
    fn test_sums_across_pages() {
        let mut agg = MetricsAggregator::new();
        let first = page("/", 1000, 50, 120);
        agg.record(&first, &first.url);
        let second = page("/about", 2000, 70, 80);
        agg.record(&second, &second.url);

        let metrics = agg.finish(&seed()).unwrap();
        assert_eq!(metrics.total_bytes, 3000);
        assert_eq!(metrics.total_dom_nodes, 120);
        assert_eq!(metrics.total_execution_ms, 200);
        assert_eq!(metrics.pages_scanned, 2);
        assert_eq!(metrics.pages_visited, vec![first.url.clone(), second.url]);
        assert_eq!(metrics.visited_url, first.url);
    }

    #[test]
    fn test_zero_totals_floored_to_one() {
        let mut agg = MetricsAggregator::new();
        let empty = page("/", 0, 0, 0);
        agg.record(&empty, &empty.url);

        let metrics = agg.finish(&seed()).unwrap();
        assert_eq!(metrics.total_bytes, 1);
        assert_eq!(metrics.total_dom_nodes, 1);
        assert_eq!(metrics.total_execution_ms, 1);
        assert_eq!(metrics.pages_scanned, 1);
    }

    #[test]
    fn test_proof_of_visit_uses_resolved_url() {
        let mut agg = MetricsAggregator::new();
        let requested = page("/old", 10, 1, 1);
        let resolved = Url::parse("https://example.com/new").unwrap();
        agg.record(&requested, &resolved);

        let metrics = agg.finish(&seed()).unwrap();
        assert_eq!(metrics.visited_url, resolved);
        assert_eq!(metrics.pages_visited, vec![requested.url]);
    }

    #[test]
    fn test_empty_crawl_fails() {
        let err = MetricsAggregator::new().finish(&seed()).unwrap_err();
        assert!(matches!(err, CrawlError::NoPagesReachable { .. }));
        assert!(err.to_string().contains("No pages reachable"));
    }
}
