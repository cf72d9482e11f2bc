//! End-to-end scan job tests: crawl, estimate, narrate and persist

use crate::{mount_page, requested_paths};
use greenscan::config::UserAgentConfig;
use greenscan::crawler::{CrawlBudget, FetchedPage, HttpFetcher, PageFetcher};
use greenscan::estimate::{generate_website_recommendations, EnergyInputs, GLOBAL_CARBON_KG_PER_KWH};
use greenscan::narrative::GeminiClient;
use greenscan::storage::{
    open_job_store, JobStore, JobUpdate, MemoryJobStore, StorageResult,
};
use greenscan::{FetchError, ScanJob, ScanOrchestrator, ScanRequest, ScanStatus};
use async_trait::async_trait;
use url::Url;
use serde_json::json;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const MODEL_PATH: &str = "/v1/models/gemini-test:generateContent";

/// Job store that remembers every status a job passed through
struct RecordingStore {
    inner: MemoryJobStore,
    history: Mutex<Vec<ScanStatus>>,
}

impl RecordingStore {
    fn new() -> Self {
        Self {
            inner: MemoryJobStore::new(),
            history: Mutex::new(Vec::new()),
        }
    }

    fn history(&self) -> Vec<ScanStatus> {
        self.history.lock().unwrap().clone()
    }

    fn record(&self, status: ScanStatus) {
        let mut history = self.history.lock().unwrap();
        if history.last() != Some(&status) {
            history.push(status);
        }
    }
}

impl JobStore for RecordingStore {
    fn create(&self, job: &ScanJob) -> StorageResult<String> {
        let id = self.inner.create(job)?;
        self.record(job.status);
        Ok(id)
    }

    fn update(&self, id: &str, update: JobUpdate) -> StorageResult<ScanJob> {
        let job = self.inner.update(id, update)?;
        self.record(job.status);
        Ok(job)
    }

    fn get(&self, id: &str) -> StorageResult<ScanJob> {
        self.inner.get(id)
    }

    fn delete(&self, id: &str) -> StorageResult<()> {
        self.inner.delete(id)
    }

    fn list_recent(&self, limit: usize) -> StorageResult<Vec<ScanJob>> {
        self.inner.list_recent(limit)
    }
}

fn http_fetcher() -> Arc<dyn PageFetcher> {
    Arc::new(HttpFetcher::new(&UserAgentConfig::default(), Duration::from_secs(5)).unwrap())
}

fn gemini_for(server: &MockServer) -> Arc<GeminiClient> {
    Arc::new(
        GeminiClient::new(
            &format!("{}/v1", server.uri()),
            "gemini-test",
            "secret".to_string(),
            Duration::from_secs(5),
        )
        .unwrap(),
    )
}

async fn small_site() -> MockServer {
    let server = MockServer::start().await;
    mount_page(&server, "/", &["/about", "/blog"]).await;
    mount_page(&server, "/about", &["/"]).await;
    mount_page(&server, "/blog", &["/blog/post"]).await;
    mount_page(&server, "/blog/post", &[]).await;
    server
}

#[tokio::test]
async fn test_scan_completes_through_every_state() {
    let site = small_site().await;
    let store = Arc::new(RecordingStore::new());
    let orchestrator = ScanOrchestrator::new(
        store.clone(),
        http_fetcher(),
        CrawlBudget::new(10, 1).unwrap(),
    );

    let job = orchestrator
        .scan(ScanRequest::new(site.uri(), "us-east-1"))
        .await
        .unwrap();

    assert_eq!(job.status, ScanStatus::Completed);
    assert!(job.error_message.is_none());
    assert_eq!(
        store.history(),
        vec![
            ScanStatus::Queued,
            ScanStatus::Visiting,
            ScanStatus::Analyzing,
            ScanStatus::Completed
        ]
    );

    let result = job.result.unwrap();
    assert_eq!(result.metrics.pages_scanned, 3);
    assert_eq!(result.metrics.visited_url.path(), "/");
    assert!(result.energy.energy_kwh > 0.0);
    assert!(result.carbon.carbon_kg > 0.0);
    assert!(!result.narrative.is_generated());
    assert!(!result.assumptions.is_empty());

    // depth 1 stops before the blog post
    assert!(!requested_paths(&site).await.contains(&"/blog/post".to_string()));
}

#[tokio::test]
async fn test_unreachable_site_fails_before_analyzing() {
    let site = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&site)
        .await;

    let store = Arc::new(RecordingStore::new());
    let orchestrator = ScanOrchestrator::new(
        store.clone(),
        http_fetcher(),
        CrawlBudget::new(5, 2).unwrap(),
    );

    let job = orchestrator
        .scan(ScanRequest::new(site.uri(), "us-east-1"))
        .await
        .unwrap();

    assert_eq!(job.status, ScanStatus::Failed);
    assert!(job.result.is_none());
    assert!(job
        .error_message
        .as_deref()
        .unwrap_or_default()
        .contains("No pages reachable"));
    assert!(!store.history().contains(&ScanStatus::Analyzing));
    assert_eq!(store.history().last(), Some(&ScanStatus::Failed));
}

/// Fetcher that panics after the first page, as a parser might on hostile markup
struct PanicsAfterSeed {
    inner: HttpFetcher,
}

#[async_trait]
impl PageFetcher for PanicsAfterSeed {
    fn name(&self) -> &'static str {
        "panics-after-seed"
    }

    fn page_timeout(&self) -> Option<Duration> {
        Some(Duration::from_secs(5))
    }

    async fn fetch(&self, url: &Url, capture: bool) -> Result<FetchedPage, FetchError> {
        if url.path() != "/" {
            panic!("cannot handle {}", url);
        }
        self.inner.fetch(url, capture).await
    }
}

#[tokio::test]
async fn test_pipeline_panic_still_reaches_failed() {
    let site = small_site().await;
    let store = Arc::new(RecordingStore::new());
    let fetcher = PanicsAfterSeed {
        inner: HttpFetcher::new(&UserAgentConfig::default(), Duration::from_secs(5)).unwrap(),
    };
    let orchestrator =
        ScanOrchestrator::new(store.clone(), Arc::new(fetcher), CrawlBudget::new(10, 2).unwrap());

    let id = orchestrator
        .submit(ScanRequest::new(site.uri(), "us-east-1"))
        .unwrap();
    let job = orchestrator.spawn(id.clone()).await.unwrap().unwrap();

    assert_eq!(job.status, ScanStatus::Failed);
    assert_eq!(job.error_message.as_deref(), Some("Scan aborted unexpectedly"));
    assert_eq!(
        store.history(),
        vec![ScanStatus::Queued, ScanStatus::Visiting, ScanStatus::Failed]
    );
    assert_eq!(store.get(&id).unwrap().status, ScanStatus::Failed);
}

#[tokio::test]
async fn test_invalid_url_fails_job() {
    let store = Arc::new(MemoryJobStore::new());
    let orchestrator =
        ScanOrchestrator::new(store, http_fetcher(), CrawlBudget::new(5, 2).unwrap());

    let job = orchestrator
        .scan(ScanRequest::new("ftp://example.com/", "us-east-1"))
        .await
        .unwrap();

    assert_eq!(job.status, ScanStatus::Failed);
    assert!(job
        .error_message
        .as_deref()
        .unwrap_or_default()
        .contains("Invalid start URL"));
}

#[tokio::test]
async fn test_narrative_failure_falls_back_to_rule_recommendations() {
    let site = small_site().await;
    let gemini = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(MODEL_PATH))
        .respond_with(ResponseTemplate::new(500).set_body_string("backend unavailable"))
        .mount(&gemini)
        .await;

    let orchestrator = ScanOrchestrator::new(
        Arc::new(MemoryJobStore::new()),
        http_fetcher(),
        CrawlBudget::new(10, 2).unwrap(),
    )
    .with_narrative(gemini_for(&gemini), Duration::from_secs(5));

    let job = orchestrator
        .scan(ScanRequest::new(site.uri(), "us-east-1"))
        .await
        .unwrap();

    assert_eq!(job.status, ScanStatus::Completed);
    let result = job.result.unwrap();
    assert!(!result.narrative.is_generated());
    assert!(result.narrative.summary().contains("4 pages"));
    assert_eq!(
        result.recommendations,
        generate_website_recommendations(&EnergyInputs::from(&result.metrics))
    );
}

#[tokio::test]
async fn test_generated_narrative_supplies_recommendations() {
    let site = small_site().await;
    let gemini = MockServer::start().await;
    let report = json!({
        "summary": "A small, light site.",
        "detailedAnalysis": "Four pages with little script.",
        "recommendations": [
            { "title": "Cache static pages", "estimatedReductionPercent": 8, "effort": "low" }
        ]
    })
    .to_string();
    Mock::given(method("POST"))
        .and(path(MODEL_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [ { "content": { "parts": [ { "text": report } ] } } ]
        })))
        .expect(1)
        .mount(&gemini)
        .await;

    let orchestrator = ScanOrchestrator::new(
        Arc::new(MemoryJobStore::new()),
        http_fetcher(),
        CrawlBudget::new(10, 2).unwrap(),
    )
    .with_narrative(gemini_for(&gemini), Duration::from_secs(5));

    let job = orchestrator
        .scan(ScanRequest::new(site.uri(), "eu-west-1"))
        .await
        .unwrap();

    let result = job.result.unwrap();
    assert!(result.narrative.is_generated());
    assert_eq!(result.narrative.summary(), "A small, light site.");
    assert_eq!(result.recommendations.len(), 1);
    assert_eq!(result.recommendations[0].title, "Cache static pages");
}

#[tokio::test]
async fn test_unknown_region_uses_global_factor() {
    let site = small_site().await;
    let orchestrator = ScanOrchestrator::new(
        Arc::new(MemoryJobStore::new()),
        http_fetcher(),
        CrawlBudget::new(1, 0).unwrap(),
    );

    let job = orchestrator
        .scan(ScanRequest::new(site.uri(), "moon-base-1"))
        .await
        .unwrap();

    let result = job.result.unwrap();
    assert_eq!(result.metrics.pages_scanned, 1);
    assert_eq!(result.carbon.region_factor_used, GLOBAL_CARBON_KG_PER_KWH);
}

#[tokio::test]
async fn test_spawned_scans_run_concurrently() {
    let first = small_site().await;
    let second = small_site().await;
    let store: Arc<dyn JobStore> = Arc::new(MemoryJobStore::new());
    let orchestrator = ScanOrchestrator::new(
        Arc::clone(&store),
        http_fetcher(),
        CrawlBudget::new(10, 2).unwrap(),
    );

    let first_id = orchestrator
        .submit(ScanRequest::new(first.uri(), "us-east-1"))
        .unwrap();
    let second_id = orchestrator
        .submit(ScanRequest::new(second.uri(), "us-east-1"))
        .unwrap();
    assert_ne!(first_id, second_id);

    let handles = [
        orchestrator.spawn(first_id.clone()),
        orchestrator.spawn(second_id.clone()),
    ];
    for handle in handles {
        let job = handle.await.unwrap().unwrap();
        assert_eq!(job.status, ScanStatus::Completed);
    }

    assert_eq!(
        store.get(&first_id).unwrap().request.url,
        first.uri()
    );
    assert_eq!(store.list_recent(10).unwrap().len(), 2);
}

#[tokio::test]
async fn test_sqlite_store_persists_completed_scan() {
    let site = small_site().await;
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("nested").join("scans.db");

    let id = {
        let store = Arc::new(open_job_store(&db_path).unwrap());
        let orchestrator =
            ScanOrchestrator::new(store, http_fetcher(), CrawlBudget::new(10, 2).unwrap());
        let job = orchestrator
            .scan(ScanRequest::new(site.uri(), "us-west-2"))
            .await
            .unwrap();
        assert_eq!(job.status, ScanStatus::Completed);
        job.id
    };

    let reopened = open_job_store(&db_path).unwrap();
    let job = reopened.get(&id).unwrap();
    assert_eq!(job.status, ScanStatus::Completed);
    assert_eq!(job.request.region, "us-west-2");

    let progress = job.progress.unwrap();
    assert_eq!(progress.pages_scanned, 4);

    let result = job.result.unwrap();
    assert_eq!(result.metrics.pages_scanned, 4);
    assert_eq!(
        result.recommendations,
        generate_website_recommendations(&EnergyInputs::from(&result.metrics))
    );

    // terminal jobs are frozen
    assert!(reopened
        .update(&id, JobUpdate::status(ScanStatus::Visiting))
        .is_err());
}
