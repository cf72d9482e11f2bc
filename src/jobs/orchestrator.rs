//! Scan job orchestrator
//!
//! Sequences one scan through its lifecycle:
//!
//! ```text
//! QUEUED -> VISITING -> ANALYZING -> COMPLETED
//!    \_________\___________\______-> FAILED
//! ```
//!
//! Pipeline stages return values; only the orchestrator writes to the job
//! store, once per transition plus the progress stream while visiting. Crawl
//! failures fail the job with their message preserved. Narrative failures
//! degrade to the rule-engine result. Storage failures are propagated after a
//! best-effort attempt to record FAILED.

use crate::config::Config;
use crate::crawler::{build_fetcher, CrawlBudget, CrawlProgress, Frontier, PageFetcher};
use crate::estimate::{
    estimate_website_energy, generate_website_recommendations, map_energy_to_carbon,
    map_energy_to_cost, website_assumptions, EnergyCoefficients, EnergyInputs, Recommendation,
};
use crate::jobs::models::{ScanJob, ScanRequest, ScanResult};
use crate::narrative::{
    GeminiClient, NarrativeError, NarrativeRequest, NarrativeResult, NarrativeService,
};
use crate::state::ScanStatus;
use crate::storage::{JobStore, JobUpdate, StorageResult};
use crate::GreenscanError;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::Instrument;

const DEFAULT_NARRATIVE_TIMEOUT: Duration = Duration::from_secs(60);

/// Message recorded when a storage failure interrupts a job
const STORAGE_FAILURE_MESSAGE: &str = "Scan aborted: the job store could not be updated";

/// Message recorded when the pipeline task dies without returning
const ABORTED_MESSAGE: &str = "Scan aborted unexpectedly";

/// Runs scan jobs against a job store
///
/// Cheap to clone; clones share the store, fetcher and narrative service.
/// Each run owns its own frontier, visited set and aggregator, so any number
/// of jobs may run concurrently.
#[derive(Clone)]
pub struct ScanOrchestrator {
    store: Arc<dyn JobStore>,
    fetcher: Arc<dyn PageFetcher>,
    narrative: Option<Arc<dyn NarrativeService>>,
    narrative_timeout: Duration,
    budget: CrawlBudget,
    coefficients: EnergyCoefficients,
    snapshot_dir: Option<PathBuf>,
}

impl ScanOrchestrator {
    pub fn new(store: Arc<dyn JobStore>, fetcher: Arc<dyn PageFetcher>, budget: CrawlBudget) -> Self {
        Self {
            store,
            fetcher,
            narrative: None,
            narrative_timeout: DEFAULT_NARRATIVE_TIMEOUT,
            budget,
            coefficients: EnergyCoefficients::default(),
            snapshot_dir: None,
        }
    }

    /// Wires every collaborator from configuration
    ///
    /// The fetch strategy is chosen here, once. A narrative service that is
    /// enabled but cannot be built (e.g. missing API key) is logged and left
    /// out rather than failing startup.
    pub async fn from_config(
        config: &Config,
        store: Arc<dyn JobStore>,
    ) -> Result<Self, GreenscanError> {
        let budget = CrawlBudget::from_config(&config.crawler)?;
        let fetcher = build_fetcher(config).await?;

        let mut orchestrator = Self::new(store, fetcher, budget)
            .with_coefficients(config.estimation.coefficients())
            .with_snapshot_dir(&config.output.snapshot_dir);

        if config.narrative.enabled {
            match GeminiClient::from_config(&config.narrative) {
                Ok(client) => {
                    orchestrator = orchestrator.with_narrative(
                        Arc::new(client),
                        Duration::from_secs(config.narrative.timeout_secs),
                    );
                }
                Err(e) => {
                    tracing::warn!("Narrative reports disabled: {}", e);
                }
            }
        }

        Ok(orchestrator)
    }

    pub fn with_narrative(mut self, service: Arc<dyn NarrativeService>, timeout: Duration) -> Self {
        self.narrative = Some(service);
        self.narrative_timeout = timeout;
        self
    }

    pub fn with_coefficients(mut self, coefficients: EnergyCoefficients) -> Self {
        self.coefficients = coefficients;
        self
    }

    pub fn with_snapshot_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.snapshot_dir = Some(dir.into());
        self
    }

    pub fn store(&self) -> &Arc<dyn JobStore> {
        &self.store
    }

    pub fn fetcher_name(&self) -> &'static str {
        self.fetcher.name()
    }

    /// Creates a queued job and returns its id
    pub fn submit(&self, request: ScanRequest) -> StorageResult<String> {
        let job = ScanJob::new(request);
        let id = self.store.create(&job)?;
        tracing::info!(scan_id = %id, url = %job.request.url, "Scan queued");
        Ok(id)
    }

    /// Submits and runs a scan to a terminal state
    pub async fn scan(&self, request: ScanRequest) -> StorageResult<ScanJob> {
        let id = self.submit(request)?;
        self.run(&id).await
    }

    /// Runs a queued job to completion on a background task
    pub fn spawn(&self, id: String) -> JoinHandle<StorageResult<ScanJob>> {
        let orchestrator = self.clone();
        tokio::spawn(async move { orchestrator.run(&id).await })
    }

    /// Drives a queued job to COMPLETED or FAILED
    ///
    /// Returns the job as stored at the end. A job that fails for crawl
    /// reasons is still `Ok`; `Err` means the store itself failed. The
    /// pipeline runs on its own task, so a panic in a fetcher, parser or
    /// narrative client is recorded as FAILED instead of stranding the job.
    pub async fn run(&self, id: &str) -> StorageResult<ScanJob> {
        let span = tracing::info_span!("scan", scan_id = %id);
        let stages = {
            let orchestrator = self.clone();
            let id = id.to_string();
            tokio::spawn(async move { orchestrator.run_stages(&id).await }.instrument(span.clone()))
        };

        async {
            match stages.await {
                Ok(Ok(job)) => Ok(job),
                Err(e) => {
                    tracing::error!("Scan pipeline aborted: {}", e);
                    self.store.update(id, JobUpdate::failed(ABORTED_MESSAGE))
                }
                Ok(Err(e)) => {
                    tracing::error!("Storage failure during scan: {}", e);
                    if let Err(record_err) =
                        self.store.update(id, JobUpdate::failed(STORAGE_FAILURE_MESSAGE))
                    {
                        tracing::error!("Could not record scan failure: {}", record_err);
                    }
                    Err(e)
                }
            }
        }
        .instrument(span)
        .await
    }

    /// Releases fetcher resources (browser sessions)
    pub async fn shutdown(&self) {
        self.fetcher.shutdown().await;
    }

    async fn run_stages(&self, id: &str) -> StorageResult<ScanJob> {
        let request = self.store.get(id)?.request;

        let initial = CrawlProgress {
            pages_scanned: 0,
            pages_total: 0,
            current_url: request.url.clone(),
        };
        self.store.update(
            id,
            JobUpdate::status(ScanStatus::Visiting).with_progress(initial.clone()),
        )?;
        tracing::info!(url = %request.url, fetcher = self.fetcher.name(), "Visiting");

        let (progress_tx, progress_rx) = watch::channel(initial);
        let drain = tokio::spawn(drain_progress(
            Arc::clone(&self.store),
            id.to_string(),
            progress_rx,
        ));

        let crawl = {
            let observer = move |progress: &CrawlProgress| {
                progress_tx.send_replace(progress.clone());
            };
            let outcome = Frontier::new(self.fetcher.as_ref(), self.budget)
                .with_observer(&observer)
                .crawl(&request.url)
                .await;
            // Dropping the observer closes the channel and ends the drain
            outcome
        };

        if let Err(e) = drain.await {
            tracing::warn!("Progress writer stopped abnormally: {}", e);
        }

        let report = match crawl {
            Ok(report) => report,
            Err(e) => {
                tracing::error!("Scan failed: {}", e);
                return self.store.update(id, JobUpdate::failed(e.to_string()));
            }
        };

        self.store.update(id, JobUpdate::status(ScanStatus::Analyzing))?;
        tracing::info!(
            pages = report.metrics.pages_scanned,
            bytes = report.metrics.total_bytes,
            "Analyzing"
        );

        let metrics = report.metrics;
        let inputs = EnergyInputs::from(&metrics);
        let energy = estimate_website_energy(&inputs, &self.coefficients);
        let carbon = map_energy_to_carbon(energy.energy_kwh, &request.region);
        let rule_recommendations = generate_website_recommendations(&inputs);

        let narrative_request = NarrativeRequest::new(&metrics, &inputs, &energy, &carbon);
        let (narrative, recommendations) = self
            .narrate(&narrative_request, rule_recommendations)
            .await;

        let snapshot_path = match report.snapshot {
            Some(png) => self.save_snapshot(id, &png).await,
            None => None,
        };

        let result = ScanResult {
            page_weight_kb: inputs.page_weight_kb,
            estimated_cost_usd: map_energy_to_cost(energy.energy_kwh),
            metrics,
            energy,
            carbon,
            narrative,
            recommendations,
            assumptions: website_assumptions(),
            snapshot_path,
        };

        let job = self.store.update(
            id,
            JobUpdate::status(ScanStatus::Completed).with_result(result),
        )?;
        tracing::info!(
            energy_kwh = energy.energy_kwh,
            carbon_kg = carbon.carbon_kg,
            "Scan completed"
        );

        Ok(job)
    }

    /// Calls the narrative service under a timeout, falling back on any failure
    async fn narrate(
        &self,
        request: &NarrativeRequest,
        rule_recommendations: Vec<Recommendation>,
    ) -> (NarrativeResult, Vec<Recommendation>) {
        let Some(service) = &self.narrative else {
            return (NarrativeResult::fallback(request), rule_recommendations);
        };

        let outcome = tokio::time::timeout(self.narrative_timeout, service.generate(request))
            .await
            .unwrap_or(Err(NarrativeError::Timeout(self.narrative_timeout)));

        match outcome {
            Ok(report) => {
                tracing::info!("Narrative report generated");
                let recommendations = report.recommendations.clone();
                (NarrativeResult::Generated(report), recommendations)
            }
            Err(e) => {
                tracing::warn!("{}; using rule-based recommendations", e);
                (NarrativeResult::fallback(request), rule_recommendations)
            }
        }
    }

    /// Writes the first-page snapshot; failures only cost the artifact
    async fn save_snapshot(&self, id: &str, png: &[u8]) -> Option<PathBuf> {
        let dir = self.snapshot_dir.as_ref()?;
        let path = dir.join(format!("scan-{}.png", id));

        let written = async {
            tokio::fs::create_dir_all(dir).await?;
            tokio::fs::write(&path, png).await
        }
        .await;

        match written {
            Ok(()) => {
                tracing::debug!("Snapshot written to {}", path.display());
                Some(path)
            }
            Err(e) => {
                tracing::warn!("Failed to write snapshot {}: {}", path.display(), e);
                None
            }
        }
    }
}

/// Copies crawl progress into the store until the crawl drops its sender
///
/// Only the latest value is written, so a slow store never holds up the
/// crawl. Write failures are logged and do not affect the job.
async fn drain_progress(
    store: Arc<dyn JobStore>,
    id: String,
    mut progress_rx: watch::Receiver<CrawlProgress>,
) {
    while progress_rx.changed().await.is_ok() {
        let progress = progress_rx.borrow_and_update().clone();
        if let Err(e) = store.update(&id, JobUpdate::progress(progress)) {
            tracing::warn!("Failed to record progress for {}: {}", id, e);
        }
    }
}
