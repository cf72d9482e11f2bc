//! Narrative report generation
//!
//! An optional, external text-generation service turns scan metrics into a
//! prose summary, a detailed analysis and richer recommendations. It is a
//! soft dependency: any failure degrades to [`NarrativeResult::Fallback`],
//! built from the same metrics, and never fails the scan.

mod gemini;
mod prompt;

pub use gemini::GeminiClient;
pub use prompt::build_prompt;

use crate::crawler::CrawlMetrics;
use crate::estimate::{CarbonEstimate, EnergyEstimate, EnergyInputs, Recommendation};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Upper bound on the sample of visited pages sent to the service
pub const MAX_SAMPLE_PAGES: usize = 10;

/// Errors from the narrative service; always recoverable by falling back
#[derive(Debug, Error)]
pub enum NarrativeError {
    #[error("API key environment variable {0} is not set")]
    MissingApiKey(String),

    #[error("Narrative request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Narrative service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Narrative service returned no text")]
    EmptyResponse,

    #[error("Malformed narrative response: {0}")]
    Malformed(String),

    #[error("Narrative response is missing required field '{0}'")]
    MissingField(&'static str),

    #[error("Narrative service timed out after {0:?}")]
    Timeout(Duration),
}

/// Everything the narrative service is told about a scan
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NarrativeRequest {
    pub visited_url: Url,
    pub pages_scanned: u64,
    pub sample_pages: Vec<Url>,
    pub page_weight_kb: u64,
    pub dom_nodes: u64,
    pub execution_ms: u64,
    pub energy_kwh: f64,
    pub carbon_kg: f64,
}

impl NarrativeRequest {
    pub fn new(
        metrics: &CrawlMetrics,
        inputs: &EnergyInputs,
        energy: &EnergyEstimate,
        carbon: &CarbonEstimate,
    ) -> Self {
        Self {
            visited_url: metrics.visited_url.clone(),
            pages_scanned: metrics.pages_scanned,
            sample_pages: metrics
                .pages_visited
                .iter()
                .take(MAX_SAMPLE_PAGES)
                .cloned()
                .collect(),
            page_weight_kb: inputs.page_weight_kb,
            dom_nodes: inputs.dom_nodes,
            execution_ms: inputs.execution_ms,
            energy_kwh: energy.energy_kwh,
            carbon_kg: carbon.carbon_kg,
        }
    }
}

/// A validated report from the narrative service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NarrativeReport {
    pub summary: String,
    pub detailed_analysis: String,

    /// Non-empty; every entry carries a description
    pub recommendations: Vec<Recommendation>,
}

/// Text-generation collaborator for scan reports
#[async_trait]
pub trait NarrativeService: Send + Sync {
    async fn generate(&self, request: &NarrativeRequest)
        -> Result<NarrativeReport, NarrativeError>;
}

/// Outcome of the narrative step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum NarrativeResult {
    /// The service produced a valid report
    Generated(NarrativeReport),

    /// The service was disabled or failed; text is templated locally and the
    /// recommendations come from the rule engine
    Fallback {
        summary: String,
        detailed_analysis: String,
    },
}

impl NarrativeResult {
    /// Templated narrative built from the scan's own numbers
    pub fn fallback(request: &NarrativeRequest) -> Self {
        let summary = format!(
            "Website analyzed with {}KB total weight across {} pages.",
            request.page_weight_kb, request.pages_scanned
        );
        let detailed_analysis = format!(
            "The website has been scanned and analyzed. The measured pages contain {} DOM nodes \
             and took {}ms to load, for an estimated {} kWh and {} kg CO2e per month. \
             Recommendations are derived from fixed performance thresholds.",
            request.dom_nodes, request.execution_ms, request.energy_kwh, request.carbon_kg
        );
        NarrativeResult::Fallback {
            summary,
            detailed_analysis,
        }
    }

    pub fn summary(&self) -> &str {
        match self {
            NarrativeResult::Generated(report) => &report.summary,
            NarrativeResult::Fallback { summary, .. } => summary,
        }
    }

    pub fn detailed_analysis(&self) -> &str {
        match self {
            NarrativeResult::Generated(report) => &report.detailed_analysis,
            NarrativeResult::Fallback {
                detailed_analysis, ..
            } => detailed_analysis,
        }
    }

    pub fn is_generated(&self) -> bool {
        matches!(self, NarrativeResult::Generated(_))
    }
}
