//! Scan job records

use crate::crawler::{CrawlMetrics, CrawlProgress};
use crate::estimate::{CarbonEstimate, EnergyEstimate, Recommendation};
use crate::narrative::NarrativeResult;
use crate::state::ScanStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

/// What the caller asked to scan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanRequest {
    pub url: String,

    /// Grid region code used for the carbon factor
    pub region: String,
}

impl ScanRequest {
    pub fn new(url: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            region: region.into(),
        }
    }
}

/// Everything a completed scan produces
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanResult {
    pub metrics: CrawlMetrics,
    pub page_weight_kb: u64,
    pub energy: EnergyEstimate,
    pub carbon: CarbonEstimate,
    pub estimated_cost_usd: f64,
    pub narrative: NarrativeResult,
    pub recommendations: Vec<Recommendation>,
    pub assumptions: Vec<String>,

    /// Where the first page's snapshot was written, if one was captured
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot_path: Option<PathBuf>,
}

/// A scan job as held by the job store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanJob {
    pub id: String,
    pub request: ScanRequest,
    pub status: ScanStatus,
    pub progress: Option<CrawlProgress>,
    pub result: Option<ScanResult>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ScanJob {
    /// A fresh, queued job with a random id
    pub fn new(request: ScanRequest) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            request,
            status: ScanStatus::Queued,
            progress: None,
            result: None,
            error_message: None,
            created_at: now,
            updated_at: now,
        }
    }
}
