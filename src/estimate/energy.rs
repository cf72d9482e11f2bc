//! Website energy estimator

use crate::crawler::CrawlMetrics;
use crate::estimate::round_to;
use serde::{Deserialize, Serialize};

/// Network transfer energy per megabyte
pub const NETWORK_KWH_PER_MB: f64 = 0.0002;

/// CPU energy per second of script execution
pub const CPU_KWH_PER_SECOND: f64 = 0.00002;

/// Layout energy per thousand DOM nodes
pub const LAYOUT_KWH_PER_1000_NODES: f64 = 0.000005;

/// Tunable coefficients for [`estimate_website_energy`]
///
/// The defaults are intentionally small: the estimate is a lower bound.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnergyCoefficients {
    pub network_kwh_per_mb: f64,
    pub cpu_kwh_per_second: f64,
    pub layout_kwh_per_1000_nodes: f64,
}

impl Default for EnergyCoefficients {
    fn default() -> Self {
        Self {
            network_kwh_per_mb: NETWORK_KWH_PER_MB,
            cpu_kwh_per_second: CPU_KWH_PER_SECOND,
            layout_kwh_per_1000_nodes: LAYOUT_KWH_PER_1000_NODES,
        }
    }
}

/// The three signals the energy model consumes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnergyInputs {
    pub page_weight_kb: u64,
    pub dom_nodes: u64,
    pub execution_ms: u64,
}

impl From<&CrawlMetrics> for EnergyInputs {
    fn from(metrics: &CrawlMetrics) -> Self {
        Self {
            page_weight_kb: page_weight_kb(metrics.total_bytes),
            dom_nodes: metrics.total_dom_nodes,
            execution_ms: metrics.total_execution_ms,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnergyEstimate {
    pub energy_kwh: f64,
}

/// Total transfer size in kilobytes, rounded up and never below 1
pub fn page_weight_kb(total_bytes: u64) -> u64 {
    total_bytes.div_ceil(1024).max(1)
}

/// Monthly energy for the measured pages, rounded to 6 decimal places
///
/// ```text
/// network = (page_weight_kb / 1024) * network_kwh_per_mb
/// cpu     = (execution_ms / 1000)   * cpu_kwh_per_second
/// layout  = (dom_nodes / 1000)      * layout_kwh_per_1000_nodes
/// ```
pub fn estimate_website_energy(
    inputs: &EnergyInputs,
    coefficients: &EnergyCoefficients,
) -> EnergyEstimate {
    let network_kwh = (inputs.page_weight_kb as f64 / 1024.0) * coefficients.network_kwh_per_mb;
    let cpu_kwh = (inputs.execution_ms as f64 / 1000.0) * coefficients.cpu_kwh_per_second;
    let layout_kwh = (inputs.dom_nodes as f64 / 1000.0) * coefficients.layout_kwh_per_1000_nodes;

    EnergyEstimate {
        energy_kwh: round_to(network_kwh + cpu_kwh + layout_kwh, 6),
    }
}
