//! Deterministic estimation pipeline
//!
//! Maps crawl metrics to energy (kWh/month), carbon (kg CO2e/month) and cost,
//! and to a ranked list of optimization recommendations. Every function here
//! is pure: identical inputs always produce identical outputs.
//!
//! All figures are deliberately conservative lower bounds, not bills.

mod ai_model;
mod carbon;
mod cost;
mod energy;
mod recommendations;

pub use ai_model::{estimate_ai_inference_energy, AiEnergyEstimate, AiModelInputs, Precision};
pub use carbon::{
    map_energy_to_carbon, region_factor, CarbonEstimate, GLOBAL_CARBON_KG_PER_KWH,
    REGION_CARBON_KG_PER_KWH,
};
pub use cost::{map_energy_to_cost, COST_PER_KWH_USD};
pub use energy::{
    estimate_website_energy, page_weight_kb, EnergyCoefficients, EnergyEstimate, EnergyInputs,
    CPU_KWH_PER_SECOND, LAYOUT_KWH_PER_1000_NODES, NETWORK_KWH_PER_MB,
};
pub use recommendations::{generate_website_recommendations, Effort, Recommendation};

/// Methodology caveats attached to every website scan result
pub const WEBSITE_ASSUMPTIONS: [&str; 5] = [
    "Transferred bytes are based on response sizes reported by the fetcher and may undercount.",
    "JS execution time is approximated by page load duration.",
    "Only a bounded, same-origin portion of the site is crawled (not exhaustive).",
    "Energy estimation uses lower-bound heuristics for network, CPU, and layout costs.",
    "Region grid factors are coarse averages and may differ from local conditions.",
];

/// Rounds to a fixed number of decimal places
pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}

/// Owned copy of [`WEBSITE_ASSUMPTIONS`] for storing in a result
pub fn website_assumptions() -> Vec<String> {
    WEBSITE_ASSUMPTIONS.iter().map(|s| s.to_string()).collect()
}
