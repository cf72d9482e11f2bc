//! Carbon mapper: energy plus grid region to kg CO2e

use crate::estimate::round_to;
use serde::{Deserialize, Serialize};

/// Coarse grid carbon intensity per region (kg CO2e per kWh)
pub const REGION_CARBON_KG_PER_KWH: [(&str, f64); 3] = [
    ("us-east-1", 0.475),
    ("eu-north-1", 0.02),
    ("ap-south-1", 0.7),
];

/// Used when the region is missing or not in the table
pub const GLOBAL_CARBON_KG_PER_KWH: f64 = 0.4;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CarbonEstimate {
    pub carbon_kg: f64,
    pub region_factor_used: f64,
}

/// Looks up a known region's factor; region codes are case-insensitive
pub fn region_factor(region: &str) -> Option<f64> {
    let region = region.trim();
    REGION_CARBON_KG_PER_KWH
        .iter()
        .find(|(code, _)| code.eq_ignore_ascii_case(region))
        .map(|(_, factor)| *factor)
}

/// Maps energy to carbon, rounded to 6 decimal places
///
/// Total: an unknown region is valid input and uses
/// [`GLOBAL_CARBON_KG_PER_KWH`].
pub fn map_energy_to_carbon(energy_kwh: f64, region: &str) -> CarbonEstimate {
    let factor = region_factor(region).unwrap_or(GLOBAL_CARBON_KG_PER_KWH);
    CarbonEstimate {
        carbon_kg: round_to(energy_kwh * factor, 6),
        region_factor_used: factor,
    }
}
