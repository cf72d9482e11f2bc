//! Cost mapper

use crate::estimate::round_to;

/// Blended electricity price; a proxy for energy spend, not a bill
pub const COST_PER_KWH_USD: f64 = 0.12;

/// Monthly energy cost in USD, rounded to cents
pub fn map_energy_to_cost(energy_kwh: f64) -> f64 {
    round_to(energy_kwh * COST_PER_KWH_USD, 2)
}
