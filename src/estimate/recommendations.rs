//! Recommendation rule engine
//!
//! Each signal has a severe and a moderate band. Impact is a linear score
//! against a reference value, clamped per signal; moderate bands scale that
//! impact down with a published floor.

use crate::estimate::EnergyInputs;
use serde::{Deserialize, Serialize};
use std::fmt;

const WEIGHT_SEVERE_KB: u64 = 1800;
const WEIGHT_MODERATE_KB: u64 = 900;
const DOM_SEVERE_NODES: u64 = 3000;
const DOM_MODERATE_NODES: u64 = 2000;
const EXEC_SEVERE_MS: u64 = 1800;
const EXEC_MODERATE_MS: u64 = 1000;

const FALLBACK_TITLE: &str = "Maintain current performance budget";
const FALLBACK_PERCENT: u8 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Effort {
    Low,
    Medium,
    High,
}

impl Effort {
    pub fn as_str(&self) -> &'static str {
        match self {
            Effort::Low => "low",
            Effort::Medium => "medium",
            Effort::High => "high",
        }
    }
}

impl fmt::Display for Effort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    pub title: String,

    /// Always within 0..=100
    pub estimated_reduction_percent: u8,
    pub effort: Effort,

    /// Only present on narrative-generated recommendations
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Recommendation {
    fn rule(title: &str, percent: u8, effort: Effort) -> Self {
        Self {
            title: title.to_string(),
            estimated_reduction_percent: percent.min(100),
            effort,
            description: None,
        }
    }
}

/// `round(value / reference * multiplier)` clamped into `min..=max`
fn impact(value: u64, reference: f64, multiplier: f64, min: f64, max: f64) -> f64 {
    (value as f64 / reference * multiplier).round().clamp(min, max)
}

/// Moderate-band impact: a fraction of the severe impact, never below `floor`
fn scaled(impact: f64, factor: f64, floor: f64) -> u8 {
    (impact * factor).round().max(floor) as u8
}

/// Ranked suggestions for the measured signals; never empty
///
/// Order is page weight, then DOM size, then execution time. When no signal
/// crosses its moderate threshold a single "maintain" entry is returned.
pub fn generate_website_recommendations(inputs: &EnergyInputs) -> Vec<Recommendation> {
    let mut recommendations = Vec::new();

    let weight_impact = impact(inputs.page_weight_kb, 1000.0, 6.0, 6.0, 20.0);
    let dom_impact = impact(inputs.dom_nodes, 2000.0, 5.0, 5.0, 16.0);
    let exec_impact = impact(inputs.execution_ms, 1000.0, 6.0, 6.0, 22.0);

    if inputs.page_weight_kb > WEIGHT_SEVERE_KB {
        recommendations.push(Recommendation::rule(
            "Image compression",
            weight_impact as u8,
            Effort::Low,
        ));
    } else if inputs.page_weight_kb > WEIGHT_MODERATE_KB {
        recommendations.push(Recommendation::rule(
            "Lazy loading",
            scaled(weight_impact, 0.7, 6.0),
            Effort::Low,
        ));
    }

    if inputs.dom_nodes > DOM_SEVERE_NODES {
        recommendations.push(Recommendation::rule(
            "Reduce DOM depth",
            dom_impact as u8,
            Effort::Medium,
        ));
    } else if inputs.dom_nodes > DOM_MODERATE_NODES {
        recommendations.push(Recommendation::rule(
            "Streamline layout structure",
            scaled(dom_impact, 0.8, 5.0),
            Effort::Low,
        ));
    }

    if inputs.execution_ms > EXEC_SEVERE_MS {
        recommendations.push(Recommendation::rule(
            "Remove unused JS",
            exec_impact as u8,
            Effort::Medium,
        ));
    } else if inputs.execution_ms > EXEC_MODERATE_MS {
        recommendations.push(Recommendation::rule(
            "Defer non-critical JS",
            scaled(exec_impact, 0.7, 6.0),
            Effort::Low,
        ));
    }

    if recommendations.is_empty() {
        recommendations.push(Recommendation::rule(
            FALLBACK_TITLE,
            FALLBACK_PERCENT,
            Effort::Low,
        ));
    }

    recommendations
}
