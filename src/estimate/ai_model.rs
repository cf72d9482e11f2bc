//! AI-inference energy estimator
//!
//! Same lower-bound discipline as the website estimator: a single forward pass
//! costs roughly `2 * parameters` FLOPs, scaled down modestly for reduced
//! precision, and the hardware efficiency figure is taken at face value.

use crate::estimate::carbon::{region_factor, GLOBAL_CARBON_KG_PER_KWH};
use crate::estimate::round_to;
use crate::EstimationError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const FLOPS_PER_PARAMETER: f64 = 2.0;
const HOURS_PER_MONTH: f64 = 24.0 * 30.0;

/// Numeric precision the model is served at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Precision {
    Fp32,
    Fp16,
    Int8,
}

impl Precision {
    /// Effective-FLOPs multiplier relative to fp32
    pub fn scale(&self) -> f64 {
        match self {
            Precision::Fp32 => 1.0,
            Precision::Fp16 => 0.7,
            Precision::Int8 => 0.5,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Precision::Fp32 => "fp32",
            Precision::Fp16 => "fp16",
            Precision::Int8 => "int8",
        }
    }
}

impl fmt::Display for Precision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Precision {
    type Err = EstimationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fp32" => Ok(Precision::Fp32),
            "fp16" => Ok(Precision::Fp16),
            "int8" => Ok(Precision::Int8),
            _ => Err(EstimationError::UnsupportedPrecision(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiModelInputs {
    pub model_parameters: f64,
    pub precision: Precision,
    pub requests_per_second: f64,
    pub hardware_flops_per_watt: f64,
    pub region: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiEnergyEstimate {
    pub energy_kwh: f64,
    pub carbon_kg: f64,
    pub region_factor_used: f64,
    pub assumptions: Vec<String>,
}

fn require_positive(field: &'static str, value: f64) -> Result<(), EstimationError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(EstimationError::NotPositive { field, value })
    }
}

/// Monthly energy and carbon for serving a model continuously
///
/// ```text
/// watts      = 2 * parameters * precision_scale * rps / flops_per_watt
/// energy_kwh = watts * 24 * 30 / 1000
/// ```
pub fn estimate_ai_inference_energy(
    inputs: &AiModelInputs,
) -> Result<AiEnergyEstimate, EstimationError> {
    require_positive("model_parameters", inputs.model_parameters)?;
    require_positive("requests_per_second", inputs.requests_per_second)?;
    require_positive("hardware_flops_per_watt", inputs.hardware_flops_per_watt)?;

    let flops_per_inference =
        inputs.model_parameters * FLOPS_PER_PARAMETER * inputs.precision.scale();
    let watts = flops_per_inference * inputs.requests_per_second / inputs.hardware_flops_per_watt;
    let energy_kwh = round_to(watts * HOURS_PER_MONTH / 1000.0, 6);

    let known_factor = inputs.region.as_deref().and_then(region_factor);
    let factor = known_factor.unwrap_or(GLOBAL_CARBON_KG_PER_KWH);
    let region_note = if known_factor.is_some() {
        "Region grid factor applied using coarse averages."
    } else {
        "Global average grid factor applied when region is missing or unsupported."
    };

    Ok(AiEnergyEstimate {
        energy_kwh,
        carbon_kg: round_to(energy_kwh * factor, 6),
        region_factor_used: factor,
        assumptions: vec![
            "Inference-only estimate; training energy is excluded.".to_string(),
            "FLOPs per inference approximated as 2x parameter count (single forward pass)."
                .to_string(),
            "Precision scaling uses conservative reductions for fp16 and int8.".to_string(),
            "Hardware efficiency is provided by the user and treated as constant.".to_string(),
            region_note.to_string(),
        ],
    })
}
