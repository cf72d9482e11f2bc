//! Gemini-style `generateContent` client for narrative reports

use crate::config::NarrativeConfig;
use crate::estimate::{Effort, Recommendation};
use crate::narrative::{
    build_prompt, NarrativeError, NarrativeReport, NarrativeRequest, NarrativeService,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub struct GeminiClient {
    client: Client,
    endpoint: String,
    model: String,
    api_key: String,
}

impl GeminiClient {
    pub fn new(
        endpoint: &str,
        model: &str,
        api_key: String,
        timeout: Duration,
    ) -> Result<Self, NarrativeError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key,
        })
    }

    /// Builds a client from config, reading the key from `api_key_env`
    pub fn from_config(config: &NarrativeConfig) -> Result<Self, NarrativeError> {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| NarrativeError::MissingApiKey(config.api_key_env.clone()))?;

        Self::new(
            &config.endpoint,
            &config.model,
            api_key,
            Duration::from_secs(config.timeout_secs),
        )
    }

    fn url(&self) -> String {
        format!("{}/models/{}:generateContent", self.endpoint, self.model)
    }
}

#[async_trait]
impl NarrativeService for GeminiClient {
    async fn generate(
        &self,
        request: &NarrativeRequest,
    ) -> Result<NarrativeReport, NarrativeError> {
        let prompt = build_prompt(request);
        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: &prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: 0.7,
                top_k: 40,
                top_p: 0.95,
                max_output_tokens: 4096,
            },
        };

        let response = self
            .client
            .post(self.url())
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            return Err(NarrativeError::Status { status, body });
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| NarrativeError::Malformed(e.to_string()))?;

        let text = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .and_then(|c| c.parts.into_iter().next())
            .map(|p| p.text)
            .filter(|t| !t.trim().is_empty())
            .ok_or(NarrativeError::EmptyResponse)?;

        parse_report(&text)
    }
}

/// Removes a surrounding markdown code fence, if any
fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    let rest = rest.strip_suffix("```").unwrap_or(rest);
    rest.trim()
}

fn required(value: Option<String>, field: &'static str) -> Result<String, NarrativeError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or(NarrativeError::MissingField(field))
}

/// Parses and validates the model's JSON answer
fn parse_report(text: &str) -> Result<NarrativeReport, NarrativeError> {
    let wire: WireReport = serde_json::from_str(strip_code_fences(text))
        .map_err(|e| NarrativeError::Malformed(e.to_string()))?;

    let summary = required(wire.summary, "summary")?;
    let detailed_analysis = required(wire.detailed_analysis, "detailedAnalysis")?;
    let wire_recommendations = wire
        .recommendations
        .filter(|r| !r.is_empty())
        .ok_or(NarrativeError::MissingField("recommendations"))?;

    let recommendations = wire_recommendations
        .into_iter()
        .map(|r| {
            Ok(Recommendation {
                title: required(r.title, "recommendations.title")?,
                estimated_reduction_percent: r
                    .estimated_reduction_percent
                    .filter(|p| p.is_finite())
                    .unwrap_or(0.0)
                    .round()
                    .clamp(0.0, 100.0) as u8,
                effort: parse_effort(r.effort.as_deref()),
                description: r.description.filter(|d| !d.trim().is_empty()),
            })
        })
        .collect::<Result<Vec<_>, NarrativeError>>()?;

    Ok(NarrativeReport {
        summary,
        detailed_analysis,
        recommendations,
    })
}

/// Unrecognized effort labels are treated as medium
fn parse_effort(value: Option<&str>) -> Effort {
    match value.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
        Some("low") => Effort::Low,
        Some("high") => Effort::High,
        _ => Effort::Medium,
    }
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    top_k: u32,
    top_p: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireReport {
    summary: Option<String>,
    detailed_analysis: Option<String>,
    recommendations: Option<Vec<WireRecommendation>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireRecommendation {
    title: Option<String>,
    description: Option<String>,
    estimated_reduction_percent: Option<f64>,
    effort: Option<String>,
}
