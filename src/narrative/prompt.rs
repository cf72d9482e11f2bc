//! Prompt construction for the narrative service

use crate::narrative::NarrativeRequest;
use std::fmt::Write;

const TASK: &str = r#"## YOUR TASK
Analyze this website and provide:

1. SUMMARY: a clear 3-4 sentence executive summary covering overall performance,
   the main carbon footprint contributors and the key optimization opportunities.

2. DETAILED ANALYSIS: a 4-5 paragraph analysis covering performance issues, carbon
   impact, user experience, technical debt and business impact.

3. RECOMMENDATIONS: 5-8 prioritized recommendations, each with an actionable title,
   a 3-4 sentence description (problem, why it matters, how to fix it, expected
   benefit), a realistic reduction percentage (5-40) and an effort level
   (low/medium/high).

Focus on images and media, JavaScript, CSS, DOM complexity, caching, server
optimization, third-party scripts and fonts.

## OUTPUT FORMAT
Return ONLY valid JSON in this exact format, with no markdown and no extra text:
{
  "summary": "...",
  "detailedAnalysis": "...",
  "recommendations": [
    {
      "title": "...",
      "description": "...",
      "estimatedReductionPercent": 25,
      "effort": "low"
    }
  ]
}

Use the actual numbers from the metrics and prioritize recommendations by impact."#;

/// Renders the analysis prompt for `request`
pub fn build_prompt(request: &NarrativeRequest) -> String {
    let mut prompt = String::from(
        "You are an expert web performance analyst and carbon footprint consultant. \
         Analyze this website and provide actionable insights.\n\n",
    );

    // Writing into a String cannot fail
    let _ = writeln!(prompt, "## WEBSITE DETAILS");
    let _ = writeln!(prompt, "Website URL: {}", request.visited_url);
    let _ = writeln!(prompt, "Pages Scanned: {}", request.pages_scanned);
    let _ = writeln!(prompt, "Sample Pages Analyzed:");
    for page in &request.sample_pages {
        let _ = writeln!(prompt, "- {}", page);
    }

    let _ = writeln!(prompt, "\n## PERFORMANCE METRICS");
    let _ = writeln!(
        prompt,
        "Total Page Weight: {} KB ({:.2} MB)",
        request.page_weight_kb,
        request.page_weight_kb as f64 / 1024.0
    );
    let _ = writeln!(prompt, "DOM Nodes: {}", request.dom_nodes);
    let _ = writeln!(
        prompt,
        "JavaScript Execution Time: {} ms ({:.2} seconds)",
        request.execution_ms,
        request.execution_ms as f64 / 1000.0
    );

    let _ = writeln!(prompt, "\n## ENVIRONMENTAL IMPACT");
    let _ = writeln!(
        prompt,
        "Estimated Energy Consumption: {} kWh per month",
        request.energy_kwh
    );
    let _ = writeln!(
        prompt,
        "Estimated Carbon Footprint: {} kg CO2e per month\n",
        request.carbon_kg
    );

    prompt.push_str(TASK);
    prompt
}
