//! Markdown report generation
//!
//! This module renders a human-readable report for a scan job: crawl
//! metrics, energy, carbon and cost estimates, recommendations and the
//! methodology assumptions. Failed and unfinished jobs render their status
//! (and error) only.

use crate::jobs::{ScanJob, ScanResult};
use crate::output::OutputResult;
use crate::state::ScanStatus;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Writes the markdown report for `job` to `output_path`
pub fn generate_markdown_report(job: &ScanJob, output_path: &Path) -> OutputResult<()> {
    let markdown = format_markdown_report(job);

    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;

    Ok(())
}

/// Formats a scan job as markdown
pub fn format_markdown_report(job: &ScanJob) -> String {
    let mut md = String::new();

    md.push_str("# GreenScan Report\n\n");

    md.push_str("## Scan Information\n\n");
    md.push_str(&format!("- **Scan ID**: {}\n", job.id));
    md.push_str(&format!("- **URL**: {}\n", job.request.url));
    md.push_str(&format!("- **Region**: {}\n", job.request.region));
    md.push_str(&format!("- **Status**: {}\n", job.status));
    md.push_str(&format!("- **Created**: {}\n", job.created_at.to_rfc3339()));
    md.push_str(&format!("- **Updated**: {}\n\n", job.updated_at.to_rfc3339()));

    match (&job.status, &job.result) {
        (ScanStatus::Completed, Some(result)) => push_result(&mut md, result),
        (ScanStatus::Failed, _) => {
            md.push_str("## Failure\n\n");
            md.push_str(
                job.error_message
                    .as_deref()
                    .unwrap_or("The scan failed without an error message."),
            );
            md.push_str("\n\n");
        }
        _ => {
            if let Some(progress) = &job.progress {
                md.push_str("## Progress\n\n");
                md.push_str(&format!(
                    "- **Pages Scanned**: {} of ~{}\n",
                    progress.pages_scanned, progress.pages_total
                ));
                md.push_str(&format!("- **Current URL**: {}\n\n", progress.current_url));
            }
        }
    }

    md.push_str("---\n\n");
    md.push_str(
        "*Estimates are deliberately conservative lower bounds, not measurements or bills.*\n",
    );

    md
}

fn push_result(md: &mut String, result: &ScanResult) {
    let metrics = &result.metrics;

    md.push_str("## Summary\n\n");
    md.push_str(result.narrative.summary());
    md.push_str("\n\n");

    md.push_str("## Measurements\n\n");
    md.push_str("| Metric | Value |\n");
    md.push_str("|--------|-------|\n");
    md.push_str(&format!("| Pages Scanned | {} |\n", metrics.pages_scanned));
    md.push_str(&format!(
        "| Page Weight | {} KB ({:.2} MB) |\n",
        result.page_weight_kb,
        result.page_weight_kb as f64 / 1024.0
    ));
    md.push_str(&format!("| DOM Nodes | {} |\n", metrics.total_dom_nodes));
    md.push_str(&format!(
        "| Execution Time | {} ms |\n",
        metrics.total_execution_ms
    ));
    md.push_str(&format!("| Visited URL | {} |\n", metrics.visited_url));
    md.push_str(&format!(
        "| Visited At | {} |\n\n",
        metrics.visited_at.to_rfc3339()
    ));

    md.push_str("## Estimated Impact (per month)\n\n");
    md.push_str(&format!("- **Energy**: {} kWh\n", result.energy.energy_kwh));
    md.push_str(&format!(
        "- **Carbon**: {} kg CO2e (grid factor {} kg/kWh)\n",
        result.carbon.carbon_kg, result.carbon.region_factor_used
    ));
    md.push_str(&format!(
        "- **Cost**: ${:.2}\n\n",
        result.estimated_cost_usd
    ));

    md.push_str("## Recommendations\n\n");
    md.push_str("| # | Recommendation | Est. Reduction | Effort |\n");
    md.push_str("|---|----------------|----------------|--------|\n");
    for (i, rec) in result.recommendations.iter().enumerate() {
        md.push_str(&format!(
            "| {} | {} | {}% | {} |\n",
            i + 1,
            rec.title,
            rec.estimated_reduction_percent,
            rec.effort
        ));
    }
    md.push('\n');

    for rec in &result.recommendations {
        if let Some(description) = &rec.description {
            md.push_str(&format!("### {}\n\n{}\n\n", rec.title, description));
        }
    }

    md.push_str("## Detailed Analysis\n\n");
    md.push_str(result.narrative.detailed_analysis());
    md.push_str("\n\n");

    md.push_str("## Pages Visited\n\n");
    for page in &metrics.pages_visited {
        md.push_str(&format!("- {}\n", page));
    }
    md.push('\n');

    if let Some(path) = &result.snapshot_path {
        md.push_str(&format!("Snapshot of the first page: `{}`\n\n", path.display()));
    }

    md.push_str("## Assumptions\n\n");
    for assumption in &result.assumptions {
        md.push_str(&format!("- {}\n", assumption));
    }
    md.push('\n');
}
