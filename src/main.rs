//! GreenScan main entry point
//!
//! This is the command-line interface for the GreenScan website footprint
//! estimator.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use greenscan::config::{load_config_with_hash, validate, Config};
use greenscan::estimate::{estimate_ai_inference_energy, AiModelInputs, Precision};
use greenscan::output::{generate_markdown_report, write_json_report};
use greenscan::storage::{open_job_store, JobStore};
use greenscan::{ScanJob, ScanOrchestrator, ScanRequest, ScanStatus};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// GreenScan: website energy and carbon footprint estimator
///
/// GreenScan crawls a bounded, same-origin part of a website, measures page
/// weight, DOM size and execution time, and turns them into conservative
/// energy, carbon and cost estimates with optimization recommendations.
#[derive(Parser, Debug)]
#[command(name = "greenscan")]
#[command(version)]
#[command(about = "Website energy and carbon footprint estimator", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (defaults apply when omitted)
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Scan a website and print its estimated footprint
    Scan {
        /// Start URL; only pages on the same origin are visited
        url: String,

        /// Grid region code for the carbon factor (e.g. us-east-1)
        #[arg(long)]
        region: Option<String>,

        /// Override crawler.max-pages
        #[arg(long)]
        max_pages: Option<u32>,

        /// Override crawler.max-depth
        #[arg(long)]
        max_depth: Option<u32>,

        /// Write a markdown report to this path
        #[arg(long, value_name = "FILE")]
        report: Option<PathBuf>,

        /// Write the full job record as JSON to this path
        #[arg(long, value_name = "FILE")]
        json: Option<PathBuf>,
    },

    /// Show a stored scan job
    Status {
        /// Scan id printed by `scan`
        id: String,

        /// Write a markdown report to this path
        #[arg(long, value_name = "FILE")]
        report: Option<PathBuf>,
    },

    /// List recent scan jobs
    List {
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },

    /// Estimate monthly energy and carbon for serving an AI model
    Ai {
        /// Model parameter count (e.g. 7e9)
        #[arg(long)]
        parameters: f64,

        /// Serving precision: fp32, fp16 or int8
        #[arg(long, default_value = "fp16")]
        precision: Precision,

        /// Sustained requests per second
        #[arg(long)]
        rps: f64,

        /// Hardware efficiency in FLOPs per watt
        #[arg(long)]
        flops_per_watt: f64,

        /// Grid region code for the carbon factor
        #[arg(long)]
        region: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let config = load_configuration(cli.config.as_deref())?;

    match cli.command {
        Command::Scan {
            url,
            region,
            max_pages,
            max_depth,
            report,
            json,
        } => {
            let mut config = config;
            if let Some(max_pages) = max_pages {
                config.crawler.max_pages = max_pages;
            }
            if let Some(max_depth) = max_depth {
                config.crawler.max_depth = max_depth;
            }
            validate(&config).context("Invalid crawl budget")?;

            let region = region.unwrap_or_else(|| config.estimation.default_region.clone());
            handle_scan(&config, ScanRequest::new(url, region), report, json).await
        }
        Command::Status { id, report } => handle_status(&config, &id, report),
        Command::List { limit } => handle_list(&config, limit),
        Command::Ai {
            parameters,
            precision,
            rps,
            flops_per_watt,
            region,
        } => handle_ai(AiModelInputs {
            model_parameters: parameters,
            precision,
            requests_per_second: rps,
            hardware_flops_per_watt: flops_per_watt,
            region,
        }),
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("greenscan=info,warn"),
            1 => EnvFilter::new("greenscan=debug,info"),
            2 => EnvFilter::new("greenscan=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

fn load_configuration(path: Option<&Path>) -> Result<Config> {
    let Some(path) = path else {
        tracing::debug!("No configuration file given, using defaults");
        return Ok(Config::default());
    };

    tracing::info!("Loading configuration from: {}", path.display());
    let (config, hash) = load_config_with_hash(path)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", hash);

    Ok(config)
}

fn open_store(config: &Config) -> Result<Arc<dyn JobStore>> {
    let path = Path::new(&config.output.database_path);
    let store = open_job_store(path)
        .with_context(|| format!("Failed to open job database {}", path.display()))?;
    Ok(Arc::new(store))
}

async fn handle_scan(
    config: &Config,
    request: ScanRequest,
    report: Option<PathBuf>,
    json: Option<PathBuf>,
) -> Result<()> {
    let store = open_store(config)?;
    let orchestrator = ScanOrchestrator::from_config(config, Arc::clone(&store))
        .await
        .context("Failed to start scanner")?;

    let id = orchestrator.submit(request)?;
    println!("Scan {} queued ({} fetcher)", id, orchestrator.fetcher_name());

    let mut handle = orchestrator.spawn(id.clone());
    let mut ticker = tokio::time::interval(Duration::from_millis(500));
    let mut last_scanned = None;

    let job = loop {
        tokio::select! {
            joined = &mut handle => {
                break joined.context("Scan task panicked")??;
            }
            _ = ticker.tick() => {
                if let Ok(job) = store.get(&id) {
                    if let Some(progress) = job.progress.filter(|_| job.status == ScanStatus::Visiting) {
                        if last_scanned != Some(progress.pages_scanned) && progress.pages_scanned > 0 {
                            println!(
                                "  [{}/{}] {}",
                                progress.pages_scanned, progress.pages_total, progress.current_url
                            );
                            last_scanned = Some(progress.pages_scanned);
                        }
                    }
                }
            }
        }
    };

    orchestrator.shutdown().await;

    print_job(&job);
    write_reports(&job, report, json)?;

    if job.status == ScanStatus::Failed {
        bail!(
            "Scan failed: {}",
            job.error_message.as_deref().unwrap_or("unknown error")
        );
    }
    Ok(())
}

fn handle_status(config: &Config, id: &str, report: Option<PathBuf>) -> Result<()> {
    let store = open_store(config)?;
    let job = store
        .get(id)
        .with_context(|| format!("Failed to load scan {}", id))?;

    print_job(&job);
    write_reports(&job, report, None)
}

fn handle_list(config: &Config, limit: usize) -> Result<()> {
    let store = open_store(config)?;
    let jobs = store.list_recent(limit)?;

    if jobs.is_empty() {
        println!("No scans recorded in {}", config.output.database_path);
        return Ok(());
    }

    for job in jobs {
        println!(
            "{}  {:<10} {}  {}",
            job.id,
            job.status.to_string(),
            job.created_at.format("%Y-%m-%d %H:%M:%S"),
            job.request.url
        );
    }
    Ok(())
}

fn handle_ai(inputs: AiModelInputs) -> Result<()> {
    let estimate = estimate_ai_inference_energy(&inputs).context("Invalid model inputs")?;

    println!("=== AI Inference Estimate ===\n");
    println!("  Energy: {} kWh/month", estimate.energy_kwh);
    println!(
        "  Carbon: {} kg CO2e/month (grid factor {} kg/kWh)",
        estimate.carbon_kg, estimate.region_factor_used
    );
    println!("\nAssumptions:");
    for assumption in &estimate.assumptions {
        println!("  - {}", assumption);
    }
    Ok(())
}

fn print_job(job: &ScanJob) {
    println!("\n=== Scan {} ===\n", job.id);
    println!("  URL: {}", job.request.url);
    println!("  Region: {}", job.request.region);
    println!("  Status: {}", job.status);

    if let Some(message) = &job.error_message {
        println!("  Error: {}", message);
    }

    if let Some(progress) = job.progress.as_ref().filter(|_| job.status.is_active()) {
        println!(
            "  Progress: {}/{} ({})",
            progress.pages_scanned, progress.pages_total, progress.current_url
        );
    }

    let Some(result) = &job.result else {
        return;
    };

    println!("\n  Pages scanned: {}", result.metrics.pages_scanned);
    println!("  Page weight: {} KB", result.page_weight_kb);
    println!("  DOM nodes: {}", result.metrics.total_dom_nodes);
    println!("  Execution time: {} ms", result.metrics.total_execution_ms);
    println!("\n  Energy: {} kWh/month", result.energy.energy_kwh);
    println!("  Carbon: {} kg CO2e/month", result.carbon.carbon_kg);
    println!("  Cost: ${:.2}/month", result.estimated_cost_usd);

    println!("\n  {}", result.narrative.summary());

    println!("\nRecommendations:");
    for rec in &result.recommendations {
        println!(
            "  - {} (~{}%, {} effort)",
            rec.title, rec.estimated_reduction_percent, rec.effort
        );
    }
}

fn write_reports(job: &ScanJob, report: Option<PathBuf>, json: Option<PathBuf>) -> Result<()> {
    if let Some(path) = report {
        generate_markdown_report(job, &path)
            .with_context(|| format!("Failed to write report to {}", path.display()))?;
        println!("\nReport written to {}", path.display());
    }
    if let Some(path) = json {
        write_json_report(job, &path)
            .with_context(|| format!("Failed to write JSON to {}", path.display()))?;
        println!("JSON written to {}", path.display());
    }
    Ok(())
}
