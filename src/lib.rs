//! GreenScan: website energy and carbon footprint estimator
//!
//! This crate crawls a bounded, same-origin subset of a website, measures
//! transfer size, DOM size and execution time per page, and maps those signals
//! to a lower-bound energy (kWh), carbon (kg CO2e) and cost estimate together
//! with prioritized optimization recommendations. Scans run as asynchronous
//! jobs whose lifecycle is tracked through an explicit state machine.

pub mod config;
pub mod crawler;
pub mod estimate;
pub mod jobs;
pub mod narrative;
pub mod output;
pub mod state;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for GreenScan operations
#[derive(Debug, Error)]
pub enum GreenscanError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Crawl error: {0}")]
    Crawl(#[from] CrawlError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Estimation error: {0}")]
    Estimation(#[from] EstimationError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingHost,
}

/// Failure to fetch a single page
///
/// Never fatal to a crawl: the frontier logs it and moves on.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Network error for {url}: {message}")]
    Network { url: String, message: String },

    #[error("Malformed content at {url}: {message}")]
    Content { url: String, message: String },

    #[error("Browser error for {url}: {message}")]
    Browser { url: String, message: String },

    #[error("Failed to start fetcher: {0}")]
    Setup(String),
}

/// Failure that prevents crawl metrics from existing at all
///
/// The `Display` text is surfaced verbatim as the job's error message.
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("No pages reachable: every page fetch failed for {url}")]
    NoPagesReachable { url: String },

    #[error("Invalid start URL '{url}': {reason}")]
    InvalidSeed { url: String, reason: String },
}

/// Invalid input to one of the estimators
#[derive(Debug, Error, PartialEq)]
pub enum EstimationError {
    #[error("{field} must be a finite number greater than zero, got {value}")]
    NotPositive { field: &'static str, value: f64 },

    #[error("{field} must be a finite, non-negative number, got {value}")]
    Negative { field: &'static str, value: f64 },

    #[error("Unsupported precision '{0}' (expected fp32, fp16 or int8)")]
    UnsupportedPrecision(String),
}

/// Result type alias for GreenScan operations
pub type Result<T> = std::result::Result<T, GreenscanError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{CrawlBudget, CrawlMetrics, PageFetcher, PageResult};
pub use jobs::{ScanJob, ScanOrchestrator, ScanRequest, ScanResult};
pub use state::ScanStatus;
