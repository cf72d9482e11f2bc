//! Configuration module for GreenScan
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every section is optional; omitted keys fall back to conservative defaults.
//!
//! # Example
//!
//! ```no_run
//! use greenscan::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("greenscan.toml")).unwrap();
//! println!("Scans will visit at most {} pages", config.crawler.max_pages);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    BrowserConfig, Config, CrawlerConfig, EstimationConfig, FetchStrategyKind, NarrativeConfig,
    OutputConfig, UserAgentConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};
pub use validation::validate;
