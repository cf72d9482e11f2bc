//! Output module for rendering scan reports
//!
//! This module handles:
//! - Markdown reports for finished scan jobs
//! - JSON export of the full job record

mod markdown;

pub use markdown::{format_markdown_report, generate_markdown_report};

use crate::jobs::ScanJob;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur while writing reports
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Writes the full job record as pretty-printed JSON
pub fn write_json_report(job: &ScanJob, output_path: &Path) -> OutputResult<()> {
    let writer = BufWriter::new(File::create(output_path)?);
    serde_json::to_writer_pretty(writer, job)?;
    Ok(())
}
