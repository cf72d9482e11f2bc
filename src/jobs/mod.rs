//! Scan jobs: records and the orchestrator that drives them

mod models;
mod orchestrator;

pub use models::{ScanJob, ScanRequest, ScanResult};
pub use orchestrator::ScanOrchestrator;
