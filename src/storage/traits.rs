//! Storage traits and error types
//!
//! This module defines the job store interface shared by every backend, the
//! partial-update type the orchestrator sends through it, and the associated
//! error types.

use crate::crawler::CrawlProgress;
use crate::jobs::{ScanJob, ScanResult};
use crate::state::ScanStatus;
use chrono::Utc;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Scan job not found: {0}")]
    NotFound(String),

    #[error("Scan job already exists: {0}")]
    AlreadyExists(String),

    #[error("Invalid state transition: {from} -> {to}")]
    InvalidTransition { from: ScanStatus, to: ScanStatus },

    #[error("Scan job {id} is {status} and can no longer be modified")]
    TerminalJob { id: String, status: ScanStatus },

    #[error("Corrupt record for scan job {id}: {message}")]
    Corrupt { id: String, message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage lock poisoned")]
    Lock,
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Partial update to a stored scan job
///
/// Only the fields that are `Some` are written. A status equal to the job's
/// current status is accepted as a no-op so progress-only updates can carry
/// it without special casing.
#[derive(Debug, Clone, Default)]
pub struct JobUpdate {
    pub status: Option<ScanStatus>,
    pub progress: Option<CrawlProgress>,
    pub result: Option<ScanResult>,
    pub error_message: Option<String>,
}

impl JobUpdate {
    pub fn status(status: ScanStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn progress(progress: CrawlProgress) -> Self {
        Self {
            progress: Some(progress),
            ..Self::default()
        }
    }

    /// Transition to `Failed` with a user-facing message
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            status: Some(ScanStatus::Failed),
            error_message: Some(message.into()),
            ..Self::default()
        }
    }

    pub fn with_progress(mut self, progress: CrawlProgress) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn with_result(mut self, result: ScanResult) -> Self {
        self.result = Some(result);
        self
    }

    /// Applies the update to `job`, enforcing the state machine
    ///
    /// Terminal jobs reject every update; status changes must be legal
    /// transitions.
    pub fn apply_to(self, job: &mut ScanJob) -> StorageResult<()> {
        if job.status.is_terminal() {
            return Err(StorageError::TerminalJob {
                id: job.id.clone(),
                status: job.status,
            });
        }

        if let Some(next) = self.status {
            if next != job.status && !job.status.can_transition_to(next) {
                return Err(StorageError::InvalidTransition {
                    from: job.status,
                    to: next,
                });
            }
            job.status = next;
        }

        if let Some(progress) = self.progress {
            job.progress = Some(progress);
        }
        if let Some(result) = self.result {
            job.result = Some(result);
        }
        if let Some(message) = self.error_message {
            job.error_message = Some(message);
        }
        job.updated_at = Utc::now();

        Ok(())
    }
}

/// Trait for job store backends
///
/// Implementations must support independent reads and writes per job id from
/// multiple tasks; no cross-job locking is required of callers.
pub trait JobStore: Send + Sync {
    /// Persists a new job and returns its id
    fn create(&self, job: &ScanJob) -> StorageResult<String>;

    /// Applies a partial update and returns the job as stored afterwards
    fn update(&self, id: &str, update: JobUpdate) -> StorageResult<ScanJob>;

    /// Gets a job by id
    fn get(&self, id: &str) -> StorageResult<ScanJob>;

    /// Removes a job regardless of its status
    fn delete(&self, id: &str) -> StorageResult<()>;

    /// Most recently created jobs first
    fn list_recent(&self, limit: usize) -> StorageResult<Vec<ScanJob>>;
}
