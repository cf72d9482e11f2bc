//! Storage module for persisting scan jobs
//!
//! This module handles all job-store operations, including:
//! - SQLite database initialization and schema management
//! - Job creation, partial updates, lookup and deletion
//! - Enforcement of the scan state machine on every write
//!
//! The orchestrator only depends on the [`JobStore`] trait; the SQLite and
//! in-memory backends are interchangeable.

mod memory;
mod schema;
mod sqlite;
mod traits;

pub use memory::MemoryJobStore;
pub use sqlite::SqliteJobStore;
pub use traits::{JobStore, JobUpdate, StorageError, StorageResult};

use std::path::Path;

/// Opens the SQLite job store at `path`, creating parent directories
pub fn open_job_store(path: &Path) -> StorageResult<SqliteJobStore> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    SqliteJobStore::new(path)
}
