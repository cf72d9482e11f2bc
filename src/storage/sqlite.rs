//! SQLite job store
//!
//! This module provides a SQLite-based implementation of the JobStore trait.
//! The connection is guarded by a mutex so one store can be shared across
//! concurrently running scan jobs.

use crate::jobs::{ScanJob, ScanRequest};
use crate::state::ScanStatus;
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{JobStore, JobUpdate, StorageError, StorageResult};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

const SELECT_COLUMNS: &str = "SELECT id, url, region, status, progress_json, result_json,
     error_message, created_at, updated_at FROM scan_jobs";

/// SQLite storage backend
pub struct SqliteJobStore {
    conn: Mutex<Connection>,
}

impl SqliteJobStore {
    /// Opens (or creates) the job database at `path`
    pub fn new(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        // Configure SQLite for better performance
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> StorageResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StorageError::Lock)
    }
}

/// Raw column values, converted to a [`ScanJob`] outside the row closure
struct JobRow {
    id: String,
    url: String,
    region: String,
    status: String,
    progress_json: Option<String>,
    result_json: Option<String>,
    error_message: Option<String>,
    created_at: String,
    updated_at: String,
}

impl JobRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            url: row.get(1)?,
            region: row.get(2)?,
            status: row.get(3)?,
            progress_json: row.get(4)?,
            result_json: row.get(5)?,
            error_message: row.get(6)?,
            created_at: row.get(7)?,
            updated_at: row.get(8)?,
        })
    }

    fn into_job(self) -> StorageResult<ScanJob> {
        let status = ScanStatus::from_db_string(&self.status).ok_or_else(|| {
            StorageError::Corrupt {
                id: self.id.clone(),
                message: format!("unknown status '{}'", self.status),
            }
        })?;

        let progress = self
            .progress_json
            .as_deref()
            .map(serde_json::from_str)
            .transpose()?;
        let result = self
            .result_json
            .as_deref()
            .map(serde_json::from_str)
            .transpose()?;

        Ok(ScanJob {
            created_at: parse_timestamp(&self.id, &self.created_at)?,
            updated_at: parse_timestamp(&self.id, &self.updated_at)?,
            id: self.id,
            request: ScanRequest {
                url: self.url,
                region: self.region,
            },
            status,
            progress,
            result,
            error_message: self.error_message,
        })
    }
}

fn parse_timestamp(id: &str, value: &str) -> StorageResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| StorageError::Corrupt {
            id: id.to_string(),
            message: format!("bad timestamp '{}': {}", value, e),
        })
}

fn to_json<T: serde::Serialize>(value: &Option<T>) -> StorageResult<Option<String>> {
    Ok(value.as_ref().map(serde_json::to_string).transpose()?)
}

fn fetch_job(conn: &Connection, id: &str) -> StorageResult<ScanJob> {
    let sql = format!("{} WHERE id = ?1", SELECT_COLUMNS);
    conn.query_row(&sql, params![id], JobRow::from_row)
        .optional()?
        .ok_or_else(|| StorageError::NotFound(id.to_string()))?
        .into_job()
}

impl JobStore for SqliteJobStore {
    fn create(&self, job: &ScanJob) -> StorageResult<String> {
        let conn = self.lock()?;
        let inserted = conn.execute(
            "INSERT OR IGNORE INTO scan_jobs
             (id, url, region, status, progress_json, result_json, error_message, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                job.id,
                job.request.url,
                job.request.region,
                job.status.to_db_string(),
                to_json(&job.progress)?,
                to_json(&job.result)?,
                job.error_message,
                job.created_at.to_rfc3339_opts(SecondsFormat::Micros, true),
                job.updated_at.to_rfc3339_opts(SecondsFormat::Micros, true),
            ],
        )?;

        if inserted == 0 {
            return Err(StorageError::AlreadyExists(job.id.clone()));
        }
        Ok(job.id.clone())
    }

    fn update(&self, id: &str, update: JobUpdate) -> StorageResult<ScanJob> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        let mut job = fetch_job(&tx, id)?;
        update.apply_to(&mut job)?;

        tx.execute(
            "UPDATE scan_jobs
             SET status = ?1, progress_json = ?2, result_json = ?3, error_message = ?4, updated_at = ?5
             WHERE id = ?6",
            params![
                job.status.to_db_string(),
                to_json(&job.progress)?,
                to_json(&job.result)?,
                job.error_message,
                job.updated_at.to_rfc3339_opts(SecondsFormat::Micros, true),
                id,
            ],
        )?;
        tx.commit()?;

        Ok(job)
    }

    fn get(&self, id: &str) -> StorageResult<ScanJob> {
        let conn = self.lock()?;
        fetch_job(&conn, id)
    }

    fn delete(&self, id: &str) -> StorageResult<()> {
        let conn = self.lock()?;
        let deleted = conn.execute("DELETE FROM scan_jobs WHERE id = ?1", params![id])?;
        if deleted == 0 {
            return Err(StorageError::NotFound(id.to_string()));
        }
        Ok(())
    }

    fn list_recent(&self, limit: usize) -> StorageResult<Vec<ScanJob>> {
        let conn = self.lock()?;
        let sql = format!("{} ORDER BY created_at DESC, rowid DESC LIMIT ?1", SELECT_COLUMNS);
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![limit as i64], JobRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter().map(JobRow::into_job).collect()
    }
}
