//! Database schema definitions
//!
//! This module contains the SQL schema for the GreenScan job database.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- One row per scan job; progress and result are JSON documents
CREATE TABLE IF NOT EXISTS scan_jobs (
    id TEXT PRIMARY KEY,
    url TEXT NOT NULL,
    region TEXT NOT NULL,
    status TEXT NOT NULL,
    progress_json TEXT,
    result_json TEXT,
    error_message TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_scan_jobs_status ON scan_jobs(status);
CREATE INDEX IF NOT EXISTS idx_scan_jobs_created ON scan_jobs(created_at);
"#;

/// Initializes the database schema
///
/// # Arguments
///
/// * `conn` - The database connection
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    conn.pragma_update(None, "user_version", get_schema_version())?;
    Ok(())
}

/// Gets the current schema version
///
/// Stored in `PRAGMA user_version` for future migrations.
pub fn get_schema_version() -> u32 {
    1
}
