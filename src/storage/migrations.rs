//! Schema migrations.
//!
//! The schema version lives in `PRAGMA user_version`. Each entry of
//! [`STEPS`] upgrades the schema by one version and is applied in its own
//! transaction together with the version bump.

use rusqlite::Connection;

use crate::error::SyncError;

/// SQL for each version, starting at 1.
const STEPS: &[&str] = &[
    // v1: serialized documents keyed by name
    r"
    CREATE TABLE IF NOT EXISTS local_storage (
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL,
        updated_at TEXT NOT NULL
    );
    ",
];

/// Schema version a fully migrated database reports.
pub fn latest_version() -> i32 {
    i32::try_from(STEPS.len()).unwrap_or(i32::MAX)
}

/// Read the schema version; 0 for a fresh database.
pub fn get_version(conn: &Connection) -> Result<i32, SyncError> {
    conn.query_row("PRAGMA user_version", [], |row| row.get(0))
        .map_err(|e| SyncError::Database(format!("Failed to read schema version: {e}")))
}

/// Bring the schema up to [`latest_version`].
pub fn run(conn: &Connection) -> Result<(), SyncError> {
    let current = get_version(conn)?;
    if current > latest_version() {
        return Err(SyncError::Database(format!(
            "Database schema v{current} is newer than supported v{}",
            latest_version()
        )));
    }

    for (index, sql) in STEPS.iter().enumerate().skip(usize::try_from(current).unwrap_or(0)) {
        let version = index + 1;
        conn.execute_batch(&format!(
            "BEGIN;\n{sql}\nPRAGMA user_version = {version};\nCOMMIT;"
        ))
        .map_err(|e| {
            let _ = conn.execute_batch("ROLLBACK;");
            SyncError::Database(format!("Migration v{version} failed: {e}"))
        })?;
    }

    Ok(())
}
