//! Database schema and migrations
//!
//! Uses SQLite with embedded migrations managed via PRAGMA user_version.

use rusqlite::Connection;

/// Current schema version
pub const SCHEMA_VERSION: i32 = 1;

/// SQL migrations, indexed by version number
const MIGRATIONS: &[&str] = &[
    // Version 1: bucket tables and refresh ledger
    r#"
    -- ============================================
    -- Coding activity
    -- ============================================

    CREATE TABLE IF NOT EXISTS coding_daily (
        date              TEXT PRIMARY KEY,
        total_seconds     REAL NOT NULL DEFAULT 0,
        total_minutes     INTEGER NOT NULL DEFAULT 0,
        source_timezone   TEXT,
        last_ingested_at  TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS coding_languages (
        date              TEXT NOT NULL,
        name              TEXT NOT NULL,
        total_seconds     REAL NOT NULL DEFAULT 0,
        total_minutes     INTEGER NOT NULL DEFAULT 0,
        percent           REAL NOT NULL DEFAULT 0,
        PRIMARY KEY (date, name)
    );

    CREATE TABLE IF NOT EXISTS coding_projects (
        date              TEXT NOT NULL,
        name              TEXT NOT NULL,
        total_seconds     REAL NOT NULL DEFAULT 0,
        total_minutes     INTEGER NOT NULL DEFAULT 0,
        percent           REAL NOT NULL DEFAULT 0,
        PRIMARY KEY (date, name)
    );

    CREATE TABLE IF NOT EXISTS coding_editors (
        date              TEXT NOT NULL,
        name              TEXT NOT NULL,
        total_seconds     REAL NOT NULL DEFAULT 0,
        total_minutes     INTEGER NOT NULL DEFAULT 0,
        percent           REAL NOT NULL DEFAULT 0,
        PRIMARY KEY (date, name)
    );

    -- Replaced as a whole per date: 24 rows, hour 0..23
    CREATE TABLE IF NOT EXISTS coding_hourly (
        date              TEXT NOT NULL,
        hour              INTEGER NOT NULL CHECK (hour BETWEEN 0 AND 23),
        seconds           REAL NOT NULL DEFAULT 0,
        languages         JSON NOT NULL DEFAULT '{}',
        PRIMARY KEY (date, hour)
    );

    -- ============================================
    -- Contributions
    -- ============================================

    CREATE TABLE IF NOT EXISTS contribution_days (
        date              TEXT PRIMARY KEY,
        count             INTEGER NOT NULL DEFAULT 0,
        last_ingested_at  TEXT NOT NULL
    );

    -- Scoped to the exact range of the refresh that produced them
    CREATE TABLE IF NOT EXISTS contribution_repos (
        range_start       TEXT NOT NULL,
        range_end         TEXT NOT NULL,
        repo              TEXT NOT NULL,
        count             INTEGER NOT NULL DEFAULT 0,
        PRIMARY KEY (range_start, range_end, repo)
    );

    -- ============================================
    -- Refresh ledger
    -- ============================================

    CREATE TABLE IF NOT EXISTS refresh_ledger (
        job_type          TEXT PRIMARY KEY,
        last_run_at       TEXT NOT NULL
    );

    -- ============================================
    -- Indexes
    -- ============================================

    CREATE INDEX IF NOT EXISTS idx_coding_languages_date ON coding_languages(date);
    CREATE INDEX IF NOT EXISTS idx_coding_projects_date ON coding_projects(date);
    CREATE INDEX IF NOT EXISTS idx_coding_editors_date ON coding_editors(date);
    "#,
];

/// Run all pending migrations
pub fn run_migrations(conn: &Connection) -> crate::error::Result<()> {
    let current_version: i32 = conn
        .query_row("PRAGMA user_version", [], |r| r.get(0))
        .unwrap_or(0);

    tracing::info!(
        current_version,
        target_version = SCHEMA_VERSION,
        "Checking database migrations"
    );

    for (i, migration) in MIGRATIONS.iter().enumerate() {
        let version = (i + 1) as i32;
        if version > current_version {
            tracing::info!(version, "Running migration");
            conn.execute_batch(migration)?;
            conn.execute(&format!("PRAGMA user_version = {}", version), [])?;
        }
    }

    if current_version < SCHEMA_VERSION {
        tracing::info!(
            from = current_version,
            to = SCHEMA_VERSION,
            "Migrations complete"
        );
    }

    Ok(())
}

/// Get the current schema version from the database
pub fn get_schema_version(conn: &Connection) -> crate::error::Result<i32> {
    let version: i32 = conn.query_row("PRAGMA user_version", [], |r| r.get(0))?;
    Ok(version)
}
