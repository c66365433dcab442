//! Refresh ledger: last successful run per job.
//!
//! The ledger only throttles scheduled work. Manual refreshes and backfills
//! never consult it.

use super::Database;
use crate::error::Result;
use crate::types::{JobType, RefreshLedgerEntry};
use chrono::{DateTime, Duration, Utc};
use rusqlite::{params, OptionalExtension};

impl Database {
    /// Whether `job` is due at `now`.
    ///
    /// True when the job never ran, when its stored timestamp cannot be parsed,
    /// or when at least `min_minutes` have elapsed since it last succeeded.
    pub fn should_refresh(&self, job: JobType, min_minutes: i64, now: DateTime<Utc>) -> Result<bool> {
        let Some(entry) = self.ledger_entry(job)? else {
            return Ok(true);
        };

        let Some(last_run) = entry.last_run() else {
            tracing::warn!(
                job = %job,
                last_run_at = %entry.last_run_at,
                "Unparsable ledger timestamp, treating job as due"
            );
            return Ok(true);
        };

        // An interval past chrono's range is never reached
        Ok(Duration::try_minutes(min_minutes).is_some_and(|min| now - last_run >= min))
    }

    /// Record that `job` succeeded at `now`.
    pub fn mark_refreshed(&self, job: JobType, now: DateTime<Utc>) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            r#"
            INSERT INTO refresh_ledger (job_type, last_run_at)
            VALUES (?1, ?2)
            ON CONFLICT(job_type) DO UPDATE SET last_run_at = excluded.last_run_at
            "#,
            params![job.as_str(), now.to_rfc3339()],
        )?;
        tracing::debug!(job = %job, at = %now, "Ledger updated");
        Ok(())
    }

    /// Ledger row for one job, if it has ever succeeded.
    pub fn ledger_entry(&self, job: JobType) -> Result<Option<RefreshLedgerEntry>> {
        let conn = self.conn.lock().unwrap();
        let entry = conn
            .query_row(
                "SELECT job_type, last_run_at FROM refresh_ledger WHERE job_type = ?1",
                params![job.as_str()],
                |row| {
                    Ok(RefreshLedgerEntry {
                        job_type: row.get(0)?,
                        last_run_at: row.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(entry)
    }

    /// Every ledger row, by job name.
    pub fn ledger_entries(&self) -> Result<Vec<RefreshLedgerEntry>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt =
            conn.prepare("SELECT job_type, last_run_at FROM refresh_ledger ORDER BY job_type")?;
        let entries = stmt
            .query_map([], |row| {
                Ok(RefreshLedgerEntry {
                    job_type: row.get(0)?,
                    last_run_at: row.get(1)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(entries)
    }
}
