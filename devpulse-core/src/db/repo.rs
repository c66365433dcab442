//! Database repository layer
//!
//! The bucket store: idempotent writes for every bucket table, plus the
//! ranged reads the views and the rollup are built from.

use crate::error::Result;
use crate::time::DateSpan;
use crate::types::*;
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, Row, TransactionBehavior};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Mutex;

/// Database handle (single connection behind a mutex)
pub struct Database {
    pub(super) conn: Mutex<Connection>,
}

/// Finite, non-negative seconds; anything else is stored as zero.
fn clean_seconds(seconds: f64) -> f64 {
    if seconds.is_finite() && seconds > 0.0 {
        seconds
    } else {
        0.0
    }
}

fn parse_timestamp(value: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_default()
}

impl Database {
    /// Open or create a database at the given path
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;

        // WAL lets readers proceed while a refresh is writing
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA busy_timeout = 5000;
            ",
        )?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Run migrations on this database
    pub fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        super::schema::run_migrations(&conn)
    }

    /// Get the underlying connection (for advanced use)
    pub fn connection(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().unwrap()
    }

    // ============================================
    // Coding activity writes
    // ============================================

    /// Insert or overwrite the daily summary for `date`.
    pub fn upsert_daily_summary(
        &self,
        date: NaiveDate,
        total_seconds: f64,
        timezone: Option<&str>,
        ingested_at: DateTime<Utc>,
    ) -> Result<()> {
        let seconds = clean_seconds(total_seconds);
        let conn = self.conn.lock().unwrap();
        conn.execute(
            r#"
            INSERT INTO coding_daily (date, total_seconds, total_minutes, source_timezone, last_ingested_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(date) DO UPDATE SET
                total_seconds = excluded.total_seconds,
                total_minutes = excluded.total_minutes,
                source_timezone = excluded.source_timezone,
                last_ingested_at = excluded.last_ingested_at
            "#,
            params![
                date,
                seconds,
                seconds_to_minutes(seconds),
                timezone,
                ingested_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Insert or overwrite one (date, name) row of a dimension breakdown.
    ///
    /// Names that disappear from a later report for the same date are left in place.
    pub fn upsert_breakdown(
        &self,
        dimension: Dimension,
        date: NaiveDate,
        name: &str,
        total_seconds: f64,
        percent: f64,
    ) -> Result<()> {
        let seconds = clean_seconds(total_seconds);
        let percent = if percent.is_finite() { percent } else { 0.0 };
        let conn = self.conn.lock().unwrap();
        conn.execute(
            &format!(
                r#"
                INSERT INTO {table} (date, name, total_seconds, total_minutes, percent)
                VALUES (?1, ?2, ?3, ?4, ?5)
                ON CONFLICT(date, name) DO UPDATE SET
                    total_seconds = excluded.total_seconds,
                    total_minutes = excluded.total_minutes,
                    percent = excluded.percent
                "#,
                table = dimension.table()
            ),
            params![date, name, seconds, seconds_to_minutes(seconds), percent],
        )?;
        Ok(())
    }

    /// Replace every hourly bucket of `date` with exactly the 24 given.
    ///
    /// The delete and the inserts share one immediate transaction, so two
    /// concurrent refreshes of the same date serialize instead of interleaving.
    pub fn replace_hourly_buckets(
        &self,
        date: NaiveDate,
        buckets: &[HourlyBucket; 24],
    ) -> Result<()> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        tx.execute("DELETE FROM coding_hourly WHERE date = ?1", params![date])?;

        {
            let mut stmt = tx.prepare(
                "INSERT INTO coding_hourly (date, hour, seconds, languages) VALUES (?1, ?2, ?3, ?4)",
            )?;
            for (hour, bucket) in buckets.iter().enumerate() {
                debug_assert_eq!(bucket.hour as usize, hour);
                let languages = serde_json::to_string(&bucket.languages)?;
                stmt.execute(params![
                    date,
                    hour as i64,
                    clean_seconds(bucket.seconds),
                    languages
                ])?;
            }
        }

        tx.commit()?;
        Ok(())
    }

    // ============================================
    // Contribution writes
    // ============================================

    /// Insert or overwrite the contribution count for `date`.
    pub fn upsert_contribution_day(
        &self,
        date: NaiveDate,
        count: i64,
        ingested_at: DateTime<Utc>,
    ) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            r#"
            INSERT INTO contribution_days (date, count, last_ingested_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(date) DO UPDATE SET
                count = excluded.count,
                last_ingested_at = excluded.last_ingested_at
            "#,
            params![date, count.max(0), ingested_at.to_rfc3339()],
        )?;
        Ok(())
    }

    /// Replace the repository totals recorded for exactly `span`.
    ///
    /// Rows of any other (start, end) pair are untouched. Unnamed repositories
    /// are skipped; a name reported twice keeps the last count. Returns the
    /// number of rows written.
    pub fn replace_repo_totals(&self, span: DateSpan, repos: &[RepoCount]) -> Result<usize> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        tx.execute(
            "DELETE FROM contribution_repos WHERE range_start = ?1 AND range_end = ?2",
            params![span.start, span.end],
        )?;

        let mut written = 0;
        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO contribution_repos (range_start, range_end, repo, count)
                VALUES (?1, ?2, ?3, ?4)
                ON CONFLICT(range_start, range_end, repo) DO UPDATE SET count = excluded.count
                "#,
            )?;
            for entry in repos {
                let Some(repo) = entry.repo.as_deref().map(str::trim).filter(|r| !r.is_empty())
                else {
                    continue;
                };
                stmt.execute(params![span.start, span.end, repo, entry.count.max(0)])?;
                written += 1;
            }
        }

        tx.commit()?;
        Ok(written)
    }

    // ============================================
    // Coding activity reads
    // ============================================

    /// Daily summaries in `span`, ascending by date.
    pub fn coding_daily_range(&self, span: DateSpan) -> Result<Vec<DailySummary>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            r#"
            SELECT date, total_seconds, total_minutes, source_timezone, last_ingested_at
            FROM coding_daily
            WHERE date >= ?1 AND date <= ?2
            ORDER BY date ASC
            "#,
        )?;
        let rows = stmt
            .query_map(params![span.start, span.end], Self::row_to_daily_summary)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    fn row_to_daily_summary(row: &Row) -> rusqlite::Result<DailySummary> {
        let ingested: String = row.get("last_ingested_at")?;
        Ok(DailySummary {
            date: row.get("date")?,
            total_seconds: row.get("total_seconds")?,
            total_minutes: row.get("total_minutes")?,
            source_timezone: row.get("source_timezone")?,
            last_ingested_at: parse_timestamp(&ingested),
        })
    }

    /// Sum of daily coding seconds in `span`.
    pub fn coding_total_seconds(&self, span: DateSpan) -> Result<f64> {
        let conn = self.conn.lock().unwrap();
        let total = conn.query_row(
            "SELECT COALESCE(SUM(total_seconds), 0.0) FROM coding_daily WHERE date >= ?1 AND date <= ?2",
            params![span.start, span.end],
            |r| r.get(0),
        )?;
        Ok(total)
    }

    /// All breakdown rows of a dimension in `span`, by date then seconds descending.
    pub fn breakdown_range(
        &self,
        dimension: Dimension,
        span: DateSpan,
    ) -> Result<Vec<DimensionBreakdown>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            r#"
            SELECT date, name, total_seconds, total_minutes, percent
            FROM {table}
            WHERE date >= ?1 AND date <= ?2
            ORDER BY date ASC, total_seconds DESC, name ASC
            "#,
            table = dimension.table()
        ))?;
        let rows = stmt
            .query_map(params![span.start, span.end], |row| {
                Ok(DimensionBreakdown {
                    date: row.get(0)?,
                    name: row.get(1)?,
                    total_seconds: row.get(2)?,
                    total_minutes: row.get(3)?,
                    percent: row.get(4)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Names of a dimension ranked by summed seconds over `span`.
    pub fn top_breakdown(
        &self,
        dimension: Dimension,
        span: DateSpan,
        limit: usize,
    ) -> Result<Vec<(String, f64)>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            r#"
            SELECT name, SUM(total_seconds) AS seconds
            FROM {table}
            WHERE date >= ?1 AND date <= ?2
            GROUP BY name
            ORDER BY seconds DESC, name ASC
            LIMIT ?3
            "#,
            table = dimension.table()
        ))?;
        let rows = stmt
            .query_map(params![span.start, span.end, limit as i64], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, f64>(1)?))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Hourly buckets in `span`, ascending by date and hour.
    pub fn hourly_range(&self, span: DateSpan) -> Result<Vec<HourlyBucket>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            r#"
            SELECT date, hour, seconds, languages
            FROM coding_hourly
            WHERE date >= ?1 AND date <= ?2
            ORDER BY date ASC, hour ASC
            "#,
        )?;
        let rows = stmt
            .query_map(params![span.start, span.end], |row| {
                let languages: String = row.get(3)?;
                Ok(HourlyBucket {
                    date: row.get(0)?,
                    hour: row.get(1)?,
                    seconds: row.get(2)?,
                    languages: serde_json::from_str::<BTreeMap<String, f64>>(&languages)
                        .unwrap_or_default(),
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    // ============================================
    // Contribution reads
    // ============================================

    /// Contribution counts in `span`, ascending by date.
    pub fn contribution_days_range(&self, span: DateSpan) -> Result<Vec<ContributionDay>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            r#"
            SELECT date, count, last_ingested_at
            FROM contribution_days
            WHERE date >= ?1 AND date <= ?2
            ORDER BY date ASC
            "#,
        )?;
        let rows = stmt
            .query_map(params![span.start, span.end], |row| {
                let ingested: String = row.get(2)?;
                Ok(ContributionDay {
                    date: row.get(0)?,
                    count: row.get(1)?,
                    last_ingested_at: parse_timestamp(&ingested),
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Sum of daily contribution counts in `span`.
    pub fn contribution_total(&self, span: DateSpan) -> Result<i64> {
        let conn = self.conn.lock().unwrap();
        let total = conn.query_row(
            "SELECT COALESCE(SUM(count), 0) FROM contribution_days WHERE date >= ?1 AND date <= ?2",
            params![span.start, span.end],
            |r| r.get(0),
        )?;
        Ok(total)
    }

    /// Repository totals recorded for exactly `span`, highest count first.
    pub fn repo_totals(&self, span: DateSpan) -> Result<Vec<RepoContributionTotal>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            r#"
            SELECT range_start, range_end, repo, count
            FROM contribution_repos
            WHERE range_start = ?1 AND range_end = ?2
            ORDER BY count DESC, repo ASC
            "#,
        )?;
        let rows = stmt
            .query_map(params![span.start, span.end], |row| {
                Ok(RepoContributionTotal {
                    range_start: row.get(0)?,
                    range_end: row.get(1)?,
                    repo: row.get(2)?,
                    count: row.get(3)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Top repositories for exactly `span`.
    pub fn top_repos(&self, span: DateSpan, limit: usize) -> Result<Vec<(String, i64)>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            r#"
            SELECT repo, count
            FROM contribution_repos
            WHERE range_start = ?1 AND range_end = ?2
            ORDER BY count DESC, repo ASC
            LIMIT ?3
            "#,
        )?;
        let rows = stmt
            .query_map(params![span.start, span.end, limit as i64], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn test_db() -> Database {
        let db = Database::open_in_memory().unwrap();
        db.migrate().unwrap();
        db
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn ts() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 8, 9, 0, 0).unwrap()
    }

    fn full_day(date: NaiveDate, seconds_at: &[(u32, f64)]) -> [HourlyBucket; 24] {
        let mut buckets: [HourlyBucket; 24] =
            std::array::from_fn(|h| HourlyBucket::empty(date, h as u32));
        for &(hour, seconds) in seconds_at {
            buckets[hour as usize].seconds = seconds;
            buckets[hour as usize]
                .languages
                .insert("Rust".to_string(), seconds);
        }
        buckets
    }

    #[test]
    fn test_daily_summary_upsert_overwrites() {
        let db = test_db();
        let date = d(2025, 6, 1);

        db.upsert_daily_summary(date, 3600.0, Some("UTC"), ts()).unwrap();
        db.upsert_daily_summary(date, 5430.0, Some("Europe/Berlin"), ts())
            .unwrap();

        let rows = db.coding_daily_range(DateSpan::day(date)).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].total_seconds, 5430.0);
        assert_eq!(rows[0].total_minutes, 91);
        assert_eq!(rows[0].source_timezone.as_deref(), Some("Europe/Berlin"));
        assert_eq!(rows[0].last_ingested_at, ts());
    }

    #[test]
    fn test_breakdown_upsert_keeps_stale_names() {
        let db = test_db();
        let date = d(2025, 6, 1);

        db.upsert_breakdown(Dimension::Language, date, "Rust", 100.0, 50.0)
            .unwrap();
        db.upsert_breakdown(Dimension::Language, date, "Go", 100.0, 50.0)
            .unwrap();
        // Later report only mentions Rust
        db.upsert_breakdown(Dimension::Language, date, "Rust", 300.0, 100.0)
            .unwrap();

        let rows = db
            .breakdown_range(Dimension::Language, DateSpan::day(date))
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].name, "Rust");
        assert_eq!(rows[0].total_seconds, 300.0);
        assert_eq!(rows[0].percent, 100.0);
        assert_eq!(rows[1].name, "Go");

        // Dimensions are separate tables
        assert!(db
            .breakdown_range(Dimension::Editor, DateSpan::day(date))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_replace_hourly_buckets_always_24_rows() {
        let db = test_db();
        let date = d(2025, 6, 1);

        db.replace_hourly_buckets(date, &full_day(date, &[(9, 600.0), (14, 1200.0)]))
            .unwrap();
        db.replace_hourly_buckets(date, &full_day(date, &[(10, 60.0)]))
            .unwrap();

        let rows = db.hourly_range(DateSpan::day(date)).unwrap();
        assert_eq!(rows.len(), 24);
        let hours: Vec<u32> = rows.iter().map(|b| b.hour).collect();
        assert_eq!(hours, (0..24).collect::<Vec<_>>());
        assert_eq!(rows[9].seconds, 0.0);
        assert_eq!(rows[14].seconds, 0.0);
        assert_eq!(rows[10].seconds, 60.0);
        assert_eq!(rows[10].languages.get("Rust"), Some(&60.0));
    }

    #[test]
    fn test_replace_hourly_buckets_leaves_other_dates() {
        let db = test_db();
        let first = d(2025, 6, 1);
        let second = d(2025, 6, 2);

        db.replace_hourly_buckets(first, &full_day(first, &[(1, 10.0)]))
            .unwrap();
        db.replace_hourly_buckets(second, &full_day(second, &[(2, 20.0)]))
            .unwrap();
        db.replace_hourly_buckets(second, &full_day(second, &[]))
            .unwrap();

        let rows = db.hourly_range(DateSpan::day(first)).unwrap();
        assert_eq!(rows[1].seconds, 10.0);
        assert_eq!(
            db.hourly_range(DateSpan::new(first, second)).unwrap().len(),
            48
        );
    }

    #[test]
    fn test_failed_hourly_replace_keeps_previous_rows() {
        let db = test_db();
        let date = d(2025, 6, 1);
        db.replace_hourly_buckets(date, &full_day(date, &[(9, 600.0)]))
            .unwrap();

        // Abort the insert for hour 12 after hours 0-11 went in
        db.connection()
            .execute_batch(
                r#"
                CREATE TRIGGER fail_hour_12 BEFORE INSERT ON coding_hourly
                WHEN NEW.hour = 12
                BEGIN
                    SELECT RAISE(ABORT, 'forced failure');
                END;
                "#,
            )
            .unwrap();

        let result = db.replace_hourly_buckets(date, &full_day(date, &[(3, 30.0)]));
        assert!(matches!(result, Err(crate::error::Error::Database(_))));

        let rows = db.hourly_range(DateSpan::day(date)).unwrap();
        assert_eq!(rows.len(), 24);
        assert_eq!(rows[9].seconds, 600.0);
        assert_eq!(rows[3].seconds, 0.0);
    }

    #[test]
    fn test_failed_repo_replace_keeps_previous_totals() {
        let db = test_db();
        let span = DateSpan::new(d(2025, 1, 1), d(2025, 1, 31));
        let repo = |name: &str, count| RepoCount {
            repo: Some(name.to_string()),
            count,
        };
        db.replace_repo_totals(span, &[repo("me/a", 10), repo("me/b", 2)])
            .unwrap();

        db.connection()
            .execute_batch(
                r#"
                CREATE TRIGGER fail_bad_repo BEFORE INSERT ON contribution_repos
                WHEN NEW.repo = 'me/bad'
                BEGIN
                    SELECT RAISE(ABORT, 'forced failure');
                END;
                "#,
            )
            .unwrap();

        let result = db.replace_repo_totals(span, &[repo("me/c", 7), repo("me/bad", 1)]);
        assert!(result.is_err());

        let repos: Vec<(String, i64)> = db
            .repo_totals(span)
            .unwrap()
            .into_iter()
            .map(|r| (r.repo, r.count))
            .collect();
        assert_eq!(
            repos,
            vec![("me/a".to_string(), 10), ("me/b".to_string(), 2)]
        );
    }

    #[test]
    fn test_contribution_day_upsert() {
        let db = test_db();
        let date = d(2025, 6, 1);

        db.upsert_contribution_day(date, 3, ts()).unwrap();
        db.upsert_contribution_day(date, 7, ts()).unwrap();
        db.upsert_contribution_day(d(2025, 6, 2), 1, ts()).unwrap();

        let span = DateSpan::new(date, d(2025, 6, 2));
        let rows = db.contribution_days_range(span).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].count, 7);
        assert_eq!(db.contribution_total(span).unwrap(), 8);
    }

    #[test]
    fn test_repo_totals_scoped_to_exact_range() {
        let db = test_db();
        let ab = DateSpan::new(d(2025, 1, 1), d(2025, 1, 31));
        let cd = DateSpan::new(d(2025, 3, 1), d(2025, 3, 31));
        let overlapping = DateSpan::new(d(2025, 1, 15), d(2025, 2, 15));

        let repo = |name: &str, count| RepoCount {
            repo: Some(name.to_string()),
            count,
        };

        db.replace_repo_totals(cd, &[repo("me/old", 4)]).unwrap();
        db.replace_repo_totals(ab, &[repo("me/a", 10), repo("me/b", 2)])
            .unwrap();
        db.replace_repo_totals(overlapping, &[repo("me/a", 99)])
            .unwrap();
        let written = db
            .replace_repo_totals(
                ab,
                &[
                    repo("me/c", 5),
                    RepoCount {
                        repo: None,
                        count: 50,
                    },
                    repo("", 1),
                ],
            )
            .unwrap();
        assert_eq!(written, 1);

        let rows = db.repo_totals(ab).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].repo, "me/c");
        assert_eq!(rows[0].count, 5);

        assert_eq!(db.top_repos(cd, 10).unwrap(), vec![("me/old".to_string(), 4)]);
        assert_eq!(
            db.top_repos(overlapping, 10).unwrap(),
            vec![("me/a".to_string(), 99)]
        );
    }

    #[test]
    fn test_top_breakdown_ranks_by_summed_seconds() {
        let db = test_db();
        let span = DateSpan::new(d(2025, 6, 1), d(2025, 6, 2));

        db.upsert_breakdown(Dimension::Project, d(2025, 6, 1), "api", 100.0, 0.0)
            .unwrap();
        db.upsert_breakdown(Dimension::Project, d(2025, 6, 2), "api", 100.0, 0.0)
            .unwrap();
        db.upsert_breakdown(Dimension::Project, d(2025, 6, 1), "web", 150.0, 0.0)
            .unwrap();
        db.upsert_breakdown(Dimension::Project, d(2025, 6, 1), "cli", 150.0, 0.0)
            .unwrap();
        db.upsert_breakdown(Dimension::Project, d(2025, 6, 3), "late", 999.0, 0.0)
            .unwrap();

        let top = db.top_breakdown(Dimension::Project, span, 2).unwrap();
        assert_eq!(
            top,
            vec![("api".to_string(), 200.0), ("cli".to_string(), 150.0)]
        );
    }

    #[test]
    fn test_empty_ranges_are_zero() {
        let db = test_db();
        let span = DateSpan::new(d(2025, 6, 1), d(2025, 6, 7));
        assert_eq!(db.coding_total_seconds(span).unwrap(), 0.0);
        assert_eq!(db.contribution_total(span).unwrap(), 0);
        assert!(db.coding_daily_range(span).unwrap().is_empty());
        assert!(db.top_repos(span, 10).unwrap().is_empty());
    }

    #[test]
    fn test_negative_and_nan_seconds_are_clamped() {
        let db = test_db();
        let date = d(2025, 6, 1);
        db.upsert_daily_summary(date, f64::NAN, None, ts()).unwrap();
        db.upsert_breakdown(Dimension::Editor, date, "vim", -5.0, f64::INFINITY)
            .unwrap();

        let daily = db.coding_daily_range(DateSpan::day(date)).unwrap();
        assert_eq!(daily[0].total_seconds, 0.0);
        let editors = db
            .breakdown_range(Dimension::Editor, DateSpan::day(date))
            .unwrap();
        assert_eq!(editors[0].total_seconds, 0.0);
        assert_eq!(editors[0].percent, 0.0);
    }
}
