//! Ingestion orchestration
//!
//! The [`Refresher`] drives every write path: it resolves the effective date
//! range, validates caller-supplied ranges, calls the source clients, writes
//! through the bucket store and records successful runs in the ledger.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐     ┌──────────────┐     ┌──────────────┐     ┌──────────┐
//! │  Refresher   │ ──► │ Source client│ ──► │ Bucket store │ ──► │  Ledger  │
//! │ (range, val.)│     │ (fetch)      │     │ (upsert)     │     │ (mark)   │
//! └──────────────┘     └──────────────┘     └──────────────┘     └──────────┘
//! ```
//!
//! The clock is always a parameter: `now` is the instant of the run, and
//! "today" is derived from it in the configured coding timezone.

pub mod hourly;

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::api::ErrorPayload;
use crate::config::Config;
use crate::db::Database;
use crate::error::Result;
use crate::sources::{contributions, CodingClient, ContributionClient};
use crate::time::{local_today, DateSpan};
use crate::types::{Dimension, JobType};

/// Outcome of one successful ingestion run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RefreshSummary {
    /// Effective range start
    pub start: NaiveDate,
    /// Effective range end
    pub end: NaiveDate,
    /// Dates whose buckets were written
    pub days_written: usize,
    /// Dates skipped because their upstream call failed
    pub days_skipped: usize,
    /// Rows written across all tables
    pub rows_written: usize,
}

impl RefreshSummary {
    fn empty(span: DateSpan) -> Self {
        Self {
            start: span.start,
            end: span.end,
            days_written: 0,
            days_skipped: 0,
            rows_written: 0,
        }
    }
}

/// One source's entry in a combined refresh.
///
/// Serializes as `{"ok": true, "start": .., "end": .., ...}` or
/// `{"ok": false, "error": ".."}`.
#[derive(Debug, Clone, Serialize)]
pub struct SourceResult {
    pub ok: bool,
    #[serde(flatten)]
    pub summary: Option<RefreshSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<Result<RefreshSummary>> for SourceResult {
    fn from(result: Result<RefreshSummary>) -> Self {
        match result {
            Ok(summary) => Self {
                ok: true,
                summary: Some(summary),
                error: None,
            },
            Err(e) => Self {
                ok: false,
                summary: None,
                error: Some(ErrorPayload::from_error(&e).error),
            },
        }
    }
}

/// Result of [`Refresher::refresh_all`].
#[derive(Debug, Clone, Serialize)]
pub struct RefreshAllReport {
    pub coding: SourceResult,
    pub hourly: SourceResult,
    pub contributions: SourceResult,
}

impl RefreshAllReport {
    /// Whether every source succeeded
    pub fn all_ok(&self) -> bool {
        self.coding.ok && self.hourly.ok && self.contributions.ok
    }
}

/// What happened to one stage of a scheduled run.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StageOutcome {
    Completed(RefreshSummary),
    /// The ledger said the stage ran too recently
    Throttled,
    Failed {
        error: String,
    },
}

impl StageOutcome {
    fn from_result(stage: JobType, result: Result<RefreshSummary>) -> Self {
        match result {
            Ok(summary) => StageOutcome::Completed(summary),
            Err(e) => {
                tracing::warn!(stage = %stage, error = %e, "Scheduled stage failed");
                StageOutcome::Failed {
                    error: e.to_string(),
                }
            }
        }
    }
}

/// Result of [`Refresher::run_scheduled`].
#[derive(Debug, Clone, Serialize)]
pub struct ScheduledReport {
    pub coding: StageOutcome,
    pub hourly: StageOutcome,
    pub contributions: StageOutcome,
}

/// Drives refreshes and backfills against the bucket store.
pub struct Refresher {
    db: Arc<Database>,
    config: Config,
}

impl Refresher {
    /// Create a refresher over a migrated database.
    pub fn new(db: Arc<Database>, config: Config) -> Self {
        Self { db, config }
    }

    /// The underlying store.
    pub fn database(&self) -> &Arc<Database> {
        &self.db
    }

    /// Civil date of `now` in the configured coding timezone.
    pub fn today(&self, now: DateTime<Utc>) -> NaiveDate {
        local_today(now, &self.config.coding.timezone)
    }

    // ============================================
    // Manual refresh (trailing windows, marks the ledger)
    // ============================================

    /// Daily summaries and breakdowns for the trailing `refresh.coding_days`.
    pub async fn refresh_coding(&self, now: DateTime<Utc>) -> Result<RefreshSummary> {
        let span = DateSpan::trailing(self.today(now), self.config.refresh.coding_days);
        let summary = self.ingest_coding(span, now).await?;
        self.db.mark_refreshed(JobType::CodingDaily, now)?;
        Ok(summary)
    }

    /// Hourly buckets for the trailing `refresh.hourly_days`.
    ///
    /// The ledger is only marked when at least one day was written.
    pub async fn refresh_hourly(&self, now: DateTime<Utc>) -> Result<RefreshSummary> {
        let span = DateSpan::trailing(self.today(now), self.config.refresh.hourly_days);
        let summary = self.ingest_hourly(span, now, &|_| {}).await?;
        if summary.days_written > 0 {
            self.db.mark_refreshed(JobType::CodingHourly, now)?;
        } else {
            tracing::warn!(%span, "Hourly refresh wrote no days, ledger left unchanged");
        }
        Ok(summary)
    }

    /// Contribution calendar and repository totals for the trailing `refresh.contribution_days`.
    pub async fn refresh_contributions(&self, now: DateTime<Utc>) -> Result<RefreshSummary> {
        let span = DateSpan::trailing(self.today(now), self.config.refresh.contribution_days);
        let summary = self.ingest_contributions(span, now).await?;
        self.db.mark_refreshed(JobType::Contributions, now)?;
        Ok(summary)
    }

    /// Run all three refreshes concurrently. One source failing never stops the others.
    pub async fn refresh_all(&self, now: DateTime<Utc>) -> RefreshAllReport {
        let (coding, hourly, contributions) = tokio::join!(
            self.refresh_coding(now),
            self.refresh_hourly(now),
            self.refresh_contributions(now),
        );

        let report = RefreshAllReport {
            coding: coding.into(),
            hourly: hourly.into(),
            contributions: contributions.into(),
        };
        tracing::info!(
            coding_ok = report.coding.ok,
            hourly_ok = report.hourly.ok,
            contributions_ok = report.contributions.ok,
            "Combined refresh finished"
        );
        report
    }

    // ============================================
    // Backfill (explicit ranges, validated, never marks the ledger)
    // ============================================

    /// Daily summaries over an explicit range, at most `refresh.max_backfill_days` long.
    pub async fn backfill_coding(&self, span: DateSpan, now: DateTime<Utc>) -> Result<RefreshSummary> {
        span.validate(self.config.refresh.max_backfill_days)?;
        self.ingest_coding(span, now).await
    }

    /// Hourly buckets over an explicit range, at most `refresh.max_hourly_backfill_days` long.
    pub async fn backfill_hourly(&self, span: DateSpan, now: DateTime<Utc>) -> Result<RefreshSummary> {
        self.backfill_hourly_with_progress(span, now, &|_| {}).await
    }

    /// Like [`Refresher::backfill_hourly`], calling `on_day` after each date is processed.
    pub async fn backfill_hourly_with_progress(
        &self,
        span: DateSpan,
        now: DateTime<Utc>,
        on_day: &(dyn Fn(NaiveDate) + Sync),
    ) -> Result<RefreshSummary> {
        span.validate(self.config.refresh.max_hourly_backfill_days)?;
        self.ingest_hourly(span, now, on_day).await
    }

    /// Contributions over an explicit range, at most `refresh.max_backfill_days`
    /// long and never more than one provider year.
    pub async fn backfill_contributions(
        &self,
        span: DateSpan,
        now: DateTime<Utc>,
    ) -> Result<RefreshSummary> {
        let max_days = self
            .config
            .refresh
            .max_backfill_days
            .min(contributions::MAX_SPAN_DAYS);
        span.validate(max_days)?;
        self.ingest_contributions(span, now).await
    }

    // ============================================
    // Scheduled trigger
    // ============================================

    /// Unattended run: coding and contributions always, hourly when the
    /// ledger says it is due. Never fails; each stage reports its own outcome.
    pub async fn run_scheduled(&self, now: DateTime<Utc>) -> ScheduledReport {
        tracing::info!(%now, "Scheduled refresh starting");

        let coding = StageOutcome::from_result(JobType::CodingDaily, self.refresh_coding(now).await);

        let min_minutes = self.config.refresh.hourly_min_minutes;
        let hourly = match self.db.should_refresh(JobType::CodingHourly, min_minutes, now) {
            Ok(true) => StageOutcome::from_result(JobType::CodingHourly, self.refresh_hourly(now).await),
            Ok(false) => {
                tracing::info!(min_minutes, "Hourly refresh throttled");
                StageOutcome::Throttled
            }
            Err(e) => StageOutcome::from_result(JobType::CodingHourly, Err(e)),
        };

        let contributions = StageOutcome::from_result(
            JobType::Contributions,
            self.refresh_contributions(now).await,
        );

        ScheduledReport {
            coding,
            hourly,
            contributions,
        }
    }

    // ============================================
    // Ingestion bodies
    // ============================================

    async fn ingest_coding(&self, span: DateSpan, now: DateTime<Utc>) -> Result<RefreshSummary> {
        let client = CodingClient::from_config(&self.config.coding, &self.config.http)?;
        let days = client.fetch_summaries(span).await?;

        let mut summary = RefreshSummary::empty(span);
        for day in &days {
            self.db
                .upsert_daily_summary(day.date, day.total_seconds, day.timezone.as_deref(), now)?;
            summary.rows_written += 1;

            for dimension in Dimension::ALL {
                for entry in day.breakdown(dimension) {
                    let Some(name) = entry.usable_name() else {
                        continue;
                    };
                    self.db.upsert_breakdown(
                        dimension,
                        day.date,
                        name,
                        entry.total_seconds,
                        entry.percent,
                    )?;
                    summary.rows_written += 1;
                }
            }
            summary.days_written += 1;
        }

        tracing::info!(
            %span,
            days = summary.days_written,
            rows = summary.rows_written,
            "Coding summaries ingested"
        );
        Ok(summary)
    }

    async fn ingest_hourly(
        &self,
        span: DateSpan,
        now: DateTime<Utc>,
        on_day: &(dyn Fn(NaiveDate) + Sync),
    ) -> Result<RefreshSummary> {
        let client = CodingClient::from_config(&self.config.coding, &self.config.http)?;
        let fallback_tz = self.config.coding.timezone.as_str();

        let mut summary = RefreshSummary::empty(span);
        for date in span.days() {
            match client.fetch_durations(date).await {
                Ok(day) => {
                    let timezone = day.timezone.as_deref().unwrap_or(fallback_tz);
                    let buckets = hourly::bucket_samples(date, &day.samples, timezone);
                    self.db.replace_hourly_buckets(date, &buckets)?;
                    summary.days_written += 1;
                    summary.rows_written += buckets.len();
                }
                Err(e) => {
                    tracing::warn!(%date, error = %e, "Skipping day, duration fetch failed");
                    summary.days_skipped += 1;
                }
            }
            on_day(date);
        }

        tracing::info!(
            %span,
            %now,
            days = summary.days_written,
            skipped = summary.days_skipped,
            "Hourly buckets ingested"
        );
        Ok(summary)
    }

    async fn ingest_contributions(&self, span: DateSpan, now: DateTime<Utc>) -> Result<RefreshSummary> {
        let client = ContributionClient::from_config(&self.config.contributions, &self.config.http)?;
        let report = client.fetch(span).await?;

        let mut summary = RefreshSummary::empty(span);
        for (date, count) in &report.days {
            self.db.upsert_contribution_day(*date, *count, now)?;
            summary.days_written += 1;
            summary.rows_written += 1;
        }
        summary.rows_written += self.db.replace_repo_totals(span, &report.repos)?;

        tracing::info!(
            %span,
            days = summary.days_written,
            repos = report.repos.len(),
            "Contributions ingested"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn refresher() -> Refresher {
        let db = Database::open_in_memory().unwrap();
        db.migrate().unwrap();
        Refresher::new(Arc::new(db), Config::default())
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 8, 9, 0, 0).unwrap()
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[tokio::test]
    async fn test_inverted_backfill_rejected_before_configuration_check() {
        let refresher = refresher();
        let span = DateSpan::new(d(2025, 6, 2), d(2025, 6, 1));

        for result in [
            refresher.backfill_coding(span, now()).await,
            refresher.backfill_hourly(span, now()).await,
            refresher.backfill_contributions(span, now()).await,
        ] {
            assert!(matches!(result, Err(crate::Error::Range(_))));
        }
    }

    #[tokio::test]
    async fn test_hourly_backfill_has_its_own_ceiling() {
        let refresher = refresher();
        let span = DateSpan::new(d(2025, 1, 1), d(2025, 6, 1));

        let hourly = refresher.backfill_hourly(span, now()).await;
        assert!(matches!(hourly, Err(crate::Error::Range(_))));

        // Daily ceiling is wider, so this gets past validation to the missing key
        let daily = refresher.backfill_coding(span, now()).await;
        assert!(matches!(daily, Err(crate::Error::NotConfigured { .. })));
    }

    #[tokio::test]
    async fn test_unconfigured_refresh_does_not_mark_ledger() {
        let refresher = refresher();
        assert!(refresher.refresh_coding(now()).await.is_err());
        assert!(refresher.database().ledger_entries().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_scheduled_run_never_fails() {
        let refresher = refresher();
        let report = refresher.run_scheduled(now()).await;

        assert!(matches!(report.coding, StageOutcome::Failed { .. }));
        assert!(matches!(report.hourly, StageOutcome::Failed { .. }));
        assert!(matches!(report.contributions, StageOutcome::Failed { .. }));
    }

    #[tokio::test]
    async fn test_scheduled_hourly_respects_ledger() {
        let refresher = refresher();
        refresher
            .database()
            .mark_refreshed(JobType::CodingHourly, now() - chrono::Duration::minutes(30))
            .unwrap();

        let report = refresher.run_scheduled(now()).await;
        assert!(matches!(report.hourly, StageOutcome::Throttled));
    }

    #[test]
    fn test_source_result_serialization() {
        let ok: SourceResult = Ok(RefreshSummary {
            start: d(2025, 6, 1),
            end: d(2025, 6, 7),
            days_written: 7,
            days_skipped: 0,
            rows_written: 12,
        })
        .into();
        let json = serde_json::to_value(&ok).unwrap();
        assert_eq!(json["ok"], true);
        assert_eq!(json["start"], "2025-06-01");
        assert_eq!(json["end"], "2025-06-07");
        assert!(json.get("error").is_none());

        let failed: SourceResult = Err(crate::Error::NotConfigured {
            source_name: "github",
            missing: "contributions.token",
        })
        .into();
        let json = serde_json::to_value(&failed).unwrap();
        assert_eq!(json["ok"], false);
        assert!(json["error"].as_str().unwrap().contains("not configured"));
        assert!(json.get("start").is_none());
    }

    #[test]
    fn test_today_uses_configured_timezone() {
        let db = Database::open_in_memory().unwrap();
        let mut config = Config::default();
        config.coding.timezone = "Asia/Tokyo".to_string();
        let refresher = Refresher::new(Arc::new(db), config);

        let late = Utc.with_ymd_and_hms(2025, 6, 3, 23, 30, 0).unwrap();
        assert_eq!(refresher.today(late), d(2025, 6, 4));
    }
}
