//! Integration tests for the ingestion pipeline and rollups
//!
//! Each test runs the refresher against an `httpmock` server standing in for
//! the providers and checks what lands in a temporary SQLite database.

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use devpulse_core::analytics::{build_rollup, coding_daily_view, hourly_view, RollupWindow};
use devpulse_core::config::Config;
use devpulse_core::db::Database;
use devpulse_core::{
    DateSpan, Dimension, Error, ErrorPayload, JobType, RangeError, Refresher, StageOutcome,
};
use httpmock::prelude::*;
use serde_json::json;
use tempfile::TempDir;

const API_KEY: &str = "waka_test_key";
const TOKEN: &str = "ghp_test_token";

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

/// 2025-06-08 09:00 UTC, so the default 7-day window is 2025-06-02..2025-06-08
fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 8, 9, 0, 0).unwrap()
}

struct Harness {
    _dir: TempDir,
    db: Arc<Database>,
}

impl Harness {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let db = Database::open(&dir.path().join("data.db")).unwrap();
        db.migrate().unwrap();
        Self {
            _dir: dir,
            db: Arc::new(db),
        }
    }

    fn refresher(&self, config: Config) -> Refresher {
        Refresher::new(Arc::clone(&self.db), config)
    }
}

fn coding_config(server: &MockServer) -> Config {
    let mut config = Config::default();
    config.coding.api_key = Some(API_KEY.to_string());
    config.coding.base_url = server.url("/api/v1");
    config.http.timeout_secs = 5;
    config
}

fn full_config(server: &MockServer) -> Config {
    let mut config = coding_config(server);
    config.contributions.token = Some(TOKEN.to_string());
    config.contributions.login = Some("octocat".to_string());
    config.contributions.endpoint = server.url("/graphql");
    config
}

fn basic_auth() -> String {
    format!("Basic {}", STANDARD.encode(API_KEY))
}

fn summary_day(date: &str, seconds: f64, language: &str) -> serde_json::Value {
    json!({
        "range": {"date": date, "timezone": "UTC"},
        "grand_total": {"total_seconds": seconds},
        "languages": [{"name": language, "total_seconds": seconds, "percent": 100.0}],
        "projects": [{"name": "devpulse", "total_seconds": seconds, "percent": 100.0}],
        "editors": [{"name": null, "total_seconds": seconds, "percent": 100.0}]
    })
}

fn contributions_body() -> serde_json::Value {
    json!({
        "data": {"user": {"contributionsCollection": {
            "contributionCalendar": {"weeks": [
                {"contributionDays": [
                    {"date": "2025-06-01", "contributionCount": 2},
                    {"date": "2025-06-02", "contributionCount": 5}
                ]}
            ]},
            "commitContributionsByRepository": [
                {"repository": {"nameWithOwner": "octocat/api"}, "contributions": {"totalCount": 6}},
                {"repository": {"nameWithOwner": "octocat/web"}, "contributions": {"totalCount": 1}}
            ]
        }}}
    })
}

// ============================================
// Coding summaries
// ============================================

#[tokio::test]
async fn test_coding_refresh_writes_summaries_and_marks_ledger() {
    let server = MockServer::start_async().await;
    let harness = Harness::new();

    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/api/v1/users/current/summaries")
                .query_param("start", "2025-06-02")
                .query_param("end", "2025-06-08")
                .header("authorization", basic_auth());
            then.status(200).json_body(json!({
                "data": [
                    summary_day("2025-06-02", 3600.0, "Rust"),
                    summary_day("2025-06-03", 1800.0, "Go")
                ]
            }));
        })
        .await;

    let summary = harness
        .refresher(coding_config(&server))
        .refresh_coding(now())
        .await
        .unwrap();
    mock.assert_async().await;

    assert_eq!(summary.start, d(2025, 6, 2));
    assert_eq!(summary.end, d(2025, 6, 8));
    assert_eq!(summary.days_written, 2);
    // 1 summary + 1 language + 1 project per day; the unnamed editor is skipped
    assert_eq!(summary.rows_written, 6);

    let rows = harness
        .db
        .coding_daily_range(DateSpan::new(d(2025, 6, 1), d(2025, 6, 8)))
        .unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].total_minutes, 60);
    assert_eq!(rows[0].source_timezone.as_deref(), Some("UTC"));
    assert_eq!(rows[0].last_ingested_at, now());

    let entry = harness.db.ledger_entry(JobType::CodingDaily).unwrap().unwrap();
    assert_eq!(entry.last_run(), Some(now()));
}

#[tokio::test]
async fn test_coding_reingest_overwrites_without_duplicates() {
    let server = MockServer::start_async().await;
    let harness = Harness::new();
    let refresher = harness.refresher(coding_config(&server));

    let mut first = server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v1/users/current/summaries");
            then.status(200).json_body(json!({
                "data": [summary_day("2025-06-05", 600.0, "Rust")]
            }));
        })
        .await;
    refresher.refresh_coding(now()).await.unwrap();
    first.delete_async().await;

    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v1/users/current/summaries");
            then.status(200).json_body(json!({
                "data": [summary_day("2025-06-05", 4200.0, "Rust")]
            }));
        })
        .await;
    refresher.refresh_coding(now()).await.unwrap();

    let span = DateSpan::day(d(2025, 6, 5));
    let rows = harness.db.coding_daily_range(span).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].total_seconds, 4200.0);
    assert_eq!(rows[0].total_minutes, 70);

    let languages = harness.db.breakdown_range(Dimension::Language, span).unwrap();
    assert_eq!(languages.len(), 1);
    assert_eq!(languages[0].total_seconds, 4200.0);
}

#[tokio::test]
async fn test_upstream_error_surfaces_provider_message() {
    let server = MockServer::start_async().await;
    let harness = Harness::new();

    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v1/users/current/summaries");
            then.status(401)
                .json_body(json!({"error": "Unauthorized. Check your api key."}));
        })
        .await;

    let err = harness
        .refresher(coding_config(&server))
        .refresh_coding(now())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Upstream { status: 401, .. }));
    let payload = ErrorPayload::from_error(&err);
    assert_eq!(payload.status, 502);
    assert_eq!(payload.error, "Unauthorized. Check your api key.");
    assert!(harness.db.ledger_entries().unwrap().is_empty());
}

// ============================================
// Hourly buckets
// ============================================

#[tokio::test]
async fn test_hourly_backfill_buckets_local_hour_and_skips_failed_days() {
    let server = MockServer::start_async().await;
    let harness = Harness::new();

    // 12:05 and 12:40 UTC are 14:xx in Berlin during summer time
    let t1 = Utc.with_ymd_and_hms(2025, 6, 3, 12, 5, 0).unwrap().timestamp();
    let t2 = Utc.with_ymd_and_hms(2025, 6, 3, 12, 40, 0).unwrap().timestamp();

    let good_day = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/api/v1/users/current/durations")
                .query_param("date", "2025-06-03")
                .query_param("slice_by", "language");
            then.status(200).json_body(json!({
                "timezone": "Europe/Berlin",
                "data": [
                    {"time": t1, "duration": 300.0, "language": "Rust"},
                    {"time": t2, "duration": 900.5, "languages": [{"name": "TOML"}]}
                ]
            }));
        })
        .await;
    let bad_day = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/api/v1/users/current/durations")
                .query_param("date", "2025-06-04");
            then.status(500).body("internal error");
        })
        .await;

    let summary = harness
        .refresher(coding_config(&server))
        .backfill_hourly(DateSpan::new(d(2025, 6, 3), d(2025, 6, 4)), now())
        .await
        .unwrap();
    good_day.assert_async().await;
    bad_day.assert_async().await;

    assert_eq!(summary.days_written, 1);
    assert_eq!(summary.days_skipped, 1);
    assert_eq!(summary.rows_written, 24);

    let view = hourly_view(&harness.db, DateSpan::day(d(2025, 6, 3))).unwrap();
    assert_eq!(view.buckets.len(), 24);
    for bucket in &view.buckets {
        if bucket.hour == 14 {
            assert_eq!(bucket.seconds, 1200.5);
            assert_eq!(bucket.languages.get("Rust"), Some(&300.0));
            assert_eq!(bucket.languages.get("TOML"), Some(&900.5));
        } else {
            assert_eq!(bucket.seconds, 0.0, "hour {} should be empty", bucket.hour);
        }
    }
    assert!(hourly_view(&harness.db, DateSpan::day(d(2025, 6, 4)))
        .unwrap()
        .buckets
        .is_empty());

    // Backfills never touch the ledger
    assert!(harness.db.ledger_entry(JobType::CodingHourly).unwrap().is_none());
}

#[tokio::test]
async fn test_hourly_refresh_replaces_previous_buckets() {
    let server = MockServer::start_async().await;
    let harness = Harness::new();
    let refresher = harness.refresher(coding_config(&server));
    let span = DateSpan::day(d(2025, 6, 3));
    let early = Utc.with_ymd_and_hms(2025, 6, 3, 8, 0, 0).unwrap().timestamp();
    let late = Utc.with_ymd_and_hms(2025, 6, 3, 20, 0, 0).unwrap().timestamp();

    let mut first = server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v1/users/current/durations");
            then.status(200)
                .json_body(json!({"data": [{"time": early, "duration": 60.0, "language": "Rust"}]}));
        })
        .await;
    refresher.backfill_hourly(span, now()).await.unwrap();
    first.delete_async().await;

    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v1/users/current/durations");
            then.status(200)
                .json_body(json!({"data": [{"time": late, "duration": 90.0, "language": "Rust"}]}));
        })
        .await;
    refresher.backfill_hourly(span, now()).await.unwrap();

    // No timezone in the response, so the configured UTC default applies
    let buckets = harness.db.hourly_range(span).unwrap();
    assert_eq!(buckets.len(), 24);
    assert_eq!(buckets[8].seconds, 0.0);
    assert_eq!(buckets[20].seconds, 90.0);
}

// ============================================
// Contributions
// ============================================

#[tokio::test]
async fn test_contribution_refresh_writes_days_and_exact_range_repos() {
    let server = MockServer::start_async().await;
    let harness = Harness::new();

    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/graphql")
                .header("authorization", format!("Bearer {}", TOKEN))
                .json_body_partial(
                    r#"{"variables": {"login": "octocat", "from": "2025-05-10T00:00:00Z", "to": "2025-06-08T23:59:59Z"}}"#,
                );
            then.status(200).json_body(contributions_body());
        })
        .await;

    let summary = harness
        .refresher(full_config(&server))
        .refresh_contributions(now())
        .await
        .unwrap();
    mock.assert_async().await;

    let span = DateSpan::new(d(2025, 5, 10), d(2025, 6, 8));
    assert_eq!((summary.start, summary.end), (span.start, span.end));
    assert_eq!(summary.days_written, 2);
    assert_eq!(summary.rows_written, 4);

    assert_eq!(harness.db.contribution_total(span).unwrap(), 7);
    assert_eq!(
        harness.db.top_repos(span, 10).unwrap(),
        vec![("octocat/api".to_string(), 6), ("octocat/web".to_string(), 1)]
    );
    // Repo totals are keyed by the exact refresh range
    assert!(harness
        .db
        .top_repos(DateSpan::new(d(2025, 6, 1), d(2025, 6, 2)), 10)
        .unwrap()
        .is_empty());
    assert!(harness.db.ledger_entry(JobType::Contributions).unwrap().is_some());
}

#[tokio::test]
async fn test_graphql_errors_are_protocol_errors() {
    let server = MockServer::start_async().await;
    let harness = Harness::new();

    server
        .mock_async(|when, then| {
            when.method(POST).path("/graphql");
            then.status(200).json_body(json!({
                "data": null,
                "errors": [{"message": "Could not resolve to a User with the login of 'octocat'."}]
            }));
        })
        .await;

    let err = harness
        .refresher(full_config(&server))
        .backfill_contributions(DateSpan::new(d(2025, 1, 1), d(2025, 1, 31)), now())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Protocol { .. }));
    assert_eq!(ErrorPayload::from_error(&err).status, 502);
}

// ============================================
// Backfill validation
// ============================================

#[tokio::test]
async fn test_invalid_backfill_makes_no_upstream_call() {
    let server = MockServer::start_async().await;
    let harness = Harness::new();
    let refresher = harness.refresher(full_config(&server));

    let any = server
        .mock_async(|when, then| {
            when.path_contains("/");
            then.status(200).json_body(json!({}));
        })
        .await;

    let inverted = DateSpan::new(d(2025, 6, 2), d(2025, 6, 1));
    let err = refresher.backfill_coding(inverted, now()).await.unwrap_err();
    assert_eq!(ErrorPayload::from_error(&err).status, 400);

    let too_long = DateSpan::new(d(2025, 1, 1), d(2025, 6, 1));
    let err = refresher.backfill_hourly(too_long, now()).await.unwrap_err();
    assert!(matches!(err, Error::Range(_)));

    let err = refresher
        .backfill_contributions(DateSpan::new(d(2023, 1, 1), d(2025, 1, 1)), now())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Range(_)));

    // 366 days without a leap day is over the provider's one-year limit
    let err = refresher
        .backfill_contributions(DateSpan::new(d(2025, 1, 1), d(2026, 1, 1)), now())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Range(RangeError::TooLarge { days: 366, max_days: 365 })
    ));

    assert_eq!(any.hits_async().await, 0);
}

// ============================================
// Combined and scheduled runs
// ============================================

#[tokio::test]
async fn test_refresh_all_isolates_unconfigured_source() {
    let server = MockServer::start_async().await;
    let harness = Harness::new();

    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v1/users/current/summaries");
            then.status(200)
                .json_body(json!({"data": [summary_day("2025-06-08", 120.0, "Rust")]}));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v1/users/current/durations");
            then.status(200).json_body(json!({"data": []}));
        })
        .await;

    // Contributions left without token and login
    let report = harness
        .refresher(coding_config(&server))
        .refresh_all(now())
        .await;

    assert!(report.coding.ok);
    assert!(report.hourly.ok);
    assert!(!report.contributions.ok);
    assert!(!report.all_ok());

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["coding"]["ok"], true);
    assert_eq!(json["coding"]["start"], "2025-06-02");
    assert_eq!(json["coding"]["end"], "2025-06-08");
    assert_eq!(json["hourly"]["days_written"], 7);
    assert_eq!(json["contributions"]["ok"], false);
    assert!(json["contributions"]["error"]
        .as_str()
        .unwrap()
        .contains("contributions.token"));
}

#[tokio::test]
async fn test_scheduled_run_throttles_hourly_after_success() {
    let server = MockServer::start_async().await;
    let harness = Harness::new();
    let refresher = harness.refresher(full_config(&server));

    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v1/users/current/summaries");
            then.status(200).json_body(json!({"data": []}));
        })
        .await;
    let durations = server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v1/users/current/durations");
            then.status(200).json_body(json!({"data": []}));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/graphql");
            then.status(502).body("");
        })
        .await;

    let first = refresher.run_scheduled(now()).await;
    assert!(matches!(first.coding, StageOutcome::Completed(_)));
    assert!(matches!(first.hourly, StageOutcome::Completed(_)));
    assert!(matches!(first.contributions, StageOutcome::Failed { .. }));
    assert_eq!(durations.hits_async().await, 7);

    let later = now() + chrono::Duration::minutes(90);
    let second = refresher.run_scheduled(later).await;
    assert!(matches!(second.hourly, StageOutcome::Throttled));
    assert_eq!(durations.hits_async().await, 7);

    let much_later = now() + chrono::Duration::hours(6);
    let third = refresher.run_scheduled(much_later).await;
    assert!(matches!(third.hourly, StageOutcome::Completed(_)));
}

// ============================================
// Reads
// ============================================

#[tokio::test]
async fn test_rollup_after_ingest() {
    let server = MockServer::start_async().await;
    let harness = Harness::new();

    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v1/users/current/summaries");
            then.status(200).json_body(json!({
                "data": [
                    summary_day("2025-06-01", 100.0, "Rust"),
                    summary_day("2025-06-02", 200.0, "Go")
                ]
            }));
        })
        .await;
    harness
        .refresher(coding_config(&server))
        .backfill_coding(DateSpan::new(d(2025, 6, 1), d(2025, 6, 2)), now())
        .await
        .unwrap();

    let span = RollupWindow::Week.resolve(d(2025, 6, 2)).unwrap();
    let report = build_rollup(Arc::clone(&harness.db), span, 10).await.unwrap();

    assert_eq!(report.coding.total_seconds, 300.0);
    let dates: Vec<_> = report.coding.daily.iter().map(|r| r.date).collect();
    assert_eq!(dates, vec![d(2025, 6, 1), d(2025, 6, 2)]);
    let languages: Vec<_> = report
        .coding
        .top_languages
        .iter()
        .map(|e| e.name.as_str())
        .collect();
    assert_eq!(languages, vec!["Go", "Rust"]);
    assert_eq!(report.coding.top_projects[0].total_seconds, 300.0);
    assert!(report.coding.top_editors.is_empty());
    assert_eq!(report.contributions.total, 0);
}

#[test]
fn test_empty_week_view_on_fresh_database() {
    let harness = Harness::new();
    let view = coding_daily_view(&harness.db, DateSpan::new(d(2025, 6, 1), d(2025, 6, 7))).unwrap();
    assert_eq!(view.total_seconds, 0.0);
    assert!(view.daily.is_empty());
}
