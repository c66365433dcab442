//! devpulse - personal coding telemetry ingestion CLI
//!
//! Refreshes and backfills coding activity and contribution data into the
//! local bucket store, runs the scheduled trigger, and prints ranged views.
//!
//! Uses XDG Base Directory specification for file locations:
//! - Database: $XDG_DATA_HOME/devpulse/data.db (~/.local/share/devpulse/data.db)
//! - Logs: $XDG_STATE_HOME/devpulse/devpulse.log (~/.local/state/devpulse/devpulse.log)
//! - Config: $XDG_CONFIG_HOME/devpulse/config.toml (~/.config/devpulse/config.toml)

mod process_lock;

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use devpulse_core::analytics::{coding_daily_view, contributions_view, hourly_view};
use devpulse_core::format::format_relative_time_opt;
use devpulse_core::time::add_days;
use devpulse_core::config::LoggingConfig;
use devpulse_core::{Config, DateSpan, Database, ErrorPayload, JobType, Refresher};
use indicatif::{ProgressBar, ProgressStyle};
use process_lock::{acquire_refresh_guard, try_acquire_refresh_guard};
use serde::Serialize;

#[derive(Parser)]
#[command(name = "devpulse")]
#[command(about = "Ingest coding activity and contributions into a local bucket store")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Refresh the trailing window of one source, or all sources concurrently
    Refresh {
        #[arg(value_enum, default_value_t = RefreshTarget::All)]
        target: RefreshTarget,
    },

    /// Ingest an explicit date range for one source
    Backfill {
        #[arg(value_enum)]
        source: Source,

        /// First date (YYYY-MM-DD)
        #[arg(long)]
        start: String,

        /// Last date, inclusive (YYYY-MM-DD)
        #[arg(long)]
        end: String,
    },

    /// Unattended run for cron/launchd; never exits non-zero on source failures
    Scheduled,

    /// Print stored data for a range as JSON
    Show {
        #[arg(value_enum)]
        view: View,

        /// First date (default: start of the source's refresh window)
        #[arg(long)]
        start: Option<String>,

        /// Last date (default: today)
        #[arg(long)]
        end: Option<String>,
    },

    /// Show configuration, database location and last refresh per job
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum RefreshTarget {
    Coding,
    Hourly,
    Contributions,
    All,
}

#[derive(Clone, Copy, ValueEnum)]
enum Source {
    Coding,
    Hourly,
    Contributions,
}

#[derive(Clone, Copy, ValueEnum)]
enum View {
    Daily,
    Hourly,
    Contributions,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();

    if matches!(args.command, Command::Scheduled) {
        return Ok(run_scheduled().await);
    }

    let config = Config::load().context("failed to load configuration")?;

    let _log_guard =
        devpulse_core::logging::init(&config.logging).context("failed to initialize logging")?;

    tracing::info!("devpulse starting");

    let db_path = Config::database_path();
    tracing::info!(path = %db_path.display(), "Opening database");

    let db = Database::open(&db_path).context("failed to open database")?;
    db.migrate().context("failed to run database migrations")?;
    let db = Arc::new(db);

    let now = Utc::now();

    match args.command {
        Command::Refresh { target } => {
            let _guard =
                acquire_refresh_guard(&db_path).context("failed to acquire process lock")?;
            cmd_refresh(Refresher::new(db, config), target, now).await
        }
        Command::Backfill { source, start, end } => {
            let span = match DateSpan::parse(&start, &end) {
                Ok(span) => span,
                Err(e) => return emit(Err::<(), _>(e.into())),
            };
            let _guard =
                acquire_refresh_guard(&db_path).context("failed to acquire process lock")?;
            cmd_backfill(Refresher::new(db, config), source, span, now).await
        }
        Command::Scheduled => unreachable!("scheduled runs are dispatched before startup"),
        Command::Show { view, start, end } => cmd_show(&db, &config, view, start, end, now),
        Command::Status { json } => cmd_status(&db, &config, now, json),
    }
}

/// Unattended entry point for cron/launchd. Startup, lock and stage
/// failures are logged and the process still exits successfully.
async fn run_scheduled() -> ExitCode {
    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            let _log_guard = devpulse_core::logging::init(&LoggingConfig::default()).ok();
            tracing::warn!(error = %e, "Invalid configuration, skipping scheduled run");
            return ExitCode::SUCCESS;
        }
    };
    let _log_guard = devpulse_core::logging::init(&config.logging).ok();

    let db_path = Config::database_path();
    let db = match Database::open(&db_path) {
        Ok(db) => db,
        Err(e) => {
            tracing::warn!(
                error = %e,
                path = %db_path.display(),
                "Database unavailable, skipping scheduled run"
            );
            return ExitCode::SUCCESS;
        }
    };
    if let Err(e) = db.migrate() {
        tracing::warn!(error = %e, "Database migration failed, skipping scheduled run");
        return ExitCode::SUCCESS;
    }

    let _guard = match try_acquire_refresh_guard(&db_path) {
        Ok(Some(guard)) => guard,
        Ok(None) => {
            tracing::info!("Another refresh holds the lock, skipping scheduled run");
            return ExitCode::SUCCESS;
        }
        Err(e) => {
            tracing::warn!(error = %e, "Could not take the refresh lock, skipping scheduled run");
            return ExitCode::SUCCESS;
        }
    };

    let report = Refresher::new(Arc::new(db), config)
        .run_scheduled(Utc::now())
        .await;
    if let Err(e) = print_json(&report) {
        tracing::warn!(error = %e, "Failed to print scheduled report");
    }
    ExitCode::SUCCESS
}

/// Print a success payload, or an error payload and a failing exit code.
fn emit<T: Serialize>(result: devpulse_core::Result<T>) -> Result<ExitCode> {
    match result {
        Ok(value) => {
            print_json(&value)?;
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            tracing::error!(error = %e, "Command failed");
            print_json(&ErrorPayload::from_error(&e))?;
            Ok(ExitCode::FAILURE)
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn cmd_refresh(refresher: Refresher, target: RefreshTarget, now: DateTime<Utc>) -> Result<ExitCode> {
    match target {
        RefreshTarget::Coding => emit(refresher.refresh_coding(now).await),
        RefreshTarget::Hourly => emit(refresher.refresh_hourly(now).await),
        RefreshTarget::Contributions => emit(refresher.refresh_contributions(now).await),
        RefreshTarget::All => {
            // Per-source failures are part of the payload
            let report = refresher.refresh_all(now).await;
            print_json(&report)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

async fn cmd_backfill(
    refresher: Refresher,
    source: Source,
    span: DateSpan,
    now: DateTime<Utc>,
) -> Result<ExitCode> {
    match source {
        Source::Coding => emit(refresher.backfill_coding(span, now).await),
        Source::Contributions => emit(refresher.backfill_contributions(span, now).await),
        Source::Hourly => {
            let pb = ProgressBar::new(span.len_days().max(0) as u64);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                    .unwrap()
                    .progress_chars("#>-"),
            );

            let result = refresher
                .backfill_hourly_with_progress(span, now, &|date: NaiveDate| {
                    pb.set_message(date.to_string());
                    pb.inc(1);
                })
                .await;
            pb.finish_and_clear();
            emit(result)
        }
    }
}

/// Resolve optional bounds: `end` defaults to today, `start` to the window ending at `end`.
fn resolve_span(
    start: Option<String>,
    end: Option<String>,
    today: NaiveDate,
    default_days: i64,
) -> devpulse_core::Result<DateSpan> {
    let end = match end {
        Some(end) => devpulse_core::time::parse_date(&end)?,
        None => today,
    };
    let start = match start {
        Some(start) => devpulse_core::time::parse_date(&start)?,
        None => add_days(end, -(default_days.max(1) - 1)),
    };
    Ok(DateSpan::new(start, end))
}

fn cmd_show(
    db: &Database,
    config: &Config,
    view: View,
    start: Option<String>,
    end: Option<String>,
    now: DateTime<Utc>,
) -> Result<ExitCode> {
    let today = devpulse_core::time::local_today(now, &config.coding.timezone);
    let refresh = &config.refresh;

    match view {
        View::Daily => emit(
            resolve_span(start, end, today, refresh.coding_days)
                .and_then(|span| coding_daily_view(db, span)),
        ),
        View::Hourly => emit(
            resolve_span(start, end, today, refresh.hourly_days)
                .and_then(|span| hourly_view(db, span)),
        ),
        View::Contributions => emit(
            resolve_span(start, end, today, refresh.contribution_days)
                .and_then(|span| contributions_view(db, span, config.rollup.top_n)),
        ),
    }
}

#[derive(Serialize)]
struct StatusReport {
    config_path: String,
    config_found: bool,
    database_path: String,
    log_path: String,
    coding_ready: bool,
    contributions_ready: bool,
    jobs: Vec<JobStatus>,
}

#[derive(Serialize)]
struct JobStatus {
    job: &'static str,
    last_run_at: Option<DateTime<Utc>>,
    age: String,
}

fn cmd_status(db: &Database, config: &Config, now: DateTime<Utc>, json: bool) -> Result<ExitCode> {
    let config_path = Config::config_path();
    let mut jobs = Vec::new();
    for job in JobType::ALL {
        let last_run = db
            .ledger_entry(job)
            .context("failed to read refresh ledger")?
            .and_then(|entry| entry.last_run());
        jobs.push(JobStatus {
            job: job.as_str(),
            last_run_at: last_run,
            age: format_relative_time_opt(last_run, now),
        });
    }

    let report = StatusReport {
        config_found: config_path.exists(),
        config_path: config_path.display().to_string(),
        database_path: Config::database_path().display().to_string(),
        log_path: Config::log_path().display().to_string(),
        coding_ready: config.coding.is_ready(),
        contributions_ready: config.contributions.is_ready(),
        jobs,
    };

    if json {
        print_json(&report)?;
        return Ok(ExitCode::SUCCESS);
    }

    let ready = |ok: bool| if ok { "ready" } else { "not configured" };

    println!("devpulse status");
    println!("===============");
    println!();
    println!(
        "Config:        {}{}",
        report.config_path,
        if report.config_found { "" } else { " (not found, using defaults)" }
    );
    println!("Database:      {}", report.database_path);
    println!("Log file:      {}", report.log_path);
    println!();
    println!("Sources");
    println!("  coding:         {}", ready(report.coding_ready));
    println!("  contributions:  {}", ready(report.contributions_ready));
    println!();
    println!("Last successful refresh");
    for job in &report.jobs {
        println!("  {:<16} {}", job.job, job.age);
    }

    Ok(ExitCode::SUCCESS)
}
