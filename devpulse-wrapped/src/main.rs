//! devpulse-wrapped - coding and contribution rollups
//!
//! Summarizes stored coding activity and contributions for a named window,
//! a calendar year or month, or an explicit date range.

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use devpulse_core::analytics::{build_rollup, RankedEntry, RollupReport, RollupWindow};
use devpulse_core::time::local_today;
use devpulse_core::{Config, DateSpan, Database};

#[derive(Parser, Debug)]
#[command(name = "devpulse-wrapped")]
#[command(about = "Coding activity and contributions, wrapped")]
#[command(version)]
struct Args {
    /// Named window: today, week, month30 (default: week)
    #[arg(long, conflicts_with_all = ["year", "month", "start"])]
    window: Option<RollupWindow>,

    /// Calendar year
    #[arg(long, conflicts_with_all = ["month", "start"])]
    year: Option<i32>,

    /// Calendar month (format: YYYY-MM)
    #[arg(long, conflicts_with = "start")]
    month: Option<String>,

    /// Explicit range start (YYYY-MM-DD), requires --end
    #[arg(long, requires = "end")]
    start: Option<String>,

    /// Explicit range end (YYYY-MM-DD)
    #[arg(long, requires = "start")]
    end: Option<String>,

    /// Entries per ranked list (default: from config)
    #[arg(long)]
    top: Option<usize>,

    /// Export format (md = markdown, json = JSON)
    #[arg(long)]
    export: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration and database
    let config = Config::load().context("failed to load configuration")?;
    let _log_guard = devpulse_core::logging::init(&config.logging).ok();

    let db_path = Config::database_path();
    let db = Database::open(&db_path).context("failed to open database")?;
    db.migrate().context("failed to run database migrations")?;

    let today = local_today(Utc::now(), &config.coding.timezone);

    // Determine the range and its title
    let (span, title) = if let (Some(start), Some(end)) = (&args.start, &args.end) {
        let span = DateSpan::parse(start, end).context("invalid range")?;
        span.validate(i64::MAX).context("invalid range")?;
        (span, span.to_string())
    } else {
        let window = if let Some(month) = &args.month {
            RollupWindow::parse_month(month).context("invalid month, use YYYY-MM (e.g., 2024-12)")?
        } else if let Some(year) = args.year {
            RollupWindow::Year(year)
        } else {
            args.window.unwrap_or(RollupWindow::Week)
        };
        let span = window.resolve(today).context("invalid window")?;
        (span, window.display_name())
    };

    let top_n = args.top.unwrap_or(config.rollup.top_n);
    let report = build_rollup(Arc::new(db), span, top_n)
        .await
        .context("failed to build rollup")?;

    match args.export.as_deref() {
        Some("json") => print_json(&report)?,
        Some("md") => print_markdown(&report, &title),
        Some(other) => anyhow::bail!("Unknown export format: {}. Use 'md' or 'json'", other),
        None => print_terminal(&report, &title),
    }

    Ok(())
}

fn is_empty(report: &RollupReport) -> bool {
    report.coding.total_seconds <= 0.0 && report.contributions.total == 0
}

fn print_ranked(label: &str, entries: &[RankedEntry]) {
    if entries.is_empty() {
        return;
    }
    println!("{}", label);
    for (i, entry) in entries.iter().enumerate() {
        println!("   {:>2}. {:<28} {}", i + 1, entry.name, entry.duration_display());
    }
    println!();
}

fn print_terminal(report: &RollupReport, title: &str) {
    let heading = format!("devpulse wrapped: {}", title);

    // Header
    println!();
    println!("╭{}╮", "─".repeat(60));
    println!("│{:^60}│", heading);
    println!("│{:^60}│", report.range.to_string());
    println!("╰{}╯", "─".repeat(60));
    println!();

    if is_empty(report) {
        println!("  No activity found for this period.");
        println!();
        return;
    }

    let coding = &report.coding;
    let contributions = &report.contributions;

    println!("SUMMARY");
    println!(
        "   Coding time:   {:<12} Active days: {}",
        coding.duration_display(),
        coding.active_days()
    );
    println!("   Contributions: {}", contributions.total);
    if let Some(day) = coding.busiest_day() {
        println!(
            "   Busiest coding day:        {} ({})",
            day.date,
            devpulse_core::analytics::duration_display(day.total_seconds)
        );
    }
    if let Some(day) = contributions.busiest_day() {
        println!("   Busiest contribution day:  {} ({})", day.date, day.count);
    }
    println!();

    print_ranked("LANGUAGES", &coding.top_languages);
    print_ranked("PROJECTS", &coding.top_projects);
    print_ranked("EDITORS", &coding.top_editors);

    if !contributions.top_repos.is_empty() {
        println!("REPOSITORIES");
        for (i, repo) in contributions.top_repos.iter().enumerate() {
            println!("   {:>2}. {:<40} {} commits", i + 1, repo.repo, repo.count);
        }
        println!();
    }
}

fn print_markdown(report: &RollupReport, title: &str) {
    println!("# devpulse wrapped: {}", title);
    println!();
    println!("*{}*", report.range);
    println!();

    if is_empty(report) {
        println!("*No activity found for this period.*");
        return;
    }

    let coding = &report.coding;

    // Summary table
    println!("## Summary");
    println!();
    println!("| Metric | Value |");
    println!("|--------|-------|");
    println!("| Coding Time | {} |", coding.duration_display());
    println!("| Active Days | {} |", coding.active_days());
    println!("| Contributions | {} |", report.contributions.total);
    println!();

    for (label, entries) in [
        ("Languages", &coding.top_languages),
        ("Projects", &coding.top_projects),
        ("Editors", &coding.top_editors),
    ] {
        if entries.is_empty() {
            continue;
        }
        println!("## Top {}", label);
        println!();
        for (i, entry) in entries.iter().enumerate() {
            println!("{}. **{}** - {}", i + 1, entry.name, entry.duration_display());
        }
        println!();
    }

    if !report.contributions.top_repos.is_empty() {
        println!("## Top Repositories");
        println!();
        for (i, repo) in report.contributions.top_repos.iter().enumerate() {
            println!("{}. **{}** - {} commits", i + 1, repo.repo, repo.count);
        }
        println!();
    }

    println!("---");
    println!("*Generated by devpulse-wrapped*");
}

fn print_json(report: &RollupReport) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(report)?);
    Ok(())
}
