//! Wrapped - cross-source rollups over a date range
//!
//! Combines coding activity and contributions into one report. Every part of
//! the report is an independent read, so the reads run concurrently.

use std::sync::Arc;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::db::Database;
use crate::error::{Error, RangeError, Result};
use crate::time::{add_days, DateSpan};
use crate::types::{seconds_to_minutes, ContributionDay, DailySummary, Dimension};

/// Named window a rollup can be requested for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RollupWindow {
    /// Just today
    Today,
    /// Trailing 7 days including today
    Week,
    /// Trailing 30 days including today
    Month30,
    /// Full calendar year
    Year(i32),
    /// Calendar month (year, month 1-12)
    Month(i32, u32),
}

impl RollupWindow {
    /// Resolve to a concrete range relative to `today`.
    pub fn resolve(&self, today: NaiveDate) -> Result<DateSpan> {
        let span = match *self {
            RollupWindow::Today => DateSpan::day(today),
            RollupWindow::Week => DateSpan::trailing(today, 7),
            RollupWindow::Month30 => DateSpan::trailing(today, 30),
            RollupWindow::Year(year) => {
                let start = NaiveDate::from_ymd_opt(year, 1, 1)
                    .ok_or_else(|| RangeError::InvalidDate(format!("{year}-01-01")))?;
                let end = NaiveDate::from_ymd_opt(year, 12, 31)
                    .ok_or_else(|| RangeError::InvalidDate(format!("{year}-12-31")))?;
                DateSpan::new(start, end)
            }
            RollupWindow::Month(year, month) => {
                let start = NaiveDate::from_ymd_opt(year, month, 1)
                    .ok_or_else(|| RangeError::InvalidDate(format!("{year}-{month:02}")))?;
                let (next_year, next_month) = if month == 12 {
                    (year + 1, 1)
                } else {
                    (year, month + 1)
                };
                let next = NaiveDate::from_ymd_opt(next_year, next_month, 1)
                    .ok_or_else(|| RangeError::InvalidDate(format!("{year}-{month:02}")))?;
                DateSpan::new(start, add_days(next, -1))
            }
        };
        Ok(span)
    }

    /// Get display name for this window.
    pub fn display_name(&self) -> String {
        match self {
            RollupWindow::Today => "Today".to_string(),
            RollupWindow::Week => "Last 7 days".to_string(),
            RollupWindow::Month30 => "Last 30 days".to_string(),
            RollupWindow::Year(year) => format!("{}", year),
            RollupWindow::Month(year, month) => {
                let month_name = match month {
                    1 => "January",
                    2 => "February",
                    3 => "March",
                    4 => "April",
                    5 => "May",
                    6 => "June",
                    7 => "July",
                    8 => "August",
                    9 => "September",
                    10 => "October",
                    11 => "November",
                    12 => "December",
                    _ => "Unknown",
                };
                format!("{} {}", month_name, year)
            }
        }
    }

    /// The calendar month containing `today`.
    pub fn month_of(today: NaiveDate) -> Self {
        RollupWindow::Month(today.year(), today.month())
    }

    /// Parse `YYYY-MM`.
    pub fn parse_month(value: &str) -> Result<Self> {
        let invalid = || Error::Range(RangeError::InvalidDate(value.to_string()));
        let (year, month) = value.trim().split_once('-').ok_or_else(invalid)?;
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;
        if !(1..=12).contains(&month) {
            return Err(invalid());
        }
        Ok(RollupWindow::Month(year, month))
    }
}

impl std::str::FromStr for RollupWindow {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "today" => Ok(RollupWindow::Today),
            "week" | "7d" => Ok(RollupWindow::Week),
            "month30" | "30d" => Ok(RollupWindow::Month30),
            _ => Err(format!("unknown window: {} (expected today, week, month30)", s)),
        }
    }
}

/// One ranked breakdown name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedEntry {
    pub name: String,
    pub total_seconds: f64,
    pub total_minutes: i64,
}

impl RankedEntry {
    fn from_pair((name, total_seconds): (String, f64)) -> Self {
        Self {
            name,
            total_minutes: seconds_to_minutes(total_seconds),
            total_seconds,
        }
    }

    /// Format duration for display (e.g., "3h 20m").
    pub fn duration_display(&self) -> String {
        duration_display(self.total_seconds)
    }
}

/// One ranked repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoEntry {
    pub repo: String,
    pub count: i64,
}

/// Coding half of a rollup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodingRollup {
    pub total_seconds: f64,
    pub total_minutes: i64,
    pub daily: Vec<DailySummary>,
    pub top_languages: Vec<RankedEntry>,
    pub top_projects: Vec<RankedEntry>,
    pub top_editors: Vec<RankedEntry>,
}

impl CodingRollup {
    /// Format total duration for display (e.g., "312h 45m").
    pub fn duration_display(&self) -> String {
        duration_display(self.total_seconds)
    }

    /// Days with any recorded activity.
    pub fn active_days(&self) -> usize {
        self.daily.iter().filter(|d| d.total_seconds > 0.0).count()
    }

    /// Day with the most coding time, earliest on ties.
    pub fn busiest_day(&self) -> Option<&DailySummary> {
        self.daily
            .iter()
            .filter(|d| d.total_seconds > 0.0)
            .fold(None, |best: Option<&DailySummary>, day| match best {
                Some(b) if b.total_seconds >= day.total_seconds => Some(b),
                _ => Some(day),
            })
    }
}

/// Contribution half of a rollup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContributionRollup {
    pub total: i64,
    pub daily: Vec<ContributionDay>,
    pub top_repos: Vec<RepoEntry>,
}

impl ContributionRollup {
    /// Day with the most contributions, earliest on ties.
    pub fn busiest_day(&self) -> Option<&ContributionDay> {
        self.daily
            .iter()
            .filter(|d| d.count > 0)
            .fold(None, |best: Option<&ContributionDay>, day| match best {
                Some(b) if b.count >= day.count => Some(b),
                _ => Some(day),
            })
    }
}

/// Combined report for one range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RollupReport {
    pub range: DateSpan,
    pub coding: CodingRollup,
    pub contributions: ContributionRollup,
}

/// Format seconds as hours and minutes (e.g., "312h 45m", "12m").
pub fn duration_display(seconds: f64) -> String {
    let total_minutes = seconds_to_minutes(seconds).max(0);
    let hours = total_minutes / 60;
    let mins = total_minutes % 60;
    if hours > 0 {
        format!("{}h {}m", hours, mins)
    } else {
        format!("{}m", mins)
    }
}

/// Run one blocking read on the blocking pool.
async fn read<T, F>(db: &Arc<Database>, f: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce(&Database) -> Result<T> + Send + 'static,
{
    let db = Arc::clone(db);
    tokio::task::spawn_blocking(move || f(&db))
        .await
        .map_err(|e| Error::Io(std::io::Error::other(format!("rollup read task failed: {e}"))))?
}

/// Build the combined rollup for `span`.
///
/// All reads are issued together and awaited as a group; the first failure
/// (if any) is returned once every read has finished.
pub async fn build_rollup(db: Arc<Database>, span: DateSpan, top_n: usize) -> Result<RollupReport> {
    tracing::debug!(%span, top_n, "Building rollup");

    let (coding_total, coding_daily, languages, projects, editors, contrib_total, contrib_daily, repos) = tokio::join!(
        read(&db, move |db| db.coding_total_seconds(span)),
        read(&db, move |db| db.coding_daily_range(span)),
        read(&db, move |db| db.top_breakdown(Dimension::Language, span, top_n)),
        read(&db, move |db| db.top_breakdown(Dimension::Project, span, top_n)),
        read(&db, move |db| db.top_breakdown(Dimension::Editor, span, top_n)),
        read(&db, move |db| db.contribution_total(span)),
        read(&db, move |db| db.contribution_days_range(span)),
        read(&db, move |db| db.top_repos(span, top_n)),
    );

    let total_seconds = coding_total?;
    let ranked = |rows: Vec<(String, f64)>| -> Vec<RankedEntry> {
        rows.into_iter().map(RankedEntry::from_pair).collect()
    };

    Ok(RollupReport {
        range: span,
        coding: CodingRollup {
            total_seconds,
            total_minutes: seconds_to_minutes(total_seconds),
            daily: coding_daily?,
            top_languages: ranked(languages?),
            top_projects: ranked(projects?),
            top_editors: ranked(editors?),
        },
        contributions: ContributionRollup {
            total: contrib_total?,
            daily: contrib_daily?,
            top_repos: repos?
                .into_iter()
                .map(|(repo, count)| RepoEntry { repo, count })
                .collect(),
        },
    })
}
