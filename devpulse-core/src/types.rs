//! Core domain types for devpulse
//!
//! These types represent the canonical bucket model that normalizes metrics
//! from every supported provider.
//!
//! ## Terminology
//!
//! | Term | Definition |
//! |------|------------|
//! | **Bucket** | A fixed-granularity accumulation unit (day, hour, day + name) written idempotently |
//! | **Dimension** | One of the breakdown axes of coding activity: language, project, editor |
//! | **Rollup** | A read-only aggregate over a date range of already-ingested buckets |
//! | **Backfill** | Ingestion over an explicit, caller-supplied date range |
//! | **Ledger** | The last-successful-run record per job, used to throttle automatic refresh |

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ============================================
// Jobs
// ============================================

/// Logical refresh job, one ledger row each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum JobType {
    /// Daily coding summaries and breakdowns
    CodingDaily,
    /// Per-day duration samples bucketed into hours
    CodingHourly,
    /// Contribution calendar and per-repository totals
    Contributions,
}

impl JobType {
    pub const ALL: [JobType; 3] = [
        JobType::CodingDaily,
        JobType::CodingHourly,
        JobType::Contributions,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            JobType::CodingDaily => "coding-daily",
            JobType::CodingHourly => "coding-hourly",
            JobType::Contributions => "contributions",
        }
    }
}

impl std::str::FromStr for JobType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "coding-daily" => Ok(JobType::CodingDaily),
            "coding-hourly" => Ok(JobType::CodingHourly),
            "contributions" => Ok(JobType::Contributions),
            _ => Err(format!("unknown job type: {}", s)),
        }
    }
}

impl std::fmt::Display for JobType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================
// Dimensions
// ============================================

/// Breakdown axis of coding activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Language,
    Project,
    Editor,
}

impl Dimension {
    pub const ALL: [Dimension; 3] = [Dimension::Language, Dimension::Project, Dimension::Editor];

    /// Backing table for this dimension
    pub(crate) fn table(&self) -> &'static str {
        match self {
            Dimension::Language => "coding_languages",
            Dimension::Project => "coding_projects",
            Dimension::Editor => "coding_editors",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Dimension::Language => "language",
            Dimension::Project => "project",
            Dimension::Editor => "editor",
        }
    }
}

impl std::str::FromStr for Dimension {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "language" | "languages" => Ok(Dimension::Language),
            "project" | "projects" => Ok(Dimension::Project),
            "editor" | "editors" => Ok(Dimension::Editor),
            _ => Err(format!("unknown dimension: {}", s)),
        }
    }
}

/// Whole seconds rounded to minutes, the way every `total_minutes` column is derived.
pub fn seconds_to_minutes(seconds: f64) -> i64 {
    if seconds.is_finite() {
        (seconds / 60.0).round() as i64
    } else {
        0
    }
}

// ============================================
// Stored buckets
// ============================================

/// One row per civil date of coding activity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySummary {
    pub date: NaiveDate,
    pub total_seconds: f64,
    pub total_minutes: i64,
    /// Timezone the provider computed the day in
    pub source_timezone: Option<String>,
    pub last_ingested_at: DateTime<Utc>,
}

/// One (date, name) row of a dimension breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionBreakdown {
    pub date: NaiveDate,
    pub name: String,
    pub total_seconds: f64,
    pub total_minutes: i64,
    pub percent: f64,
}

/// Activity within one local hour of one date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyBucket {
    pub date: NaiveDate,
    /// Local hour, 0-23
    pub hour: u32,
    pub seconds: f64,
    /// Seconds per language within this hour
    pub languages: BTreeMap<String, f64>,
}

impl HourlyBucket {
    /// An empty bucket for `date` at `hour`.
    pub fn empty(date: NaiveDate, hour: u32) -> Self {
        Self {
            date,
            hour,
            seconds: 0.0,
            languages: BTreeMap::new(),
        }
    }
}

/// Contribution count for one date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContributionDay {
    pub date: NaiveDate,
    pub count: i64,
    pub last_ingested_at: DateTime<Utc>,
}

/// Commit total for one repository over an exact refresh range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoContributionTotal {
    pub range_start: NaiveDate,
    pub range_end: NaiveDate,
    pub repo: String,
    pub count: i64,
}

/// Last successful run of a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshLedgerEntry {
    pub job_type: String,
    /// Raw stored timestamp; may be unparsable if written by something else
    pub last_run_at: String,
}

impl RefreshLedgerEntry {
    /// Parsed timestamp, `None` when unparsable
    pub fn last_run(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.last_run_at)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }
}

// ============================================
// Normalized upstream records
// ============================================

/// One entry of a provider breakdown list. Entries without a name are skipped on write.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BreakdownEntry {
    pub name: Option<String>,
    pub total_seconds: f64,
    pub percent: f64,
}

impl BreakdownEntry {
    /// Usable name, ignoring blanks
    pub fn usable_name(&self) -> Option<&str> {
        self.name.as_deref().map(str::trim).filter(|n| !n.is_empty())
    }
}

/// One day of the coding summary response.
#[derive(Debug, Clone, PartialEq)]
pub struct CodingDay {
    pub date: NaiveDate,
    pub timezone: Option<String>,
    pub total_seconds: f64,
    pub languages: Vec<BreakdownEntry>,
    pub projects: Vec<BreakdownEntry>,
    pub editors: Vec<BreakdownEntry>,
}

impl CodingDay {
    /// Breakdown list for a dimension
    pub fn breakdown(&self, dimension: Dimension) -> &[BreakdownEntry] {
        match dimension {
            Dimension::Language => &self.languages,
            Dimension::Project => &self.projects,
            Dimension::Editor => &self.editors,
        }
    }
}

/// A discrete timed sample from the duration endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct DurationSample {
    pub time: DateTime<Utc>,
    pub duration_seconds: f64,
    pub language: Option<String>,
}

/// All samples of one requested day.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DurationDay {
    /// Timezone reported by the provider, if any
    pub timezone: Option<String>,
    pub samples: Vec<DurationSample>,
}

/// A repository's commit total as reported upstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoCount {
    pub repo: Option<String>,
    pub count: i64,
}

/// Contribution-graph response for a range.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ContributionReport {
    pub days: Vec<(NaiveDate, i64)>,
    pub repos: Vec<RepoCount>,
}
