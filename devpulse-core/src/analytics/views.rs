//! Ranged read views over the bucket store.
//!
//! An empty range is not an error: it yields zero totals and empty series.

use serde::Serialize;

use crate::db::Database;
use crate::error::Result;
use crate::time::DateSpan;
use crate::types::{ContributionDay, DailySummary, Dimension, DimensionBreakdown, HourlyBucket};

use super::wrapped::RepoEntry;

/// Daily coding metrics with their breakdowns.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CodingDailyView {
    pub range: DateSpan,
    pub total_seconds: f64,
    pub total_minutes: i64,
    pub daily: Vec<DailySummary>,
    pub languages: Vec<DimensionBreakdown>,
    pub projects: Vec<DimensionBreakdown>,
    pub editors: Vec<DimensionBreakdown>,
}

/// Hourly buckets for a range.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HourlyView {
    pub range: DateSpan,
    pub total_seconds: f64,
    pub buckets: Vec<HourlyBucket>,
}

impl HourlyView {
    /// Seconds per hour of day summed across every date in the range.
    pub fn hour_totals(&self) -> [f64; 24] {
        let mut totals = [0.0; 24];
        for bucket in &self.buckets {
            if let Some(slot) = totals.get_mut(bucket.hour as usize) {
                *slot += bucket.seconds;
            }
        }
        totals
    }
}

/// Contribution counts and top repositories for a range.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContributionsView {
    pub range: DateSpan,
    pub total: i64,
    pub daily: Vec<ContributionDay>,
    pub top_repos: Vec<RepoEntry>,
}

fn check(span: DateSpan) -> Result<()> {
    span.validate(i64::MAX)?;
    Ok(())
}

/// Daily coding summaries and per-dimension rows for `span`.
pub fn coding_daily_view(db: &Database, span: DateSpan) -> Result<CodingDailyView> {
    check(span)?;
    let daily = db.coding_daily_range(span)?;
    let total_seconds: f64 = daily.iter().map(|d| d.total_seconds).sum();
    let total_minutes = daily.iter().map(|d| d.total_minutes).sum();

    Ok(CodingDailyView {
        range: span,
        total_seconds,
        total_minutes,
        daily,
        languages: db.breakdown_range(Dimension::Language, span)?,
        projects: db.breakdown_range(Dimension::Project, span)?,
        editors: db.breakdown_range(Dimension::Editor, span)?,
    })
}

/// Hourly buckets for `span`.
pub fn hourly_view(db: &Database, span: DateSpan) -> Result<HourlyView> {
    check(span)?;
    let buckets = db.hourly_range(span)?;
    Ok(HourlyView {
        range: span,
        total_seconds: buckets.iter().map(|b| b.seconds).sum(),
        buckets,
    })
}

/// Daily contribution counts and the top `top_n` repositories recorded for exactly `span`.
pub fn contributions_view(db: &Database, span: DateSpan, top_n: usize) -> Result<ContributionsView> {
    check(span)?;
    let daily = db.contribution_days_range(span)?;
    Ok(ContributionsView {
        range: span,
        total: daily.iter().map(|d| d.count).sum(),
        daily,
        top_repos: db
            .top_repos(span, top_n)?
            .into_iter()
            .map(|(repo, count)| RepoEntry { repo, count })
            .collect(),
    })
}
