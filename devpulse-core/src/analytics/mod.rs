//! Analytics module for devpulse
//!
//! Read-only aggregates over the bucket store:
//! - Ranged views (daily coding, hourly, contributions)
//! - Wrapped (cross-source rollup over a named window or explicit range)

pub mod views;
pub mod wrapped;

pub use views::{
    coding_daily_view, contributions_view, hourly_view, CodingDailyView, ContributionsView,
    HourlyView,
};
pub use wrapped::{
    build_rollup, duration_display, CodingRollup, ContributionRollup, RankedEntry, RepoEntry,
    RollupReport, RollupWindow,
};
