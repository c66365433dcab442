//! Date and hour arithmetic.
//!
//! Everything here is pure: callers pass the current instant or date in,
//! nothing reads the ambient clock.

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Timelike, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::RangeError;

/// Local hour-of-day (0-23) of `instant` in the IANA zone `timezone`.
///
/// Unknown zone names fall back to the UTC hour instead of failing, so a
/// single bad sample cannot abort a whole day's bucketing.
pub fn hour_of_day(instant: DateTime<Utc>, timezone: &str) -> u32 {
    match timezone.trim().parse::<Tz>() {
        Ok(tz) => tz.from_utc_datetime(&instant.naive_utc()).hour(),
        Err(_) => {
            tracing::debug!(timezone, "Unknown timezone, bucketing by UTC hour");
            instant.hour()
        }
    }
}

/// Civil date of `now` in `timezone` (UTC when the zone is unknown).
pub fn local_today(now: DateTime<Utc>, timezone: &str) -> NaiveDate {
    match timezone.trim().parse::<Tz>() {
        Ok(tz) => tz.from_utc_datetime(&now.naive_utc()).date_naive(),
        Err(_) => now.date_naive(),
    }
}

/// `date` shifted by `days` (negative goes back). Saturates at chrono's range.
pub fn add_days(date: NaiveDate, days: i64) -> NaiveDate {
    Duration::try_days(days)
        .and_then(|delta| date.checked_add_signed(delta))
        .unwrap_or(if days < 0 { NaiveDate::MIN } else { NaiveDate::MAX })
}

/// Number of days in `[start, end]`, counting both ends. Zero or negative when inverted.
pub fn days_inclusive(start: NaiveDate, end: NaiveDate) -> i64 {
    (end - start).num_days() + 1
}

/// Reject inverted ranges and ranges longer than `max_days`.
pub fn validate_range(start: NaiveDate, end: NaiveDate, max_days: i64) -> Result<(), RangeError> {
    if start > end {
        return Err(RangeError::Inverted { start, end });
    }
    let days = days_inclusive(start, end);
    if days > max_days {
        return Err(RangeError::TooLarge { days, max_days });
    }
    Ok(())
}

/// Parse a `YYYY-MM-DD` date.
pub fn parse_date(value: &str) -> Result<NaiveDate, RangeError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| RangeError::InvalidDate(value.to_string()))
}

/// An inclusive range of civil dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateSpan {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateSpan {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// A single day.
    pub fn day(date: NaiveDate) -> Self {
        Self::new(date, date)
    }

    /// The `days` days ending at `today`, inclusive.
    pub fn trailing(today: NaiveDate, days: i64) -> Self {
        Self::new(add_days(today, -(days.max(1) - 1)), today)
    }

    /// Parse caller-supplied bounds. Ordering is checked by [`validate_range`].
    pub fn parse(start: &str, end: &str) -> Result<Self, RangeError> {
        Ok(Self::new(parse_date(start)?, parse_date(end)?))
    }

    /// Inclusive day count.
    pub fn len_days(&self) -> i64 {
        days_inclusive(self.start, self.end)
    }

    /// Every date in the span in ascending order. Empty when inverted.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end;
        self.start.iter_days().take_while(move |d| *d <= end)
    }

    /// Validate against a maximum span.
    pub fn validate(&self, max_days: i64) -> Result<(), RangeError> {
        validate_range(self.start, self.end, max_days)
    }
}

impl std::fmt::Display for DateSpan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}
