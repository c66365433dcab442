//! Duration samples to hourly buckets.

use chrono::NaiveDate;

use crate::time::hour_of_day;
use crate::types::{DurationSample, HourlyBucket};

/// Aggregate one day's samples into exactly 24 buckets, hours 0..=23.
///
/// Each sample lands in the local hour of its start instant in `timezone`.
/// Samples with a non-positive or non-finite duration are ignored. Samples
/// without a language add to the hour's seconds but not to its language map.
pub fn bucket_samples(date: NaiveDate, samples: &[DurationSample], timezone: &str) -> [HourlyBucket; 24] {
    let mut buckets: [HourlyBucket; 24] = std::array::from_fn(|h| HourlyBucket::empty(date, h as u32));

    for sample in samples {
        let seconds = sample.duration_seconds;
        if !seconds.is_finite() || seconds <= 0.0 {
            continue;
        }

        let bucket = &mut buckets[hour_of_day(sample.time, timezone) as usize];
        bucket.seconds += seconds;
        if let Some(language) = sample.language.as_deref() {
            *bucket.languages.entry(language.to_string()).or_insert(0.0) += seconds;
        }
    }

    buckets
}
