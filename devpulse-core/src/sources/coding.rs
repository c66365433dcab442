//! Coding-activity provider client (WakaTime-compatible API).

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, NaiveDate, Utc};
use reqwest::header::AUTHORIZATION;
use serde::Deserialize;

use super::{decode_body, transport_error, upstream_error};
use crate::config::{CodingConfig, HttpConfig};
use crate::error::{Error, Result};
use crate::time::DateSpan;
use crate::types::{BreakdownEntry, CodingDay, DurationDay, DurationSample};

const SOURCE: &str = "wakatime";

// ============================================
// Wire format
// ============================================

#[derive(Debug, Deserialize, Default)]
struct SummariesResponse {
    #[serde(default)]
    data: Vec<SummaryDay>,
}

#[derive(Debug, Deserialize, Default)]
struct SummaryDay {
    #[serde(default)]
    range: Option<SummaryRange>,
    #[serde(default)]
    grand_total: Option<GrandTotal>,
    #[serde(default)]
    languages: Vec<WireEntry>,
    #[serde(default)]
    projects: Vec<WireEntry>,
    #[serde(default)]
    editors: Vec<WireEntry>,
}

#[derive(Debug, Deserialize, Default)]
struct SummaryRange {
    date: Option<String>,
    timezone: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct GrandTotal {
    total_seconds: Option<f64>,
}

#[derive(Debug, Deserialize, Default)]
struct WireEntry {
    name: Option<String>,
    total_seconds: Option<f64>,
    percent: Option<f64>,
}

impl From<WireEntry> for BreakdownEntry {
    fn from(entry: WireEntry) -> Self {
        Self {
            name: entry.name,
            total_seconds: entry.total_seconds.unwrap_or(0.0),
            percent: entry.percent.unwrap_or(0.0),
        }
    }
}

#[derive(Debug, Deserialize, Default)]
struct DurationsResponse {
    #[serde(default)]
    data: Vec<WireDuration>,
    timezone: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct WireDuration {
    time: Option<f64>,
    duration: Option<f64>,
    language: Option<String>,
    #[serde(default)]
    languages: Vec<WireNamed>,
}

#[derive(Debug, Deserialize, Default)]
struct WireNamed {
    name: Option<String>,
}

// ============================================
// Normalization
// ============================================

fn normalize_summaries(response: SummariesResponse) -> Vec<CodingDay> {
    response
        .data
        .into_iter()
        .filter_map(|day| {
            let range = day.range.unwrap_or_default();
            let Some(date) = range
                .date
                .as_deref()
                .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
            else {
                tracing::warn!(date = ?range.date, "Skipping summary day without a usable date");
                return None;
            };

            Some(CodingDay {
                date,
                timezone: range.timezone.filter(|tz| !tz.trim().is_empty()),
                total_seconds: day
                    .grand_total
                    .and_then(|g| g.total_seconds)
                    .unwrap_or(0.0),
                languages: day.languages.into_iter().map(Into::into).collect(),
                projects: day.projects.into_iter().map(Into::into).collect(),
                editors: day.editors.into_iter().map(Into::into).collect(),
            })
        })
        .collect()
}

fn normalize_durations(response: DurationsResponse) -> DurationDay {
    let samples = response
        .data
        .into_iter()
        .filter_map(|wire| {
            let time = wire.time?;
            let secs = time.floor() as i64;
            let nanos = ((time - time.floor()) * 1e9) as u32;
            let instant = DateTime::<Utc>::from_timestamp(secs, nanos)?;
            let language = wire
                .language
                .or_else(|| wire.languages.into_iter().next().and_then(|l| l.name))
                .filter(|l| !l.trim().is_empty());
            Some(DurationSample {
                time: instant,
                duration_seconds: wire.duration.unwrap_or(0.0),
                language,
            })
        })
        .collect();

    DurationDay {
        timezone: response.timezone.filter(|tz| !tz.trim().is_empty()),
        samples,
    }
}

// ============================================
// Client
// ============================================

/// Client for the summary and duration endpoints.
pub struct CodingClient {
    http_client: reqwest::Client,
    base_url: String,
    auth_header: String,
}

impl CodingClient {
    /// Build a client from configuration.
    ///
    /// Fails with [`Error::NotConfigured`] when no API key is available.
    pub fn from_config(config: &CodingConfig, http: &HttpConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or(Error::NotConfigured {
                source_name: SOURCE,
                missing: "coding.api_key",
            })?;

        Ok(Self {
            http_client: super::http_client(http)?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            auth_header: format!("Basic {}", STANDARD.encode(api_key)),
        })
    }

    /// One normalized record per day of `span`, in upstream order.
    pub async fn fetch_summaries(&self, span: DateSpan) -> Result<Vec<CodingDay>> {
        let url = format!("{}/users/current/summaries", self.base_url);
        tracing::debug!(%span, "Fetching coding summaries");

        let response = self
            .http_client
            .get(&url)
            .header(AUTHORIZATION, &self.auth_header)
            .query(&[
                ("start", span.start.to_string()),
                ("end", span.end.to_string()),
            ])
            .send()
            .await
            .map_err(|e| transport_error(SOURCE, e))?;

        if !response.status().is_success() {
            return Err(upstream_error(SOURCE, response).await);
        }

        let parsed: SummariesResponse = decode_body(SOURCE, response).await?;
        Ok(normalize_summaries(parsed))
    }

    /// Timed samples for a single day, sliced by language.
    pub async fn fetch_durations(&self, date: NaiveDate) -> Result<DurationDay> {
        let url = format!("{}/users/current/durations", self.base_url);
        tracing::debug!(%date, "Fetching coding durations");

        let response = self
            .http_client
            .get(&url)
            .header(AUTHORIZATION, &self.auth_header)
            .query(&[("date", date.to_string()), ("slice_by", "language".to_string())])
            .send()
            .await
            .map_err(|e| transport_error(SOURCE, e))?;

        if !response.status().is_success() {
            return Err(upstream_error(SOURCE, response).await);
        }

        let parsed: DurationsResponse = decode_body(SOURCE, response).await?;
        Ok(normalize_durations(parsed))
    }
}
