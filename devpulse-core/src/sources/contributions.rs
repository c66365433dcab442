//! Contribution-graph provider client (GitHub GraphQL API).

use chrono::NaiveDate;
use reqwest::header::AUTHORIZATION;
use serde::{Deserialize, Serialize};

use super::{decode_body, transport_error, upstream_error};
use crate::config::{ContributionConfig, HttpConfig};
use crate::error::{Error, Result};
use crate::time::DateSpan;
use crate::types::{ContributionReport, RepoCount};

const SOURCE: &str = "github";

/// Widest span one contributions collection may cover. The provider
/// rejects anything longer than a year, leap day or not.
pub const MAX_SPAN_DAYS: i64 = 365;

const CONTRIBUTIONS_QUERY: &str = r#"
query($login: String!, $from: DateTime!, $to: DateTime!) {
  user(login: $login) {
    contributionsCollection(from: $from, to: $to) {
      contributionCalendar {
        weeks {
          contributionDays {
            date
            contributionCount
          }
        }
      }
      commitContributionsByRepository(maxRepositories: 100) {
        repository {
          nameWithOwner
        }
        contributions {
          totalCount
        }
      }
    }
  }
}
"#;

// ============================================
// Wire format
// ============================================

#[derive(Debug, Serialize)]
struct GraphQlRequest<'a> {
    query: &'a str,
    variables: Variables<'a>,
}

#[derive(Debug, Serialize)]
struct Variables<'a> {
    login: &'a str,
    from: String,
    to: String,
}

#[derive(Debug, Deserialize, Default)]
struct GraphQlResponse {
    data: Option<ResponseData>,
    errors: Option<Vec<GraphQlError>>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct ResponseData {
    user: Option<User>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct User {
    contributions_collection: Option<Collection>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct Collection {
    contribution_calendar: Option<Calendar>,
    #[serde(default)]
    commit_contributions_by_repository: Vec<RepoContributions>,
}

#[derive(Debug, Deserialize, Default)]
struct Calendar {
    #[serde(default)]
    weeks: Vec<Week>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct Week {
    #[serde(default)]
    contribution_days: Vec<CalendarDay>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct CalendarDay {
    date: Option<String>,
    contribution_count: Option<i64>,
}

#[derive(Debug, Deserialize, Default)]
struct RepoContributions {
    repository: Option<Repository>,
    contributions: Option<TotalCount>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct Repository {
    name_with_owner: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct TotalCount {
    total_count: Option<i64>,
}

fn normalize(response: GraphQlResponse) -> Result<ContributionReport> {
    if let Some(errors) = response.errors.filter(|e| !e.is_empty()) {
        let message = errors
            .iter()
            .filter_map(|e| e.message.as_deref())
            .collect::<Vec<_>>()
            .join("; ");
        return Err(Error::Protocol {
            source_name: SOURCE,
            message: if message.is_empty() {
                "query returned errors".to_string()
            } else {
                message
            },
        });
    }

    let user = response
        .data
        .and_then(|d| d.user)
        .ok_or_else(|| Error::Protocol {
            source_name: SOURCE,
            message: "response has no user".to_string(),
        })?;

    let collection = user.contributions_collection.unwrap_or_default();

    let days = collection
        .contribution_calendar
        .unwrap_or_default()
        .weeks
        .into_iter()
        .flat_map(|w| w.contribution_days)
        .filter_map(|day| {
            let date = NaiveDate::parse_from_str(day.date.as_deref()?, "%Y-%m-%d").ok()?;
            Some((date, day.contribution_count.unwrap_or(0)))
        })
        .collect();

    let repos = collection
        .commit_contributions_by_repository
        .into_iter()
        .map(|r| RepoCount {
            repo: r.repository.and_then(|repo| repo.name_with_owner),
            count: r.contributions.and_then(|c| c.total_count).unwrap_or(0),
        })
        .collect();

    Ok(ContributionReport { days, repos })
}

// ============================================
// Client
// ============================================

/// Client for the contribution calendar query.
pub struct ContributionClient {
    http_client: reqwest::Client,
    endpoint: String,
    auth_header: String,
    login: String,
}

impl ContributionClient {
    /// Build a client from configuration.
    ///
    /// Both a token and a login are required.
    pub fn from_config(config: &ContributionConfig, http: &HttpConfig) -> Result<Self> {
        let present = |v: &Option<String>| {
            v.as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };
        let token = present(&config.token).ok_or(Error::NotConfigured {
            source_name: SOURCE,
            missing: "contributions.token",
        })?;
        let login = present(&config.login).ok_or(Error::NotConfigured {
            source_name: SOURCE,
            missing: "contributions.login",
        })?;

        Ok(Self {
            http_client: super::http_client(http)?,
            endpoint: config.endpoint.clone(),
            auth_header: format!("Bearer {}", token),
            login,
        })
    }

    /// Calendar and per-repository commit totals for `span`.
    pub async fn fetch(&self, span: DateSpan) -> Result<ContributionReport> {
        let request = GraphQlRequest {
            query: CONTRIBUTIONS_QUERY,
            variables: Variables {
                login: &self.login,
                from: format!("{}T00:00:00Z", span.start),
                to: format!("{}T23:59:59Z", span.end),
            },
        };
        tracing::debug!(%span, login = %self.login, "Fetching contribution calendar");

        let response = self
            .http_client
            .post(&self.endpoint)
            .header(AUTHORIZATION, &self.auth_header)
            .json(&request)
            .send()
            .await
            .map_err(|e| transport_error(SOURCE, e))?;

        if !response.status().is_success() {
            return Err(upstream_error(SOURCE, response).await);
        }

        let parsed: GraphQlResponse = decode_body(SOURCE, response).await?;
        normalize(parsed)
    }
}
