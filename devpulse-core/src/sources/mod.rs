//! Clients for the upstream metric providers.
//!
//! Each client turns one provider's wire format into the normalized records in
//! [`crate::types`]. Clients never touch the database.

pub mod coding;
pub mod contributions;

pub use coding::CodingClient;
pub use contributions::ContributionClient;

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use serde::Deserialize;

use crate::config::HttpConfig;
use crate::error::{Error, Result};

/// Build the shared HTTP client with the configured timeout and User-Agent.
pub fn http_client(config: &HttpConfig) -> Result<reqwest::Client> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    headers.insert(
        USER_AGENT,
        HeaderValue::from_str(&config.user_agent)
            .map_err(|e| Error::Config(format!("invalid http.user_agent: {}", e)))?,
    );

    reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .default_headers(headers)
        .build()
        .map_err(|e| Error::Config(format!("failed to create HTTP client: {}", e)))
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<serde_json::Value>,
    message: Option<String>,
}

/// Human-readable message from an upstream error body.
///
/// Prefers a JSON `error` (string, or object with `message`) or `message`
/// field, then the trimmed body text. Empty bodies yield `None`.
pub(crate) fn upstream_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(trimmed) {
        let from_error = match parsed.error {
            Some(serde_json::Value::String(s)) => Some(s),
            Some(serde_json::Value::Object(map)) => map
                .get("message")
                .and_then(|m| m.as_str())
                .map(str::to_string),
            _ => None,
        };
        if let Some(message) = from_error.or(parsed.message) {
            let message = message.trim().to_string();
            if !message.is_empty() {
                return Some(message);
            }
        }
    }

    Some(trimmed.to_string())
}

/// Map a non-success response into [`Error::Upstream`].
pub(crate) async fn upstream_error(source_name: &'static str, response: reqwest::Response) -> Error {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    let message = upstream_message(&body);
    tracing::warn!(source = source_name, status, message = ?message, "Upstream returned an error");
    Error::Upstream {
        source_name,
        status,
        message,
    }
}

/// Map a reqwest failure that produced no usable response.
pub(crate) fn transport_error(source_name: &'static str, err: reqwest::Error) -> Error {
    tracing::warn!(source = source_name, error = %err, "Upstream request failed");
    Error::Transport {
        source_name,
        message: err.to_string(),
    }
}

/// Read a success body and decode it, mapping malformed JSON to [`Error::Protocol`].
pub(crate) async fn decode_body<T: serde::de::DeserializeOwned>(
    source_name: &'static str,
    response: reqwest::Response,
) -> Result<T> {
    let body = response
        .text()
        .await
        .map_err(|e| transport_error(source_name, e))?;
    serde_json::from_str(&body).map_err(|e| Error::Protocol {
        source_name,
        message: format!("failed to parse response: {}", e),
    })
}
