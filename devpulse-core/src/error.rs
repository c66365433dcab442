//! Error types for devpulse-core

use chrono::NaiveDate;
use thiserror::Error;

/// Main error type for the devpulse-core library
#[derive(Error, Debug)]
pub enum Error {
    /// Database error (a write or read against the bucket store failed)
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// A source is missing its credential or identifier
    #[error("{source_name} is not configured: missing {missing}")]
    NotConfigured {
        source_name: &'static str,
        missing: &'static str,
    },

    /// Upstream answered with a non-success status
    #[error("{source_name} upstream error ({status}){}", .message.as_deref().map(|m| format!(": {m}")).unwrap_or_default())]
    Upstream {
        source_name: &'static str,
        status: u16,
        message: Option<String>,
    },

    /// Upstream answered successfully but the body was malformed or carried errors
    #[error("{source_name} protocol error: {message}")]
    Protocol {
        source_name: &'static str,
        message: String,
    },

    /// The request never produced a response (DNS, timeout, connection reset)
    #[error("{source_name} request failed: {message}")]
    Transport {
        source_name: &'static str,
        message: String,
    },

    /// Caller-supplied range is invalid
    #[error(transparent)]
    Range(#[from] RangeError),
}

/// Rejections produced before any upstream call is made.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RangeError {
    /// `start` is after `end`
    #[error("start date {start} is after end date {end}")]
    Inverted { start: NaiveDate, end: NaiveDate },

    /// The inclusive span is longer than allowed
    #[error("range covers {days} days, maximum is {max_days}")]
    TooLarge { days: i64, max_days: i64 },

    /// A date could not be parsed as `YYYY-MM-DD`
    #[error("invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),
}

impl Error {
    /// Upstream-facing message when one is available.
    ///
    /// For upstream failures this is the provider's own message; for every
    /// other kind it is the display string.
    pub fn public_message(&self) -> Option<String> {
        match self {
            Error::Upstream { message, .. } => message.clone(),
            Error::Database(_) | Error::Io(_) => None,
            other => Some(other.to_string()),
        }
    }

    /// Whether this error came from a third party rather than from us.
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            Error::Upstream { .. } | Error::Protocol { .. } | Error::Transport { .. }
        )
    }
}

/// Result type alias for devpulse-core
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_display_with_and_without_message() {
        let err = Error::Upstream {
            source_name: "wakatime",
            status: 401,
            message: Some("bad api key".to_string()),
        };
        assert_eq!(err.to_string(), "wakatime upstream error (401): bad api key");

        let err = Error::Upstream {
            source_name: "github",
            status: 502,
            message: None,
        };
        assert_eq!(err.to_string(), "github upstream error (502)");
        assert!(err.is_upstream());
        assert_eq!(err.public_message(), None);
    }

    #[test]
    fn test_range_error_is_transparent() {
        let start = NaiveDate::from_ymd_opt(2025, 6, 7).unwrap();
        let end = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let err: Error = RangeError::Inverted { start, end }.into();
        assert_eq!(
            err.to_string(),
            "start date 2025-06-07 is after end date 2025-06-01"
        );
        assert!(!err.is_upstream());
    }
}
