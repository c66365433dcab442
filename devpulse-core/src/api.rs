//! Response payloads for the exposed operations.
//!
//! Write operations answer with either the run summary (echoing the
//! effective `{start, end}`) or an [`ErrorPayload`].

use serde::Serialize;

use crate::error::Error;

const GENERIC_UPSTREAM: &str = "upstream provider request failed";
const GENERIC_INTERNAL: &str = "internal error";

/// Structured failure returned to callers of write operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorPayload {
    /// HTTP-style status code
    pub status: u16,
    /// Human-readable message
    pub error: String,
}

impl ErrorPayload {
    /// Map a library error to a payload.
    ///
    /// | Kind | Status |
    /// |------|--------|
    /// | range | 400 |
    /// | upstream, protocol, transport | 502 |
    /// | not configured | 503 |
    /// | anything else | 500 |
    pub fn from_error(err: &Error) -> Self {
        let status = match err {
            Error::Range(_) => 400,
            Error::Upstream { .. } | Error::Protocol { .. } | Error::Transport { .. } => 502,
            Error::NotConfigured { .. } => 503,
            _ => 500,
        };

        let fallback = if err.is_upstream() {
            GENERIC_UPSTREAM
        } else {
            GENERIC_INTERNAL
        };

        Self {
            status,
            error: err
                .public_message()
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| fallback.to_string()),
        }
    }

    /// Whether the caller, rather than a provider or the store, was at fault.
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status)
    }
}

impl From<&Error> for ErrorPayload {
    fn from(err: &Error) -> Self {
        Self::from_error(err)
    }
}
