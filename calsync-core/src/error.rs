//! Error types for the calsync ecosystem.

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur while talking to the calendar or CRM vendor.
#[derive(Error, Debug)]
pub enum CalSyncError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{service} token refresh failed: {message}")]
    Auth {
        service: &'static str,
        message: String,
    },

    #[error("{service} returned HTTP {status}: {body}")]
    Upstream {
        service: &'static str,
        status: u16,
        body: String,
        retry_after: Option<Duration>,
    },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Could not decode {service} response: {message}")]
    Decode {
        service: &'static str,
        message: String,
    },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("{service} listing still had more results after {pages} pages")]
    Truncated { service: &'static str, pages: u32 },
}

impl CalSyncError {
    pub fn upstream(service: &'static str, status: u16, body: impl Into<String>) -> Self {
        CalSyncError::Upstream {
            service,
            status,
            body: body.into(),
            retry_after: None,
        }
    }

    pub fn decode(service: &'static str, err: impl std::fmt::Display) -> Self {
        CalSyncError::Decode {
            service,
            message: err.to_string(),
        }
    }

    /// HTTP status of the vendor response, if the error came from one.
    pub fn status(&self) -> Option<u16> {
        match self {
            CalSyncError::Upstream { status, .. } => Some(*status),
            CalSyncError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Rate limits, vendor-side 5xx and transport failures are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            CalSyncError::Upstream { status, .. } => *status == 429 || *status >= 500,
            CalSyncError::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            _ => false,
        }
    }

    pub fn is_rate_limited(&self) -> bool {
        self.status() == Some(429)
    }

    /// Server-suggested wait before the next attempt (from `Retry-After`).
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            CalSyncError::Upstream { retry_after, .. } => *retry_after,
            _ => None,
        }
    }

    /// Raw vendor body, for surfacing in error responses.
    pub fn upstream_body(&self) -> Option<&str> {
        match self {
            CalSyncError::Upstream { body, .. } => Some(body),
            _ => None,
        }
    }
}

/// Result type alias for calsync operations.
pub type CalSyncResult<T> = Result<T, CalSyncError>;
