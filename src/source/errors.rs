//! Per-attempt failure types for the standings source.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("HTTP error: {status_code} - {message}")]
    Http { status_code: u16, message: String },

    #[error("Rate limited (HTTP 429)")]
    RateLimited,

    #[error("Invalid source address: {0}")]
    InvalidAddress(String),

    #[error("Invalid request header: {0}")]
    InvalidHeader(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Unreadable response body: {0}")]
    Body(String),
}

impl FetchError {
    /// Build an error from a non-success HTTP status and its body.
    pub fn from_status(status_code: u16, body: &str) -> Self {
        if status_code == 429 {
            return Self::RateLimited;
        }

        // Keep the diagnostic short; source pages can be megabytes of markup.
        let message: String = body.trim().chars().take(200).collect();
        Self::Http {
            status_code,
            message,
        }
    }

    /// Whether another attempt may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RateLimited
                | Self::Network(_)
                | Self::Timeout(_)
                | Self::Http {
                    status_code: 500..=599,
                    ..
                }
        )
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout(e.to_string())
        } else if e.is_builder() {
            Self::InvalidAddress(e.to_string())
        } else if e.is_body() || e.is_decode() {
            Self::Body(e.to_string())
        } else {
            Self::Network(e.to_string())
        }
    }
}
