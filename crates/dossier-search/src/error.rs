//! Error types for the search collaborator client.

use thiserror::Error;

/// Errors that can occur while querying the search collaborator.
#[derive(Error, Debug)]
pub enum SearchError {
    /// No API key available for the search backend
    #[error("no search API key configured")]
    MissingApiKey,

    /// API error with status code
    #[error("search API error: status {status}, {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Error message
        message: String,
    },

    /// Rate limit exceeded
    #[error("search API rate limit exceeded: {message}")]
    RateLimited {
        /// Error message
        message: String,
    },

    /// Invalid API key or authentication failure
    #[error("search API authentication failed: {message}")]
    AuthenticationFailed {
        /// Error message
        message: String,
    },

    /// Response parsing error
    #[error("failed to parse search response: {message}")]
    ParseError {
        /// Error message
        message: String,
    },

    /// Network error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal error
    #[error("internal error: {0}")]
    Internal(String),
}

impl SearchError {
    /// Whether a retry of the same request could plausibly succeed.
    ///
    /// Authentication and configuration failures are terminal; network
    /// hiccups, throttling, and server-side errors are not.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Network(_) | Self::RateLimited { .. } => true,
            Self::ApiError { status, .. } => *status >= 500 || *status == 429,
            Self::MissingApiKey
            | Self::AuthenticationFailed { .. }
            | Self::ParseError { .. }
            | Self::Serialization(_)
            | Self::Internal(_) => false,
        }
    }
}

/// Result type alias for search operations.
pub type Result<T> = std::result::Result<T, SearchError>;
