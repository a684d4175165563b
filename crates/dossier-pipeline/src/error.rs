//! Pipeline error types.
//!
//! Only one condition aborts a whole run: the search collaborator being
//! unavailable. Every other failure is captured at the smallest enclosing
//! scope (field, record, or session) and downgrades that unit's status.

use dossier_search::SearchError;
use thiserror::Error;

/// Fatal pipeline errors.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Search collaborator unreachable or retries exhausted.
    #[error("search collaborator unavailable: {source}")]
    SearchUnavailable {
        /// The terminal search failure.
        #[source]
        source: SearchError,
    },
}

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PipelineError::SearchUnavailable {
            source: SearchError::MissingApiKey,
        };
        assert!(err.to_string().contains("search collaborator unavailable"));
    }
}
