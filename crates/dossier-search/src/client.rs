//! Search collaborator trait.

use crate::error::Result;
use async_trait::async_trait;
use dossier_core::SearchOutcome;

/// A backend that answers a research query with a narrative and links.
///
/// Implementations must be thread-safe; the orchestrator calls them from
/// concurrent tasks and retries transient failures. Returned outcomes are
/// expected to be validated: deduplicated, http(s)-only links with titles.
#[async_trait]
pub trait SearchClient: Send + Sync {
    /// Run one search for `query`, returning at most `max_results` links.
    ///
    /// # Errors
    /// Returns error if the backend is unreachable, rejects the request,
    /// or produces nothing parseable.
    async fn search(&self, query: &str, max_results: usize) -> Result<SearchOutcome>;
}
