//! Task orchestration: search → classify → (optional) extraction →
//! normalized result.
//!
//! Generic over the search and session seams so the pipeline can be
//! exercised with fakes. Extraction runs with bounded concurrency through
//! an order-preserving buffered stream; the session is closed on every
//! path once it has been opened.

use crate::error::{PipelineError, Result};
use crate::router;
use dossier_browser::ProfileSession;
use dossier_core::{
    AppConfig, PipelineResult, ProfileRecord, QueryMode, ResearchRequest, ScrapingConfig,
    SearchOutcome,
};
use dossier_search::{SearchClient, SearchError};
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Base delay for search retry backoff.
const SEARCH_RETRY_DELAY_MS: u64 = 2000;

/// Drives one research request end to end.
pub struct Orchestrator<S, P> {
    search: S,
    session: Arc<P>,
    scraping: ScrapingConfig,
    search_retries: u32,
    deadline: Option<Duration>,
}

impl<S, P> Orchestrator<S, P>
where
    S: SearchClient,
    P: ProfileSession + 'static,
{
    /// Create an orchestrator over the given collaborators.
    pub fn new(search: S, session: Arc<P>, config: &AppConfig) -> Self {
        Self {
            search,
            session,
            scraping: config.scraping.clone(),
            search_retries: config.search.retry_attempts,
            deadline: None,
        }
    }

    /// Set an overall wall-clock budget for the run. Extractions that do
    /// not finish inside it become `Failed` records with a timeout note;
    /// completed ones are kept.
    #[must_use]
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Run the pipeline for one request.
    ///
    /// # Errors
    /// Only [`PipelineError::SearchUnavailable`]: every other failure is
    /// absorbed into record or field status.
    pub async fn run(&self, request: &ResearchRequest) -> Result<PipelineResult> {
        tracing::info!(
            max_results = request.max_results,
            "starting pipeline run: {}",
            request.text
        );

        let search = self
            .search_with_retry(&request.text, request.max_results)
            .await?;

        let mode = router::classify(request, &search, &self.scraping.profile);
        tracing::debug!(%mode, links = search.links.len(), "request classified");

        if mode == QueryMode::WebOnly {
            return Ok(PipelineResult {
                search,
                profiles: Vec::new(),
            });
        }

        let urls = router::candidate_profile_urls(request, &search, &self.scraping.profile);
        let profiles = self.extract_all(urls).await;

        tracing::info!(profiles = profiles.len(), "pipeline run complete");
        Ok(PipelineResult { search, profiles })
    }

    /// Invoke the search collaborator, retrying transient failures.
    async fn search_with_retry(&self, query: &str, max_results: usize) -> Result<SearchOutcome> {
        let mut last_error: Option<SearchError> = None;

        for attempt in 0..=self.search_retries {
            match self.search.search(query, max_results).await {
                Ok(outcome) => return Ok(outcome),
                Err(e) => {
                    let transient = e.is_transient();
                    tracing::warn!(
                        attempt = attempt + 1,
                        attempts = self.search_retries + 1,
                        "search attempt failed: {}",
                        e
                    );
                    last_error = Some(e);
                    if !transient || attempt == self.search_retries {
                        break;
                    }
                    let delay =
                        Duration::from_millis(SEARCH_RETRY_DELAY_MS * u64::from(attempt + 1));
                    tokio::time::sleep(delay).await;
                }
            }
        }

        Err(PipelineError::SearchUnavailable {
            source: last_error
                .unwrap_or_else(|| SearchError::Internal("search never attempted".to_string())),
        })
    }

    /// Extract all candidate URLs through the shared session.
    ///
    /// Output order equals input order regardless of completion order. A
    /// panicking extraction becomes a `Failed` record. The session is
    /// closed exactly once before returning.
    async fn extract_all(&self, urls: Vec<String>) -> Vec<ProfileRecord> {
        if urls.is_empty() {
            return Vec::new();
        }

        let mode = self.session.open().await;
        let degradation = mode.degradation().map(String::from);
        let deadline = self.deadline.map(|d| Instant::now() + d);

        let mut records: Vec<ProfileRecord> = stream::iter(urls)
            .map(|url| {
                let session = Arc::clone(&self.session);
                async move {
                    let remaining = match deadline {
                        Some(deadline) => {
                            let now = Instant::now();
                            if now >= deadline {
                                tracing::warn!(url = url.as_str(), "run deadline already spent");
                                return ProfileRecord::timed_out(&url);
                            }
                            Some(deadline - now)
                        }
                        None => None,
                    };

                    // Spawned so an extraction panic downgrades to a failed
                    // record instead of tearing down the run.
                    let mut handle = tokio::spawn({
                        let session = Arc::clone(&session);
                        let url = url.clone();
                        async move { session.extract(&url).await }
                    });

                    let joined = match remaining {
                        Some(remaining) => {
                            match tokio::time::timeout(remaining, &mut handle).await {
                                Ok(joined) => joined,
                                Err(_) => {
                                    handle.abort();
                                    tracing::warn!(
                                        url = url.as_str(),
                                        "extraction cancelled at run deadline"
                                    );
                                    return ProfileRecord::timed_out(&url);
                                }
                            }
                        }
                        None => (&mut handle).await,
                    };

                    match joined {
                        Ok(record) => record,
                        Err(e) => {
                            tracing::error!(url = url.as_str(), "extraction task failed: {}", e);
                            ProfileRecord::failed(&url, format!("extraction task failed: {e}"))
                        }
                    }
                }
            })
            .buffered(self.scraping.concurrency.max(1))
            .collect()
            .await;

        self.session.close().await;

        if let Some(note) = degradation {
            for record in &mut records {
                record.push_note(&note);
            }
        }

        records
    }
}
