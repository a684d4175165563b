//! Orchestrator behavior against fake collaborators: routing, ordering,
//! capping, degradation, deadlines, and session lifecycle.

use async_trait::async_trait;
use dossier_browser::{ProfileSession, SessionMode};
use dossier_core::{
    AppConfig, ProfileRecord, RecordStatus, ResearchRequest, SearchLink, SearchOutcome,
};
use dossier_pipeline::{Orchestrator, PipelineError};
use dossier_search::{SearchClient, SearchError};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn link(url: &str) -> SearchLink {
    SearchLink {
        title: url.to_string(),
        url: url.to_string(),
        snippet: String::new(),
    }
}

fn outcome_with(urls: &[&str]) -> SearchOutcome {
    SearchOutcome {
        answer: "narrative answer".to_string(),
        links: urls.iter().map(|u| link(u)).collect(),
    }
}

fn transient_error() -> SearchError {
    SearchError::ApiError {
        status: 503,
        message: "service unavailable".to_string(),
    }
}

fn auth_error() -> SearchError {
    SearchError::AuthenticationFailed {
        message: "bad key".to_string(),
    }
}

/// Search fake: fails `failures_before_success` times, then succeeds.
#[derive(Clone)]
struct FakeSearch {
    outcome: SearchOutcome,
    failures_before_success: Arc<AtomicUsize>,
    error_factory: fn() -> SearchError,
    calls: Arc<AtomicUsize>,
}

impl FakeSearch {
    fn ok(outcome: SearchOutcome) -> Self {
        Self {
            outcome,
            failures_before_success: Arc::new(AtomicUsize::new(0)),
            error_factory: transient_error,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn failing_times(n: usize, outcome: SearchOutcome) -> Self {
        Self {
            failures_before_success: Arc::new(AtomicUsize::new(n)),
            ..Self::ok(outcome)
        }
    }

    fn always_failing(error_factory: fn() -> SearchError) -> Self {
        Self {
            error_factory,
            failures_before_success: Arc::new(AtomicUsize::new(usize::MAX)),
            ..Self::ok(SearchOutcome::default())
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SearchClient for FakeSearch {
    async fn search(&self, _query: &str, max_results: usize) -> dossier_search::Result<SearchOutcome> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let remaining = self.failures_before_success.load(Ordering::SeqCst);
        if remaining > 0 {
            if remaining != usize::MAX {
                self.failures_before_success.fetch_sub(1, Ordering::SeqCst);
            }
            return Err((self.error_factory)());
        }
        let mut outcome = self.outcome.clone();
        outcome.links.truncate(max_results);
        Ok(outcome)
    }
}

/// Session fake with per-URL delays, an optional panicking URL, and
/// open/close counters for lifecycle assertions.
struct FakeSession {
    mode: SessionMode,
    delays: Vec<(String, Duration)>,
    panic_on: Option<String>,
    opens: AtomicUsize,
    closes: AtomicUsize,
}

impl FakeSession {
    fn new() -> Self {
        Self {
            mode: SessionMode::Authenticated,
            delays: Vec::new(),
            panic_on: None,
            opens: AtomicUsize::new(0),
            closes: AtomicUsize::new(0),
        }
    }

    fn anonymous(note: &str) -> Self {
        Self {
            mode: SessionMode::Anonymous {
                degraded: Some(note.to_string()),
            },
            ..Self::new()
        }
    }

    fn with_delay(mut self, url: &str, delay: Duration) -> Self {
        self.delays.push((url.to_string(), delay));
        self
    }

    fn with_panic_on(mut self, url: &str) -> Self {
        self.panic_on = Some(url.to_string());
        self
    }

    fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProfileSession for FakeSession {
    async fn open(&self) -> SessionMode {
        self.opens.fetch_add(1, Ordering::SeqCst);
        self.mode.clone()
    }

    async fn extract(&self, url: &str) -> ProfileRecord {
        if self.panic_on.as_deref() == Some(url) {
            panic!("extraction blew up");
        }
        if let Some((_, delay)) = self.delays.iter().find(|(u, _)| u == url) {
            tokio::time::sleep(*delay).await;
        }
        let mut record = ProfileRecord::empty(url);
        record.name = format!(
            "Person {}",
            url.rsplit('/').find(|s| !s.is_empty()).unwrap_or("unknown")
        );
        record.resolve_status();
        record
    }

    async fn close(&self) {
        self.closes.fetch_add(1, Ordering::SeqCst);
    }
}

fn orchestrator(
    search: FakeSearch,
    session: Arc<FakeSession>,
) -> Orchestrator<FakeSearch, FakeSession> {
    Orchestrator::new(search, session, &AppConfig::default())
}

#[tokio::test]
async fn web_only_request_yields_no_profiles() {
    let search = FakeSearch::ok(outcome_with(&[
        "https://example.com/salaries",
        "https://example.org/survey",
    ]));
    let session = Arc::new(FakeSession::new());
    let orch = orchestrator(search, session.clone());

    let result = orch
        .run(&ResearchRequest::new("average rust salary"))
        .await
        .expect("run succeeds");

    assert!(result.profiles.is_empty());
    assert_eq!(result.search.links.len(), 2);
    // No session was ever needed.
    assert_eq!(session.opens(), 0);
    assert_eq!(session.closes(), 0);
}

#[tokio::test]
async fn literal_profile_url_extracts_despite_empty_search() {
    let search = FakeSearch::ok(SearchOutcome::default());
    let session = Arc::new(FakeSession::new());
    let orch = orchestrator(search, session.clone());

    let result = orch
        .run(&ResearchRequest::new(
            "look at https://www.linkedin.com/in/jdoe",
        ))
        .await
        .expect("run succeeds");

    assert_eq!(result.profiles.len(), 1);
    assert_eq!(result.profiles[0].url, "https://www.linkedin.com/in/jdoe");
    assert_eq!(session.opens(), 1);
    assert_eq!(session.closes(), 1);
}

#[tokio::test]
async fn mixed_links_extract_only_profile_shaped_ones() {
    let search = FakeSearch::ok(outcome_with(&[
        "https://www.linkedin.com/in/jdoe",
        "https://example.com/engineers",
    ]));
    let session = Arc::new(FakeSession::new());
    let orch = orchestrator(search, session.clone());

    let result = orch
        .run(&ResearchRequest::new(
            "Find software engineers in San Francisco",
        ))
        .await
        .expect("run succeeds");

    assert_eq!(result.profiles.len(), 1);
    assert_eq!(result.profiles[0].url, "https://www.linkedin.com/in/jdoe");
    // The full search outcome is retained alongside the profiles.
    assert_eq!(result.search.links.len(), 2);
}

#[tokio::test]
async fn profiles_never_exceed_max_results() {
    let search = FakeSearch::ok(outcome_with(&[
        "https://www.linkedin.com/in/a",
        "https://www.linkedin.com/in/b",
        "https://www.linkedin.com/in/c",
        "https://www.linkedin.com/in/d",
    ]));
    let session = Arc::new(FakeSession::new());
    let orch = orchestrator(search, session.clone());

    let result = orch
        .run(&ResearchRequest::new("engineers").with_max_results(2))
        .await
        .expect("run succeeds");

    assert_eq!(result.profiles.len(), 2);
}

#[tokio::test(start_paused = true)]
async fn output_order_matches_input_order_under_delays() {
    let search = FakeSearch::ok(outcome_with(&[
        "https://www.linkedin.com/in/slow",
        "https://www.linkedin.com/in/fast",
        "https://www.linkedin.com/in/medium",
    ]));
    let session = Arc::new(
        FakeSession::new()
            .with_delay("https://www.linkedin.com/in/slow", Duration::from_millis(300))
            .with_delay("https://www.linkedin.com/in/fast", Duration::from_millis(10))
            .with_delay(
                "https://www.linkedin.com/in/medium",
                Duration::from_millis(100),
            ),
    );
    let orch = orchestrator(search, session.clone());

    let result = orch
        .run(&ResearchRequest::new("engineers"))
        .await
        .expect("run succeeds");

    let urls: Vec<&str> = result.profiles.iter().map(|p| p.url.as_str()).collect();
    assert_eq!(
        urls,
        vec![
            "https://www.linkedin.com/in/slow",
            "https://www.linkedin.com/in/fast",
            "https://www.linkedin.com/in/medium",
        ]
    );
    assert_eq!(session.opens(), 1);
    assert_eq!(session.closes(), 1);
}

#[tokio::test]
async fn session_closes_once_even_when_an_extraction_panics() {
    let search = FakeSearch::ok(outcome_with(&[
        "https://www.linkedin.com/in/boom",
        "https://www.linkedin.com/in/fine",
    ]));
    let session =
        Arc::new(FakeSession::new().with_panic_on("https://www.linkedin.com/in/boom"));
    let orch = orchestrator(search, session.clone());

    let result = orch
        .run(&ResearchRequest::new("engineers"))
        .await
        .expect("run still succeeds");

    assert_eq!(result.profiles.len(), 2);
    assert_eq!(result.profiles[0].status, RecordStatus::Failed);
    assert!(result.profiles[0]
        .error
        .as_deref()
        .expect("failure note")
        .contains("extraction task failed"));
    assert_eq!(result.profiles[1].status, RecordStatus::Ok);
    assert_eq!(session.closes(), 1);
}

#[tokio::test(start_paused = true)]
async fn search_retries_transient_failures_then_succeeds() {
    let search = FakeSearch::failing_times(
        1,
        outcome_with(&["https://example.com/only-generic"]),
    );
    let session = Arc::new(FakeSession::new());
    let orch = orchestrator(search.clone(), session);

    let result = orch
        .run(&ResearchRequest::new("anything"))
        .await
        .expect("second attempt succeeds");

    assert_eq!(result.search.links.len(), 1);
    assert_eq!(search.calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn search_exhaustion_is_fatal_even_with_literal_profile_url() {
    let search = FakeSearch::always_failing(transient_error);
    let session = Arc::new(FakeSession::new());
    let orch = orchestrator(search.clone(), session.clone());

    let err = orch
        .run(&ResearchRequest::new(
            "check https://www.linkedin.com/in/jdoe",
        ))
        .await
        .expect_err("run fails");

    assert!(matches!(err, PipelineError::SearchUnavailable { .. }));
    // Default budget: one attempt plus two retries.
    assert_eq!(search.calls(), 3);
    // No partial result leaked through a side channel.
    assert_eq!(session.opens(), 0);
    assert_eq!(session.closes(), 0);
}

#[tokio::test]
async fn non_transient_search_failure_fails_fast() {
    let search = FakeSearch::always_failing(auth_error);
    let session = Arc::new(FakeSession::new());
    let orch = orchestrator(search.clone(), session);

    let err = orch
        .run(&ResearchRequest::new("anything"))
        .await
        .expect_err("run fails");

    assert!(matches!(err, PipelineError::SearchUnavailable { .. }));
    assert_eq!(search.calls(), 1);
}

#[tokio::test]
async fn login_degradation_is_noted_without_changing_status() {
    let search = FakeSearch::ok(outcome_with(&[
        "https://www.linkedin.com/in/a",
        "https://www.linkedin.com/in/b",
    ]));
    let session = Arc::new(FakeSession::anonymous("login degraded: bad credentials"));
    let orch = orchestrator(search, session.clone());

    let result = orch
        .run(&ResearchRequest::new("engineers"))
        .await
        .expect("run succeeds");

    assert_eq!(result.profiles.len(), 2);
    for record in &result.profiles {
        // Status reflects field presence only; the note rides along.
        assert_eq!(record.status, RecordStatus::Ok);
        assert!(record
            .error
            .as_deref()
            .expect("degradation note")
            .contains("login degraded"));
    }
    assert_eq!(session.closes(), 1);
}

#[tokio::test(start_paused = true)]
async fn deadline_keeps_finished_records_and_times_out_slow_ones() {
    let search = FakeSearch::ok(outcome_with(&[
        "https://www.linkedin.com/in/quick",
        "https://www.linkedin.com/in/glacial",
    ]));
    let session = Arc::new(
        FakeSession::new()
            .with_delay("https://www.linkedin.com/in/quick", Duration::from_secs(2))
            .with_delay("https://www.linkedin.com/in/glacial", Duration::from_secs(10)),
    );
    let orch =
        orchestrator(search, session.clone()).with_deadline(Duration::from_secs(5));

    let result = orch
        .run(&ResearchRequest::new("engineers"))
        .await
        .expect("run succeeds");

    assert_eq!(result.profiles.len(), 2);
    assert_eq!(result.profiles[0].status, RecordStatus::Ok);
    assert_eq!(result.profiles[1].status, RecordStatus::Failed);
    assert_eq!(result.profiles[1].error.as_deref(), Some("timeout"));
    assert_eq!(session.closes(), 1);
}
