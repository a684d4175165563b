//! Shared types used across the Dossier pipeline.
//!
//! These are the wire shapes exchanged between the search client, the
//! browser session, the orchestrator, and the report renderer. Everything
//! here is plain data: validation happens at the edges that produce it.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// One research request, immutable for the duration of a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchRequest {
    /// Free-text research question.
    pub text: String,
    /// Upper bound on both search links and profiles processed.
    pub max_results: usize,
    /// Emit intermediate diagnostics (pass-through to the logging sink).
    pub verbose: bool,
}

impl ResearchRequest {
    /// Create a request with default bounds.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            max_results: 10,
            verbose: false,
        }
    }

    /// Set the maximum number of results.
    #[must_use]
    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    /// Enable verbose diagnostics.
    #[must_use]
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}

/// Routing decision for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryMode {
    /// Web search only; no profile scraping.
    WebOnly,
    /// Web search augmented with profile extraction.
    Profile,
}

impl fmt::Display for QueryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WebOnly => write!(f, "web_only"),
            Self::Profile => write!(f, "profile"),
        }
    }
}

/// One validated web search hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchLink {
    /// Human-readable title (falls back to the URL upstream).
    pub title: String,
    /// Absolute http(s) URL.
    pub url: String,
    /// Short excerpt, possibly empty.
    pub snippet: String,
}

/// Typed output of the search collaborator.
///
/// Produced behind the validation boundary in `dossier-search`: links are
/// deduplicated, http(s)-only, and ordered as returned by the collaborator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchOutcome {
    /// Narrative answer to the request.
    pub answer: String,
    /// Source links backing the answer.
    pub links: Vec<SearchLink>,
}

/// One work experience entry on a profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExperienceEntry {
    /// Job title.
    pub title: String,
    /// Employer name.
    pub company: String,
    /// Free-form duration string (e.g. "2019 - 2023"), if visible.
    pub duration: Option<String>,
}

/// One education entry on a profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EducationEntry {
    /// Institution name.
    pub school: String,
    /// Degree or program, if visible.
    pub degree: Option<String>,
    /// Free-form duration string, if visible.
    pub duration: Option<String>,
}

/// One recent activity post on a profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostSummary {
    /// Post text, truncated upstream.
    pub text: String,
    /// Relative or absolute date string, if visible.
    pub date: Option<String>,
}

/// How completely one profile was extracted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordStatus {
    /// All required fields present, no field-level failures.
    Ok,
    /// Identified, but one or more optional fields failed to extract.
    Partial,
    /// Could not be minimally identified (no name) or never reached.
    Failed,
}

impl fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ok => write!(f, "ok"),
            Self::Partial => write!(f, "partial"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Normalized extraction result for one profile URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileRecord {
    /// Profile URL this record was extracted from.
    pub url: String,
    /// Person's name. Empty iff `status == Failed`.
    pub name: String,
    /// Headline under the name.
    pub headline: String,
    /// Location string.
    pub location: String,
    /// About/summary section.
    pub summary: String,
    /// Work experience, page order.
    pub experience: Vec<ExperienceEntry>,
    /// Education entries, page order.
    pub education: Vec<EducationEntry>,
    /// Skills, keyword-extracted and deduplicated.
    pub skills: BTreeSet<String>,
    /// Recent activity posts, page order.
    pub posts: Vec<PostSummary>,
    /// Extraction outcome.
    pub status: RecordStatus,
    /// Accumulated failure notes, `None` when extraction was clean.
    pub error: Option<String>,
}

impl ProfileRecord {
    /// An empty record for `url`, status unresolved (`Failed` until
    /// [`resolve_status`](Self::resolve_status) upgrades it).
    #[must_use]
    pub fn empty(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            name: String::new(),
            headline: String::new(),
            location: String::new(),
            summary: String::new(),
            experience: Vec::new(),
            education: Vec::new(),
            skills: BTreeSet::new(),
            posts: Vec::new(),
            status: RecordStatus::Failed,
            error: None,
        }
    }

    /// A terminally failed record with an explanatory error.
    #[must_use]
    pub fn failed(url: impl Into<String>, error: impl Into<String>) -> Self {
        let mut record = Self::empty(url);
        record.error = Some(error.into());
        record
    }

    /// A record for an extraction that exceeded the run deadline.
    #[must_use]
    pub fn timed_out(url: impl Into<String>) -> Self {
        Self::failed(url, "timeout")
    }

    /// Append a failure note, joining multiple notes with `"; "`.
    pub fn push_note(&mut self, note: impl AsRef<str>) {
        match &mut self.error {
            Some(existing) => {
                existing.push_str("; ");
                existing.push_str(note.as_ref());
            }
            None => self.error = Some(note.as_ref().to_string()),
        }
    }

    /// Compute `status` from field presence and accumulated notes.
    ///
    /// `Failed` if the record could not be minimally identified (empty
    /// `name` or `url`), `Partial` if any note accumulated, `Ok` otherwise.
    pub fn resolve_status(&mut self) {
        self.status = if self.name.trim().is_empty() || self.url.trim().is_empty() {
            RecordStatus::Failed
        } else if self.error.is_some() {
            RecordStatus::Partial
        } else {
            RecordStatus::Ok
        };
    }
}

/// Sole artifact handed to the report renderer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineResult {
    /// Validated search outcome.
    pub search: SearchOutcome,
    /// Profile records in input URL order; empty for `WebOnly` runs.
    pub profiles: Vec<ProfileRecord>,
}

/// Shape of a profile URL on the target site.
///
/// Made explicit configuration rather than an inline regex: host must end
/// with `host_suffix` on a label boundary, path must start with
/// `path_prefix` and must not contain `excluded_path`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfilePattern {
    /// Required host suffix, e.g. `linkedin.com`.
    pub host_suffix: String,
    /// Required path prefix, e.g. `/in/`.
    pub path_prefix: String,
    /// Path fragment that disqualifies a match, e.g. `/company/`.
    pub excluded_path: String,
}

impl Default for ProfilePattern {
    fn default() -> Self {
        Self {
            host_suffix: "linkedin.com".to_string(),
            path_prefix: "/in/".to_string(),
            excluded_path: "/company/".to_string(),
        }
    }
}

impl ProfilePattern {
    /// Whether `candidate` is a profile URL under this pattern.
    ///
    /// Non-URLs and non-http(s) schemes never match.
    #[must_use]
    pub fn matches(&self, candidate: &str) -> bool {
        let Ok(parsed) = url::Url::parse(candidate) else {
            return false;
        };
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return false;
        }
        let Some(host) = parsed.host_str() else {
            return false;
        };
        let host_ok = host == self.host_suffix
            || host
                .strip_suffix(&self.host_suffix)
                .is_some_and(|rest| rest.ends_with('.'));
        let path = parsed.path();
        host_ok && path.starts_with(&self.path_prefix) && !path.contains(&self.excluded_path)
    }
}

/// Extract literal http(s) URLs from free text, in order of appearance.
///
/// Trailing punctuation that commonly clings to URLs in prose is stripped.
#[must_use]
pub fn extract_urls(text: &str) -> Vec<String> {
    static URL_REGEX: Lazy<Regex> =
        Lazy::new(|| Regex::new(r#"https?://[^\s)\]}>"']+"#).expect("valid regex"));

    URL_REGEX
        .find_iter(text)
        .map(|m| m.as_str().trim_end_matches(['.', ',', ';']).to_string())
        .collect()
}
