//! Profile extraction: navigation with a bounded retry budget, throttle
//! detection feeding the rate limiter, and per-field fault-isolated
//! parsing. `extract` never errors; failures downgrade the record.

use crate::engine::BrowserEngine;
use crate::error::{BrowserError, Result};
use crate::limiter::{FailureKind, RateLimiter};
use crate::selectors::ProfileSelectors;
use dossier_core::{
    EducationEntry, ExperienceEntry, PostSummary, ProfileRecord, ScrapingConfig,
};
use scraper::{ElementRef, Html, Selector};
use std::collections::BTreeSet;

const MAX_EXPERIENCE_ENTRIES: usize = 5;
const MAX_EDUCATION_ENTRIES: usize = 3;
const MAX_ACTIVITY_POSTS: usize = 4;
const MAX_POST_CHARS: usize = 500;

/// Bodies shorter than this where content was expected count as a
/// throttle response (interstitial or stub page).
const MIN_CONTENT_BYTES: usize = 512;

/// Skill vocabulary matched against headline, summary, and job titles.
const SKILL_VOCABULARY: &[&str] = &[
    "python",
    "javascript",
    "typescript",
    "java",
    "rust",
    "go",
    "c++",
    "react",
    "angular",
    "vue",
    "node.js",
    "sql",
    "aws",
    "azure",
    "gcp",
    "docker",
    "kubernetes",
    "terraform",
    "machine learning",
    "deep learning",
    "data analysis",
    "data engineering",
    "ai",
    "nlp",
    "project management",
    "product management",
    "agile",
    "scrum",
    "marketing",
    "sales",
    "design",
    "ui/ux",
    "figma",
    "tableau",
    "power bi",
    "tensorflow",
    "pytorch",
    "pandas",
];

/// List-entry headings that are site chrome, not data.
const EXCLUDED_ENTRY_KEYWORDS: &[&str] = &[
    "show more",
    "see all",
    "view more",
    "skills",
    "endorsement",
    "followers",
    "connections",
    "activity",
];

/// Extracts one profile under an active browser session.
pub struct ProfileExtractor<'a> {
    engine: &'a BrowserEngine,
    limiter: &'a RateLimiter,
    scraping: &'a ScrapingConfig,
    selectors: &'a ProfileSelectors,
}

impl<'a> ProfileExtractor<'a> {
    pub fn new(
        engine: &'a BrowserEngine,
        limiter: &'a RateLimiter,
        scraping: &'a ScrapingConfig,
        selectors: &'a ProfileSelectors,
    ) -> Self {
        Self {
            engine,
            limiter,
            scraping,
            selectors,
        }
    }

    /// Extract a profile record for `url`.
    ///
    /// The main page failing terminally fails the record; detail pages
    /// (experience, education, activity) are best-effort and only add
    /// failure notes.
    pub async fn extract(&self, url: &str) -> ProfileRecord {
        let root = profile_root(url);
        let mut record = ProfileRecord::empty(url);

        tracing::debug!(url, "extracting profile");
        let html = match self.fetch_with_retry(&root).await {
            Ok(html) => html,
            Err(e) => {
                tracing::warn!(url, "profile fetch failed: {}", e);
                return ProfileRecord::failed(url, e.to_string());
            }
        };
        parse_main_page(self.selectors, &html, &mut record);

        match self.fetch_with_retry(&format!("{root}details/experience/")).await {
            Ok(html) => {
                record.experience = parse_entries(self.selectors, &html, MAX_EXPERIENCE_ENTRIES)
                    .into_iter()
                    .map(|entry| ExperienceEntry {
                        title: entry.heading,
                        company: entry.subheading.unwrap_or_default(),
                        duration: entry.caption,
                    })
                    .collect();
            }
            Err(e) => record.push_note(format!("experience unavailable: {e}")),
        }

        match self.fetch_with_retry(&format!("{root}details/education/")).await {
            Ok(html) => {
                record.education = parse_entries(self.selectors, &html, MAX_EDUCATION_ENTRIES)
                    .into_iter()
                    .map(|entry| EducationEntry {
                        school: entry.heading,
                        degree: entry.subheading,
                        duration: entry.caption,
                    })
                    .collect();
            }
            Err(e) => record.push_note(format!("education unavailable: {e}")),
        }

        match self
            .fetch_with_retry(&format!("{root}recent-activity/all/"))
            .await
        {
            Ok(html) => record.posts = parse_posts(self.selectors, &html, MAX_ACTIVITY_POSTS),
            Err(e) => record.push_note(format!("activity unavailable: {e}")),
        }

        record.skills = extract_skills(
            std::iter::once(record.headline.as_str())
                .chain(std::iter::once(record.summary.as_str()))
                .chain(record.experience.iter().map(|e| e.title.as_str())),
        );

        record.resolve_status();
        tracing::debug!(url, status = %record.status, "profile extraction finished");
        record
    }

    /// Fetch one page with the configured retry budget.
    ///
    /// Every attempt acquires a rate-limiter slot first; throttle responses
    /// report back to the limiter and consume an attempt.
    async fn fetch_with_retry(&self, url: &str) -> Result<String> {
        let attempts = self.scraping.retry_attempts.max(1);
        let mut last_error = None;

        for attempt in 1..=attempts {
            self.limiter.acquire().await;

            match self.fetch_page(url).await {
                Ok(html) => {
                    if let Some(kind) = throttle_kind(&html, &self.selectors.throttle_markers) {
                        self.limiter.report_failure(kind).await;
                        tracing::warn!(
                            url,
                            attempt,
                            attempts,
                            "throttle response ({:?}), backing off",
                            kind
                        );
                        last_error = Some(BrowserError::Throttled(format!("{kind:?}")));
                        continue;
                    }
                    self.limiter.report_success().await;
                    return Ok(html);
                }
                Err(e @ BrowserError::Closed) => return Err(e),
                Err(e) => {
                    tracing::warn!(url, attempt, attempts, "fetch failed: {}", e);
                    last_error = Some(e);
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| BrowserError::NavigationError("no fetch attempts made".to_string())))
    }

    async fn fetch_page(&self, url: &str) -> Result<String> {
        let page = self.engine.open_page(url).await?;

        if let Err(e) = self
            .engine
            .wait_for_selector(&page, &self.selectors.content_region, self.engine.content_timeout())
            .await
        {
            // Content region never appeared; grab what is there and let
            // throttle detection classify it.
            tracing::debug!(url, "content region wait failed: {}", e);
        }
        self.engine.progressive_scroll(&page, 4).await;

        let html = self.engine.page_content(&page).await;
        let _ = page.close().await;
        html
    }
}

/// Normalize a profile URL to its canonical root, `https://host/in/handle/`.
pub fn profile_root(url: &str) -> String {
    if let Ok(parsed) = url::Url::parse(url) {
        let segments: Vec<&str> = parsed
            .path()
            .split('/')
            .filter(|s| !s.is_empty())
            .collect();
        if let Some(idx) = segments.iter().position(|s| *s == "in") {
            if let Some(handle) = segments.get(idx + 1) {
                if let Some(host) = parsed.host_str() {
                    return format!("{}://{}/in/{}/", parsed.scheme(), host, handle);
                }
            }
        }
    }
    if url.ends_with('/') {
        url.to_string()
    } else {
        format!("{url}/")
    }
}

/// Classify a throttle response, if the body looks like one.
pub fn throttle_kind(html: &str, markers: &[String]) -> Option<FailureKind> {
    if html.trim().len() < MIN_CONTENT_BYTES {
        return Some(FailureKind::EmptyContent);
    }
    let lower = html.to_lowercase();
    for marker in markers {
        if lower.contains(marker.as_str()) {
            return if marker.contains("captcha") || marker.contains("verification") {
                Some(FailureKind::Captcha)
            } else {
                Some(FailureKind::Throttled)
            };
        }
    }
    None
}

/// Fill the identity fields from the main profile page.
///
/// Each field is independent: a missing optional field empties it and adds
/// a note; only the name decides pass/fail (via `resolve_status`).
pub fn parse_main_page(selectors: &ProfileSelectors, html: &str, record: &mut ProfileRecord) {
    let document = Html::parse_document(html);

    if let Some(name) = select_first_text(&document, &selectors.name, 2) {
        record.name = name;
    } else {
        record.push_note("name not found");
    }

    match select_first_text(&document, &selectors.headline, 5) {
        Some(headline) => record.headline = headline,
        None => record.push_note("headline not found"),
    }

    match select_first_text(&document, &selectors.location, 3) {
        Some(location) => record.location = location,
        None => record.push_note("location not found"),
    }

    match select_first_text(&document, &selectors.about, 20) {
        Some(summary) => record.summary = summary,
        None => record.push_note("about section not found"),
    }
}

/// Generic heading/subheading/caption entry in a detail list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailEntry {
    pub heading: String,
    pub subheading: Option<String>,
    pub caption: Option<String>,
}

/// Parse a detail page (experience or education) into entries.
pub fn parse_entries(selectors: &ProfileSelectors, html: &str, max: usize) -> Vec<DetailEntry> {
    let document = Html::parse_document(html);
    let mut entries = Vec::new();

    for item_selector in &selectors.detail_item {
        let Ok(item_sel) = Selector::parse(item_selector) else {
            continue;
        };
        for item in document.select(&item_sel) {
            if entries.len() >= max {
                break;
            }
            let heading = element_first_text(&item, &selectors.entry_heading, 2);
            let subheading = element_first_text(&item, &selectors.entry_subheading, 2);
            let caption = element_first_text(&item, &selectors.entry_caption, 2);

            let Some(heading) = heading else { continue };
            if is_excluded_entry(&heading) || heading.starts_with('•') {
                continue;
            }
            // A subheading identical to the heading is a collapsed layout
            // artifact, not a real pair.
            let subheading = subheading.filter(|s| s != &heading);

            entries.push(DetailEntry {
                heading,
                subheading,
                caption,
            });
        }
        if !entries.is_empty() {
            break;
        }
    }

    entries
}

/// Parse the activity feed into post summaries.
pub fn parse_posts(selectors: &ProfileSelectors, html: &str, max: usize) -> Vec<PostSummary> {
    let document = Html::parse_document(html);
    let mut posts = Vec::new();

    for item_selector in &selectors.post_item {
        let Ok(item_sel) = Selector::parse(item_selector) else {
            continue;
        };
        for item in document.select(&item_sel) {
            if posts.len() >= max {
                break;
            }
            let Some(text) = element_first_text(&item, &selectors.post_text, 10) else {
                continue;
            };
            let date = element_first_text(&item, &selectors.post_date, 2);
            posts.push(PostSummary {
                text: truncate_chars(&text, MAX_POST_CHARS),
                date,
            });
        }
        if !posts.is_empty() {
            break;
        }
    }

    posts
}

/// Keyword-match skills across the given text fragments.
///
/// Terms must sit on word boundaries, so "ai" does not fire inside
/// "maintained".
pub fn extract_skills<'a>(texts: impl Iterator<Item = &'a str>) -> BTreeSet<String> {
    let mut skills = BTreeSet::new();
    for text in texts {
        let lower = text.to_lowercase();
        for skill in SKILL_VOCABULARY {
            if contains_term(&lower, skill) {
                skills.insert((*skill).to_string());
            }
        }
    }
    skills
}

fn contains_term(haystack: &str, term: &str) -> bool {
    let mut start = 0;
    while let Some(pos) = haystack[start..].find(term) {
        let abs = start + pos;
        let before_ok = haystack[..abs]
            .chars()
            .next_back()
            .map_or(true, |c| !c.is_alphanumeric());
        let end = abs + term.len();
        let after_ok = haystack[end..]
            .chars()
            .next()
            .map_or(true, |c| !c.is_alphanumeric());
        if before_ok && after_ok {
            return true;
        }
        start = end;
    }
    false
}

fn is_excluded_entry(heading: &str) -> bool {
    let lower = heading.to_lowercase();
    EXCLUDED_ENTRY_KEYWORDS.iter().any(|k| lower.contains(k))
}

fn select_first_text(document: &Html, candidates: &[String], min_len: usize) -> Option<String> {
    for candidate in candidates {
        let Ok(selector) = Selector::parse(candidate) else {
            continue;
        };
        if let Some(element) = document.select(&selector).next() {
            let text = collect_text(&element);
            if text.len() >= min_len {
                return Some(text);
            }
        }
    }
    None
}

fn element_first_text(
    element: &ElementRef,
    candidates: &[String],
    min_len: usize,
) -> Option<String> {
    for candidate in candidates {
        let Ok(selector) = Selector::parse(candidate) else {
            continue;
        };
        if let Some(found) = element.select(&selector).next() {
            let text = collect_text(&found);
            if text.len() >= min_len {
                return Some(text);
            }
        }
    }
    None
}

fn collect_text(element: &ElementRef) -> String {
    element
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        text.chars().take(max_chars).collect()
    }
}
