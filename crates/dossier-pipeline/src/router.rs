//! Query routing: web-only vs profile-augmented.
//!
//! Classification is deterministic and requires no extra LLM round trip: a
//! literal profile URL in the request text decides immediately; otherwise
//! the search outcome's links are inspected against the configured profile
//! pattern.

use dossier_core::{extract_urls, ProfilePattern, QueryMode, ResearchRequest, SearchOutcome};
use std::collections::HashSet;

/// Classify one request given its search outcome.
#[must_use]
pub fn classify(
    request: &ResearchRequest,
    search: &SearchOutcome,
    pattern: &ProfilePattern,
) -> QueryMode {
    if !literal_profile_urls(&request.text, pattern).is_empty() {
        return QueryMode::Profile;
    }
    if search.links.iter().any(|link| pattern.matches(&link.url)) {
        QueryMode::Profile
    } else {
        QueryMode::WebOnly
    }
}

/// Profile URLs typed literally into the request text.
#[must_use]
pub fn literal_profile_urls(text: &str, pattern: &ProfilePattern) -> Vec<String> {
    extract_urls(text)
        .into_iter()
        .filter(|url| pattern.matches(url))
        .collect()
}

/// Candidate URLs for extraction, capped at the request's bound.
///
/// Literal URLs come first (the user asked for them explicitly), then
/// profile-shaped search links in search order, deduplicated.
#[must_use]
pub fn candidate_profile_urls(
    request: &ResearchRequest,
    search: &SearchOutcome,
    pattern: &ProfilePattern,
) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut urls = Vec::new();

    for url in literal_profile_urls(&request.text, pattern) {
        if seen.insert(url.clone()) {
            urls.push(url);
        }
    }
    for link in &search.links {
        if pattern.matches(&link.url) && seen.insert(link.url.clone()) {
            urls.push(link.url.clone());
        }
    }

    urls.truncate(request.max_results);
    urls
}

#[cfg(test)]
mod tests {
    use super::*;
    use dossier_core::SearchLink;

    fn link(url: &str) -> SearchLink {
        SearchLink {
            title: url.to_string(),
            url: url.to_string(),
            snippet: String::new(),
        }
    }

    fn outcome(urls: &[&str]) -> SearchOutcome {
        SearchOutcome {
            answer: String::new(),
            links: urls.iter().map(|u| link(u)).collect(),
        }
    }

    #[test]
    fn test_no_profile_links_is_web_only() {
        let request = ResearchRequest::new("average rust salary");
        let search = outcome(&["https://example.com/salaries", "https://example.org/survey"]);
        assert_eq!(
            classify(&request, &search, &ProfilePattern::default()),
            QueryMode::WebOnly
        );
    }

    #[test]
    fn test_profile_shaped_link_classifies_profile() {
        let request = ResearchRequest::new("find software engineers in San Francisco");
        let search = outcome(&[
            "https://www.linkedin.com/in/jdoe",
            "https://example.com/engineers",
        ]);
        assert_eq!(
            classify(&request, &search, &ProfilePattern::default()),
            QueryMode::Profile
        );
    }

    #[test]
    fn test_literal_url_wins_without_search_links() {
        let request = ResearchRequest::new("look at https://www.linkedin.com/in/jdoe please");
        let search = SearchOutcome::default();
        assert_eq!(
            classify(&request, &search, &ProfilePattern::default()),
            QueryMode::Profile
        );
    }

    #[test]
    fn test_literal_non_profile_url_does_not_classify_profile() {
        let request = ResearchRequest::new("summarize https://example.com/article");
        let search = SearchOutcome::default();
        assert_eq!(
            classify(&request, &search, &ProfilePattern::default()),
            QueryMode::WebOnly
        );
    }

    #[test]
    fn test_candidates_literal_first_then_search_order() {
        let request = ResearchRequest::new("check https://www.linkedin.com/in/alpha");
        let search = outcome(&[
            "https://example.com/not-a-profile",
            "https://www.linkedin.com/in/beta",
            "https://www.linkedin.com/in/gamma",
        ]);
        let urls = candidate_profile_urls(&request, &search, &ProfilePattern::default());
        assert_eq!(
            urls,
            vec![
                "https://www.linkedin.com/in/alpha".to_string(),
                "https://www.linkedin.com/in/beta".to_string(),
                "https://www.linkedin.com/in/gamma".to_string(),
            ]
        );
    }

    #[test]
    fn test_candidates_deduplicate() {
        let request = ResearchRequest::new("check https://www.linkedin.com/in/alpha");
        let search = outcome(&["https://www.linkedin.com/in/alpha"]);
        let urls = candidate_profile_urls(&request, &search, &ProfilePattern::default());
        assert_eq!(urls.len(), 1);
    }

    #[test]
    fn test_candidates_capped_at_max_results() {
        let request = ResearchRequest::new("engineers").with_max_results(2);
        let search = outcome(&[
            "https://www.linkedin.com/in/a",
            "https://www.linkedin.com/in/b",
            "https://www.linkedin.com/in/c",
        ]);
        let urls = candidate_profile_urls(&request, &search, &ProfilePattern::default());
        assert_eq!(urls.len(), 2);
    }
}
