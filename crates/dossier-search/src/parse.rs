//! Validation boundary for loose search responses.
//!
//! The web-search model returns prose with labeled sections and, when it
//! cooperates, a trailing machine-readable `RESULTS_JSON` block. Nothing
//! past this module ever sees the raw text: parsing prefers the JSON block,
//! falls back to section bullets, then to bare URL extraction, and always
//! produces a typed, deduplicated [`SearchOutcome`].

use dossier_core::{extract_urls, SearchLink, SearchOutcome};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::collections::HashSet;

/// Loosely-shaped link entry inside a `RESULTS_JSON` block.
#[derive(Debug, Deserialize)]
#[serde(default)]
struct RawLink {
    title: String,
    url: String,
    snippet: String,
}

impl Default for RawLink {
    fn default() -> Self {
        Self {
            title: String::new(),
            url: String::new(),
            snippet: String::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ResultsBlock {
    results: Vec<RawLink>,
}

/// Parse one raw completion into a validated outcome.
#[must_use]
pub fn parse_response(content: &str) -> SearchOutcome {
    let sections = parse_sections(content);

    let mut links = extract_results_json(content)
        .map(|raw| {
            raw.into_iter()
                .map(|item| SearchLink {
                    title: if item.title.is_empty() {
                        item.url.clone()
                    } else {
                        item.title
                    },
                    url: item.url,
                    snippet: item.snippet,
                })
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();

    if links.is_empty() {
        for url in &sections.sources {
            links.push(SearchLink {
                title: url.clone(),
                url: url.clone(),
                snippet: truncate(&sections.answer, 160),
            });
        }
        for url in &sections.profiles {
            links.push(SearchLink {
                title: url.clone(),
                url: url.clone(),
                snippet: "LinkedIn profile".to_string(),
            });
        }
    }

    // Last resort: any URL in the raw text.
    if links.is_empty() {
        for url in extract_urls(content) {
            links.push(SearchLink {
                title: url.clone(),
                url,
                snippet: String::new(),
            });
        }
    }

    SearchOutcome {
        answer: sections.answer,
        links: sanitize_links(links),
    }
}

/// Drop malformed links and deduplicate by URL, preserving order.
#[must_use]
pub fn sanitize_links(links: Vec<SearchLink>) -> Vec<SearchLink> {
    let mut seen = HashSet::new();
    links
        .into_iter()
        .filter(|link| link.url.starts_with("http://") || link.url.starts_with("https://"))
        .filter(|link| seen.insert(link.url.clone()))
        .collect()
}

/// Merge a later outcome into an accumulated one.
///
/// The first non-empty answer wins; links append in arrival order and are
/// deduplicated by the caller via [`sanitize_links`].
pub fn merge_outcomes(accumulated: &mut SearchOutcome, next: SearchOutcome) {
    if accumulated.answer.is_empty() {
        accumulated.answer = next.answer;
    }
    accumulated.links.extend(next.links);
}

#[derive(Debug, Default)]
struct Sections {
    answer: String,
    sources: Vec<String>,
    profiles: Vec<String>,
}

/// Parse `Answer:`, `Sources:`, and `LinkedIn Profiles:` sections from
/// labeled prose. Text with no labels at all becomes the answer wholesale.
fn parse_sections(content: &str) -> Sections {
    let mut sections = Sections::default();
    let mut current = None;
    let mut answer_lines: Vec<String> = Vec::new();
    let mut saw_label = false;

    for line in content.lines() {
        let trimmed = line.trim();

        if let Some(rest) = strip_label(trimmed, "answer:") {
            saw_label = true;
            current = Some("answer");
            let first = rest.trim();
            if !first.is_empty() {
                answer_lines.push(first.to_string());
            }
        } else if strip_label(trimmed, "sources:").is_some() {
            saw_label = true;
            current = Some("sources");
        } else if strip_label(trimmed, "linkedin profiles").is_some() {
            saw_label = true;
            current = Some("profiles");
        } else if strip_label(trimmed, "results_json").is_some() {
            current = None;
        } else {
            match current {
                Some("answer") => answer_lines.push(trimmed.to_string()),
                Some("sources") | Some("profiles") if is_bullet(trimmed) => {
                    let url = clean_bullet(trimmed);
                    if url.starts_with("http") {
                        if current == Some("sources") {
                            sections.sources.push(url);
                        } else {
                            sections.profiles.push(url);
                        }
                    }
                }
                _ => {}
            }
        }
    }

    sections.answer = answer_lines.join("\n").trim().to_string();
    if !saw_label {
        // Unlabeled prose: treat everything before any JSON as the answer.
        sections.answer = content
            .split("RESULTS_JSON")
            .next()
            .unwrap_or(content)
            .trim()
            .to_string();
    }
    sections
}

/// Case-insensitive ASCII label match; returns the remainder after the label.
fn strip_label<'a>(line: &'a str, label: &str) -> Option<&'a str> {
    let prefix = line.as_bytes().get(..label.len())?;
    if prefix.eq_ignore_ascii_case(label.as_bytes()) {
        Some(&line[label.len()..])
    } else {
        None
    }
}

fn is_bullet(line: &str) -> bool {
    line.starts_with('-') || line.starts_with('•') || line.starts_with('*')
}

fn clean_bullet(line: &str) -> String {
    line.trim_start_matches(['-', '•', '*', ' '])
        .split_whitespace()
        .next()
        .unwrap_or("")
        .to_string()
}

/// Extract and parse the `RESULTS_JSON` block, if any.
fn extract_results_json(content: &str) -> Option<Vec<RawLink>> {
    static BLOCK_REGEX: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r#"(?s)\{\s*"results"\s*:\s*\[.*?\]\s*\}"#).expect("valid regex")
    });

    let m = BLOCK_REGEX.find(content)?;
    match serde_json::from_str::<ResultsBlock>(m.as_str()) {
        Ok(block) if !block.results.is_empty() => Some(block.results),
        Ok(_) => None,
        Err(e) => {
            tracing::debug!("RESULTS_JSON block present but unparseable: {}", e);
            None
        }
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        text.chars().take(max_chars).collect()
    }
}
