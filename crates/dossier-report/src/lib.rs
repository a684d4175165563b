//! Dossier Report - text report rendering.
//!
//! Sink for one [`PipelineResult`]: renders a plain-text/markdown report
//! with the narrative answer, per-profile sections annotated with their
//! extraction status, a source list, and summary statistics. Text-only by
//! design.

use chrono::Utc;
use dossier_core::{PipelineResult, ProfileRecord, RecordStatus, ReportConfig};
use std::fmt::Write as _;

/// Renders pipeline results into text reports.
pub struct ReportRenderer {
    config: ReportConfig,
}

impl ReportRenderer {
    pub fn new(config: ReportConfig) -> Self {
        Self { config }
    }

    /// Render one result. Never fails; absent data renders as annotations.
    pub fn render(&self, request_text: &str, result: &PipelineResult) -> String {
        let mut out = String::new();
        let generated_at = Utc::now().format("%Y-%m-%d %H:%M:%S UTC");

        let _ = writeln!(out, "# Research Report");
        let _ = writeln!(out);
        let _ = writeln!(out, "Generated on: {generated_at}");
        let _ = writeln!(out, "Request: {request_text}");
        let _ = writeln!(out);

        self.render_answer(&mut out, result);
        self.render_profiles(&mut out, &result.profiles);
        if self.config.include_sources {
            self.render_sources(&mut out, result);
        }
        self.render_statistics(&mut out, result);

        tracing::debug!(
            profiles = result.profiles.len(),
            chars = out.len(),
            "report rendered"
        );
        out
    }

    fn render_answer(&self, out: &mut String, result: &PipelineResult) {
        let _ = writeln!(out, "## Summary");
        let _ = writeln!(out);
        if result.search.answer.is_empty() {
            let _ = writeln!(out, "No narrative answer was produced for this request.");
        } else {
            let _ = writeln!(out, "{}", result.search.answer.trim());
        }
        let _ = writeln!(out);
    }

    fn render_profiles(&self, out: &mut String, profiles: &[ProfileRecord]) {
        if profiles.is_empty() {
            return;
        }
        let _ = writeln!(out, "## Profiles");
        let _ = writeln!(out);

        for record in profiles {
            let heading = if record.name.is_empty() {
                record.url.as_str()
            } else {
                record.name.as_str()
            };
            let _ = writeln!(out, "### {heading} [{}]", record.status);

            if record.status == RecordStatus::Failed {
                let reason = record.error.as_deref().unwrap_or("unknown failure");
                let _ = writeln!(out, "- Extraction failed: {reason}");
                let _ = writeln!(out, "- URL: {}", record.url);
                let _ = writeln!(out);
                continue;
            }

            if !record.headline.is_empty() {
                let _ = writeln!(out, "- Headline: {}", record.headline);
            }
            if !record.location.is_empty() {
                let _ = writeln!(out, "- Location: {}", record.location);
            }
            if !record.summary.is_empty() {
                let _ = writeln!(
                    out,
                    "- About: {}",
                    truncate(&record.summary, self.config.max_snippet_chars)
                );
            }
            for entry in &record.experience {
                let duration = entry
                    .duration
                    .as_deref()
                    .map(|d| format!(" ({d})"))
                    .unwrap_or_default();
                if entry.company.is_empty() {
                    let _ = writeln!(out, "- Experience: {}{duration}", entry.title);
                } else {
                    let _ = writeln!(
                        out,
                        "- Experience: {} at {}{duration}",
                        entry.title, entry.company
                    );
                }
            }
            for entry in &record.education {
                let degree = entry
                    .degree
                    .as_deref()
                    .map(|d| format!(", {d}"))
                    .unwrap_or_default();
                let _ = writeln!(out, "- Education: {}{degree}", entry.school);
            }
            if !record.skills.is_empty() {
                let skills: Vec<&str> = record.skills.iter().map(String::as_str).collect();
                let _ = writeln!(out, "- Skills: {}", skills.join(", "));
            }
            for post in &record.posts {
                let _ = writeln!(
                    out,
                    "- Recent post{}: {}",
                    post.date
                        .as_deref()
                        .map(|d| format!(" ({d})"))
                        .unwrap_or_default(),
                    truncate(&post.text, self.config.max_snippet_chars)
                );
            }
            if let Some(error) = &record.error {
                let _ = writeln!(out, "- Notes: {error}");
            }
            let _ = writeln!(out, "- URL: {}", record.url);
            let _ = writeln!(out);
        }
    }

    fn render_sources(&self, out: &mut String, result: &PipelineResult) {
        if result.search.links.is_empty() {
            return;
        }
        let _ = writeln!(out, "## Sources");
        let _ = writeln!(out);
        for link in &result.search.links {
            if link.snippet.is_empty() {
                let _ = writeln!(out, "- {} <{}>", link.title, link.url);
            } else {
                let _ = writeln!(
                    out,
                    "- {} <{}>: {}",
                    link.title,
                    link.url,
                    truncate(&link.snippet, self.config.max_snippet_chars)
                );
            }
        }
        let _ = writeln!(out);
    }

    fn render_statistics(&self, out: &mut String, result: &PipelineResult) {
        let counts = status_counts(&result.profiles);

        let _ = writeln!(out, "## Statistics");
        let _ = writeln!(out);
        let _ = writeln!(out, "- Search links: {}", result.search.links.len());
        let _ = writeln!(out, "- Profiles extracted: {}", result.profiles.len());
        if !result.profiles.is_empty() {
            let _ = writeln!(
                out,
                "- Profile status: {} ok, {} partial, {} failed",
                counts.ok, counts.partial, counts.failed
            );
        }
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
struct StatusCounts {
    ok: usize,
    partial: usize,
    failed: usize,
}

fn status_counts(profiles: &[ProfileRecord]) -> StatusCounts {
    let mut counts = StatusCounts::default();
    for record in profiles {
        match record.status {
            RecordStatus::Ok => counts.ok += 1,
            RecordStatus::Partial => counts.partial += 1,
            RecordStatus::Failed => counts.failed += 1,
        }
    }
    counts
}

fn truncate(text: &str, max_chars: usize) -> String {
    let text = text.trim();
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let truncated: String = text.chars().take(max_chars).collect();
        format!("{truncated}...")
    }
}
