//! Groq chat-completions search backend.
//!
//! Uses the `compound-beta` web-search model: the model browses on the
//! server side and returns labeled prose plus a machine-readable block,
//! which [`crate::parse`] turns into a typed outcome.

use crate::client::SearchClient;
use crate::error::{Result, SearchError};
use crate::parse;
use async_trait::async_trait;
use dossier_core::{SearchConfig, SearchOutcome};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// System prompt for the web-search model. Asks for labeled sections the
/// parser understands, plus a trailing `RESULTS_JSON` block.
const SEARCH_SYSTEM_PROMPT: &str = "You are a comprehensive web search assistant.\n\n\
Perform a thorough web search to find the most relevant and up-to-date information.\n\
Include a \"Sources\" section with at least two reputable URLs.\n\
Look for LinkedIn profile URLs and include them in a separate \"LinkedIn Profiles\" section if found.\n\n\
Response Format:\n\
Answer: [Detailed answer based on reputable sources]\n\
Sources:\n\
- [Reputable URL 1]\n\
- [Optional additional reputable URL]\n\
LinkedIn Profiles (if found):\n\
- [LinkedIn profile URL 1]\n\n\
Additionally, at the end of your response, include a machine-readable JSON block labeled RESULTS_JSON\n\
that contains: {\"results\": [{\"title\": str, \"url\": str, \"snippet\": str}, ...]}.\n\
Ensure the JSON is valid and includes 2-5 high-quality results with meaningful snippets.";

/// Groq API search client.
pub struct GroqSearchClient {
    api_key: String,
    config: SearchConfig,
    client: Client,
}

impl GroqSearchClient {
    /// Create a new client with the given API key and settings.
    ///
    /// # Errors
    /// Returns [`SearchError::MissingApiKey`] for an empty key, or an
    /// internal error if the HTTP client cannot be created.
    pub fn new(api_key: impl Into<String>, config: SearchConfig) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(SearchError::MissingApiKey);
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| SearchError::Internal(format!("failed to create HTTP client: {e}")))?;
        Ok(Self {
            api_key,
            config,
            client,
        })
    }

    fn build_request(
        &self,
        system_prompt: Option<&str>,
        user: &str,
        max_tokens: u32,
        temperature: f32,
    ) -> ChatRequest {
        let mut messages = Vec::new();
        if let Some(system) = system_prompt {
            messages.push(ApiMessage {
                role: "system".to_string(),
                content: system.to_string(),
            });
        }
        messages.push(ApiMessage {
            role: "user".to_string(),
            content: user.to_string(),
        });

        ChatRequest {
            model: self.config.model.clone(),
            messages,
            max_tokens: Some(max_tokens),
            temperature: Some(temperature),
        }
    }

    async fn complete(
        &self,
        system_prompt: Option<&str>,
        user: &str,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<String> {
        let body = self.build_request(system_prompt, user, max_tokens, temperature);

        let response = self
            .client
            .post(format!(
                "{}/chat/completions",
                self.config.base_url.trim_end_matches('/')
            ))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(match status.as_u16() {
                429 => SearchError::RateLimited { message },
                401 | 403 => SearchError::AuthenticationFailed { message },
                status => SearchError::ApiError { status, message },
            });
        }

        let parsed: ChatResponse = response.json().await.map_err(|e| SearchError::ParseError {
            message: format!("failed to parse completion response: {e}"),
        })?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| SearchError::ParseError {
                message: "no choices in response".to_string(),
            })
    }

    /// Ask the model for refined query variants.
    ///
    /// Never errors: any failure (API or unparseable output) falls back to
    /// the deterministic queries from [`fallback_queries`].
    pub async fn generate_queries(&self, text: &str) -> Vec<String> {
        let prompt = format!(
            "Generate {} web search queries relevant to: {text}. \
             Keep them concise. Return a JSON array of strings.",
            self.config.query_variants
        );

        match self.complete(None, &prompt, 150, 0.1).await {
            Ok(content) => match serde_json::from_str::<Vec<String>>(content.trim()) {
                Ok(queries) if !queries.is_empty() => queries
                    .into_iter()
                    .take(self.config.query_variants.max(1))
                    .collect(),
                _ => {
                    tracing::warn!("query generation returned unparseable output, using fallback");
                    fallback_queries(text, self.config.query_variants)
                }
            },
            Err(e) => {
                tracing::warn!("query generation failed, using fallback: {}", e);
                fallback_queries(text, self.config.query_variants)
            }
        }
    }
}

/// Deterministic query variants used when generation is unavailable: the
/// request verbatim, then a site-scoped profile pass.
#[must_use]
pub fn fallback_queries(text: &str, variants: usize) -> Vec<String> {
    vec![text.to_string(), format!("site:linkedin.com/in {text}")]
        .into_iter()
        .take(variants.max(1))
        .collect()
}

#[async_trait]
impl SearchClient for GroqSearchClient {
    async fn search(&self, query: &str, max_results: usize) -> Result<SearchOutcome> {
        let queries = self.generate_queries(query).await;
        let mut outcome = SearchOutcome::default();
        let mut last_error = None;
        let mut any_succeeded = false;

        for (i, q) in queries.iter().enumerate() {
            tracing::debug!(query = q.as_str(), "web search {}/{}", i + 1, queries.len());
            match self
                .complete(
                    Some(SEARCH_SYSTEM_PROMPT),
                    q,
                    self.config.max_tokens,
                    self.config.temperature,
                )
                .await
            {
                Ok(content) => {
                    any_succeeded = true;
                    parse::merge_outcomes(&mut outcome, parse::parse_response(&content));
                }
                Err(e) => {
                    tracing::warn!(query = q.as_str(), "web search query failed: {}", e);
                    last_error = Some(e);
                }
            }
        }

        if !any_succeeded {
            return Err(last_error
                .unwrap_or_else(|| SearchError::Internal("no search queries to run".to_string())));
        }

        outcome.links = parse::sanitize_links(outcome.links);
        outcome.links.truncate(max_results);
        tracing::debug!(
            links = outcome.links.len(),
            "web search completed across {} queries",
            queries.len()
        );
        Ok(outcome)
    }
}

// Groq API types (OpenAI-compatible chat completions)

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ApiMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ApiMessage,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_rejects_empty_key() {
        let result = GroqSearchClient::new("", SearchConfig::default());
        assert!(matches!(result, Err(SearchError::MissingApiKey)));
    }

    #[test]
    fn test_build_request() {
        let client =
            GroqSearchClient::new("test-key", SearchConfig::default()).expect("create client");
        let request = client.build_request(Some("be helpful"), "find engineers", 900, 0.2);

        assert_eq!(request.model, "compound-beta");
        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.messages[0].role, "system");
        assert_eq!(request.messages[0].content, "be helpful");
        assert_eq!(request.messages[1].role, "user");
        assert_eq!(request.max_tokens, Some(900));
    }

    #[test]
    fn test_build_request_without_system() {
        let client =
            GroqSearchClient::new("test-key", SearchConfig::default()).expect("create client");
        let request = client.build_request(None, "hello", 150, 0.1);
        assert_eq!(request.messages.len(), 1);
        assert_eq!(request.messages[0].role, "user");
    }

    #[test]
    fn test_fallback_queries() {
        let queries = fallback_queries("rust engineers in Berlin", 2);
        assert_eq!(queries.len(), 2);
        assert_eq!(queries[0], "rust engineers in Berlin");
        assert!(queries[1].contains("site:linkedin.com/in"));
    }

    #[test]
    fn test_fallback_queries_at_least_one() {
        let queries = fallback_queries("anything", 0);
        assert_eq!(queries.len(), 1);
    }

    #[test]
    fn test_request_serialization_omits_empty_options() {
        let request = ChatRequest {
            model: "compound-beta".to_string(),
            messages: vec![],
            max_tokens: None,
            temperature: None,
        };
        let json = serde_json::to_string(&request).expect("serialize request");
        assert!(!json.contains("max_tokens"));
        assert!(!json.contains("temperature"));
    }
}
