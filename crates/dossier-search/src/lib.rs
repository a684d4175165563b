//! Dossier Search - LLM-backed web search collaborator client.
//!
//! This crate wraps the Groq `compound-beta` web-search model behind the
//! [`SearchClient`] trait and a strict validation boundary: loosely-shaped
//! model output is parsed into typed [`dossier_core::SearchOutcome`] values
//! at the edge, so the pipeline never handles raw text.
//!
//! # Example
//!
//! ```rust,no_run
//! use dossier_search::{GroqSearchClient, SearchClient};
//! use dossier_core::SearchConfig;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = GroqSearchClient::new("gsk-...", SearchConfig::default())?;
//! let outcome = client.search("software engineers in San Francisco", 10).await?;
//!
//! println!("{} links", outcome.links.len());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod client;
pub mod error;
pub mod groq;
pub mod parse;

// Re-export commonly used types
pub use client::SearchClient;
pub use error::{Result, SearchError};
pub use groq::{fallback_queries, GroqSearchClient};
pub use parse::{merge_outcomes, parse_response, sanitize_links};
