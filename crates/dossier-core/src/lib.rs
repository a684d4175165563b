//! Dossier Core - Foundation crate for the Dossier research pipeline.
//!
//! This crate provides the shared types, error handling, and configuration
//! management that all other Dossier crates depend on.
//!
//! # Modules
//!
//! - [`error`] - Configuration error types using thiserror
//! - [`config`] - TOML-based configuration with XDG paths and env overrides
//! - [`types`] - Pipeline data shapes (`ResearchRequest`, `SearchOutcome`,
//!   `ProfileRecord`, `PipelineResult`) and the profile URL pattern
//!
//! # Example
//!
//! ```rust
//! use dossier_core::{ProfilePattern, ResearchRequest};
//!
//! let request = ResearchRequest::new("software engineers in San Francisco")
//!     .with_max_results(5);
//!
//! let pattern = ProfilePattern::default();
//! assert!(pattern.matches("https://www.linkedin.com/in/jdoe"));
//! assert_eq!(request.max_results, 5);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod config;
pub mod error;
pub mod types;

// Re-export commonly used types
pub use config::{
    AppConfig, BrowserConfig, Credentials, ReportConfig, ScrapingConfig, SearchConfig,
};
pub use error::{ConfigError, ConfigResult};
pub use types::{
    extract_urls, EducationEntry, ExperienceEntry, PipelineResult, PostSummary, ProfilePattern,
    ProfileRecord, QueryMode, RecordStatus, ResearchRequest, SearchLink, SearchOutcome,
};
