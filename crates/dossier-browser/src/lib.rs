//! Browser automation for profile scraping.
//!
//! Provides headless browser control with fingerprint rotation, a
//! cooperative rate limiter with multiplicative backoff, a single-flight
//! login session shared across extractions, and fault-isolated profile
//! field extraction.

pub mod engine;
pub mod error;
pub mod extractor;
pub mod fingerprint;
pub mod limiter;
pub mod selectors;
pub mod session;

pub use engine::BrowserEngine;
pub use error::{BrowserError, Result};
pub use extractor::ProfileExtractor;
pub use fingerprint::FingerprintConfig;
pub use limiter::{FailureKind, RateLimiter};
pub use selectors::ProfileSelectors;
pub use session::{LiveSession, ProfileSession, SessionMode};
