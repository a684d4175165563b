//! Configuration management for Dossier.
//!
//! Provides TOML-based configuration with XDG-compliant paths and
//! environment variable overrides. Secrets never live in the TOML file;
//! they are collected once into [`Credentials`] at the process edge and
//! injected explicitly into the components that need them.

use crate::error::{ConfigError, ConfigResult};
use crate::types::ProfilePattern;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::PathBuf;

/// Main application configuration.
///
/// Loaded from `~/.config/dossier/config.toml` (or platform equivalent).
/// If the file doesn't exist, default values are used.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Search collaborator settings
    pub search: SearchConfig,
    /// Browser automation settings
    pub browser: BrowserConfig,
    /// Scraping behavior settings
    pub scraping: ScrapingConfig,
    /// Report rendering settings
    pub report: ReportConfig,
}

impl AppConfig {
    /// Load configuration from disk, falling back to defaults if not found.
    ///
    /// # Errors
    /// Returns error if the config directory cannot be determined, the file
    /// exists but cannot be read, or the contents are not valid TOML.
    pub fn load() -> ConfigResult<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            tracing::debug!("Loading config from {}", config_path.display());
            let contents = fs::read_to_string(&config_path)?;
            let config = toml::from_str(&contents)?;
            Ok(config)
        } else {
            tracing::debug!("Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Load configuration with environment variable overrides.
    ///
    /// Supports the following environment variables:
    /// - `DOSSIER_HEADLESS`: Override browser headless mode (true/false)
    /// - `DOSSIER_SEARCH_MODEL`: Override the search model name
    /// - `DOSSIER_CONCURRENCY`: Override extraction concurrency
    pub fn load_with_env() -> ConfigResult<Self> {
        let mut config = Self::load()?;

        if let Ok(val) = std::env::var("DOSSIER_HEADLESS") {
            if let Ok(headless) = val.parse() {
                config.browser.headless = headless;
                tracing::debug!("Override browser.headless from env: {}", headless);
            }
        }

        if let Ok(val) = std::env::var("DOSSIER_SEARCH_MODEL") {
            config.search.model = val.clone();
            tracing::debug!("Override search.model from env: {}", val);
        }

        if let Ok(val) = std::env::var("DOSSIER_CONCURRENCY") {
            if let Ok(concurrency) = val.parse() {
                config.scraping.concurrency = concurrency;
                tracing::debug!("Override scraping.concurrency from env: {}", concurrency);
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to disk, creating the config directory if needed.
    pub fn save(&self) -> ConfigResult<()> {
        let config_path = Self::config_path()?;
        let config_dir = config_path
            .parent()
            .ok_or_else(|| ConfigError::InvalidValue {
                field: "config_path".to_string(),
                reason: "no parent directory".to_string(),
            })?;

        fs::create_dir_all(config_dir)?;
        tracing::debug!("Saving config to {}", config_path.display());

        let contents = toml::to_string_pretty(self)?;
        fs::write(config_path, contents)?;
        Ok(())
    }

    /// Get the path to the configuration file.
    ///
    /// Uses XDG base directories: `~/.config/dossier/config.toml`
    pub fn config_path() -> ConfigResult<PathBuf> {
        let dirs = ProjectDirs::from("org", "dossier", "dossier").ok_or(ConfigError::NoConfigDir)?;
        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Get the data directory path (report and artifact output).
    pub fn data_dir() -> ConfigResult<PathBuf> {
        let dirs = ProjectDirs::from("org", "dossier", "dossier").ok_or(ConfigError::NoConfigDir)?;
        Ok(dirs.data_dir().to_path_buf())
    }

    /// Reject configurations that cannot drive a run.
    fn validate(&self) -> ConfigResult<()> {
        if self.scraping.concurrency == 0 {
            return Err(ConfigError::InvalidValue {
                field: "scraping.concurrency".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        if self.scraping.backoff_factor < 2 {
            return Err(ConfigError::InvalidValue {
                field: "scraping.backoff_factor".to_string(),
                reason: "must be at least 2".to_string(),
            });
        }
        Ok(())
    }
}

/// Search collaborator settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Chat-completions API base URL
    pub base_url: String,
    /// Web-search model name
    pub model: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Maximum completion tokens
    pub max_tokens: u32,
    /// Sampling temperature
    pub temperature: f32,
    /// Retries after the first failed attempt
    pub retry_attempts: u32,
    /// Number of refined queries generated per request
    pub query_variants: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.groq.com/openai/v1".to_string(),
            model: "compound-beta".to_string(),
            timeout_secs: 60,
            max_tokens: 900,
            temperature: 0.2,
            retry_attempts: 2,
            query_variants: 2,
        }
    }
}

/// Browser automation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// Run browser in headless mode
    pub headless: bool,
    /// Browser window width
    pub window_width: u32,
    /// Browser window height
    pub window_height: u32,
    /// Navigation timeout in seconds
    pub navigation_timeout_secs: u64,
    /// Timeout waiting for the primary content region, in seconds
    pub content_timeout_secs: u64,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            window_width: 1920,
            window_height: 1080,
            navigation_timeout_secs: 30,
            content_timeout_secs: 20,
        }
    }
}

/// Scraping behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrapingConfig {
    /// Concurrent page extractions per run
    pub concurrency: usize,
    /// Attempts per profile URL before marking it failed
    pub retry_attempts: u32,
    /// Minimum interval between outbound requests in milliseconds
    pub min_request_interval_ms: u64,
    /// Random jitter added on top of the interval, in milliseconds
    pub jitter_ms: u64,
    /// Interval multiplier applied after a throttle response
    pub backoff_factor: u32,
    /// Upper bound for the backed-off interval in milliseconds
    pub max_interval_ms: u64,
    /// Shape of a profile URL on the target site
    pub profile: ProfilePattern,
}

impl Default for ScrapingConfig {
    fn default() -> Self {
        Self {
            concurrency: 3,
            retry_attempts: 2,
            min_request_interval_ms: 3000,
            jitter_ms: 750,
            backoff_factor: 2,
            max_interval_ms: 60_000,
            profile: ProfilePattern::default(),
        }
    }
}

/// Report rendering settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Include the source link table
    pub include_sources: bool,
    /// Truncate snippets and summaries to this many characters
    pub max_snippet_chars: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            include_sources: true,
            max_snippet_chars: 300,
        }
    }
}

/// External secrets, collected once at the process edge.
///
/// Absence of the site credentials is a capability downgrade (anonymous
/// extraction), not an error. Absence of the search key only matters to
/// runs that need live search.
#[derive(Clone, Default)]
pub struct Credentials {
    /// Search API key
    pub groq_api_key: Option<String>,
    /// Site login email
    pub linkedin_email: Option<String>,
    /// Site login password
    pub linkedin_password: Option<String>,
}

impl Credentials {
    /// Read all secrets from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            groq_api_key: std::env::var("GROQ_API_KEY").ok().filter(|v| !v.is_empty()),
            linkedin_email: std::env::var("LINKEDIN_EMAIL")
                .ok()
                .filter(|v| !v.is_empty()),
            linkedin_password: std::env::var("LINKEDIN_PASSWORD")
                .ok()
                .filter(|v| !v.is_empty()),
        }
    }

    /// Whether a full site login can be attempted.
    #[must_use]
    pub fn has_site_login(&self) -> bool {
        self.linkedin_email.is_some() && self.linkedin_password.is_some()
    }
}

// Redacted by hand so secrets never reach a log line.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn mark(v: &Option<String>) -> &'static str {
            if v.is_some() {
                "set"
            } else {
                "unset"
            }
        }
        f.debug_struct("Credentials")
            .field("groq_api_key", &mark(&self.groq_api_key))
            .field("linkedin_email", &mark(&self.linkedin_email))
            .field("linkedin_password", &mark(&self.linkedin_password))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.search.model, "compound-beta");
        assert_eq!(config.scraping.concurrency, 3);
        assert_eq!(config.scraping.retry_attempts, 2);
        assert!(config.browser.headless);
        assert!(config.report.include_sources);
    }

    #[test]
    fn test_config_serialization() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("[search]"));
        assert!(toml_str.contains("[browser]"));
        assert!(toml_str.contains("[scraping]"));
        assert!(toml_str.contains("[scraping.profile]"));

        let parsed: AppConfig = toml::from_str(&toml_str).expect("parse serialized config");
        assert_eq!(parsed.search.model, config.search.model);
        assert_eq!(parsed.scraping.profile, config.scraping.profile);
    }

    #[test]
    fn test_partial_config() {
        let toml_str = r#"
[search]
model = "compound-beta-mini"

[scraping]
concurrency = 2
"#;

        let config: AppConfig = toml::from_str(toml_str).expect("parse partial config");
        assert_eq!(config.search.model, "compound-beta-mini");
        assert_eq!(config.scraping.concurrency, 2);
        // These should be defaults
        assert!(config.browser.headless);
        assert_eq!(config.scraping.min_request_interval_ms, 3000);
    }

    #[test]
    fn test_config_save_load_round_trip() {
        let tmp = tempfile::TempDir::new().expect("create temp dir");
        let config_path = tmp.path().join("config.toml");

        let mut config = AppConfig::default();
        config.browser.headless = false;
        config.scraping.concurrency = 4;

        let contents = toml::to_string_pretty(&config).expect("serialize config");
        fs::write(&config_path, contents).expect("write config file");

        let loaded_contents = fs::read_to_string(&config_path).expect("read config file");
        let loaded: AppConfig = toml::from_str(&loaded_contents).expect("parse loaded config");

        assert!(!loaded.browser.headless);
        assert_eq!(loaded.scraping.concurrency, 4);
    }

    #[test]
    fn test_validate_rejects_zero_concurrency() {
        let mut config = AppConfig::default();
        config.scraping.concurrency = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_credentials_debug_redacts() {
        let creds = Credentials {
            groq_api_key: Some("gsk-secret".to_string()),
            linkedin_email: Some("user@example.com".to_string()),
            linkedin_password: None,
        };
        let rendered = format!("{creds:?}");
        assert!(!rendered.contains("gsk-secret"));
        assert!(!rendered.contains("user@example.com"));
        assert!(rendered.contains("set"));
        assert!(rendered.contains("unset"));
    }

    #[test]
    fn test_credentials_site_login() {
        let mut creds = Credentials::default();
        assert!(!creds.has_site_login());
        creds.linkedin_email = Some("user@example.com".to_string());
        assert!(!creds.has_site_login());
        creds.linkedin_password = Some("hunter2".to_string());
        assert!(creds.has_site_login());
    }
}
