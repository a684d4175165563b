//! Browsing session lifecycle and single-flight login.
//!
//! One session is shared by every extraction in a run. The first task that
//! needs it drives browser launch and login; concurrent tasks await that
//! same in-flight attempt instead of duplicating it. Login failure is a
//! capability downgrade (anonymous extraction), never a run failure.

use crate::engine::BrowserEngine;
use crate::error::{BrowserError, Result};
use crate::extractor::ProfileExtractor;
use crate::limiter::RateLimiter;
use crate::selectors::ProfileSelectors;
use async_trait::async_trait;
use dossier_core::{AppConfig, Credentials, ProfileRecord};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;

const LOGIN_URL: &str = "https://www.linkedin.com/login";

/// Pause after submitting the login form, giving the redirect time to land.
const POST_LOGIN_SETTLE: Duration = Duration::from_secs(3);

/// Authentication state of an open session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionMode {
    /// Logged in with site credentials.
    Authenticated,
    /// No login; `degraded` carries a note when credentials existed but
    /// login failed (copied into each affected record's error).
    Anonymous { degraded: Option<String> },
}

impl SessionMode {
    /// The degradation note, if authenticated login was attempted and lost.
    pub fn degradation(&self) -> Option<&str> {
        match self {
            Self::Anonymous { degraded } => degraded.as_deref(),
            Self::Authenticated => None,
        }
    }
}

/// A browsing session the orchestrator can drive profile extraction through.
///
/// `open` is idempotent and single-flight; `extract` never errors (failures
/// downgrade the record); `close` is safe to call repeatedly and must be
/// called exactly once per run by the orchestrator.
#[async_trait]
pub trait ProfileSession: Send + Sync {
    /// Ensure the session is open, returning its authentication mode.
    async fn open(&self) -> SessionMode;

    /// Extract one profile under this session.
    async fn extract(&self, url: &str) -> ProfileRecord;

    /// Release the underlying browser resources.
    async fn close(&self);
}

struct SessionState {
    engine: Option<Arc<BrowserEngine>>,
    mode: SessionMode,
}

/// Live chromium-backed session.
pub struct LiveSession {
    config: AppConfig,
    credentials: Credentials,
    limiter: RateLimiter,
    selectors: ProfileSelectors,
    state: OnceCell<SessionState>,
    closed: AtomicBool,
}

impl LiveSession {
    /// Create a session shell; the browser launches lazily on first use.
    pub fn new(config: AppConfig, credentials: Credentials) -> Self {
        let limiter = RateLimiter::new(&config.scraping);
        Self {
            config,
            credentials,
            limiter,
            selectors: ProfileSelectors::default(),
            state: OnceCell::new(),
            closed: AtomicBool::new(false),
        }
    }

    /// Override the default selector set.
    #[must_use]
    pub fn with_selectors(mut self, selectors: ProfileSelectors) -> Self {
        self.selectors = selectors;
        self
    }

    async fn init(&self) -> SessionState {
        tracing::debug!("launching browser for scraping session");
        let engine = match BrowserEngine::launch(self.config.browser.clone()).await {
            Ok(engine) => Arc::new(engine),
            Err(e) => {
                tracing::error!("browser launch failed: {}", e);
                return SessionState {
                    engine: None,
                    mode: SessionMode::Anonymous {
                        degraded: Some(format!("browser launch failed: {e}")),
                    },
                };
            }
        };

        let mode = if self.credentials.has_site_login() {
            match self.login(&engine).await {
                Ok(()) => {
                    tracing::info!("site login successful");
                    SessionMode::Authenticated
                }
                Err(e) => {
                    tracing::warn!("site login failed, continuing anonymously: {}", e);
                    SessionMode::Anonymous {
                        degraded: Some(format!("login degraded: {e}")),
                    }
                }
            }
        } else {
            tracing::debug!("no site credentials, anonymous session");
            SessionMode::Anonymous { degraded: None }
        };

        SessionState {
            engine: Some(engine),
            mode,
        }
    }

    async fn login(&self, engine: &BrowserEngine) -> Result<()> {
        let email = self
            .credentials
            .linkedin_email
            .as_deref()
            .ok_or_else(|| BrowserError::LoginFailed("missing email".to_string()))?;
        let password = self
            .credentials
            .linkedin_password
            .as_deref()
            .ok_or_else(|| BrowserError::LoginFailed("missing password".to_string()))?;

        self.limiter.acquire().await;
        let page = engine.open_page(LOGIN_URL).await?;
        let outcome = self.submit_login_form(engine, &page, email, password).await;
        let _ = page.close().await;
        outcome
    }

    async fn submit_login_form(
        &self,
        engine: &BrowserEngine,
        page: &chromiumoxide::Page,
        email: &str,
        password: &str,
    ) -> Result<()> {
        engine
            .wait_for_selector(page, "#username", engine.content_timeout())
            .await?;

        let field = |e: chromiumoxide::error::CdpError| BrowserError::LoginFailed(e.to_string());

        page.find_element("#username")
            .await
            .map_err(field)?
            .click()
            .await
            .map_err(field)?
            .type_str(email)
            .await
            .map_err(field)?;
        page.find_element("#password")
            .await
            .map_err(field)?
            .click()
            .await
            .map_err(field)?
            .type_str(password)
            .await
            .map_err(field)?;
        page.find_element(r#"button[type="submit"]"#)
            .await
            .map_err(field)?
            .click()
            .await
            .map_err(field)?;

        tokio::time::sleep(POST_LOGIN_SETTLE).await;
        let _ = page.wait_for_navigation().await;

        let current = page
            .url()
            .await
            .map_err(|e| BrowserError::LoginFailed(e.to_string()))?
            .unwrap_or_default();
        if current.contains("/feed") || current.contains("mynetwork") {
            Ok(())
        } else {
            Err(BrowserError::LoginFailed(format!(
                "unexpected post-login URL: {current}"
            )))
        }
    }
}

#[async_trait]
impl ProfileSession for LiveSession {
    async fn open(&self) -> SessionMode {
        self.state.get_or_init(|| self.init()).await.mode.clone()
    }

    async fn extract(&self, url: &str) -> ProfileRecord {
        let state = self.state.get_or_init(|| self.init()).await;
        let Some(engine) = &state.engine else {
            let reason = state
                .mode
                .degradation()
                .unwrap_or("browser unavailable")
                .to_string();
            return ProfileRecord::failed(url, reason);
        };

        let extractor = ProfileExtractor::new(
            engine.as_ref(),
            &self.limiter,
            &self.config.scraping,
            &self.selectors,
        );
        extractor.extract(url).await
    }

    async fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        if let Some(state) = self.state.get() {
            if let Some(engine) = &state.engine {
                tracing::debug!("closing scraping session");
                engine.close().await;
            }
        }
    }
}
