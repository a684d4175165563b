use crate::error::{BrowserError, Result};
use crate::fingerprint::FingerprintConfig;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::Page;
use dossier_core::config::BrowserConfig as BrowserSettings;
use futures_util::stream::StreamExt;
use std::time::Duration;
use tokio::sync::Mutex;

/// How often `wait_for_selector` polls the DOM.
const SELECTOR_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Pause between progressive scroll steps, letting lazy content load.
const SCROLL_STEP_DELAY: Duration = Duration::from_millis(400);

/// Headless browser wrapper.
///
/// Owns the chromium process and its CDP event loop. Pages are opened one
/// at a time under an internal lock; `close` is safe to call repeatedly.
pub struct BrowserEngine {
    browser: Mutex<Option<Browser>>,
    settings: BrowserSettings,
}

impl BrowserEngine {
    /// Launch a browser with a randomized fingerprint.
    pub async fn launch(settings: BrowserSettings) -> Result<Self> {
        Self::with_fingerprint(settings, FingerprintConfig::randomized()).await
    }

    /// Launch a browser with a specific fingerprint.
    pub async fn with_fingerprint(
        settings: BrowserSettings,
        fingerprint: FingerprintConfig,
    ) -> Result<Self> {
        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .window_size(settings.window_width, settings.window_height);
        for arg in fingerprint.chrome_args() {
            builder = builder.arg(arg);
        }
        if !settings.headless {
            builder = builder.with_head();
        }
        let config = builder
            .build()
            .map_err(|e| BrowserError::ChromiumError(e.to_string()))?;

        tracing::debug!(
            user_agent = fingerprint.user_agent.as_str(),
            "launching browser"
        );
        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| BrowserError::ChromiumError(e.to_string()))?;

        // Drive CDP events until the browser goes away.
        tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                let _ = event;
            }
        });

        Ok(Self {
            browser: Mutex::new(Some(browser)),
            settings,
        })
    }

    /// Open a new page on `url` and wait for navigation to settle.
    ///
    /// Navigation errors after load has started are tolerated; the caller
    /// decides what to make of whatever content is present.
    pub async fn open_page(&self, url: &str) -> Result<Page> {
        let nav_timeout = self.navigation_timeout();

        let page = {
            let guard = self.browser.lock().await;
            let browser = guard.as_ref().ok_or(BrowserError::Closed)?;
            tokio::time::timeout(nav_timeout, browser.new_page(url))
                .await
                .map_err(|_| BrowserError::Timeout(format!("navigation to {url} timed out")))?
                .map_err(|e| BrowserError::NavigationError(e.to_string()))?
        };

        match tokio::time::timeout(nav_timeout, page.wait_for_navigation()).await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => tracing::debug!(url, "navigation settled with error: {}", e),
            Err(_) => tracing::debug!(url, "navigation wait timed out, continuing"),
        }

        Ok(page)
    }

    /// Poll until `selector` is present in the DOM, bounded by `timeout`.
    pub async fn wait_for_selector(
        &self,
        page: &Page,
        selector: &str,
        timeout: Duration,
    ) -> Result<()> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if page.find_element(selector).await.is_ok() {
                return Ok(());
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(BrowserError::Timeout(format!(
                    "selector {selector} not present after {timeout:?}"
                )));
            }
            tokio::time::sleep(SELECTOR_POLL_INTERVAL).await;
        }
    }

    /// Scroll down in steps to trigger lazy-loaded sections.
    pub async fn progressive_scroll(&self, page: &Page, steps: usize) {
        for _ in 0..steps {
            if page
                .evaluate("window.scrollBy(0, document.body.scrollHeight / 3)")
                .await
                .is_err()
            {
                break;
            }
            tokio::time::sleep(SCROLL_STEP_DELAY).await;
        }
    }

    /// Current serialized HTML of the page.
    pub async fn page_content(&self, page: &Page) -> Result<String> {
        page.content()
            .await
            .map_err(|e| BrowserError::ChromiumError(e.to_string()))
    }

    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_secs(self.settings.navigation_timeout_secs)
    }

    pub fn content_timeout(&self) -> Duration {
        Duration::from_secs(self.settings.content_timeout_secs)
    }

    /// Shut the browser down. Safe to call more than once.
    pub async fn close(&self) {
        let mut guard = self.browser.lock().await;
        if let Some(mut browser) = guard.take() {
            if let Err(e) = browser.close().await {
                tracing::warn!("browser close failed: {}", e);
            }
        }
    }
}
