use dossier_core::ScrapingConfig;
use rand::Rng;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// What the target site did to earn a backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// HTTP 429-equivalent throttle response
    Throttled,
    /// CAPTCHA or verification challenge served instead of content
    Captcha,
    /// Empty or stub body where content was expected
    EmptyContent,
}

#[derive(Debug)]
struct LimiterState {
    /// Current inter-request interval (widens under backoff).
    interval: Duration,
    /// Earliest instant the next acquisition may be granted.
    next_ready: Instant,
}

/// Pacing policy for outbound requests to the target site.
///
/// `acquire` suspends the calling task until the minimum interval (plus a
/// random jitter) has elapsed since the previously granted acquisition.
/// Concurrent callers reserve consecutive slots, so bursts are spread out
/// rather than released together. Throttle reports widen the interval
/// multiplicatively up to a cap; a success resets it to baseline.
///
/// Pure timer state: no I/O, never errors.
#[derive(Debug)]
pub struct RateLimiter {
    base_interval: Duration,
    max_interval: Duration,
    jitter_ms: u64,
    backoff_factor: u32,
    state: Mutex<LimiterState>,
}

impl RateLimiter {
    pub fn new(config: &ScrapingConfig) -> Self {
        let base_interval = Duration::from_millis(config.min_request_interval_ms);
        Self {
            base_interval,
            max_interval: Duration::from_millis(config.max_interval_ms),
            jitter_ms: config.jitter_ms,
            backoff_factor: config.backoff_factor.max(2),
            state: Mutex::new(LimiterState {
                interval: base_interval,
                next_ready: Instant::now(),
            }),
        }
    }

    /// Wait for the next request slot.
    pub async fn acquire(&self) {
        let wait = {
            let mut state = self.state.lock().await;
            let now = Instant::now();
            let jitter = if self.jitter_ms == 0 {
                Duration::ZERO
            } else {
                Duration::from_millis(rand::thread_rng().gen_range(0..=self.jitter_ms))
            };
            let granted_at = state.next_ready.max(now);
            state.next_ready = granted_at + state.interval + jitter;
            granted_at.saturating_duration_since(now)
        };

        if !wait.is_zero() {
            tracing::debug!("rate limiter waiting {:?} before next request", wait);
            tokio::time::sleep(wait).await;
        }
    }

    /// Record a throttle response; widens the interval and pushes the next
    /// grant out so the new pace takes effect immediately.
    pub async fn report_failure(&self, kind: FailureKind) {
        let mut state = self.state.lock().await;
        let widened = state
            .interval
            .saturating_mul(self.backoff_factor)
            .min(self.max_interval);
        tracing::warn!(
            ?kind,
            from_ms = state.interval.as_millis() as u64,
            to_ms = widened.as_millis() as u64,
            "backing off after throttle response"
        );
        state.interval = widened;
        state.next_ready = state.next_ready.max(Instant::now() + widened);
    }

    /// Record a successful response; restores the baseline interval.
    pub async fn report_success(&self) {
        let mut state = self.state.lock().await;
        if state.interval > self.base_interval {
            tracing::debug!("throttle cleared, resetting request interval");
        }
        state.interval = self.base_interval;
    }

    #[cfg(test)]
    async fn current_interval(&self) -> Duration {
        self.state.lock().await.interval
    }
}
