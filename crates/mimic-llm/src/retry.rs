use async_trait::async_trait;
use mimic_core::{ChatMessage, MimicError, Result};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::provider::{ModelSize, Reasoner};

/// Retry schedule for a capability call site.
///
/// `max_attempts` counts every call, the first included. The delay before
/// retry `n` (0-based) is `initial_delay * multiplier^n`, capped at `max_delay`.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    /// Ten attempts, starting at one second and doubling up to five seconds.
    fn default() -> Self {
        Self {
            max_attempts: 10,
            initial_delay: Duration::from_millis(1000),
            max_delay: Duration::from_millis(5000),
            multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, initial_delay: Duration, max_delay: Duration, multiplier: f64) -> Self {
        Self {
            max_attempts,
            initial_delay,
            max_delay,
            multiplier,
        }
    }

    /// Retry back-to-back with no delay.
    pub fn immediate(max_attempts: u32) -> Self {
        Self::new(max_attempts, Duration::ZERO, Duration::ZERO, 1.0)
    }

    /// A single attempt, never retried.
    pub fn once() -> Self {
        Self::immediate(1)
    }

    /// Delay to wait after failed attempt `attempt` (0-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = self.multiplier.max(1.0).powi(attempt.min(i32::MAX as u32) as i32);
        let millis = self.initial_delay.as_millis() as f64 * factor;
        let capped = millis.min(self.max_delay.as_millis() as f64);
        Duration::from_millis(capped.max(0.0) as u64)
    }

    fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    /// Run `op` until it succeeds, fails with a non-retryable error, or the
    /// attempt budget is spent. Returns the last error in the latter cases.
    pub async fn run<T, F, Fut>(&self, label: &str, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let attempts = self.attempts();
        let mut attempt = 0;
        loop {
            match op().await {
                Ok(value) => {
                    if attempt > 0 {
                        debug!(call = label, attempt = attempt + 1, "succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(e) if e.is_retryable() && attempt + 1 < attempts => {
                    let delay = e
                        .retry_after_secs()
                        .map(Duration::from_secs)
                        .unwrap_or_else(|| self.delay_for(attempt));
                    warn!(
                        call = label,
                        attempt = attempt + 1,
                        max = attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "retrying after failed call"
                    );
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Wraps any [`Reasoner`] so every chat and embed call follows a [`RetryPolicy`].
pub struct RetryingReasoner {
    inner: Arc<dyn Reasoner>,
    policy: RetryPolicy,
}

impl RetryingReasoner {
    pub fn new(inner: Arc<dyn Reasoner>, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }
}

#[async_trait]
impl Reasoner for RetryingReasoner {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn chat(&self, messages: &[ChatMessage], size: ModelSize, json_mode: bool) -> Result<String> {
        self.policy
            .run("chat", || self.inner.chat(messages, size, json_mode))
            .await
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }
        let vectors = self.policy.run("embed", || self.inner.embed(texts)).await?;
        if vectors.len() != texts.len() {
            return Err(MimicError::Reasoner(format!(
                "embedding count mismatch: sent {}, got {}",
                texts.len(),
                vectors.len()
            )));
        }
        Ok(vectors)
    }
}
