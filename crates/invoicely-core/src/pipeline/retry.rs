//! Exponential backoff for rate-limited oracle calls.

use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use super::progress::CancellationFlag;
use crate::error::ExtractionError;
use crate::models::config::RetryConfig;

/// Suspends the current task without burning CPU.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Real waits on the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Returns immediately and remembers every requested wait.
#[derive(Debug, Clone, Default)]
pub struct RecordingSleeper {
    waits: Arc<Mutex<Vec<Duration>>>,
}

impl RecordingSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requested waits, in order.
    pub fn waits(&self) -> Vec<Duration> {
        self.waits.lock().map(|w| w.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        if let Ok(mut waits) = self.waits.lock() {
            waits.push(duration);
        }
    }
}

/// Retry bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(5000),
        }
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            base_delay: Duration::from_millis(config.base_delay_ms),
        }
    }
}

impl RetryPolicy {
    /// Wait before retrying after failed attempt `attempt` (0-based): base * 2^attempt.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        2u32.checked_pow(attempt)
            .and_then(|factor| self.base_delay.checked_mul(factor))
            .unwrap_or(Duration::MAX)
    }
}

/// Emitted before each backoff wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryNotice {
    /// 0-based index of the attempt that was throttled.
    pub attempt: u32,
    pub max_retries: u32,
    pub wait: Duration,
}

/// Runs an extraction attempt, backing off on rate limits only.
#[derive(Clone)]
pub struct RetryScheduler {
    policy: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
    cancel: Option<CancellationFlag>,
}

impl RetryScheduler {
    pub fn new(policy: RetryPolicy, sleeper: Arc<dyn Sleeper>) -> Self {
        Self {
            policy,
            sleeper,
            cancel: None,
        }
    }

    /// Stop retrying once `cancel` is set; checked after every backoff wait.
    pub fn with_cancellation(mut self, cancel: CancellationFlag) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancellationFlag::is_cancelled)
    }

    /// Call `attempt_fn` until it succeeds, fails with something other than a
    /// rate limit, or has been rate limited `max_retries + 1` times.
    ///
    /// `notify` hears about every wait before it starts. A cancellation seen
    /// after a wait ends the loop with [`ExtractionError::Cancelled`].
    pub async fn run<T, F, Fut, N>(&self, mut attempt_fn: F, mut notify: N) -> Result<T, ExtractionError>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, ExtractionError>>,
        N: FnMut(RetryNotice),
    {
        let mut attempt = 0;
        loop {
            match attempt_fn(attempt).await {
                Ok(value) => {
                    debug!(attempt, "Extraction attempt succeeded");
                    return Ok(value);
                }
                Err(err) if err.is_rate_limited() && attempt < self.policy.max_retries => {
                    let wait = self.policy.delay_for(attempt);
                    warn!(
                        attempt = attempt + 1,
                        max_retries = self.policy.max_retries,
                        wait_ms = wait.as_millis() as u64,
                        error = %err,
                        "Rate limited, backing off"
                    );
                    notify(RetryNotice {
                        attempt,
                        max_retries: self.policy.max_retries,
                        wait,
                    });
                    self.sleeper.sleep(wait).await;
                    if self.is_cancelled() {
                        debug!(attempt, "Cancelled during backoff");
                        return Err(ExtractionError::Cancelled);
                    }
                    attempt += 1;
                }
                Err(err) => {
                    if err.is_rate_limited() {
                        warn!(attempts = attempt + 1, "Rate limit persisted, giving up");
                    }
                    return Err(err);
                }
            }
        }
    }
}
