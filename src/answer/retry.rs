use crate::processing::types::AnswerError;
use crate::provider::ProviderError;
use std::future::Future;
use std::time::Duration;

/// Classifies errors that warrant a wait-and-retry.
pub trait RateLimited {
    /// Whether the error is a provider quota signal.
    fn is_rate_limited(&self) -> bool;
}

impl RateLimited for ProviderError {
    fn is_rate_limited(&self) -> bool {
        matches!(self, ProviderError::RateLimited(_))
    }
}

impl RateLimited for AnswerError {
    fn is_rate_limited(&self) -> bool {
        matches!(self, AnswerError::Provider(ProviderError::RateLimited(_)))
    }
}

/// Fixed-wait retry for rate-limited operations.
///
/// Only rate-limit failures are retried; any other error is returned on first occurrence. The
/// wait between attempts is constant.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    max_attempts: u32,
    wait: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            wait: Duration::from_secs(35),
        }
    }
}

impl RetryPolicy {
    /// Policy with `max_attempts` total tries (at least one) separated by `wait`.
    pub fn new(max_attempts: u32, wait: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            wait,
        }
    }

    /// Total number of attempts.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Wait applied between attempts.
    pub fn wait(&self) -> Duration {
        self.wait
    }

    /// Run `operation`, passing the 1-based attempt number.
    pub async fn run<T, E, F, Fut>(&self, mut operation: F) -> Result<T, E>
    where
        E: RateLimited + std::fmt::Display,
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let mut attempt = 1;
        loop {
            match operation(attempt).await {
                Err(error) if error.is_rate_limited() && attempt < self.max_attempts => {
                    tracing::warn!(
                        attempt,
                        max_attempts = self.max_attempts,
                        wait_secs = self.wait.as_secs(),
                        error = %error,
                        "Quota exceeded; waiting before retry"
                    );
                    tokio::time::sleep(self.wait).await;
                    attempt += 1;
                }
                result => return result,
            }
        }
    }
}
