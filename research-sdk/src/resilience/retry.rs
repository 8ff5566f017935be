//! Retry with a constant backoff for capacity errors
//!
//! A call runs at most `max_retries + 1` times. Between attempts the
//! executor sleeps exactly the configured backoff.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use backoff::backoff::{Backoff, Constant};

use crate::config::ProviderConfig;
use crate::error::Result;

/// Retry policy configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryConfig {
    /// Maximum number of retry attempts (0 means a single call)
    pub max_retries: u32,

    /// Delay between attempts
    pub backoff: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 1,
            backoff: Duration::from_millis(500),
        }
    }
}

impl RetryConfig {
    pub fn new(max_retries: u32, backoff: Duration) -> Self {
        Self { max_retries, backoff }
    }

    /// Retry settings of a provider block
    pub fn from_provider(config: &ProviderConfig) -> Self {
        Self::new(config.retries, config.backoff)
    }

    /// Upper bound on calls per execution
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// No retries at all
    pub fn single_attempt() -> Self {
        Self::new(0, Duration::ZERO)
    }
}

impl fmt::Display for RetryConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "RetryConfig {{ max_retries: {}, backoff: {:?} }}",
            self.max_retries, self.backoff
        )
    }
}

/// Final result of a retried call and how many calls it took
#[derive(Debug)]
pub struct AttemptOutcome<T> {
    pub result: Result<T>,
    pub attempts: u32,
}

impl<T> AttemptOutcome<T> {
    /// Calls beyond the first
    pub fn retries_used(&self) -> u32 {
        self.attempts.saturating_sub(1)
    }

    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Executor for retry operations with a constant backoff
#[derive(Debug, Clone)]
pub struct RetryExecutor {
    config: RetryConfig,
}

impl RetryExecutor {
    /// Create a new retry executor with the specified configuration
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    /// Execute a fallible operation, retrying retryable errors only
    pub async fn execute<F, Fut, T>(&self, mut operation: F) -> AttemptOutcome<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut backoff = Constant::new(self.config.backoff);
        let mut attempts: u32 = 0;

        loop {
            attempts += 1;

            match operation().await {
                Ok(value) => {
                    return AttemptOutcome {
                        result: Ok(value),
                        attempts,
                    }
                }
                Err(err) if err.is_retryable() && attempts <= self.config.max_retries => {
                    let delay = backoff.next_backoff().unwrap_or(self.config.backoff);
                    log::warn!(
                        "Attempt {}/{} failed with retryable {} error, retrying in {:?}: {}",
                        attempts,
                        self.config.max_attempts(),
                        err.kind(),
                        delay,
                        err
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(err) => {
                    if err.is_retryable() {
                        log::warn!("Giving up after {} attempts: {}", attempts, err);
                    } else {
                        log::debug!("Terminal {} error on attempt {}: {}", err.kind(), attempts, err);
                    }
                    let err = if attempts > 1 {
                        err.with_context_value("attempts", attempts)
                    } else {
                        err
                    };
                    return AttemptOutcome {
                        result: Err(err),
                        attempts,
                    };
                }
            }
        }
    }

    /// Get the current retry configuration
    pub fn config(&self) -> &RetryConfig {
        &self.config
    }
}
