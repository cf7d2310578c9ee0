//! Retry with exponential backoff for transient provider failures
//!
//! Each attempt that fails with a transient error (rate limited, overloaded)
//! waits `base_delay * 2^attempt` before the next one, capped at `max_delay`
//! (60 s by default). The cap only shows once `max_attempts` is raised well past
//! the default of 3. There is no jitter and no state is shared between calls.
//! Both the attempt and the wait race the caller's cancellation token.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use backoff::{backoff::Backoff, ExponentialBackoff};
use tokio_util::sync::CancellationToken;

use crate::error::{Result, ServiceError};

/// Retry policy configuration
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Total attempts including the first one
    pub max_attempts: u32,

    /// Delay before the first retry
    pub base_delay: Duration,

    /// Multiplier applied to the delay after every retry
    pub multiplier: f64,

    /// Upper bound for a single delay
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(1000),
            multiplier: 2.0,
            max_delay: Duration::from_secs(60),
        }
    }
}

impl RetryConfig {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
            ..Self::default()
        }
    }
}

impl fmt::Display for RetryConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "RetryConfig {{ max_attempts: {}, base_delay: {:?}, multiplier: {}, max_delay: {:?} }}",
            self.max_attempts, self.base_delay, self.multiplier, self.max_delay
        )
    }
}

/// Executor for retry operations with exponential backoff
#[derive(Debug, Clone)]
pub struct RetryExecutor {
    config: RetryConfig,
}

impl RetryExecutor {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    fn backoff(&self) -> ExponentialBackoff {
        ExponentialBackoff {
            current_interval: self.config.base_delay,
            initial_interval: self.config.base_delay,
            randomization_factor: 0.0,
            multiplier: self.config.multiplier,
            max_interval: self.config.max_delay,
            max_elapsed_time: None,
            ..ExponentialBackoff::default()
        }
    }

    /// Execute a fallible operation, retrying transient failures
    ///
    /// The error returned after the last attempt carries an `attempts` context
    /// value. Non-transient errors are returned immediately.
    pub async fn execute<F, Fut, T>(&self, cancel: &CancellationToken, mut operation: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let max_attempts = self.config.max_attempts.max(1);
        let mut backoff = self.backoff();
        let mut attempt = 0;

        loop {
            attempt += 1;

            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => Err(ServiceError::cancelled("request abandoned by caller")),
                result = operation() => result,
            };

            match result {
                Ok(value) => return Ok(value),
                Err(err) if err.is_transient() && attempt < max_attempts => {
                    let delay = backoff.next_backoff().unwrap_or(self.config.max_delay);
                    log::warn!(
                        "Transient failure, retrying in {:?} (attempt {}/{}): {}",
                        delay,
                        attempt,
                        max_attempts,
                        err
                    );

                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => {
                            return Err(ServiceError::cancelled("request abandoned during backoff")
                                .with_context_value("attempts", attempt));
                        }
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
                Err(err) => {
                    if err.is_transient() {
                        log::warn!("Giving up after {} attempts: {}", attempt, err);
                    }
                    return Err(err.with_context_value("attempts", attempt));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_successful_operation() {
        let retry = RetryExecutor::new(RetryConfig::default());
        let result = tokio_test::block_on(
            retry.execute(&CancellationToken::new(), || async { Ok::<_, ServiceError>(42) }),
        );
        assert_eq!(tokio_test::assert_ok!(result), 42);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_on_transient_failure() {
        let attempt_count = Arc::new(AtomicUsize::new(0));
        let retry = RetryExecutor::new(RetryConfig::new(3, Duration::from_millis(10)));

        let result = retry
            .execute(&CancellationToken::new(), || {
                let attempt_count = Arc::clone(&attempt_count);
                async move {
                    if attempt_count.fetch_add(1, Ordering::SeqCst) < 2 {
                        Err(ServiceError::overloaded("503"))
                    } else {
                        Ok(42)
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(attempt_count.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_delay_is_capped_at_max_delay() {
        let retry = RetryExecutor::new(RetryConfig {
            max_attempts: 4,
            base_delay: Duration::from_millis(1000),
            max_delay: Duration::from_millis(1500),
            ..RetryConfig::default()
        });
        let started = tokio::time::Instant::now();

        let result: Result<()> = retry
            .execute(&CancellationToken::new(), || async { Err(ServiceError::overloaded("503")) })
            .await;

        assert_eq!(result.unwrap_err().attempts(), Some(4));
        // 1000 + 1500 + 1500 rather than 1000 + 2000 + 4000
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(4000) && elapsed < Duration::from_millis(5000));
    }

    #[tokio::test]
    async fn test_no_retry_on_terminal_error() {
        let attempt_count = Arc::new(AtomicUsize::new(0));
        let retry = RetryExecutor::new(RetryConfig::default());

        let result: Result<()> = retry
            .execute(&CancellationToken::new(), || {
                let attempt_count = Arc::clone(&attempt_count);
                async move {
                    attempt_count.fetch_add(1, Ordering::SeqCst);
                    Err(ServiceError::authentication("bad key"))
                }
            })
            .await;

        let err = result.unwrap_err();
        assert!(matches!(err.root(), ServiceError::Authentication(_)));
        assert_eq!(err.attempts(), Some(1));
        assert_eq!(attempt_count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_malformed_response_is_not_retried() {
        let attempt_count = Arc::new(AtomicUsize::new(0));
        let retry = RetryExecutor::new(RetryConfig::default());

        let result: Result<()> = retry
            .execute(&CancellationToken::new(), || {
                let attempt_count = Arc::clone(&attempt_count);
                async move {
                    attempt_count.fetch_add(1, Ordering::SeqCst);
                    Err(ServiceError::malformed("not json"))
                }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(attempt_count.load(Ordering::SeqCst), 1);
    }
}
