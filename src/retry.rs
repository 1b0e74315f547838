//! Bounded retry for vendor calls.
//!
//! Every handler wraps its vendor call in [`retry_with_timeout`]. Only errors
//! classified as transient by [`ProviderError::is_retryable`] are retried;
//! anything else is returned on the first attempt. Once the time budget is
//! spent the last error is wrapped in [`ProviderError::Timeout`].

use std::future::Future;
use std::time::{Duration, Instant};

use rand::Rng;
use tracing::{error, warn};

use crate::error::{ProviderError, Result};

/// Default budget for create/update/delete calls
pub const WRITE_RETRY_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// Default budget for describe calls
pub const READ_RETRY_TIMEOUT: Duration = Duration::from_secs(3 * 60);

/// Retry budget and backoff shape
#[derive(Clone, Debug)]
pub struct RetryConfig {
    /// Total time allowed across all attempts
    pub timeout: Duration,
    /// Initial delay between retries
    pub initial_delay: Duration,
    /// Maximum delay between retries
    pub max_delay: Duration,
    /// Multiplier for exponential backoff
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::with_timeout(WRITE_RETRY_TIMEOUT)
    }
}

impl RetryConfig {
    /// Create a config with the given total budget
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(10),
            backoff_multiplier: 2.0,
        }
    }

    /// Budget for write calls
    pub fn write() -> Self {
        Self::with_timeout(WRITE_RETRY_TIMEOUT)
    }

    /// Budget for read calls
    pub fn read() -> Self {
        Self::with_timeout(READ_RETRY_TIMEOUT)
    }

    /// Override the initial delay (tests use millisecond delays)
    pub fn initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self.max_delay = self.max_delay.max(delay);
        self
    }
}

/// Execute an async vendor call, retrying transient failures until the
/// budget in `config` is exhausted.
pub async fn retry_with_timeout<F, Fut, T>(
    config: &RetryConfig,
    operation_name: &str,
    mut operation: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let start = Instant::now();
    let mut attempt = 0u32;
    let mut delay = config.initial_delay;

    loop {
        attempt += 1;

        let err = match operation().await {
            Ok(result) => return Ok(result),
            Err(e) => e,
        };

        if !err.is_retryable() {
            return Err(err);
        }

        // Add jitter: 0.5x to 1.5x of the delay
        let jitter = rand::thread_rng().gen_range(0.5..1.5);
        let jittered_delay = Duration::from_secs_f64(delay.as_secs_f64() * jitter);

        let elapsed = start.elapsed();
        if elapsed + jittered_delay > config.timeout {
            error!(
                operation = %operation_name,
                attempt = attempt,
                error = %err,
                "Retry budget exhausted"
            );
            return Err(ProviderError::Timeout {
                operation: operation_name.to_string(),
                elapsed,
                last: Box::new(err),
            });
        }

        warn!(
            operation = %operation_name,
            attempt = attempt,
            error = %err,
            delay_ms = jittered_delay.as_millis(),
            "Retryable error, retrying"
        );

        tokio::time::sleep(jittered_delay).await;

        // Exponential backoff, capped at max_delay
        delay = Duration::from_secs_f64(
            (delay.as_secs_f64() * config.backoff_multiplier).min(config.max_delay.as_secs_f64()),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn fast(timeout_ms: u64) -> RetryConfig {
        RetryConfig::with_timeout(Duration::from_millis(timeout_ms))
            .initial_delay(Duration::from_millis(1))
    }

    fn throttled() -> ProviderError {
        ProviderError::Api {
            code: "RequestLimitExceeded".into(),
            message: "slow down".into(),
            request_id: "r".into(),
        }
    }

    #[tokio::test]
    async fn test_succeeds_immediately() {
        let result = retry_with_timeout(&fast(100), "op", || async { Ok(42) }).await;
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_succeeds_after_transient_failures() {
        let count = Arc::new(AtomicU32::new(0));
        let c = count.clone();

        let result = retry_with_timeout(&fast(2_000), "op", || {
            let c = c.clone();
            async move {
                if c.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(throttled())
                } else {
                    Ok("done")
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), "done");
        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_non_retryable_error_fails_on_first_attempt() {
        let count = Arc::new(AtomicU32::new(0));
        let c = count.clone();

        let result: Result<()> = retry_with_timeout(&fast(2_000), "op", || {
            let c = c.clone();
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err(ProviderError::Api {
                    code: "InvalidParameter".into(),
                    message: "bad".into(),
                    request_id: "r".into(),
                })
            }
        })
        .await;

        assert_eq!(result.unwrap_err().code(), Some("InvalidParameter"));
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_times_out_with_last_error() {
        let result: Result<()> =
            retry_with_timeout(&fast(20), "CreateAccount", || async { Err(throttled()) }).await;

        match result.unwrap_err() {
            ProviderError::Timeout { operation, last, .. } => {
                assert_eq!(operation, "CreateAccount");
                assert_eq!(last.code(), Some("RequestLimitExceeded"));
            }
            other => panic!("expected timeout, got {other}"),
        }
    }
}
