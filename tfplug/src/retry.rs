//! Bounded retry for API calls made from resource operations
//!
//! A call wrapped in [`retry`] decides per attempt whether its error is worth
//! another try. Retryable errors are retried at a fixed interval until the
//! timeout; permanent errors end the loop at once.

use std::fmt;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

/// Default budget for mutating calls
pub const WRITE_RETRY_TIMEOUT: Duration = Duration::from_secs(5 * 60);
/// Default budget for describe calls
pub const READ_RETRY_TIMEOUT: Duration = Duration::from_secs(3 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryConfig {
    pub timeout: Duration,
    pub interval: Duration,
}

impl RetryConfig {
    pub fn new(timeout: Duration, interval: Duration) -> Self {
        Self { timeout, interval }
    }

    pub fn write() -> Self {
        Self::new(WRITE_RETRY_TIMEOUT, Duration::from_secs(1))
    }

    pub fn read() -> Self {
        Self::new(READ_RETRY_TIMEOUT, Duration::from_secs(1))
    }
}

/// Classification of one failed attempt
#[derive(Debug)]
pub enum RetryError<E> {
    Retryable(E),
    Permanent(E),
}

impl<E> RetryError<E> {
    pub fn into_inner(self) -> E {
        match self {
            RetryError::Retryable(e) | RetryError::Permanent(e) => e,
        }
    }
}

/// Runs `op` until it succeeds, fails permanently, or `config.timeout` elapses.
/// On timeout the last retryable error is returned.
pub async fn retry<T, E, F, Fut>(config: RetryConfig, mut op: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, RetryError<E>>>,
    E: fmt::Display,
{
    let started = Instant::now();
    let mut attempt: u32 = 0;

    loop {
        attempt += 1;
        match op().await {
            Ok(value) => return Ok(value),
            Err(RetryError::Permanent(e)) => return Err(e),
            Err(RetryError::Retryable(e)) => {
                let remaining = config.timeout.saturating_sub(started.elapsed());
                if remaining.is_zero() {
                    tracing::warn!("giving up after {} attempts: {}", attempt, e);
                    return Err(e);
                }
                tracing::warn!(
                    "attempt {} failed with retryable error, retrying in {:?}: {}",
                    attempt,
                    config.interval.min(remaining),
                    e
                );
                tokio::time::sleep(config.interval.min(remaining)).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn config() -> RetryConfig {
        RetryConfig::new(Duration::from_secs(10), Duration::from_secs(1))
    }

    #[tokio::test(start_paused = true)]
    async fn returns_first_success() {
        let calls = AtomicUsize::new(0);

        let result: Result<&str, String> = retry(config(), || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok("done")
        })
        .await;

        assert_eq!(result.unwrap(), "done");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn retries_retryable_errors_until_success() {
        let calls = AtomicUsize::new(0);

        let result: Result<u32, String> = retry(config(), || async {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            if n < 2 {
                Err(RetryError::Retryable("RequestLimitExceeded".to_string()))
            } else {
                Ok(7)
            }
        })
        .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn permanent_error_stops_immediately() {
        let calls = AtomicUsize::new(0);

        let result: Result<(), String> = retry(config(), || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(RetryError::Permanent("InvalidParameter".to_string()))
        })
        .await;

        assert_eq!(result.unwrap_err(), "InvalidParameter");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_with_last_error_after_timeout() {
        let calls = AtomicUsize::new(0);
        let started = Instant::now();

        let result: Result<(), String> = retry(config(), || async {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            Err(RetryError::Retryable(format!("busy {}", n)))
        })
        .await;

        assert_eq!(result.unwrap_err(), "busy 10");
        assert_eq!(calls.load(Ordering::SeqCst), 11);
        assert_eq!(started.elapsed(), Duration::from_secs(10));
    }

    #[test]
    fn default_budgets() {
        assert_eq!(RetryConfig::write().timeout, Duration::from_secs(300));
        assert_eq!(RetryConfig::read().timeout, Duration::from_secs(180));
        assert_eq!(
            RetryError::Retryable("x").into_inner(),
            RetryError::Permanent("x").into_inner()
        );
    }
}
