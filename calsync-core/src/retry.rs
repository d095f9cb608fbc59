//! Retry-with-backoff for vendor calls.

use std::future::Future;
use std::time::Duration;

use serde::Deserialize;
use tracing::warn;

use crate::error::CalSyncResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
        }
    }
}

/// `[retry]` section of the config file.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        RetryPolicy {
            max_attempts: config.max_attempts.max(1),
            base_delay: Duration::from_millis(config.base_delay_ms),
            max_delay: Duration::from_millis(config.max_delay_ms),
        }
    }
}

impl RetryPolicy {
    /// No waiting between attempts.
    pub fn immediate(max_attempts: u32) -> Self {
        RetryPolicy {
            max_attempts,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    /// Wait before attempt `attempt + 1`. A server hint wins over the exponential schedule;
    /// both are capped at `max_delay`.
    pub fn delay_for(&self, attempt: u32, server_hint: Option<Duration>) -> Duration {
        let exponential = || {
            let factor = 1u32 << attempt.saturating_sub(1).min(16);
            self.base_delay.saturating_mul(factor)
        };
        server_hint.unwrap_or_else(exponential).min(self.max_delay)
    }
}

/// Run `op` until it succeeds, fails with a non-retryable error, or the attempt budget
/// runs out. The last error is returned unchanged.
pub async fn retry_with_backoff<T, F, Fut>(
    policy: &RetryPolicy,
    operation: &str,
    mut op: F,
) -> CalSyncResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = CalSyncResult<T>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if attempt < max_attempts && err.is_retryable() => {
                let delay = policy.delay_for(attempt, err.retry_after());
                warn!(
                    operation,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "Vendor call failed, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CalSyncError;
    use tokio::time::Instant;

    fn rate_limited(secs: u64) -> CalSyncError {
        CalSyncError::Upstream {
            service: "zoho",
            status: 429,
            body: String::new(),
            retry_after: Some(Duration::from_secs(secs)),
        }
    }

    #[test]
    fn exponential_schedule_is_capped() {
        let policy = RetryPolicy {
            max_attempts: 10,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(5),
        };
        assert_eq!(policy.delay_for(1, None), Duration::from_secs(1));
        assert_eq!(policy.delay_for(2, None), Duration::from_secs(2));
        assert_eq!(policy.delay_for(3, None), Duration::from_secs(4));
        assert_eq!(policy.delay_for(4, None), Duration::from_secs(5));
        assert_eq!(policy.delay_for(60, None), Duration::from_secs(5));
    }

    #[test]
    fn server_hint_wins_but_is_capped() {
        let policy = RetryPolicy::default();
        assert_eq!(
            policy.delay_for(1, Some(Duration::from_secs(7))),
            Duration::from_secs(7)
        );
        assert_eq!(
            policy.delay_for(1, Some(Duration::from_secs(600))),
            Duration::from_secs(30)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn waits_for_server_suggested_delay_on_429() {
        let policy = RetryPolicy::default();
        let start = Instant::now();
        let mut calls = 0;

        let result = retry_with_backoff(&policy, "test", || {
            calls += 1;
            let n = calls;
            async move {
                if n < 3 { Err(rate_limited(5)) } else { Ok(n) }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 3);
        assert_eq!(calls, 3);
        assert_eq!(start.elapsed(), Duration::from_secs(10));
    }

    #[tokio::test(start_paused = true)]
    async fn falls_back_to_exponential_delay() {
        let policy = RetryPolicy::default();
        let start = Instant::now();
        let mut calls = 0;

        let result = retry_with_backoff(&policy, "test", || {
            calls += 1;
            let n = calls;
            async move {
                if n < 3 {
                    Err(CalSyncError::upstream("outlook", 503, "unavailable"))
                } else {
                    Ok(())
                }
            }
        })
        .await;

        assert!(result.is_ok());
        // 1s after the first failure, 2s after the second
        assert_eq!(start.elapsed(), Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn returns_last_error_when_budget_exhausted() {
        let policy = RetryPolicy::default();
        let mut calls = 0;

        let result: CalSyncResult<()> = retry_with_backoff(&policy, "test", || {
            calls += 1;
            let n = calls;
            async move { Err(CalSyncError::upstream("zoho", 429, format!("attempt {n}"))) }
        })
        .await;

        let err = result.unwrap_err();
        assert_eq!(calls, 3);
        assert_eq!(err.upstream_body(), Some("attempt 3"));
    }

    #[tokio::test]
    async fn client_errors_are_not_retried() {
        let policy = RetryPolicy::immediate(5);
        let mut calls = 0;

        let result: CalSyncResult<()> = retry_with_backoff(&policy, "test", || {
            calls += 1;
            async { Err(CalSyncError::upstream("zoho", 400, "INVALID_DATA")) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls, 1);
    }
}
