//! Fixed-delay retry for calls against flaky external services.
//!
//! Synthesis is paid per call, so retries are bounded and the delay is a
//! flat pause rather than a growing backoff.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

/// Configuration for retry behavior.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Retry attempts after the initial attempt.
    pub max_retries: u32,
    /// Fixed delay between attempts.
    pub delay: Duration,
    /// Operation name for logging.
    pub operation_name: String,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 1,
            delay: Duration::from_secs(5),
            operation_name: "operation".to_string(),
        }
    }
}

impl RetryConfig {
    /// Create a new retry config with the given operation name.
    pub fn new(operation_name: impl Into<String>) -> Self {
        Self {
            operation_name: operation_name.into(),
            ..Default::default()
        }
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// Result of a retried operation. Both arms report how many attempts
/// were made.
#[derive(Debug)]
pub enum RetryOutcome<T, E> {
    /// Operation succeeded.
    Success { value: T, attempts: u32 },
    /// All attempts failed; carries the last error.
    Exhausted { error: E, attempts: u32 },
}

impl<T, E> RetryOutcome<T, E> {
    pub fn is_success(&self) -> bool {
        matches!(self, RetryOutcome::Success { .. })
    }
}

/// Run an async operation up to `max_retries + 1` times with a fixed
/// delay between attempts.
pub async fn retry_fixed<F, Fut, T, E>(config: &RetryConfig, operation: F) -> RetryOutcome<T, E>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let mut attempt = 0u32;

    loop {
        match operation().await {
            Ok(value) => {
                return RetryOutcome::Success {
                    value,
                    attempts: attempt + 1,
                }
            }
            Err(e) if attempt < config.max_retries => {
                attempt += 1;
                warn!(
                    "{} attempt {} failed, retrying in {:?}: {}",
                    config.operation_name, attempt, config.delay, e
                );
                tokio::time::sleep(config.delay).await;
            }
            Err(e) => {
                return RetryOutcome::Exhausted {
                    error: e,
                    attempts: attempt + 1,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn test_immediate_success_makes_one_attempt() {
        let config = RetryConfig::new("test");
        let calls = AtomicU32::new(0);

        let outcome = retry_fixed(&config, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok::<_, String>(42) }
        })
        .await;

        match outcome {
            RetryOutcome::Success { value, attempts } => {
                assert_eq!(value, 42);
                assert_eq!(attempts, 1);
            }
            RetryOutcome::Exhausted { .. } => panic!("expected success"),
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_eventual_success_within_budget() {
        let config = RetryConfig::new("test")
            .with_max_retries(3)
            .with_delay(Duration::from_millis(1));
        let calls = AtomicU32::new(0);

        let outcome = retry_fixed(&config, || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err("transient")
                } else {
                    Ok(42)
                }
            }
        })
        .await;

        match outcome {
            RetryOutcome::Success { attempts, .. } => assert_eq!(attempts, 3),
            RetryOutcome::Exhausted { .. } => panic!("expected success"),
        }
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_exhaustion_counts_all_attempts() {
        let config = RetryConfig::new("test")
            .with_max_retries(2)
            .with_delay(Duration::from_millis(1));
        let calls = AtomicU32::new(0);

        let outcome = retry_fixed(&config, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err::<(), _>("down") }
        })
        .await;

        match outcome {
            RetryOutcome::Exhausted { attempts, .. } => assert_eq!(attempts, 3),
            RetryOutcome::Success { .. } => panic!("expected exhaustion"),
        }
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
