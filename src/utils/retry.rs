// file: src/utils/retry.rs
// description: bounded retry with fixed backoff for external service calls
// reference: tokio::time::sleep based retry loop

use crate::config::RetryConfig;
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Result of running an operation under a [`RetryPolicy`].
#[derive(Debug)]
pub enum RetryOutcome<T, E> {
    Succeeded(T),
    Exhausted { attempts: u32, last_error: E },
}

impl<T, E> RetryOutcome<T, E> {
    pub fn is_exhausted(&self) -> bool {
        matches!(self, RetryOutcome::Exhausted { .. })
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            RetryOutcome::Succeeded(value) => Some(value),
            RetryOutcome::Exhausted { .. } => None,
        }
    }

    pub fn into_result(self) -> std::result::Result<T, E> {
        match self {
            RetryOutcome::Succeeded(value) => Ok(value),
            RetryOutcome::Exhausted { last_error, .. } => Err(last_error),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    pub fn from_config(config: &RetryConfig) -> Self {
        Self::new(config.max_attempts, Duration::from_secs(config.delay_secs))
    }

    /// Single attempt, no waiting.
    pub fn no_retry() -> Self {
        Self::new(1, Duration::ZERO)
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Runs `op` until it succeeds or `max_attempts` calls have failed.
    /// Sleeps `delay` between attempts, never after the last one.
    pub async fn run<T, E, F, Fut>(&self, operation: &str, op: F) -> RetryOutcome<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
        E: Display,
    {
        self.run_if(operation, |_| true, op).await
    }

    /// Like [`run`](Self::run), but gives up at once on an error for which
    /// `is_retryable` returns false.
    pub async fn run_if<T, E, P, F, Fut>(
        &self,
        operation: &str,
        is_retryable: P,
        mut op: F,
    ) -> RetryOutcome<T, E>
    where
        P: Fn(&E) -> bool,
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
        E: Display,
    {
        let mut attempt = 1;
        loop {
            match op().await {
                Ok(value) => {
                    if attempt > 1 {
                        debug!("{} succeeded on attempt {}", operation, attempt);
                    }
                    return RetryOutcome::Succeeded(value);
                }
                Err(e) if !is_retryable(&e) => {
                    warn!(
                        "{} failed (attempt {}/{}): {}. Not retryable",
                        operation, attempt, self.max_attempts, e
                    );
                    return RetryOutcome::Exhausted {
                        attempts: attempt,
                        last_error: e,
                    };
                }
                Err(e) if attempt < self.max_attempts => {
                    warn!(
                        "{} failed (attempt {}/{}): {}. Retrying in {}s",
                        operation,
                        attempt,
                        self.max_attempts,
                        e,
                        self.delay.as_secs()
                    );
                    tokio::time::sleep(self.delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    warn!(
                        "{} failed (attempt {}/{}): {}. Giving up",
                        operation, attempt, self.max_attempts, e
                    );
                    return RetryOutcome::Exhausted {
                        attempts: attempt,
                        last_error: e,
                    };
                }
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(10))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn instant_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::new(max_attempts, Duration::ZERO)
    }

    #[tokio::test]
    async fn test_succeeds_first_try() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let outcome = instant_policy(3)
            .run("op", move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<_, String>(42)
            })
            .await;

        assert_eq!(outcome.into_option(), Some(42));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_recovers_after_transient_failures() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let outcome = instant_policy(3)
            .run("op", move || async move {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                if n < 3 { Err("rate limited".to_string()) } else { Ok(n) }
            })
            .await;

        assert_eq!(outcome.into_option(), Some(3));
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_exhausts_after_max_attempts() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let outcome: RetryOutcome<(), String> = instant_policy(3)
            .run("op", move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err("boom".to_string())
            })
            .await;

        assert!(outcome.is_exhausted());
        match outcome {
            RetryOutcome::Exhausted {
                attempts,
                last_error,
            } => {
                assert_eq!(attempts, 3);
                assert_eq!(last_error, "boom");
            }
            RetryOutcome::Succeeded(_) => panic!("expected exhaustion"),
        }
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_waits_between_attempts_only() {
        let policy = RetryPolicy::new(3, Duration::from_millis(20));
        let start = std::time::Instant::now();
        let outcome: RetryOutcome<(), &str> = policy.run("op", || async { Err("x") }).await;
        let elapsed = start.elapsed();

        assert!(outcome.is_exhausted());
        assert!(elapsed >= Duration::from_millis(40));
        assert!(elapsed < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_permanent_error_stops_immediately() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let outcome: RetryOutcome<(), String> = RetryPolicy::new(3, Duration::from_secs(60))
            .run_if(
                "op",
                |e: &String| e.starts_with("transient"),
                move || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err("invalid input".to_string())
                },
            )
            .await;

        match outcome {
            RetryOutcome::Exhausted {
                attempts,
                last_error,
            } => {
                assert_eq!(attempts, 1);
                assert_eq!(last_error, "invalid input");
            }
            RetryOutcome::Succeeded(_) => panic!("expected exhaustion"),
        }
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_retryable_errors_still_retried_with_predicate() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let outcome = instant_policy(3)
            .run_if(
                "op",
                |e: &String| e.starts_with("transient"),
                move || async move {
                    let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                    if n < 3 { Err("transient 503".to_string()) } else { Ok(n) }
                },
            )
            .await;

        assert_eq!(outcome.into_option(), Some(3));
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_zero_attempts_clamped_to_one() {
        let policy = RetryPolicy::new(0, Duration::ZERO);
        assert_eq!(policy.max_attempts(), 1);
        assert_eq!(RetryPolicy::no_retry().max_attempts(), 1);
    }

    #[test]
    fn test_from_config() {
        let policy = RetryPolicy::from_config(&RetryConfig {
            max_attempts: 3,
            delay_secs: 10,
        });
        assert_eq!(policy, RetryPolicy::default());
        assert_eq!(policy.delay(), Duration::from_secs(10));
    }
}
