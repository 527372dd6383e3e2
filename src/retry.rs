//! Bounded retry with linear backoff
//!
//! The per-file retry loop is an explicit state machine
//! (`Pending → Attempting(n) → Succeeded | Failed`) driven through an
//! injected [`Sleeper`], so retry exhaustion and the backoff schedule are
//! testable without real network calls or wall-clock waits.

use crate::error::Error;
use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;

/// Retry budget and backoff schedule for one file
#[derive(Clone, Copy, Debug)]
pub struct RetryPolicy {
    /// Maximum attempts per file, including the first (default 3)
    pub max_attempts: u32,
    /// Backoff base; the delay before attempt n is `backoff * n`
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    /// Delay inserted before attempt `n` (1-based)
    ///
    /// Attempt 1 runs immediately; attempt n ≥ 2 waits `backoff * n`, so the
    /// default schedule is 20s before attempt 2 and 30s before attempt 3.
    pub fn delay_before(&self, attempt: u32) -> Option<Duration> {
        if attempt <= 1 {
            None
        } else {
            Some(self.backoff * attempt)
        }
    }
}

/// Retry loop state, exposed for tracing and tests
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AttemptState {
    /// No attempt started yet
    Pending,
    /// Attempt n (1-based) is in flight
    Attempting(u32),
    /// An attempt succeeded after this many attempts
    Succeeded(u32),
    /// The budget is exhausted after this many attempts
    Failed(u32),
}

/// Injectable sleep, so tests can record the backoff schedule instead of
/// waiting it out
#[async_trait]
pub trait Sleeper: Send + Sync {
    /// Suspend for `duration`
    async fn sleep(&self, duration: Duration);
}

/// Production sleeper backed by the tokio timer
#[derive(Clone, Copy, Debug, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Drive `operation` through the retry state machine
///
/// The operation receives the 1-based attempt number. The loop stops at the
/// first success, at the first non-retryable error, or when the budget is
/// exhausted. Returns the final result together with the number of attempts
/// consumed, so callers can report exhaustion counts.
pub async fn run_with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    sleeper: &dyn Sleeper,
    mut operation: F,
) -> (Result<T, Error>, u32)
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, Error>>,
{
    let mut state = AttemptState::Pending;
    loop {
        let attempt = match state {
            AttemptState::Pending => 1,
            AttemptState::Attempting(n) => n,
            // Terminal states never re-enter the loop
            AttemptState::Succeeded(_) | AttemptState::Failed(_) => unreachable!(),
        };

        if let Some(delay) = policy.delay_before(attempt) {
            tracing::info!(attempt, delay_secs = delay.as_secs(), "waiting before retry");
            sleeper.sleep(delay).await;
        }

        match operation(attempt).await {
            Ok(value) => {
                state = AttemptState::Succeeded(attempt);
                tracing::debug!(?state, "attempt succeeded");
                return (Ok(value), attempt);
            }
            Err(e) if e.is_retryable() && attempt < policy.max_attempts => {
                tracing::warn!(
                    error = %e,
                    attempt,
                    max_attempts = policy.max_attempts,
                    "attempt failed, will retry"
                );
                state = AttemptState::Attempting(attempt + 1);
            }
            Err(e) => {
                state = AttemptState::Failed(attempt);
                tracing::error!(error = %e, ?state, "attempts exhausted");
                return (Err(e), attempt);
            }
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Records requested delays instead of sleeping
    #[derive(Default)]
    struct RecordingSleeper {
        delays: Mutex<Vec<Duration>>,
    }

    #[async_trait]
    impl Sleeper for RecordingSleeper {
        async fn sleep(&self, duration: Duration) {
            self.delays.lock().unwrap().push(duration);
        }
    }

    fn transfer_error() -> Error {
        Error::Transfer {
            url: "http://example.com/a.zip".into(),
            reason: "connection reset".into(),
        }
    }

    #[test]
    fn default_schedule_is_zero_twenty_thirty() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_before(1), None);
        assert_eq!(policy.delay_before(2), Some(Duration::from_secs(20)));
        assert_eq!(policy.delay_before(3), Some(Duration::from_secs(30)));
    }

    #[tokio::test]
    async fn success_on_first_attempt_sleeps_never() {
        let sleeper = RecordingSleeper::default();
        let (result, attempts) = run_with_retry(&RetryPolicy::default(), &sleeper, |_| async {
            Ok::<_, Error>(42)
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(attempts, 1);
        assert!(sleeper.delays.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn exhaustion_consumes_exactly_max_attempts_with_linear_delays() {
        let sleeper = RecordingSleeper::default();
        let calls = Arc::new(AtomicU32::new(0));
        let calls_clone = calls.clone();

        let (result, attempts) = run_with_retry(&RetryPolicy::default(), &sleeper, |_| {
            let calls = calls_clone.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(transfer_error())
            }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(attempts, 3, "budget is exactly max_attempts");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(
            *sleeper.delays.lock().unwrap(),
            vec![Duration::from_secs(20), Duration::from_secs(30)],
            "delays before attempts 2 and 3"
        );
    }

    #[tokio::test]
    async fn transient_failure_then_success_stops_early() {
        let sleeper = RecordingSleeper::default();
        let calls = Arc::new(AtomicU32::new(0));
        let calls_clone = calls.clone();

        let (result, attempts) = run_with_retry(&RetryPolicy::default(), &sleeper, |attempt| {
            let calls = calls_clone.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                if attempt < 2 {
                    Err(transfer_error())
                } else {
                    Ok(attempt)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 2);
        assert_eq!(attempts, 2);
        assert_eq!(
            *sleeper.delays.lock().unwrap(),
            vec![Duration::from_secs(20)]
        );
    }

    #[tokio::test]
    async fn non_retryable_error_stops_immediately() {
        let sleeper = RecordingSleeper::default();
        let calls = Arc::new(AtomicU32::new(0));
        let calls_clone = calls.clone();

        let (result, attempts) = run_with_retry(&RetryPolicy::default(), &sleeper, |_| {
            let calls = calls_clone.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(Error::Cancelled)
            }
        })
        .await;

        assert!(matches!(result, Err(Error::Cancelled)));
        assert_eq!(attempts, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(sleeper.delays.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn attempt_numbers_are_one_based_and_sequential() {
        let sleeper = RecordingSleeper::default();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = seen.clone();

        let _ = run_with_retry(&RetryPolicy::default(), &sleeper, |attempt| {
            let seen = seen_clone.clone();
            async move {
                seen.lock().unwrap().push(attempt);
                Err::<(), _>(transfer_error())
            }
        })
        .await;

        assert_eq!(*seen.lock().unwrap(), vec![1, 2, 3]);
    }
}
