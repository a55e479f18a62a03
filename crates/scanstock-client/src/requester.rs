//! # Resilient Requester
//!
//! Deadline plus bounded retry around a single backend call.
//!
//! ## Attempt Loop
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     ResilientRequester::run                             │
//! │                                                                         │
//! │   attempt = 1                                                           │
//! │      │                                                                  │
//! │      ▼                                                                  │
//! │   ┌──────────────────────┐   deadline hit    ┌───────────────────────┐ │
//! │   │ call() under timeout │ ────────────────► │ Timeout (never retry) │ │
//! │   └──────────┬───────────┘                   └───────────────────────┘ │
//! │              │                                                          │
//! │      ┌───────┼──────────────────┐                                       │
//! │      ▼       ▼                  ▼                                       │
//! │    Ok(v)   permanent error    transient error                           │
//! │      │       │                  │                                       │
//! │      ▼       ▼                  ├── attempt > max_retries?              │
//! │  Success  Rejected              │     yes → ExhaustedRetries(last)      │
//! │                                 │     no  → sleep(fixed delay),         │
//! │                                 │           attempt += 1, loop          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `max_retries = n` allows at most `1 + n` attempts.

use backoff::backoff::{Backoff, Constant};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::{ClientError, ClientResult};

// =============================================================================
// Retry Policy
// =============================================================================

/// Deadline and retry settings for one call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Deadline for each attempt.
    pub timeout: Duration,
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Fixed delay between attempts.
    pub retry_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            timeout: Duration::from_secs(10),
            max_retries: 3,
            retry_delay: Duration::from_secs(1),
        }
    }
}

// =============================================================================
// Request Outcome
// =============================================================================

/// Terminal result of a resilient call.
#[derive(Debug)]
pub enum RequestOutcome<T> {
    Success(T),
    /// The deadline passed. The call was abandoned and not retried.
    Timeout { after: Duration },
    /// Every attempt failed with a transient error.
    ExhaustedRetries { attempts: u32, last_error: ClientError },
    /// A non-transient failure ended the call on the spot.
    Rejected(ClientError),
}

impl<T> RequestOutcome<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, RequestOutcome::Success(_))
    }

    /// Collapses the outcome into a `ClientResult`.
    pub fn into_result(self) -> ClientResult<T> {
        match self {
            RequestOutcome::Success(value) => Ok(value),
            RequestOutcome::Timeout { after } => Err(ClientError::Timeout(after.as_millis() as u64)),
            RequestOutcome::ExhaustedRetries {
                attempts,
                last_error,
            } => Err(ClientError::ExhaustedRetries {
                attempts,
                last_error: last_error.to_string(),
            }),
            RequestOutcome::Rejected(err) => Err(err),
        }
    }
}

// =============================================================================
// Resilient Requester
// =============================================================================

/// Runs calls under a [`RetryPolicy`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ResilientRequester {
    policy: RetryPolicy,
}

impl ResilientRequester {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Runs `call` until it succeeds, fails permanently, times out, or the
    /// retry budget runs out.
    ///
    /// `call` is invoked once per attempt and must build a fresh request each
    /// time. `label` only appears in logs.
    pub async fn run<T, F, Fut>(&self, label: &str, mut call: F) -> RequestOutcome<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = ClientResult<T>>,
    {
        let mut delay = Constant::new(self.policy.retry_delay);
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            debug!(label, attempt, "Sending request");

            let error = match tokio::time::timeout(self.policy.timeout, call()).await {
                Err(_) => {
                    warn!(label, attempt, timeout = ?self.policy.timeout, "Request timed out");
                    return RequestOutcome::Timeout {
                        after: self.policy.timeout,
                    };
                }
                Ok(Ok(value)) => {
                    if attempt > 1 {
                        debug!(label, attempt, "Request succeeded after retry");
                    }
                    return RequestOutcome::Success(value);
                }
                Ok(Err(e)) => e,
            };

            if !error.is_transient() {
                warn!(label, attempt, error = %error, "Request rejected");
                return RequestOutcome::Rejected(error);
            }

            if attempt > self.policy.max_retries {
                warn!(label, attempts = attempt, error = %error, "Retries exhausted");
                return RequestOutcome::ExhaustedRetries {
                    attempts: attempt,
                    last_error: error,
                };
            }

            let wait = delay.next_backoff().unwrap_or(self.policy.retry_delay);
            warn!(label, attempt, error = %error, ?wait, "Transient failure, retrying");
            tokio::time::sleep(wait).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use tokio::time::Instant;

    fn policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            timeout: Duration::from_secs(5),
            max_retries,
            retry_delay: Duration::from_millis(250),
        }
    }

    fn bad_gateway() -> ClientError {
        ClientError::Http {
            status: 502,
            body: r#"{"error":"Proxy request failed"}"#.into(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_on_first_attempt() {
        let requester = ResilientRequester::new(policy(3));
        let calls = Arc::new(AtomicU32::new(0));

        let outcome = requester
            .run("test", || {
                let calls = calls.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, ClientError>(7)
                }
            })
            .await;

        assert!(matches!(outcome, RequestOutcome::Success(7)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_server_errors_are_retried_with_fixed_delay() {
        let requester = ResilientRequester::new(policy(3));
        let calls = Arc::new(AtomicU32::new(0));
        let started = Instant::now();

        let outcome: RequestOutcome<()> = requester
            .run("test", || {
                let calls = calls.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err(bad_gateway())
                }
            })
            .await;

        match outcome {
            RequestOutcome::ExhaustedRetries {
                attempts,
                last_error,
            } => {
                assert_eq!(attempts, 4);
                assert!(matches!(last_error, ClientError::Http { status: 502, .. }));
            }
            other => panic!("expected ExhaustedRetries, got {:?}", other),
        }
        assert_eq!(calls.load(Ordering::SeqCst), 4);
        // Three gaps of 250 ms between four attempts
        assert_eq!(started.elapsed(), Duration::from_millis(750));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_is_not_retried() {
        let requester = ResilientRequester::new(policy(3));
        let calls = Arc::new(AtomicU32::new(0));

        let outcome: RequestOutcome<()> = requester
            .run("test", || {
                let calls = calls.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_secs(60)).await;
                    Ok(())
                }
            })
            .await;

        assert!(matches!(
            outcome,
            RequestOutcome::Timeout { after } if after == Duration::from_secs(5)
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_client_errors_are_not_retried() {
        let requester = ResilientRequester::new(policy(3));
        let calls = Arc::new(AtomicU32::new(0));

        let outcome: RequestOutcome<()> = requester
            .run("test", || {
                let calls = calls.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err(ClientError::Http {
                        status: 400,
                        body: "bad request".into(),
                    })
                }
            })
            .await;

        assert!(matches!(outcome, RequestOutcome::Rejected(ClientError::Http { status: 400, .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_recovers_after_transient_failure() {
        let requester = ResilientRequester::new(policy(2));
        let calls = Arc::new(AtomicU32::new(0));

        let outcome = requester
            .run("test", || {
                let calls = calls.clone();
                async move {
                    if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                        Err(ClientError::ConnectionFailed("connection refused".into()))
                    } else {
                        Ok("ok")
                    }
                }
            })
            .await;

        assert!(matches!(outcome, RequestOutcome::Success("ok")));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_retries_means_single_attempt() {
        let requester = ResilientRequester::new(policy(0));
        let outcome: RequestOutcome<()> = requester
            .run("test", || async { Err(bad_gateway()) })
            .await;

        assert!(matches!(
            outcome,
            RequestOutcome::ExhaustedRetries { attempts: 1, .. }
        ));
    }

    #[test]
    fn test_outcome_into_result() {
        let err = RequestOutcome::<()>::Timeout {
            after: Duration::from_millis(1500),
        }
        .into_result()
        .unwrap_err();
        assert!(matches!(err, ClientError::Timeout(1500)));

        let err = RequestOutcome::<()>::ExhaustedRetries {
            attempts: 4,
            last_error: ClientError::ConnectionFailed("refused".into()),
        }
        .into_result()
        .unwrap_err();
        assert_eq!(err.to_string(), "Gave up after 4 attempts: Connection failed: refused");
    }
}
