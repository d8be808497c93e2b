//! Bounded per-destination retry with exponential backoff.
//!
//! A [`RetryPolicy`] is applied to each destination independently: a
//! sleeping retry only delays its own destination, never its siblings.
//!
//! Retried: network-level failures (refused, reset, per-attempt timeout)
//! and `408 Request Timeout`. A response that breaks mid-body is retried
//! only for idempotent methods. Every other status is final.

use std::future::Future;
use std::time::Duration;

use axum::http::{Method, StatusCode};

use crate::error::ForwardError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
    max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_millis(100), Duration::from_secs(5))
    }
}

/// Terminal result of a destination after all attempts.
#[derive(Debug)]
pub struct Attempted {
    pub result: Result<StatusCode, ForwardError>,
    pub attempts: u32,
}

impl RetryPolicy {
    /// `max_attempts` counts the first try and is clamped to at least one.
    #[must_use]
    pub fn new(max_attempts: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            max_delay,
        }
    }

    #[must_use]
    pub const fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay applied after the `attempt`-th failure (1-based).
    #[must_use]
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }

    #[must_use]
    pub fn should_retry(&self, method: &Method, error: &ForwardError) -> bool {
        match error {
            ForwardError::Network(_) | ForwardError::Timeout(_) => true,
            ForwardError::Status(status) => *status == StatusCode::REQUEST_TIMEOUT,
            ForwardError::Interrupted(_) => is_idempotent(method),
            ForwardError::Request(_) => false,
        }
    }

    /// Run `attempt` until it succeeds, fails terminally, or attempts run out.
    ///
    /// `attempt` receives the 1-based attempt number.
    pub async fn execute<F, Fut>(&self, method: &Method, url: &str, mut attempt: F) -> Attempted
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<StatusCode, ForwardError>>,
    {
        let mut n = 1;
        loop {
            let result = attempt(n).await;
            let error = match result {
                Ok(status) => {
                    return Attempted {
                        result: Ok(status),
                        attempts: n,
                    }
                }
                Err(error) => error,
            };

            if n >= self.max_attempts || !self.should_retry(method, &error) {
                return Attempted {
                    result: Err(error),
                    attempts: n,
                };
            }

            let delay = self.delay_after(n);
            tracing::warn!(
                url = %url,
                attempt = n,
                max_attempts = self.max_attempts,
                error = %error,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                "forward attempt failed, retrying"
            );
            tokio::time::sleep(delay).await;
            n += 1;
        }
    }
}

/// Methods whose repetition has no additional effect on the destination.
#[must_use]
pub fn is_idempotent(method: &Method) -> bool {
    [
        Method::GET,
        Method::HEAD,
        Method::PUT,
        Method::DELETE,
        Method::OPTIONS,
    ]
    .contains(method)
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use tokio::time::Instant;

    use super::*;

    fn refused() -> ForwardError {
        ForwardError::Network("connection refused".into())
    }

    /// Records the (paused-clock) instant of every attempt.
    fn recorder() -> Arc<Mutex<Vec<Instant>>> {
        Arc::new(Mutex::new(Vec::new()))
    }

    #[test]
    fn delay_doubles_and_caps() {
        let policy = RetryPolicy::new(10, Duration::from_millis(100), Duration::from_millis(350));
        assert_eq!(policy.delay_after(1), Duration::from_millis(100));
        assert_eq!(policy.delay_after(2), Duration::from_millis(200));
        assert_eq!(policy.delay_after(3), Duration::from_millis(350));
        assert_eq!(policy.delay_after(40), Duration::from_millis(350));
    }

    #[test]
    fn zero_attempts_clamped_to_one() {
        let policy = RetryPolicy::new(0, Duration::ZERO, Duration::ZERO);
        assert_eq!(policy.max_attempts(), 1);
    }

    #[test]
    fn retry_predicate() {
        let policy = RetryPolicy::default();
        assert!(policy.should_retry(&Method::POST, &refused()));
        assert!(policy.should_retry(&Method::POST, &ForwardError::Timeout(10_000)));
        assert!(policy.should_retry(
            &Method::POST,
            &ForwardError::Status(StatusCode::REQUEST_TIMEOUT)
        ));
        assert!(!policy.should_retry(
            &Method::GET,
            &ForwardError::Status(StatusCode::SERVICE_UNAVAILABLE)
        ));
        assert!(!policy.should_retry(&Method::GET, &ForwardError::Status(StatusCode::NOT_FOUND)));
        assert!(!policy.should_retry(&Method::PUT, &ForwardError::Request("bad uri".into())));
    }

    #[test]
    fn interrupted_response_retried_only_when_idempotent() {
        let policy = RetryPolicy::default();
        let error = ForwardError::Interrupted("reset mid-body".into());
        assert!(policy.should_retry(&Method::PUT, &error));
        assert!(policy.should_retry(&Method::DELETE, &error));
        assert!(!policy.should_retry(&Method::POST, &error));
        assert!(!policy.should_retry(&Method::PATCH, &error));
    }

    #[tokio::test(start_paused = true)]
    async fn connection_refused_exhausts_attempts_with_growing_delay() {
        let policy = RetryPolicy::default();
        let seen = recorder();

        let outcome = policy
            .execute(&Method::POST, "http://10.0.0.1:9000/", |_| {
                let seen = Arc::clone(&seen);
                async move {
                    seen.lock().unwrap().push(Instant::now());
                    Err(refused())
                }
            })
            .await;

        assert_eq!(outcome.attempts, 3);
        assert_eq!(outcome.result, Err(refused()));

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 3);
        let first_gap = seen[1] - seen[0];
        let second_gap = seen[2] - seen[1];
        assert!(first_gap >= Duration::from_millis(100));
        assert!(second_gap > first_gap);
    }

    #[tokio::test(start_paused = true)]
    async fn request_timeout_status_then_success() {
        let policy = RetryPolicy::default();

        let outcome = policy
            .execute(&Method::POST, "http://10.0.0.1/", |n| async move {
                if n == 1 {
                    Err(ForwardError::Status(StatusCode::REQUEST_TIMEOUT))
                } else {
                    Ok(StatusCode::OK)
                }
            })
            .await;

        assert_eq!(outcome.attempts, 2);
        assert_eq!(outcome.result, Ok(StatusCode::OK));
    }

    #[tokio::test(start_paused = true)]
    async fn server_error_is_terminal() {
        let policy = RetryPolicy::default();
        let seen = recorder();

        let outcome = policy
            .execute(&Method::GET, "http://10.0.0.1/", |_| {
                let seen = Arc::clone(&seen);
                async move {
                    seen.lock().unwrap().push(Instant::now());
                    Err(ForwardError::Status(StatusCode::INTERNAL_SERVER_ERROR))
                }
            })
            .await;

        assert_eq!(outcome.attempts, 1);
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn first_success_stops_immediately() {
        let policy = RetryPolicy::default();
        let outcome = policy
            .execute(&Method::DELETE, "http://10.0.0.1/", |_| async {
                Ok(StatusCode::NO_CONTENT)
            })
            .await;

        assert_eq!(outcome.attempts, 1);
        assert_eq!(outcome.result, Ok(StatusCode::NO_CONTENT));
    }
}
