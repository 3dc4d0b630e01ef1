//! Retry with exponential backoff and jitter.
//!
//! Status policy:
//! - 429, 502, 503 and 504 are retried.
//! - 2xx and 400 are returned at once. A 400 is never retried so that malformed
//!   requests surface instead of hiding behind backoff.
//! - Every other status is returned at once for the caller to handle.
//!
//! Delay before retry `n` (0-indexed) is `base * 2^n + U[0, 1)` seconds.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Method;
use serde_json::Value;
use tracing::Span;

use super::sleeper::{Sleeper, ThreadSleeper};
use crate::config::{RetryConfig, api};
use crate::error::{ClientError, ClientResult, is_retryable_status};
use crate::response::HttpResponse;

/// Retry ceiling and backoff for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_retries: u32,
    backoff: Duration,
}

impl RetryPolicy {
    /// Policy with an explicit ceiling and base backoff.
    #[must_use]
    pub const fn new(max_retries: u32, backoff: Duration) -> Self {
        Self { max_retries, backoff }
    }

    /// Policy for `method`: non-GET requests retry at most
    /// [`api::NON_GET_MAX_RETRIES`] times.
    #[must_use]
    pub fn for_method(method: &Method, config: &RetryConfig) -> Self {
        let max_retries = if *method == Method::GET {
            config.max_retries
        } else {
            config.max_retries.min(api::NON_GET_MAX_RETRIES)
        };
        Self::new(max_retries, config.backoff)
    }

    /// Retries allowed after the initial attempt.
    #[must_use]
    pub const fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Delay before retry `attempt` given a jitter sample in `[0, 1)`.
    #[must_use]
    pub fn backoff_delay(&self, attempt: u32, jitter: f64) -> Duration {
        let exponential = self.backoff.as_secs_f64() * 2f64.powi(attempt as i32);
        Duration::try_from_secs_f64(exponential + jitter.clamp(0.0, 1.0)).unwrap_or(Duration::MAX)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(api::DEFAULT_MAX_RETRIES, api::DEFAULT_BACKOFF)
    }
}

/// Runs one HTTP attempt repeatedly under a [`RetryPolicy`].
#[derive(Clone)]
pub struct RetryExecutor {
    policy: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
    span: Span,
}

impl RetryExecutor {
    /// Executor sleeping on the calling thread.
    #[must_use]
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            sleeper: Arc::new(ThreadSleeper),
            span: Span::none(),
        }
    }

    /// Replace the sleeper.
    #[must_use]
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Emit retry events inside `span`.
    #[must_use]
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// The policy in force.
    #[must_use]
    pub const fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Call `attempt` until it returns a terminal status or retries run out.
    ///
    /// Transport errors returned by `attempt` propagate immediately.
    pub fn execute<R, F>(&self, mut attempt: F) -> ClientResult<R>
    where
        R: HttpResponse,
        F: FnMut() -> ClientResult<R>,
    {
        let _entered = self.span.enter();
        let mut retry = 0;
        loop {
            let response = attempt()?;
            let status = response.status_code();

            if !is_retryable_status(status) {
                if retry > 0 {
                    tracing::debug!(status, retries = retry, "Request settled after retries");
                }
                return Ok(response);
            }

            if retry >= self.policy.max_retries {
                tracing::warn!(status, attempts = retry + 1, "Retries exhausted");
                let body = response
                    .json()
                    .unwrap_or_else(|_| Value::String(response.text().to_string()));
                return Err(ClientError::retries_exhausted(status, retry + 1, body));
            }

            let delay = self.policy.backoff_delay(retry, rand::random::<f64>());
            tracing::warn!(
                status,
                attempt = retry + 1,
                delay_ms = delay.as_millis() as u64,
                "Retryable status, backing off"
            );
            self.sleeper.sleep(delay);
            retry += 1;
        }
    }
}

impl std::fmt::Debug for RetryExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryExecutor").field("policy", &self.policy).finish()
    }
}
