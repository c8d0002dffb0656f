//! Generic exponential-backoff retry engine and HTTP/provider error
//! classifiers.
//!
//! The engine is agnostic of what `op` does: a single invocation of
//! [`retry`] is sequential, and callers running several retry loops
//! concurrently get independence for free since each call owns its own
//! state.

pub mod classify;

pub use classify::{classify_anthropic_error, classify_http_error, classify_openai_error};

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

/// The two-class error taxonomy the retry engine dispatches on.
#[derive(Debug, thiserror::Error, Clone)]
pub enum RetryError {
    /// Transient; the engine will retry while attempts remain.
    #[error("{0}")]
    Retryable(String),
    /// Permanent; the engine rethrows immediately, consuming no attempts.
    #[error("{0}")]
    NonRetryable(String),
}

impl From<RetryError> for nf_domain::Error {
    fn from(e: RetryError) -> Self {
        match e {
            RetryError::Retryable(m) => nf_domain::Error::Retryable(m),
            RetryError::NonRetryable(m) => nf_domain::Error::NonRetryable(m),
        }
    }
}

/// Parameters controlling backoff timing. `max_retries` additional attempts
/// are permitted beyond the first call, so the total attempt count is
/// `max_retries + 1`.
#[derive(Debug, Clone, Copy)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub exponential_base: f64,
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
            exponential_base: 2.0,
            jitter: true,
        }
    }
}

impl RetryConfig {
    /// The delay before the attempt numbered `attempt` (0-indexed),
    /// `min(initial_delay * base^attempt, max_delay)`, before jitter.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let base_ms = self.initial_delay.as_millis() as f64;
        let raw = base_ms * self.exponential_base.powi(attempt as i32);
        let capped = raw.min(self.max_delay.as_millis() as f64);
        Duration::from_millis(capped.max(0.0) as u64)
    }
}

/// Executes `op`, retrying on [`RetryError::Retryable`] failures with
/// exponential backoff and optional jitter.
///
/// - Attempt 0 is the first call; `max_retries = N` permits `N + 1` total
///   attempts.
/// - A [`RetryError::NonRetryable`] failure is rethrown immediately,
///   consuming no attempts.
/// - On exhausting the retry budget, the last error is returned.
/// - `cancel`, if supplied, interrupts a pending backoff sleep and returns
///   the last observed error immediately rather than waiting it out.
pub async fn retry<F, Fut, T>(
    mut op: F,
    config: RetryConfig,
    cancel: Option<&CancellationToken>,
) -> Result<T, RetryError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, RetryError>>,
{
    let total_attempts = config.max_retries + 1;
    let mut last_error: Option<RetryError> = None;

    for attempt in 0..total_attempts {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err @ RetryError::NonRetryable(_)) => {
                tracing::warn!(attempt, error = %err, "non-retryable error, aborting");
                return Err(err);
            }
            Err(err) => {
                if attempt + 1 == total_attempts {
                    tracing::error!(attempts = total_attempts, error = %err, "retry budget exhausted");
                    return Err(err);
                }

                let mut delay = config.delay_for_attempt(attempt);
                if config.jitter {
                    let factor = 0.5 + rand::random::<f64>() * 0.5;
                    delay = delay.mul_f64(factor);
                }

                tracing::warn!(attempt, delay_ms = delay.as_millis() as u64, error = %err, "retrying after backoff");
                last_error = Some(err);

                match cancel {
                    Some(token) => {
                        tokio::select! {
                            _ = tokio::time::sleep(delay) => {}
                            _ = token.cancelled() => {
                                return Err(last_error.expect("set above"));
                            }
                        }
                    }
                    None => tokio::time::sleep(delay).await,
                }
            }
        }
    }

    // Unreachable: the loop above always returns before exhausting its
    // range, but the compiler can't see that without this fallback.
    Err(last_error.unwrap_or_else(|| RetryError::Retryable("retry loop exited unexpectedly".into())))
}
