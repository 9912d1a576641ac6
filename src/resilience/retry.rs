//! # Retry Executor
//!
//! Bounded retries with exponential backoff and jitter, driven by the error
//! classifier.
//!
//! ## Backoff Schedule (defaults)
//!
//! | Retry | Base delay | With jitter      |
//! |-------|-----------:|------------------|
//! | 1     | 2000ms     | 2000–2499ms      |
//! | 2     | 4000ms     | 4000–4499ms      |
//! | 3     | 8000ms     | 8000–8499ms      |
//! | 4     | 16000ms    | 16000–16499ms    |
//!
//! Auth failures fail fast and count as infrastructure failures. Business
//! errors fail fast and leave every counter untouched. Everything else is
//! retried until the budget runs out.

use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::constants;
use crate::resilience::error_classifier::{classify_error, ClassifiableError, ErrorCategory};

/// Retry budget and backoff shape
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    pub base_delay: Duration,
    /// Exclusive upper bound of the random jitter
    pub max_jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: constants::retry::DEFAULT_MAX_RETRIES,
            base_delay: Duration::from_millis(constants::retry::BASE_DELAY_MS),
            max_jitter: Duration::from_millis(constants::retry::MAX_JITTER_MS),
        }
    }
}

impl RetryPolicy {
    /// `base_delay * 2^attempt`, without jitter, saturating at `Duration::MAX`
    pub fn base_delay_for(&self, attempt: u32) -> Duration {
        2u32.checked_pow(attempt)
            .and_then(|factor| self.base_delay.checked_mul(factor))
            .unwrap_or(Duration::MAX)
    }

    /// Uniform random jitter in `[0, max_jitter)` at millisecond granularity
    pub fn jitter(&self) -> Duration {
        let max_ms = self.max_jitter.as_millis() as u64;
        if max_ms == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(fastrand::u64(0..max_ms))
    }

    /// Delay slept before the retry that follows failed `attempt` (0-based)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay_for(attempt).saturating_add(self.jitter())
    }
}

/// State of one attempt inside a retry loop, for logging
#[derive(Debug, Clone)]
pub struct RetryAttempt<'a> {
    /// 0-based
    pub attempt_number: u32,
    pub max_retries: u32,
    pub operation_name: &'a str,
    pub last_error: String,
}

/// Failure surfaced by the resilient wrapper
///
/// The original operation error is returned untouched inside `Failed`.
#[derive(Debug, Error)]
pub enum ResilienceError<E> {
    /// Rejected by the circuit breaker; the operation never ran
    #[error("Circuit breaker is open for {component} (retry after {retry_after_ms}ms)")]
    CircuitOpen {
        component: String,
        retry_after_ms: u64,
    },

    /// The operation ran and its final error is attached
    #[error("{operation} failed after {attempts} attempt(s) [{category}]: {error}")]
    Failed {
        operation: String,
        category: ErrorCategory,
        attempts: u32,
        error: E,
    },
}

impl<E> ResilienceError<E> {
    /// Classification of the final error; `None` for a circuit-open rejection
    pub fn category(&self) -> Option<ErrorCategory> {
        match self {
            ResilienceError::CircuitOpen { .. } => None,
            ResilienceError::Failed { category, .. } => Some(*category),
        }
    }

    pub fn is_circuit_open(&self) -> bool {
        matches!(self, ResilienceError::CircuitOpen { .. })
    }

    /// Whether a read path may replace this failure with a fallback value
    pub fn is_connection_related(&self) -> bool {
        match self {
            ResilienceError::CircuitOpen { .. } => true,
            ResilienceError::Failed { category, .. } => category.is_connection_related(),
        }
    }

    /// Number of times the operation was invoked
    pub fn attempts(&self) -> u32 {
        match self {
            ResilienceError::CircuitOpen { .. } => 0,
            ResilienceError::Failed { attempts, .. } => *attempts,
        }
    }

    pub fn inner(&self) -> Option<&E> {
        match self {
            ResilienceError::CircuitOpen { .. } => None,
            ResilienceError::Failed { error, .. } => Some(error),
        }
    }

    pub fn into_inner(self) -> Option<E> {
        match self {
            ResilienceError::CircuitOpen { .. } => None,
            ResilienceError::Failed { error, .. } => Some(error),
        }
    }
}

/// Bookkeeping hooks invoked by the retry loop
///
/// Attempt hooks fire for every invocation, operation hooks once per call.
/// Business errors fire no hook at all.
pub trait RetryObserver: Send + Sync {
    fn on_attempt_success(&self, _latency: Duration) {}

    fn on_attempt_failure(&self, _category: ErrorCategory) {}

    fn on_operation_success(&self) {}

    fn on_operation_failure(&self, _category: ErrorCategory) {}

    /// When true, remaining retries are abandoned
    fn retries_suspended(&self) -> bool {
        false
    }
}

/// Observer that records nothing
impl RetryObserver for () {}

/// Runs an operation under a [`RetryPolicy`]
#[derive(Debug, Clone, Copy, Default)]
pub struct RetryExecutor {
    policy: RetryPolicy,
}

impl RetryExecutor {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Run `operation` with up to `max_retries` retries
    pub async fn execute<T, E, F, Fut, O>(
        &self,
        observer: &O,
        mut operation: F,
        max_retries: u32,
        operation_name: &str,
    ) -> Result<T, ResilienceError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: ClassifiableError,
        O: RetryObserver + ?Sized,
    {
        let mut attempt: u32 = 0;

        loop {
            let started = Instant::now();
            let error = match operation().await {
                Ok(value) => {
                    observer.on_attempt_success(started.elapsed());
                    observer.on_operation_success();
                    if attempt > 0 {
                        info!(
                            operation = operation_name,
                            attempts = attempt + 1,
                            "✅ Database operation recovered after retry"
                        );
                    }
                    return Ok(value);
                }
                Err(error) => error,
            };

            let category = classify_error(&error);
            let current = RetryAttempt {
                attempt_number: attempt,
                max_retries,
                operation_name,
                last_error: error.error_message().into_owned(),
            };
            let attempts = attempt + 1;
            let failed = move |error: E| ResilienceError::Failed {
                operation: operation_name.to_string(),
                category,
                attempts,
                error,
            };

            match category {
                ErrorCategory::NonRetryable => {
                    debug!(
                        operation = operation_name,
                        error = %current.last_error,
                        "Non-retryable database error, propagating"
                    );
                    return Err(failed(error));
                }
                ErrorCategory::PermanentAuth => {
                    observer.on_attempt_failure(category);
                    observer.on_operation_failure(category);
                    error!(
                        operation = operation_name,
                        error = %current.last_error,
                        "🔐 Database authentication failed, not retrying"
                    );
                    return Err(failed(error));
                }
                _ => {
                    observer.on_attempt_failure(category);

                    if attempt >= max_retries || observer.retries_suspended() {
                        observer.on_operation_failure(category);
                        error!(
                            operation = operation_name,
                            attempts = attempt + 1,
                            max_retries = max_retries,
                            category = %category,
                            suspended = attempt < max_retries,
                            error = %current.last_error,
                            "❌ Database operation failed, retries exhausted"
                        );
                        return Err(failed(error));
                    }

                    let delay = self.policy.delay_for(attempt);
                    log_retry(&current, category, delay);
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

fn log_retry(attempt: &RetryAttempt<'_>, category: ErrorCategory, delay: Duration) {
    warn!(
        operation = attempt.operation_name,
        attempt = attempt.attempt_number + 1,
        max_attempts = attempt.max_retries + 1,
        category = %category,
        delay_ms = delay.as_millis() as u64,
        error = %attempt.last_error,
        "🔄 Retrying database operation"
    );
}
