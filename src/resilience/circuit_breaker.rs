//! # Circuit Breaker Implementation
//!
//! Stops issuing calls to a database that is known to be down, then probes
//! for recovery without manual intervention. Three states:
//! Closed (normal operation), Open (failing fast), and Half-Open (testing recovery).
//!
//! The breaker only does bookkeeping. Callers ask [`CircuitBreaker::try_acquire`]
//! before running an operation and report the outcome with
//! [`CircuitBreaker::record_success`] / [`CircuitBreaker::record_failure`].
//! The lock is never held across an `.await`.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::resilience::CircuitBreakerConfig;

/// Circuit breaker states representing the current operational mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CircuitState {
    /// Normal operation - all calls are allowed through
    Closed,
    /// Failure mode - all calls fail fast without executing
    Open,
    /// Testing recovery - limited calls allowed to test system health
    HalfOpen,
}

impl fmt::Display for CircuitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CircuitState::Closed => write!(f, "CLOSED"),
            CircuitState::Open => write!(f, "OPEN"),
            CircuitState::HalfOpen => write!(f, "HALF_OPEN"),
        }
    }
}

#[derive(Debug)]
struct BreakerState {
    state: CircuitState,
    consecutive_failures: u32,
    half_open_successes: u32,
    /// Trial calls admitted in the current half-open round
    half_open_calls: u32,
    half_open_since: Option<Instant>,
    opened_at: Option<Instant>,
    opened_at_utc: Option<DateTime<Utc>>,
    total_trips: u64,
}

impl BreakerState {
    fn new() -> Self {
        Self {
            state: CircuitState::Closed,
            consecutive_failures: 0,
            half_open_successes: 0,
            half_open_calls: 0,
            half_open_since: None,
            opened_at: None,
            opened_at_utc: None,
            total_trips: 0,
        }
    }
}

/// Point-in-time view of the breaker, shaped for health payloads
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CircuitBreakerSnapshot {
    pub state: CircuitState,
    #[serde(rename = "failures")]
    pub consecutive_failures: u32,
    pub total_trips: u64,
    pub opened_at: Option<DateTime<Utc>>,
    /// Remaining cool-down while open, in milliseconds
    pub retry_after_ms: Option<u64>,
}

/// Circuit breaker guarding the shared database client
#[derive(Debug)]
pub struct CircuitBreaker {
    /// Component name for logging
    name: String,

    /// Configuration parameters
    config: CircuitBreakerConfig,

    state: Mutex<BreakerState>,
}

impl CircuitBreaker {
    /// Create a new circuit breaker with the given name and configuration
    pub fn new(name: impl Into<String>, config: CircuitBreakerConfig) -> Self {
        let name = name.into();
        info!(
            component = %name,
            failure_threshold = config.failure_threshold,
            cool_down_secs = config.cool_down.as_secs(),
            success_threshold = config.success_threshold,
            "🛡️ Circuit breaker initialized"
        );

        Self {
            name,
            config,
            state: Mutex::new(BreakerState::new()),
        }
    }

    /// Get component name
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }

    /// Get current circuit state
    pub fn state(&self) -> CircuitState {
        self.state.lock().state
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.state.lock().consecutive_failures
    }

    pub fn total_trips(&self) -> u64 {
        self.state.lock().total_trips
    }

    /// Ask permission to run an operation
    ///
    /// Returns the remaining cool-down when the call must be rejected. An open
    /// breaker whose cool-down has elapsed moves to half-open and admits the call.
    /// Half-open admits at most `success_threshold` trial calls per round; a
    /// round whose trials never report back is restarted after one cool-down.
    pub fn try_acquire(&self) -> Result<(), Duration> {
        let mut inner = self.state.lock();
        match inner.state {
            CircuitState::Closed => Ok(()),
            CircuitState::Open => {
                let Some(opened_at) = inner.opened_at else {
                    // Unreachable while the Open => opened_at invariant holds
                    warn!(component = %self.name, "Circuit open but no timestamp recorded");
                    self.transition_to_half_open(&mut inner);
                    return Ok(());
                };

                let elapsed = opened_at.elapsed();
                if elapsed >= self.config.cool_down {
                    self.transition_to_half_open(&mut inner);
                    Ok(())
                } else {
                    Err(self.config.cool_down - elapsed)
                }
            }
            CircuitState::HalfOpen => {
                if inner.half_open_calls < self.config.success_threshold {
                    inner.half_open_calls += 1;
                    return Ok(());
                }

                let stalled = inner
                    .half_open_since
                    .is_some_and(|since| since.elapsed() >= self.config.cool_down);
                if stalled {
                    warn!(
                        component = %self.name,
                        "Half-open trials never reported back, restarting round"
                    );
                    self.transition_to_half_open(&mut inner);
                    Ok(())
                } else {
                    Err(Duration::ZERO)
                }
            }
        }
    }

    /// Hand back a half-open slot taken by a call that neither succeeded nor
    /// failed against the database (a business error)
    pub fn release(&self) {
        let mut inner = self.state.lock();
        if inner.state == CircuitState::HalfOpen {
            inner.half_open_calls = inner.half_open_calls.saturating_sub(1);
        }
    }

    /// Record a successful operation
    pub fn record_success(&self) {
        let mut inner = self.state.lock();
        inner.consecutive_failures = 0;

        match inner.state {
            CircuitState::Closed => {
                debug!(component = %self.name, "🟢 Operation succeeded");
            }
            CircuitState::HalfOpen => {
                inner.half_open_successes += 1;
                debug!(
                    component = %self.name,
                    half_open_successes = inner.half_open_successes,
                    success_threshold = self.config.success_threshold,
                    "🟡 Half-open probe succeeded"
                );
                if inner.half_open_successes >= self.config.success_threshold {
                    self.transition_to_closed(&mut inner);
                }
            }
            CircuitState::Open => {
                // A call admitted before the breaker tripped finished late
                warn!(component = %self.name, "Success recorded while circuit is open");
            }
        }
    }

    /// Record a failed operation
    pub fn record_failure(&self) {
        let mut inner = self.state.lock();
        inner.consecutive_failures = inner.consecutive_failures.saturating_add(1);

        match inner.state {
            CircuitState::Closed => {
                if inner.consecutive_failures >= self.config.failure_threshold {
                    inner.total_trips += 1;
                    self.transition_to_open(&mut inner);
                } else {
                    debug!(
                        component = %self.name,
                        consecutive_failures = inner.consecutive_failures,
                        failure_threshold = self.config.failure_threshold,
                        "🔴 Operation failed"
                    );
                }
            }
            CircuitState::HalfOpen => {
                // Any failure in half-open state immediately opens circuit
                self.transition_to_open(&mut inner);
            }
            CircuitState::Open => {}
        }
    }

    /// Force circuit to open state (for emergency situations)
    pub fn force_open(&self) {
        warn!(component = %self.name, "🚨 Circuit breaker forced open");
        let mut inner = self.state.lock();
        if inner.state == CircuitState::Closed {
            inner.total_trips += 1;
        }
        self.transition_to_open(&mut inner);
    }

    /// Force circuit to closed state (for emergency recovery)
    pub fn force_closed(&self) {
        warn!(component = %self.name, "🚨 Circuit breaker forced closed");
        let mut inner = self.state.lock();
        self.transition_to_closed(&mut inner);
    }

    /// Get current snapshot
    pub fn snapshot(&self) -> CircuitBreakerSnapshot {
        let inner = self.state.lock();
        let retry_after_ms = match (inner.state, inner.opened_at) {
            (CircuitState::Open, Some(opened_at)) => Some(
                self.config
                    .cool_down
                    .saturating_sub(opened_at.elapsed())
                    .as_millis() as u64,
            ),
            _ => None,
        };

        CircuitBreakerSnapshot {
            state: inner.state,
            consecutive_failures: inner.consecutive_failures,
            total_trips: inner.total_trips,
            opened_at: inner.opened_at_utc,
            retry_after_ms,
        }
    }

    fn transition_to_closed(&self, inner: &mut BreakerState) {
        inner.state = CircuitState::Closed;
        inner.consecutive_failures = 0;
        inner.half_open_successes = 0;
        inner.half_open_calls = 0;
        inner.half_open_since = None;
        inner.opened_at = None;
        inner.opened_at_utc = None;

        info!(
            component = %self.name,
            total_trips = inner.total_trips,
            "🟢 Circuit breaker closed (recovered)"
        );
    }

    fn transition_to_open(&self, inner: &mut BreakerState) {
        inner.state = CircuitState::Open;
        inner.half_open_successes = 0;
        inner.half_open_calls = 0;
        inner.half_open_since = None;
        inner.opened_at = Some(Instant::now());
        inner.opened_at_utc = Some(Utc::now());

        error!(
            component = %self.name,
            consecutive_failures = inner.consecutive_failures,
            failure_threshold = self.config.failure_threshold,
            cool_down_secs = self.config.cool_down.as_secs(),
            total_trips = inner.total_trips,
            "🔴 Circuit breaker opened (failing fast)"
        );
    }

    fn transition_to_half_open(&self, inner: &mut BreakerState) {
        inner.state = CircuitState::HalfOpen;
        inner.half_open_successes = 0;
        // The call that triggered the transition is the first trial
        inner.half_open_calls = 1;
        inner.half_open_since = Some(Instant::now());

        info!(
            component = %self.name,
            success_threshold = self.config.success_threshold,
            "🟡 Circuit breaker half-open (testing recovery)"
        );
    }
}
