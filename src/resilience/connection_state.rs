//! # Connection State Tracking
//!
//! Remembers when the database last answered successfully and how many
//! operations have failed since. A connection unused for longer than the stale
//! threshold gets a warm-up probe before the next burst of work.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use std::time::Duration;
use tokio::time::Instant;

use crate::resilience::CircuitState;

#[derive(Debug, Default)]
struct TrackerState {
    last_success: Option<(Instant, DateTime<Utc>)>,
    consecutive_failures: u32,
}

/// Read-only diagnostics snapshot
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionDiagnostics {
    /// `None` when the database has never answered
    pub last_successful_connection: Option<DateTime<Utc>>,
    /// `None` when the database has never answered
    pub time_since_last_success_ms: Option<u64>,
    pub consecutive_failures: u32,
    pub is_stale: bool,
    /// Retries are refused once the failure ceiling is reached
    pub at_failure_ceiling: bool,
    pub circuit_breaker_state: CircuitState,
}

/// Shared tracker for the database connection
#[derive(Debug)]
pub struct ConnectionStateTracker {
    state: Mutex<TrackerState>,
    stale_threshold: Duration,
    max_consecutive_failures: u32,
}

impl ConnectionStateTracker {
    pub fn new(stale_threshold: Duration, max_consecutive_failures: u32) -> Self {
        Self {
            state: Mutex::new(TrackerState::default()),
            stale_threshold,
            max_consecutive_failures,
        }
    }

    pub fn record_success(&self) {
        let mut state = self.state.lock();
        state.last_success = Some((Instant::now(), Utc::now()));
        state.consecutive_failures = 0;
    }

    pub fn record_failure(&self) {
        let mut state = self.state.lock();
        state.consecutive_failures = state.consecutive_failures.saturating_add(1);
    }

    /// Clear the failure count; the last success timestamp is kept
    pub fn reset(&self) {
        self.state.lock().consecutive_failures = 0;
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.state.lock().consecutive_failures
    }

    /// Stale when the last success is older than the threshold.
    /// A tracker that never saw a success is not stale.
    pub fn is_stale(&self) -> bool {
        let state = self.state.lock();
        Self::stale(&state, self.stale_threshold)
    }

    /// Whether further retries should be refused
    pub fn at_failure_ceiling(&self) -> bool {
        self.state.lock().consecutive_failures >= self.max_consecutive_failures
    }

    pub fn diagnostics(&self, circuit_breaker_state: CircuitState) -> ConnectionDiagnostics {
        let state = self.state.lock();
        ConnectionDiagnostics {
            last_successful_connection: state.last_success.map(|(_, at)| at),
            time_since_last_success_ms: state
                .last_success
                .map(|(instant, _)| instant.elapsed().as_millis() as u64),
            consecutive_failures: state.consecutive_failures,
            is_stale: Self::stale(&state, self.stale_threshold),
            at_failure_ceiling: state.consecutive_failures >= self.max_consecutive_failures,
            circuit_breaker_state,
        }
    }

    fn stale(state: &TrackerState, threshold: Duration) -> bool {
        state
            .last_success
            .is_some_and(|(instant, _)| instant.elapsed() > threshold)
    }
}
