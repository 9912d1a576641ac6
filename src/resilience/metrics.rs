//! # Pool Metrics
//!
//! Aggregated success/failure/latency counters for database attempts. This is
//! an approximate health signal, separate from the circuit breaker's binary
//! go/no-go state.
//!
//! Writers use `Relaxed` atomics on the hot path; readers take a snapshot
//! that may be slightly stale but never goes backwards.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Atomic attempt counters shared by every caller of the data-access layer
#[derive(Debug, Default)]
pub struct PoolMetrics {
    successes: AtomicU64,
    failures: AtomicU64,
    total_latency_ms: AtomicU64,
}

impl PoolMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a successful attempt and its latency
    #[inline]
    pub fn record_success(&self, latency: Duration) {
        self.successes.fetch_add(1, Ordering::Relaxed);
        self.total_latency_ms
            .fetch_add(latency.as_millis() as u64, Ordering::Relaxed);
    }

    /// Record a failed attempt
    #[inline]
    pub fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Zero every counter
    pub fn reset(&self) {
        self.successes.store(0, Ordering::Relaxed);
        self.failures.store(0, Ordering::Relaxed);
        self.total_latency_ms.store(0, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> PoolMetricsSnapshot {
        PoolMetricsSnapshot::from_counts(
            self.successes.load(Ordering::Relaxed),
            self.failures.load(Ordering::Relaxed),
            self.total_latency_ms.load(Ordering::Relaxed),
        )
    }
}

/// Point-in-time view of [`PoolMetrics`] with derived rates
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolMetricsSnapshot {
    pub successes: u64,
    pub failures: u64,
    pub total_latency_ms: u64,
    /// 1.0 before any attempt has been recorded
    pub success_rate: f64,
    /// 0.0 before any success has been recorded
    pub avg_latency_ms: f64,
    pub total_attempts: u64,
}

impl PoolMetricsSnapshot {
    pub fn from_counts(successes: u64, failures: u64, total_latency_ms: u64) -> Self {
        let total_attempts = successes + failures;
        let success_rate = if total_attempts == 0 {
            1.0
        } else {
            successes as f64 / total_attempts as f64
        };
        let avg_latency_ms = if successes == 0 {
            0.0
        } else {
            total_latency_ms as f64 / successes as f64
        };

        Self {
            successes,
            failures,
            total_latency_ms,
            success_rate,
            avg_latency_ms,
            total_attempts,
        }
    }

    /// Format metrics for logging
    pub fn format_summary(&self) -> String {
        format!(
            "Attempts: {} | Success: {:.1}% | Failures: {} | Avg Latency: {:.2}ms",
            self.total_attempts,
            self.success_rate * 100.0,
            self.failures,
            self.avg_latency_ms
        )
    }
}
