//! # Circuit Breaker Tuning
//!
//! Runtime thresholds for a [`super::CircuitBreaker`]. The YAML section that
//! produces these lives in [`crate::config::CircuitBreakerConfig`].

use std::time::Duration;

use crate::config::{ConfigResult, ConfigurationError};
use crate::constants::circuit_breaker as defaults;

/// Longest cool-down accepted from configuration
const MAX_COOL_DOWN: Duration = Duration::from_secs(600);

/// Thresholds for one circuit breaker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CircuitBreakerConfig {
    /// Consecutive failed operations that open a closed breaker
    pub failure_threshold: u32,

    /// Time an open breaker rejects calls before admitting a probe
    pub cool_down: Duration,

    /// Consecutive half-open successes that close the breaker
    pub success_threshold: u32,
}

impl CircuitBreakerConfig {
    /// 5 failures, 30 second cool-down, 2 probe successes
    pub const fn for_database() -> Self {
        Self {
            failure_threshold: defaults::FAILURE_THRESHOLD,
            cool_down: Duration::from_secs(defaults::TIMEOUT_SECONDS),
            success_threshold: defaults::SUCCESS_THRESHOLD,
        }
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.failure_threshold == 0 {
            return Err(ConfigurationError::invalid_value(
                "circuit_breaker.failure_threshold",
                "0",
                "a breaker that opens before any failure rejects every call",
            ));
        }

        if self.cool_down.is_zero() || self.cool_down > MAX_COOL_DOWN {
            return Err(ConfigurationError::invalid_value(
                "circuit_breaker.timeout_seconds",
                self.cool_down.as_secs().to_string(),
                format!("must be between 1 and {} seconds", MAX_COOL_DOWN.as_secs()),
            ));
        }

        if self.success_threshold == 0
            || self.success_threshold > self.failure_threshold.saturating_mul(10)
        {
            return Err(ConfigurationError::invalid_value(
                "circuit_breaker.success_threshold",
                self.success_threshold.to_string(),
                "must be at least 1 and not dwarf the failure threshold",
            ));
        }

        Ok(())
    }
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self::for_database()
    }
}
