//! # Data-Access Configuration System
//!
//! YAML-based configuration for the resilient data-access layer with
//! environment-specific overrides.
//!
//! ## Architecture
//!
//! - **Safe Defaults**: every field has a default, so a missing section or a
//!   missing file still yields a working layer
//! - **Environment Awareness**: `development` / `test` / `production` sections
//!   override the base values
//! - **Explicit Validation**: nonsensical values are rejected at load time
//!
//! ## Usage
//!
//! ```rust,no_run
//! use storefront_db::config::ConfigManager;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = ConfigManager::load()?;
//! let retries = manager.config().retry.max_retries;
//! let breaker = manager.config().circuit_breaker.to_resilience_config();
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod loader;

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::constants;

pub use error::{ConfigResult, ConfigurationError};
pub use loader::ConfigManager;

/// Root configuration structure mirroring storefront-db.yaml
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct DataAccessConfig {
    /// Database connection and pooling configuration
    pub database: DatabaseConfig,

    /// Retry and backoff configuration
    pub retry: RetryConfig,

    /// Circuit breaker thresholds for the database component
    pub circuit_breaker: CircuitBreakerConfig,

    /// Connection staleness and failure ceiling
    pub connection: ConnectionConfig,

    /// Health probe configuration
    pub health: HealthConfig,
}

/// Database connection and pooling configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_seconds: u64,
    pub idle_timeout_seconds: u64,
    /// Per-query timeout applied to every session
    pub query_timeout_ms: u64,
}

impl DatabaseConfig {
    /// Resolved database URL, falling back to `DATABASE_URL`
    pub fn database_url(&self) -> Option<String> {
        self.url
            .clone()
            .filter(|url| !url.is_empty())
            .or_else(|| std::env::var("DATABASE_URL").ok())
    }

    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_seconds)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_seconds)
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: 10,
            min_connections: 1,
            acquire_timeout_seconds: 10,
            idle_timeout_seconds: 300,
            query_timeout_ms: constants::health::QUERY_TIMEOUT_MS,
        }
    }
}

/// Retry and backoff configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_jitter_ms: u64,
}

impl RetryConfig {
    pub fn to_policy(&self) -> crate::resilience::RetryPolicy {
        crate::resilience::RetryPolicy {
            max_retries: self.max_retries,
            base_delay: Duration::from_millis(self.base_delay_ms),
            max_jitter: Duration::from_millis(self.max_jitter_ms),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: constants::retry::DEFAULT_MAX_RETRIES,
            base_delay_ms: constants::retry::BASE_DELAY_MS,
            max_jitter_ms: constants::retry::MAX_JITTER_MS,
        }
    }
}

/// Circuit breaker thresholds as written in YAML
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct CircuitBreakerConfig {
    pub failure_threshold: u32,
    pub timeout_seconds: u64,
    pub success_threshold: u32,
}

impl CircuitBreakerConfig {
    /// Convert to the runtime circuit breaker configuration
    pub fn to_resilience_config(&self) -> crate::resilience::config::CircuitBreakerConfig {
        crate::resilience::config::CircuitBreakerConfig {
            failure_threshold: self.failure_threshold,
            cool_down: Duration::from_secs(self.timeout_seconds),
            success_threshold: self.success_threshold,
        }
    }
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: constants::circuit_breaker::FAILURE_THRESHOLD,
            timeout_seconds: constants::circuit_breaker::TIMEOUT_SECONDS,
            success_threshold: constants::circuit_breaker::SUCCESS_THRESHOLD,
        }
    }
}

/// Connection staleness and failure ceiling
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ConnectionConfig {
    pub stale_threshold_ms: u64,
    pub max_consecutive_failures: u32,
}

impl ConnectionConfig {
    pub fn stale_threshold(&self) -> Duration {
        Duration::from_millis(self.stale_threshold_ms)
    }
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            stale_threshold_ms: constants::connection::STALE_THRESHOLD_MS,
            max_consecutive_failures: constants::connection::MAX_CONSECUTIVE_FAILURES,
        }
    }
}

/// Health probe configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct HealthConfig {
    pub quick_check_timeout_ms: u64,
    pub probe_query: String,
    pub version_query: String,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            quick_check_timeout_ms: constants::health::QUICK_CHECK_TIMEOUT_MS,
            probe_query: constants::health::PROBE_QUERY.to_string(),
            version_query: constants::health::VERSION_QUERY.to_string(),
        }
    }
}

impl DataAccessConfig {
    /// Validate configuration values
    pub fn validate(&self) -> ConfigResult<()> {
        let db = &self.database;
        if db.max_connections == 0 {
            return Err(ConfigurationError::invalid_value(
                "database.max_connections",
                "0",
                "must be greater than 0",
            ));
        }
        if db.min_connections > db.max_connections {
            return Err(ConfigurationError::invalid_value(
                "database.min_connections",
                db.min_connections.to_string(),
                format!("must not exceed max_connections ({})", db.max_connections),
            ));
        }
        if db.query_timeout_ms == 0 {
            return Err(ConfigurationError::invalid_value(
                "database.query_timeout_ms",
                "0",
                "must be greater than 0",
            ));
        }

        if self.retry.base_delay_ms == 0 {
            return Err(ConfigurationError::invalid_value(
                "retry.base_delay_ms",
                "0",
                "must be greater than 0",
            ));
        }
        if self.retry.max_jitter_ms == 0 {
            return Err(ConfigurationError::invalid_value(
                "retry.max_jitter_ms",
                "0",
                "jitter range must be non-empty",
            ));
        }

        self.circuit_breaker.to_resilience_config().validate()?;

        if self.connection.stale_threshold_ms == 0 {
            return Err(ConfigurationError::invalid_value(
                "connection.stale_threshold_ms",
                "0",
                "must be greater than 0",
            ));
        }
        if self.connection.max_consecutive_failures == 0 {
            return Err(ConfigurationError::invalid_value(
                "connection.max_consecutive_failures",
                "0",
                "must be greater than 0",
            ));
        }

        if self.health.quick_check_timeout_ms == 0
            || self.health.quick_check_timeout_ms >= db.query_timeout_ms
        {
            return Err(ConfigurationError::invalid_value(
                "health.quick_check_timeout_ms",
                self.health.quick_check_timeout_ms.to_string(),
                format!(
                    "must be greater than 0 and shorter than database.query_timeout_ms ({})",
                    db.query_timeout_ms
                ),
            ));
        }
        if self.health.probe_query.trim().is_empty() {
            return Err(ConfigurationError::invalid_value(
                "health.probe_query",
                "",
                "probe query must not be empty",
            ));
        }

        Ok(())
    }
}
