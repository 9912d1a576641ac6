//! # Data-Access Constants
//!
//! Default tuning values for the resilient data-access layer. Every value here
//! can be overridden through [`crate::config::DataAccessConfig`]; these are the
//! numbers used when no configuration file is present.

/// Retry defaults
pub mod retry {
    /// Retries after the first attempt (five attempts in total)
    pub const DEFAULT_MAX_RETRIES: u32 = 4;

    /// Base delay doubled on every retry: 2s, 4s, 8s, 16s
    pub const BASE_DELAY_MS: u64 = 2_000;

    /// Exclusive upper bound of the random jitter added to each delay
    pub const MAX_JITTER_MS: u64 = 500;
}

/// Circuit breaker defaults for the database component
pub mod circuit_breaker {
    pub const COMPONENT_NAME: &str = "database";

    /// Consecutive failed operations before the breaker opens
    pub const FAILURE_THRESHOLD: u32 = 5;

    /// Cool-down spent in the open state before probing
    pub const TIMEOUT_SECONDS: u64 = 30;

    /// Consecutive half-open successes needed to close again
    pub const SUCCESS_THRESHOLD: u32 = 2;
}

/// Connection tracking defaults
pub mod connection {
    /// A connection unused for longer than this is stale
    pub const STALE_THRESHOLD_MS: u64 = 60_000;

    /// Consecutive failures after which further retries are refused
    pub const MAX_CONSECUTIVE_FAILURES: u32 = 5;
}

/// Health probe defaults
pub mod health {
    /// Quick health check budget, far below the query timeout
    pub const QUICK_CHECK_TIMEOUT_MS: u64 = 5_000;

    /// Per-query timeout applied to the database session
    pub const QUERY_TIMEOUT_MS: u64 = 120_000;

    pub const PROBE_QUERY: &str = "SELECT 1";
    pub const VERSION_QUERY: &str = "SELECT version()";
}
