//! # Resilience Module
//!
//! Failure handling for the shared database client: error classification,
//! retry with exponential backoff, a circuit breaker, connection staleness
//! tracking and pool metrics.
//!
//! ## Architecture
//!
//! - **Error Classifier**: sorts failures into fail-fast and retryable buckets
//! - **Retry Executor**: bounded retries with exponential backoff plus jitter
//! - **Circuit Breaker**: fails fast while the database is known to be down
//! - **Connection State Tracker**: last success, failure count, staleness
//! - **Pool Metrics**: success rate and average latency across all callers
//!
//! These pieces hold no global state. [`crate::database::UnifiedDataAccess`]
//! owns one instance of each and shares it between callers.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use storefront_db::resilience::{RetryExecutor, RetryPolicy};
//!
//! # async fn example() {
//! let executor = RetryExecutor::new(RetryPolicy::default());
//! let result = executor
//!     .execute(&(), || async { Ok::<_, String>("ok") }, 4, "load_catalog")
//!     .await;
//! # }
//! ```

pub mod circuit_breaker;
pub mod config;
pub mod connection_state;
pub mod error_classifier;
pub mod metrics;
pub mod retry;

pub use circuit_breaker::{CircuitBreaker, CircuitBreakerSnapshot, CircuitState};
pub use config::CircuitBreakerConfig;
pub use connection_state::{ConnectionDiagnostics, ConnectionStateTracker};
pub use error_classifier::{classify, classify_error, ClassifiableError, ErrorCategory};
pub use metrics::{PoolMetrics, PoolMetricsSnapshot};
pub use retry::{ResilienceError, RetryAttempt, RetryExecutor, RetryObserver, RetryPolicy};
