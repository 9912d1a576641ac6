//! # Unified Data Access
//!
//! The resilient wrapper every route handler and background job goes through
//! to reach the database. It composes the retry executor, the circuit breaker,
//! the connection state tracker and pool metrics around the shared
//! [`DatabaseClient`].
//!
//! One instance is built at bootstrap and cloned into whoever needs it. Clones
//! share the same breaker, tracker and metrics, so every caller observes and
//! updates the same state.

use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::config::{ConfigManager, DataAccessConfig};
use crate::constants;
use crate::database::client::{DatabaseClient, PgDatabaseClient};
use crate::error::{Result, StorefrontDbError};
use crate::logging::{log_database_operation, log_error};
use crate::resilience::{
    classify_error, CircuitBreaker, CircuitBreakerSnapshot, CircuitState, ClassifiableError,
    ConnectionDiagnostics, ConnectionStateTracker, ErrorCategory, PoolMetrics,
    PoolMetricsSnapshot, ResilienceError, RetryExecutor, RetryObserver,
};

const DEFAULT_OPERATION_NAME: &str = "database_operation";

/// Outcome of [`UnifiedDataAccess::quick_health_check`]
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuickHealthCheck {
    pub healthy: bool,
    pub latency_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Outcome of [`UnifiedDataAccess::get_health_status`]
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthStatus {
    pub connected: bool,
    #[serde(rename = "latency")]
    pub latency_ms: u64,
    /// Database server version reported by the probe
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub circuit_breaker: CircuitBreakerSnapshot,
    pub pool_metrics: PoolMetricsSnapshot,
}

/// Breaker, tracker and metrics shared by every clone of the wrapper
#[derive(Debug)]
struct SharedState {
    circuit_breaker: CircuitBreaker,
    tracker: ConnectionStateTracker,
    metrics: PoolMetrics,
}

impl RetryObserver for SharedState {
    fn on_attempt_success(&self, latency: Duration) {
        self.metrics.record_success(latency);
    }

    fn on_attempt_failure(&self, _category: ErrorCategory) {
        self.metrics.record_failure();
    }

    fn on_operation_success(&self) {
        self.tracker.record_success();
        self.circuit_breaker.record_success();
    }

    fn on_operation_failure(&self, _category: ErrorCategory) {
        self.tracker.record_failure();
        self.circuit_breaker.record_failure();
    }

    fn retries_suspended(&self) -> bool {
        self.tracker.at_failure_ceiling() || self.circuit_breaker.state() == CircuitState::Open
    }
}

/// Resilient wrapper around the shared database client
#[derive(Debug, Clone)]
pub struct UnifiedDataAccess {
    client: Arc<dyn DatabaseClient>,
    state: Arc<SharedState>,
    executor: RetryExecutor,
    config: Arc<DataAccessConfig>,
}

impl UnifiedDataAccess {
    /// Wrap an injected client
    pub fn new(client: Arc<dyn DatabaseClient>, config: DataAccessConfig) -> Self {
        let state = SharedState {
            circuit_breaker: CircuitBreaker::new(
                constants::circuit_breaker::COMPONENT_NAME,
                config.circuit_breaker.to_resilience_config(),
            ),
            tracker: ConnectionStateTracker::new(
                config.connection.stale_threshold(),
                config.connection.max_consecutive_failures,
            ),
            metrics: PoolMetrics::new(),
        };

        Self {
            client,
            state: Arc::new(state),
            executor: RetryExecutor::new(config.retry.to_policy()),
            config: Arc::new(config),
        }
    }

    /// Build the PostgreSQL client from configuration and connect it
    ///
    /// The initial connect goes through the retry path, so a database that is
    /// still starting up does not fail the whole process.
    pub async fn connect(config_manager: &ConfigManager) -> Result<Self> {
        let config = config_manager.config().clone();
        config.validate()?;

        let client = PgDatabaseClient::new(&config.database)?;
        let data_access = Self::new(Arc::new(client), config);

        let client = Arc::clone(&data_access.client);
        data_access
            .with_retry_named(
                || client.connect(),
                data_access.config.retry.max_retries,
                "connect",
            )
            .await
            .map_err(|e| StorefrontDbError::DatabaseError(e.to_string()))?;

        info!(
            environment = config_manager.environment(),
            "✅ Unified data access connected"
        );
        Ok(data_access)
    }

    pub fn client(&self) -> &Arc<dyn DatabaseClient> {
        &self.client
    }

    pub fn config(&self) -> &DataAccessConfig {
        &self.config
    }

    /// Probe the database ahead of a burst of work
    ///
    /// Returns `true` without probing while a recent success is on record.
    /// Never returns an error: a failed probe or a breaker that is not closed
    /// yields `false`. Warm-up never changes breaker state; recovery from
    /// open is probed by real operations only.
    pub async fn warm_connection(&self) -> bool {
        let diagnostics = self.connection_diagnostics();
        if diagnostics.last_successful_connection.is_some() && !diagnostics.is_stale {
            return true;
        }

        let breaker_state = self.state.circuit_breaker.state();
        if breaker_state != CircuitState::Closed {
            debug!(
                circuit_state = %breaker_state,
                "Skipping connection warm-up while circuit breaker is not closed"
            );
            return false;
        }

        let started = Instant::now();
        match self.client.execute_query(&self.config.health.probe_query).await {
            Ok(_) => {
                let latency = started.elapsed();
                self.state.on_attempt_success(latency);
                self.state.tracker.record_success();
                debug!(
                    latency_ms = latency.as_millis() as u64,
                    "🔥 Database connection warmed"
                );
                true
            }
            Err(error) => {
                // Counted as an attempt only; the real operation that follows
                // decides whether the breaker sees a failure.
                let category = classify_error(&error);
                if category.counts_as_infrastructure_failure() {
                    self.state.on_attempt_failure(category);
                }
                warn!(category = %category, error = %error, "Connection warm-up failed");
                false
            }
        }
    }

    /// Run `operation` with the default retry budget
    pub async fn with_retry<T, E, F, Fut>(
        &self,
        operation: F,
    ) -> std::result::Result<T, ResilienceError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
        E: ClassifiableError,
    {
        self.with_retry_named(
            operation,
            self.config.retry.max_retries,
            DEFAULT_OPERATION_NAME,
        )
        .await
    }

    /// Run `operation` through the circuit breaker and retry executor
    ///
    /// An open breaker rejects the call before the operation runs and without
    /// touching the retry budget.
    pub async fn with_retry_named<T, E, F, Fut>(
        &self,
        operation: F,
        max_retries: u32,
        operation_name: &str,
    ) -> std::result::Result<T, ResilienceError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
        E: ClassifiableError,
    {
        if let Err(retry_after) = self.state.circuit_breaker.try_acquire() {
            let retry_after_ms = retry_after.as_millis() as u64;
            warn!(
                operation = operation_name,
                retry_after_ms = retry_after_ms,
                "⛔ Circuit breaker open, rejecting database operation"
            );
            return Err(ResilienceError::CircuitOpen {
                component: self.state.circuit_breaker.name().to_string(),
                retry_after_ms,
            });
        }

        let started = Instant::now();
        let result = self
            .executor
            .execute(&*self.state, operation, max_retries, operation_name)
            .await;
        let duration_ms = Some(started.elapsed().as_millis() as u64);

        match &result {
            Ok(_) => debug!(
                operation = operation_name,
                duration_ms = duration_ms,
                "Database operation succeeded"
            ),
            Err(error) => {
                if error.category() == Some(ErrorCategory::NonRetryable) {
                    // The database answered; free the trial slot for another caller
                    self.state.circuit_breaker.release();
                }
                let category = error.category().map(|c| c.as_str());
                log_database_operation(
                    operation_name,
                    "failed",
                    error.attempts(),
                    duration_ms,
                    category,
                );
            }
        }

        result
    }

    /// Race a minimal probe against the configured quick-check timeout
    pub async fn quick_health_check(&self) -> QuickHealthCheck {
        self.quick_health_check_with_timeout(self.config.health.quick_check_timeout_ms)
            .await
    }

    /// Race a minimal probe against `timeout_ms`
    ///
    /// The probe runs as a detached task. On timeout it is abandoned rather
    /// than cancelled; whatever it returns later is discarded.
    pub async fn quick_health_check_with_timeout(&self, timeout_ms: u64) -> QuickHealthCheck {
        let client = Arc::clone(&self.client);
        let probe_query = self.config.health.probe_query.clone();
        let started = Instant::now();

        let probe = tokio::spawn(async move { client.execute_query(&probe_query).await });

        match tokio::time::timeout(Duration::from_millis(timeout_ms), probe).await {
            Ok(Ok(Ok(_))) => QuickHealthCheck {
                healthy: true,
                latency_ms: started.elapsed().as_millis() as u64,
                error: None,
            },
            Ok(Ok(Err(error))) => QuickHealthCheck {
                healthy: false,
                latency_ms: started.elapsed().as_millis() as u64,
                error: Some(error.to_string()),
            },
            Ok(Err(join_error)) => {
                log_error("data_access", "quick_health_check", &join_error.to_string(), None);
                QuickHealthCheck {
                    healthy: false,
                    latency_ms: started.elapsed().as_millis() as u64,
                    error: Some(format!("Health check probe aborted: {join_error}")),
                }
            }
            Err(_) => {
                warn!(timeout_ms = timeout_ms, "⏱️ Database health check timed out");
                QuickHealthCheck {
                    healthy: false,
                    latency_ms: timeout_ms,
                    error: Some(format!("Health check timeout after {timeout_ms}ms")),
                }
            }
        }
    }

    /// Probe outcome combined with breaker and pool metrics snapshots
    ///
    /// The version probe is bounded by the quick-check timeout so a hanging
    /// database cannot stall the health endpoint.
    pub async fn get_health_status(&self) -> HealthStatus {
        let timeout_ms = self.config.health.quick_check_timeout_ms;
        let started = Instant::now();

        let probe = tokio::time::timeout(
            Duration::from_millis(timeout_ms),
            self.client.execute_query(&self.config.health.version_query),
        )
        .await;
        let latency_ms = started.elapsed().as_millis() as u64;

        let (connected, version, error) = match probe {
            Ok(Ok(version)) => (true, version, None),
            Ok(Err(error)) => (false, None, Some(error.to_string())),
            Err(_) => (false, None, Some(format!("Health check timeout after {timeout_ms}ms"))),
        };

        HealthStatus {
            connected,
            latency_ms,
            version,
            error,
            circuit_breaker: self.state.circuit_breaker.snapshot(),
            pool_metrics: self.state.metrics.snapshot(),
        }
    }

    /// Read-only diagnostics snapshot
    pub fn connection_diagnostics(&self) -> ConnectionDiagnostics {
        self.state
            .tracker
            .diagnostics(self.state.circuit_breaker.state())
    }

    pub fn circuit_breaker_snapshot(&self) -> CircuitBreakerSnapshot {
        self.state.circuit_breaker.snapshot()
    }

    pub fn pool_metrics(&self) -> PoolMetricsSnapshot {
        self.state.metrics.snapshot()
    }

    /// Zero the pool metrics counters
    pub fn reset_pool_metrics(&self) {
        self.state.metrics.reset();
    }

    /// Clear failure counters and close the breaker without a restart
    pub fn force_reset_connection(&self) {
        warn!(
            consecutive_failures = self.state.tracker.consecutive_failures(),
            circuit_state = %self.state.circuit_breaker.state(),
            "🚨 Forcing database connection state reset"
        );
        self.state.tracker.reset();
        self.state.circuit_breaker.force_closed();
    }

    /// Release the database client
    ///
    /// The only place the shared client is disconnected.
    pub async fn shutdown(&self) -> Result<()> {
        info!(
            summary = %self.state.metrics.snapshot().format_summary(),
            "🛑 Shutting down unified data access"
        );
        self.client
            .disconnect()
            .await
            .map_err(|e| StorefrontDbError::ShutdownError(e.to_string()))
    }
}
