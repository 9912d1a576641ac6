//! # Server-Component Execution
//!
//! Read paths that render pages should degrade to a safe default when the
//! database is briefly unreachable instead of failing the whole response.
//! Write paths must call [`UnifiedDataAccess::with_retry`] directly so their
//! failures always reach the caller.

use std::future::Future;
use tracing::warn;

use crate::database::data_access::UnifiedDataAccess;
use crate::resilience::{ClassifiableError, ResilienceError};

/// Options for [`UnifiedDataAccess::with_server_component_db`]
#[derive(Debug, Clone)]
pub struct ServerComponentOptions<T> {
    pub operation_name: String,
    /// Probe the connection before running the operation
    pub warmup: bool,
    /// Returned in place of a connection-related failure
    pub fallback: Option<T>,
}

impl<T> Default for ServerComponentOptions<T> {
    fn default() -> Self {
        Self {
            operation_name: "server_component".to_string(),
            warmup: true,
            fallback: None,
        }
    }
}

impl<T> ServerComponentOptions<T> {
    pub fn new(operation_name: impl Into<String>) -> Self {
        Self {
            operation_name: operation_name.into(),
            ..Default::default()
        }
    }

    pub fn with_fallback(mut self, fallback: T) -> Self {
        self.fallback = Some(fallback);
        self
    }

    pub fn without_warmup(mut self) -> Self {
        self.warmup = false;
        self
    }
}

impl UnifiedDataAccess {
    /// Run a read-path operation, optionally warming the connection first and
    /// substituting `fallback` for connection-related failures
    ///
    /// Business errors and authentication failures always propagate, even
    /// when a fallback is supplied.
    pub async fn with_server_component_db<T, E, F, Fut>(
        &self,
        operation: F,
        options: ServerComponentOptions<T>,
    ) -> Result<T, ResilienceError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: ClassifiableError,
    {
        let ServerComponentOptions {
            operation_name,
            warmup,
            fallback,
        } = options;

        if warmup {
            // Latency only; the operation below reports real failures
            let _ = self.warm_connection().await;
        }

        let max_retries = self.config().retry.max_retries;
        match self
            .with_retry_named(operation, max_retries, &operation_name)
            .await
        {
            Ok(value) => Ok(value),
            Err(error) if error.is_connection_related() => match fallback {
                Some(fallback) => {
                    warn!(
                        operation = %operation_name,
                        circuit_open = error.is_circuit_open(),
                        attempts = error.attempts(),
                        "⚠️ Database unavailable, serving fallback value"
                    );
                    Ok(fallback)
                }
                None => Err(error),
            },
            Err(error) => Err(error),
        }
    }
}
