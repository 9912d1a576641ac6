use thiserror::Error;

use crate::config::ConfigurationError;
use crate::database::DbError;

/// Errors raised while bootstrapping or administering the data-access layer.
///
/// Operation failures routed through the resilient wrapper surface as
/// [`crate::resilience::ResilienceError`] instead, so callers keep the
/// original error type of their operation.
#[derive(Debug, Error)]
pub enum StorefrontDbError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Configuration error: {0}")]
    ConfigurationError(#[from] ConfigurationError),
    #[error("Shutdown error: {0}")]
    ShutdownError(String),
}

impl From<DbError> for StorefrontDbError {
    fn from(error: DbError) -> Self {
        StorefrontDbError::DatabaseError(error.to_string())
    }
}

impl From<sqlx::Error> for StorefrontDbError {
    fn from(error: sqlx::Error) -> Self {
        StorefrontDbError::DatabaseError(error.to_string())
    }
}

pub type Result<T> = std::result::Result<T, StorefrontDbError>;
