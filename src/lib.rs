#![allow(clippy::doc_markdown)] // Allow technical terms like PostgreSQL, SQLx in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Storefront DB Core
//!
//! Resilient data access for the storefront backend.
//!
//! ## Overview
//!
//! Route handlers and background jobs never touch the database client
//! directly. They go through [`UnifiedDataAccess`], which adds bounded retry
//! with exponential backoff, a circuit breaker, connection staleness
//! detection, authentication-vs-transient error classification, and health
//! reporting.
//!
//! ## Module Organization
//!
//! - [`resilience`] - Error classification, retry, circuit breaker, connection tracking
//! - [`database`] - The client capability and the unified data-access wrapper
//! - [`config`] - YAML configuration with environment overrides
//! - [`error`] - Structured error handling
//! - [`logging`] - Structured logging setup
//! - [`constants`] - Default tuning values
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use storefront_db::config::ConfigManager;
//! use storefront_db::UnifiedDataAccess;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! storefront_db::logging::init_structured_logging();
//!
//! let manager = ConfigManager::load()?;
//! let data_access = UnifiedDataAccess::connect(&manager).await?;
//!
//! let client = data_access.client().clone();
//! let deleted = data_access
//!     .with_retry(|| client.execute_raw("DELETE FROM carts WHERE expires_at < now()"))
//!     .await?;
//! println!("Removed {deleted} expired carts");
//!
//! let health = data_access.quick_health_check().await;
//! println!("healthy: {}", health.healthy);
//!
//! data_access.shutdown().await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Testing
//!
//! ```bash
//! cargo test --lib    # Unit tests
//! cargo test          # Unit and integration tests, no database required
//! ```

pub mod config;
pub mod constants;
pub mod database;
pub mod error;
pub mod logging;
pub mod resilience;

pub use config::{ConfigManager, DataAccessConfig, DatabaseConfig};
pub use database::{
    DatabaseClient, DbError, HealthStatus, PgDatabaseClient, QuickHealthCheck,
    ServerComponentOptions, UnifiedDataAccess,
};
pub use error::{Result, StorefrontDbError};
pub use resilience::{
    classify, classify_error, CircuitState, ClassifiableError, ConnectionDiagnostics,
    ErrorCategory, ResilienceError,
};
