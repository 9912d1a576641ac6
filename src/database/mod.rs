//! # Database Access
//!
//! The resilient entry point route handlers and background jobs use to reach
//! PostgreSQL.
//!
//! ## Key Components
//!
//! - [`client`] - The database client capability and its sqlx implementation
//! - [`data_access`] - [`UnifiedDataAccess`], retry and circuit breaking around the client
//! - [`server_component`] - Fallback-aware execution for read paths
//! - [`error_codes`] - Client error codes that mark connection failures
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use storefront_db::config::ConfigManager;
//! use storefront_db::database::{ServerComponentOptions, UnifiedDataAccess};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = ConfigManager::load()?;
//! let data_access = UnifiedDataAccess::connect(&manager).await?;
//!
//! let client = data_access.client().clone();
//! let version = data_access
//!     .with_server_component_db(
//!         || client.execute_query("SELECT version()"),
//!         ServerComponentOptions::new("footer_version").with_fallback(None),
//!     )
//!     .await?;
//! # let _ = version;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod data_access;
pub mod error_codes;
pub mod server_component;

pub use client::{DatabaseClient, DbError, DbResult, PgDatabaseClient};
pub use data_access::{HealthStatus, QuickHealthCheck, UnifiedDataAccess};
pub use error_codes::ClientErrorCode;
pub use server_component::ServerComponentOptions;
