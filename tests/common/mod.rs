#![allow(dead_code)]

pub mod mock_client;
pub mod strategies;

pub use mock_client::*;

use std::sync::Arc;
use storefront_db::{DataAccessConfig, UnifiedDataAccess};

/// Data access over a scripted client with default tuning
pub fn data_access_with(client: Arc<MockDatabaseClient>) -> UnifiedDataAccess {
    UnifiedDataAccess::new(client, DataAccessConfig::default())
}

/// Data access over a scripted client with a custom retry budget
pub fn data_access_with_retries(
    client: Arc<MockDatabaseClient>,
    max_retries: u32,
) -> UnifiedDataAccess {
    let mut config = DataAccessConfig::default();
    config.retry.max_retries = max_retries;
    UnifiedDataAccess::new(client, config)
}
