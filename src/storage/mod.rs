//! Storage implementations.

use tracing::info;

use crate::config::Config;
use crate::interfaces::Result;

pub mod postgres;
pub mod schema;

pub use postgres::PostgresJournal;

/// Initialize storage based on configuration.
pub async fn init_storage(config: &Config) -> Result<PostgresJournal> {
    let postgres = &config.storage.postgres;
    info!(drop = postgres.drop, "Storage: postgres");
    PostgresJournal::connect(postgres).await
}
