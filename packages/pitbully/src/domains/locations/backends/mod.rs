//! Concrete location stores and backend selection.

pub mod file;
pub mod sql;

pub use file::{LoadReport, YamlLocationStore};
pub use sql::{build_connection_url, MigrationReport, SqlLocationStore};

use std::sync::Arc;
use tracing::info;

use super::error::StoreResult;
use super::store::LocationStore;
use crate::config::{StorageBackend, StorageConfig};

/// Construct the configured backend and load it.
pub async fn open_store(config: &StorageConfig) -> StoreResult<Arc<dyn LocationStore>> {
    let store: Arc<dyn LocationStore> = match config.backend {
        StorageBackend::File => Arc::new(YamlLocationStore::new(&config.data_file)),
        StorageBackend::Database(kind) => {
            let database = crate::config::DatabaseConfig {
                kind,
                ..config.database.clone()
            };
            Arc::new(SqlLocationStore::connect(&database).await?)
        }
    };

    store.load_all().await?;
    info!(backend = %store.backend(), "location store ready");
    Ok(store)
}
