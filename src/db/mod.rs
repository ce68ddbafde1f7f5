mod error;
mod memory;
pub mod repos;
#[cfg(feature = "database-sqlite")]
pub mod sqlite;


use std::sync::Arc;

pub use error::{DbError, DbResult};
pub use memory::MemoryConfigStore;
pub use repos::*;

use crate::config::StoreConfig;

/// Open the store described by `config`.
///
/// The memory store starts out with the default row `seed_id`; SQLite
/// stores are used as found and must be initialized separately.
pub async fn open_store(config: &StoreConfig, seed_id: i64) -> DbResult<Arc<dyn ConfigStore>> {
    match config {
        StoreConfig::Memory => {
            let store = MemoryConfigStore::new();
            store.initialize(seed_id).await?;
            Ok(Arc::new(store))
        }
        #[cfg(feature = "database-sqlite")]
        StoreConfig::Sqlite(cfg) => {
            let pool = sqlx::sqlite::SqlitePoolOptions::new()
                .max_connections(cfg.max_connections)
                .connect_with(
                    sqlx::sqlite::SqliteConnectOptions::new()
                        .filename(&cfg.path)
                        .create_if_missing(cfg.create_if_missing)
                        .busy_timeout(std::time::Duration::from_millis(cfg.busy_timeout_ms)),
                )
                .await?;
            tracing::debug!(path = %cfg.path, "Opened SQLite store");
            Ok(Arc::new(sqlite::SqliteConfigStore::new(pool)))
        }
    }
}
