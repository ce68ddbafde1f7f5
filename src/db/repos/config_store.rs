use async_trait::async_trait;

use crate::{db::error::DbResult, models::ConfigurationRecord};

/// Storage for SSO configuration rows.
///
/// A row is a flat column name to value mapping. Values are stored and
/// returned as strings; the store does not interpret them.
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Names of the stored columns, in table order.
    async fn columns(&self) -> DbResult<Vec<String>>;

    /// Load one configuration row.
    ///
    /// The returned record contains every stored column in table order and
    /// nothing else.
    async fn load(&self, id: i64) -> DbResult<Option<ConfigurationRecord>>;

    /// Update the columns present in `record` on an existing row.
    ///
    /// # Errors
    /// Returns `DbError::Validation` if `record` names a column that does
    /// not exist, and `DbError::NotFound` if there is no row `id`.
    async fn save(&self, id: i64, record: &ConfigurationRecord) -> DbResult<()>;

    /// Prepare storage and insert the default row `id` if it is missing.
    async fn initialize(&self, id: i64) -> DbResult<()>;
}
