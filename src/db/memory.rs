use async_trait::async_trait;
use dashmap::DashMap;

use crate::{
    db::{
        error::{DbError, DbResult},
        repos::ConfigStore,
    },
    models::{ConfigField, ConfigurationRecord},
};

/// In-process configuration store.
///
/// Rows live for the lifetime of the process. Used for tests and for
/// trying out the screen without a database.
pub struct MemoryConfigStore {
    columns: Vec<String>,
    rows: DashMap<i64, ConfigurationRecord>,
}

impl Default for MemoryConfigStore {
    fn default() -> Self {
        Self::with_columns(ConfigField::ALL.iter().map(|f| f.as_str().to_string()))
    }
}

impl MemoryConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store with a custom table layout.
    pub fn with_columns(columns: impl IntoIterator<Item = String>) -> Self {
        Self {
            columns: columns.into_iter().collect(),
            rows: DashMap::new(),
        }
    }

    /// Replace a row wholesale. Values for unknown columns are kept as-is.
    pub fn insert_row(&self, id: i64, record: ConfigurationRecord) {
        self.rows.insert(id, record);
    }

    fn ensure_known(&self, record: &ConfigurationRecord) -> DbResult<()> {
        match record.names().find(|name| !self.columns.iter().any(|c| c.as_str() == *name)) {
            Some(unknown) => Err(DbError::Validation(format!("unknown column '{unknown}'"))),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ConfigStore for MemoryConfigStore {
    async fn columns(&self) -> DbResult<Vec<String>> {
        Ok(self.columns.clone())
    }

    async fn load(&self, id: i64) -> DbResult<Option<ConfigurationRecord>> {
        Ok(self.rows.get(&id).map(|row| {
            self.columns
                .iter()
                .map(|column| (column.as_str(), row.value().get(column).unwrap_or_default()))
                .collect()
        }))
    }

    async fn save(&self, id: i64, record: &ConfigurationRecord) -> DbResult<()> {
        self.ensure_known(record)?;
        let mut row = self.rows.get_mut(&id).ok_or(DbError::NotFound)?;
        for (name, value) in record.iter() {
            if name != ConfigField::Id.as_str() {
                row.value_mut().insert(name, value);
            }
        }
        Ok(())
    }

    async fn initialize(&self, id: i64) -> DbResult<()> {
        self.rows
            .entry(id)
            .or_insert_with(|| ConfigurationRecord::defaults(id));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_load_missing_row() {
        let store = MemoryConfigStore::new();
        assert!(store.load(1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_initialize_seeds_defaults_once() {
        let store = MemoryConfigStore::new();
        store.initialize(1).await.unwrap();
        store
            .save(1, &[("debug", "1")].into_iter().collect())
            .await
            .unwrap();
        store.initialize(1).await.unwrap();

        let record = store.load(1).await.unwrap().unwrap();
        assert_eq!(record.len(), ConfigField::ALL.len());
        assert_eq!(record.field(ConfigField::Debug), Some("1"));
    }

    #[tokio::test]
    async fn test_save_partial_update() {
        let store = MemoryConfigStore::new();
        store.initialize(1).await.unwrap();
        store
            .save(1, &[("id", "7"), ("jit", "1")].into_iter().collect())
            .await
            .unwrap();

        let record = store.load(1).await.unwrap().unwrap();
        assert_eq!(record.field(ConfigField::Jit), Some("1"));
        assert_eq!(record.field(ConfigField::Id), Some("1"));
        assert_eq!(record.field(ConfigField::Enforced), Some("0"));
    }

    #[tokio::test]
    async fn test_save_rejects_unknown_column() {
        let store = MemoryConfigStore::new();
        store.initialize(1).await.unwrap();
        let err = store
            .save(1, &[("valid", "1")].into_iter().collect())
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Validation(_)));
    }

    #[tokio::test]
    async fn test_save_missing_row() {
        let store = MemoryConfigStore::new();
        let err = store
            .save(2, &[("jit", "1")].into_iter().collect())
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound));
    }

    #[tokio::test]
    async fn test_custom_columns_shape_loaded_rows() {
        let store = MemoryConfigStore::with_columns(["id".to_string(), "legacy".to_string()]);
        store.insert_row(1, [("id", "1"), ("legacy", "x")].into_iter().collect());
        let record = store.load(1).await.unwrap().unwrap();
        assert_eq!(record.names().collect::<Vec<_>>(), vec!["id", "legacy"]);
    }
}
