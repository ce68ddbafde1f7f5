use async_trait::async_trait;
use sqlx::{Column, Row, SqlitePool, sqlite::SqliteRow};

use crate::{
    db::{
        error::{DbError, DbResult},
        repos::ConfigStore,
    },
    models::{ConfigField, ConfigurationRecord},
};

/// Table holding the SSO configuration rows.
pub const CONFIG_TABLE: &str = "sso_config";

pub struct SqliteConfigStore {
    pool: SqlitePool,
}

impl SqliteConfigStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create the configuration table if it does not exist yet.
    pub async fn create_schema(&self) -> DbResult<()> {
        let columns = ConfigField::ALL
            .iter()
            .map(|field| match field {
                ConfigField::Id => "id INTEGER PRIMARY KEY".to_string(),
                other => format!("{} TEXT NOT NULL DEFAULT ''", other.as_str()),
            })
            .collect::<Vec<_>>()
            .join(",\n    ");

        let sql = format!("CREATE TABLE IF NOT EXISTS {CONFIG_TABLE} (\n    {columns}\n)");
        sqlx::query(&sql).execute(&self.pool).await?;
        Ok(())
    }

    /// Insert the default row `id` unless it already exists.
    pub async fn seed_default(&self, id: i64) -> DbResult<()> {
        let defaults = ConfigurationRecord::defaults(id);
        let names: Vec<&str> = defaults.names().collect();
        let placeholders = vec!["?"; names.len()].join(", ");
        let sql = format!(
            "INSERT OR IGNORE INTO {CONFIG_TABLE} ({}) VALUES ({placeholders})",
            names.join(", ")
        );

        let mut query = sqlx::query(&sql);
        for (name, value) in defaults.iter() {
            query = if name == ConfigField::Id.as_str() {
                query.bind(id)
            } else {
                query.bind(value.to_string())
            };
        }
        let result = query.execute(&self.pool).await?;

        if result.rows_affected() > 0 {
            tracing::info!(id, "Seeded default SSO configuration");
        }
        Ok(())
    }

    fn parse_row(row: &SqliteRow) -> DbResult<ConfigurationRecord> {
        let mut record = ConfigurationRecord::new();
        for (idx, column) in row.columns().iter().enumerate() {
            let value = match row.try_get::<Option<String>, _>(idx) {
                Ok(value) => value.unwrap_or_default(),
                Err(_) => row
                    .try_get::<Option<i64>, _>(idx)?
                    .map(|v| v.to_string())
                    .unwrap_or_default(),
            };
            record.insert(column.name(), value);
        }
        Ok(record)
    }
}

#[async_trait]
impl ConfigStore for SqliteConfigStore {
    async fn columns(&self) -> DbResult<Vec<String>> {
        let rows = sqlx::query(&format!("PRAGMA table_info({CONFIG_TABLE})"))
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| row.try_get::<String, _>("name").map_err(DbError::from))
            .collect()
    }

    async fn load(&self, id: i64) -> DbResult<Option<ConfigurationRecord>> {
        let row = sqlx::query(&format!("SELECT * FROM {CONFIG_TABLE} WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::parse_row).transpose()
    }

    async fn save(&self, id: i64, record: &ConfigurationRecord) -> DbResult<()> {
        let columns = self.columns().await?;
        if let Some(unknown) = record
            .names()
            .find(|name| !columns.iter().any(|c| c.as_str() == *name))
        {
            return Err(DbError::Validation(format!("unknown column '{unknown}'")));
        }

        let updates: Vec<(&str, &str)> = record
            .iter()
            .filter(|(name, _)| *name != ConfigField::Id.as_str())
            .collect();
        if updates.is_empty() {
            return Ok(());
        }

        // Column names were checked against the table above, so they are
        // safe to interpolate.
        let assignments = updates
            .iter()
            .map(|(name, _)| format!("{name} = ?"))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!("UPDATE {CONFIG_TABLE} SET {assignments} WHERE id = ?");

        let mut query = sqlx::query(&sql);
        for (_, value) in &updates {
            query = query.bind(value.to_string());
        }
        let result = query.bind(id).execute(&self.pool).await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound);
        }
        Ok(())
    }

    async fn initialize(&self, id: i64) -> DbResult<()> {
        self.create_schema().await?;
        self.seed_default(id).await
    }
}
