mod config_store;

pub use config_store::{CONFIG_TABLE, SqliteConfigStore};
