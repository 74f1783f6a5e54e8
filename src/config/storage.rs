//! Storage configuration types.

use std::fmt;

use serde::Deserialize;

use crate::storage::sql::{DEFAULT_EVENT_STREAMS_TABLE, DEFAULT_LOAD_BATCH_SIZE};

/// Storage type discriminator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageType {
    #[default]
    Sqlite,
    Postgres,
    Mysql,
}

impl fmt::Display for StorageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StorageType::Sqlite => "sqlite",
            StorageType::Postgres => "postgres",
            StorageType::Mysql => "mysql",
        })
    }
}

/// Persistence strategy discriminator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyType {
    /// One table per aggregate instance, position is the aggregate version.
    #[default]
    Aggregate,
    /// One table per aggregate type.
    Single,
    /// One table per stream, no aggregate rules.
    Simple,
}

/// Write lock discriminator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WriteLockType {
    #[default]
    None,
    /// PostgreSQL `pg_advisory_lock`.
    Advisory,
    /// MySQL `GET_LOCK`.
    Metadata,
}

/// Event store configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Storage type discriminator.
    #[serde(rename = "type")]
    pub storage_type: StorageType,
    /// Connection URI understood by the sqlx driver.
    pub uri: String,
    /// Table layout.
    pub strategy: StrategyType,
    /// Writer serialization.
    pub write_lock: WriteLockType,
    /// `GET_LOCK` timeout in seconds; `-1` waits forever.
    pub lock_timeout_secs: i64,
    /// Rows fetched per cursor batch.
    pub load_batch_size: u64,
    /// Registry table name.
    pub event_streams_table: String,
    /// Leave transaction control to the caller.
    pub disable_transaction_handling: bool,
    /// Create the registry table on connect if it does not exist.
    pub create_event_streams_table: bool,
    /// Connection attempts before giving up, with exponential backoff between them.
    pub connect_attempts: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            storage_type: StorageType::Sqlite,
            uri: "sqlite::memory:".to_string(),
            strategy: StrategyType::Aggregate,
            write_lock: WriteLockType::None,
            lock_timeout_secs: -1,
            load_batch_size: DEFAULT_LOAD_BATCH_SIZE,
            event_streams_table: DEFAULT_EVENT_STREAMS_TABLE.to_string(),
            disable_transaction_handling: false,
            create_event_streams_table: true,
            connect_attempts: 1,
        }
    }
}
