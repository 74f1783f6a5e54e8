//! Storage implementations.
//!
//! The generic SQL store lives in `sql`; each vendor module supplies the
//! `SqlDatabase` marker, persistence strategies and write locks for one
//! database and is compiled only with its Cargo feature.

use tracing::{error, info};

use crate::config::{StorageType, StoreConfig, StrategyType, WriteLockType};
use crate::interfaces::{
    EventStore, EventStoreError, PersistenceStrategy, Result, WriteLockStrategy,
};

pub mod helpers;
pub mod lock;
pub mod schema;
pub mod sql;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "postgres")]
pub mod postgres;

#[cfg(feature = "mysql")]
pub mod mysql;

pub use lock::NoLockStrategy;
pub use sql::{SqlDatabase, SqlEventStore};

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteEventStore;

#[cfg(feature = "postgres")]
pub use postgres::PostgresEventStore;

#[cfg(feature = "mysql")]
pub use mysql::MySqlEventStore;

/// Open an event store based on configuration.
///
/// Strategy and write lock are resolved from the configured enums; a lock
/// the selected backend cannot provide is a configuration error. The
/// registry table is created when `create_event_streams_table` is set.
pub async fn connect(config: &StoreConfig) -> Result<Box<dyn EventStore>> {
    info!(
        backend = %config.storage_type,
        strategy = ?config.strategy,
        write_lock = ?config.write_lock,
        "Opening event store"
    );

    match config.storage_type {
        #[cfg(feature = "sqlite")]
        StorageType::Sqlite => Ok(Box::new(connect_sqlite(config).await?)),
        #[cfg(feature = "postgres")]
        StorageType::Postgres => Ok(Box::new(connect_postgres(config).await?)),
        #[cfg(feature = "mysql")]
        StorageType::Mysql => Ok(Box::new(connect_mysql(config).await?)),
        #[allow(unreachable_patterns)]
        other => {
            error!(backend = %other, "Storage backend requested but its feature is not enabled");
            Err(EventStoreError::Configuration(format!(
                "storage backend '{}' is not enabled in this build",
                other
            )))
        }
    }
}

/// Apply the vendor-neutral settings and install the registry table.
async fn configure<D: SqlDatabase>(
    conn: D::Connection,
    strategy: Box<dyn PersistenceStrategy<D>>,
    write_lock: Option<Box<dyn WriteLockStrategy<D>>>,
    config: &StoreConfig,
) -> Result<SqlEventStore<D>> {
    let mut store = SqlEventStore::with_boxed_strategy(conn, strategy)
        .with_load_batch_size(config.load_batch_size)
        .with_event_streams_table(config.event_streams_table.clone());
    if let Some(lock) = write_lock {
        store = store.with_boxed_write_lock(lock);
    }
    if config.disable_transaction_handling {
        store = store.with_disabled_transaction_handling();
    }
    if config.create_event_streams_table {
        store.create_event_streams_table().await?;
    }
    Ok(store)
}

fn unsupported_lock(config: &StoreConfig) -> EventStoreError {
    EventStoreError::Configuration(format!(
        "write lock {:?} is not available for storage backend '{}'",
        config.write_lock, config.storage_type
    ))
}

#[cfg(feature = "sqlite")]
async fn connect_sqlite(config: &StoreConfig) -> Result<SqliteEventStore> {
    use std::str::FromStr;

    use sqlx::sqlite::SqliteConnectOptions;
    use sqlx::ConnectOptions;

    use self::sqlite::{
        Sqlite, SqliteAggregateStreamStrategy, SqliteSimpleStreamStrategy,
        SqliteSingleStreamStrategy,
    };

    let strategy: Box<dyn PersistenceStrategy<Sqlite>> = match config.strategy {
        StrategyType::Aggregate => Box::new(SqliteAggregateStreamStrategy),
        StrategyType::Single => Box::new(SqliteSingleStreamStrategy),
        StrategyType::Simple => Box::new(SqliteSimpleStreamStrategy),
    };
    let write_lock: Option<Box<dyn WriteLockStrategy<Sqlite>>> = match config.write_lock {
        WriteLockType::None => None,
        WriteLockType::Advisory | WriteLockType::Metadata => {
            return Err(unsupported_lock(config))
        }
    };

    let options = SqliteConnectOptions::from_str(&config.uri)?
        .create_if_missing(true)
        .with_regexp();
    let conn = crate::utils::bootstrap::connect_with_retry("sqlite", config.connect_attempts, || {
        options.connect()
    })
    .await?;

    configure(conn, strategy, write_lock, config).await
}

#[cfg(feature = "postgres")]
async fn connect_postgres(config: &StoreConfig) -> Result<PostgresEventStore> {
    use sqlx::{Connection, PgConnection};

    use self::postgres::{
        Postgres, PostgresAdvisoryLockStrategy, PostgresAggregateStreamStrategy,
        PostgresSimpleStreamStrategy, PostgresSingleStreamStrategy,
    };

    let strategy: Box<dyn PersistenceStrategy<Postgres>> = match config.strategy {
        StrategyType::Aggregate => Box::new(PostgresAggregateStreamStrategy),
        StrategyType::Single => Box::new(PostgresSingleStreamStrategy),
        StrategyType::Simple => Box::new(PostgresSimpleStreamStrategy),
    };
    let write_lock: Option<Box<dyn WriteLockStrategy<Postgres>>> = match config.write_lock {
        WriteLockType::None => None,
        WriteLockType::Advisory => Some(Box::new(PostgresAdvisoryLockStrategy)),
        WriteLockType::Metadata => return Err(unsupported_lock(config)),
    };

    let conn = crate::utils::bootstrap::connect_with_retry("postgres", config.connect_attempts, || {
        PgConnection::connect(&config.uri)
    })
    .await?;

    configure(conn, strategy, write_lock, config).await
}

#[cfg(feature = "mysql")]
async fn connect_mysql(config: &StoreConfig) -> Result<MySqlEventStore> {
    use sqlx::{Connection, MySqlConnection};

    use self::mysql::{
        MySql, MySqlAggregateStreamStrategy, MySqlMetadataLockStrategy, MySqlSimpleStreamStrategy,
        MySqlSingleStreamStrategy,
    };

    let strategy: Box<dyn PersistenceStrategy<MySql>> = match config.strategy {
        StrategyType::Aggregate => Box::new(MySqlAggregateStreamStrategy),
        StrategyType::Single => Box::new(MySqlSingleStreamStrategy),
        StrategyType::Simple => Box::new(MySqlSimpleStreamStrategy),
    };
    let write_lock: Option<Box<dyn WriteLockStrategy<MySql>>> = match config.write_lock {
        WriteLockType::None => None,
        WriteLockType::Metadata => Some(Box::new(MySqlMetadataLockStrategy::new(
            config.lock_timeout_secs,
        ))),
        WriteLockType::Advisory => return Err(unsupported_lock(config)),
    };

    let conn = crate::utils::bootstrap::connect_with_retry("mysql", config.connect_attempts, || {
        MySqlConnection::connect(&config.uri)
    })
    .await?;

    configure(conn, strategy, write_lock, config).await
}
