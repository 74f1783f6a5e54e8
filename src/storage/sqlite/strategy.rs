//! SQLite persistence strategies.

use sea_query::SimpleExpr;

use super::{quote_table, Sqlite, UNIQUE_VIOLATION_CODES};
use crate::event::Event;
use crate::interfaces::{PersistenceStrategy, Result};
use crate::storage::helpers::{
    aggregate_version, created_at_value, encode_json, encode_metadata, require_aggregate_keys,
};
use crate::storage::schema::{AGGREGATE_STREAM_COLUMNS, SEQUENCED_STREAM_COLUMNS};

fn columns_ddl(position: &str) -> String {
    format!(
        "    no {position},
    event_id TEXT NOT NULL UNIQUE,
    event_name TEXT NOT NULL,
    payload TEXT NOT NULL,
    metadata TEXT NOT NULL,
    created_at TEXT NOT NULL"
    )
}

fn event_values(event: &Event) -> Result<Vec<SimpleExpr>> {
    Ok(vec![
        event.id().to_string().into(),
        event.name().into(),
        encode_json(event.payload())?.into(),
        encode_metadata(event)?.into(),
        created_at_value(event),
    ])
}

/// One table per aggregate instance; `no` is the aggregate version.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteAggregateStreamStrategy;

impl PersistenceStrategy<Sqlite> for SqliteAggregateStreamStrategy {
    fn create_schema(&self, table_name: &str) -> Vec<String> {
        vec![format!(
            "CREATE TABLE {} (\n{}\n)",
            quote_table(table_name),
            columns_ddl("INTEGER NOT NULL PRIMARY KEY")
        )]
    }

    fn column_names(&self) -> Vec<&'static str> {
        AGGREGATE_STREAM_COLUMNS.to_vec()
    }

    fn prepare_data(&self, events: &[Event]) -> Result<Vec<SimpleExpr>> {
        let mut data = Vec::with_capacity(events.len() * AGGREGATE_STREAM_COLUMNS.len());
        for event in events {
            data.push(aggregate_version(event)?.into());
            data.extend(event_values(event)?);
        }
        Ok(data)
    }

    fn unique_violation_error_codes(&self) -> &'static [&'static str] {
        UNIQUE_VIOLATION_CODES
    }
}

/// One table per aggregate type with a unique expression index on
/// `(type, id, version)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteSingleStreamStrategy;

impl PersistenceStrategy<Sqlite> for SqliteSingleStreamStrategy {
    fn create_schema(&self, table_name: &str) -> Vec<String> {
        let quoted = quote_table(table_name);
        vec![
            format!(
                "CREATE TABLE {} (\n{}\n)",
                quoted,
                columns_ddl("INTEGER PRIMARY KEY AUTOINCREMENT")
            ),
            format!(
                "CREATE UNIQUE INDEX \"{table_name}_unique_event_idx\" ON {quoted} (
    json_extract(metadata, '$._aggregate_type'),
    json_extract(metadata, '$._aggregate_id'),
    json_extract(metadata, '$._aggregate_version')
)"
            ),
            format!(
                "CREATE INDEX \"{table_name}_aggregate_idx\" ON {quoted} (
    json_extract(metadata, '$._aggregate_type'),
    json_extract(metadata, '$._aggregate_id'),
    no
)"
            ),
        ]
    }

    fn column_names(&self) -> Vec<&'static str> {
        SEQUENCED_STREAM_COLUMNS.to_vec()
    }

    fn prepare_data(&self, events: &[Event]) -> Result<Vec<SimpleExpr>> {
        let mut data = Vec::with_capacity(events.len() * SEQUENCED_STREAM_COLUMNS.len());
        for event in events {
            require_aggregate_keys(event)?;
            data.extend(event_values(event)?);
        }
        Ok(data)
    }

    fn unique_violation_error_codes(&self) -> &'static [&'static str] {
        UNIQUE_VIOLATION_CODES
    }
}

/// One table per stream with auto-assigned positions and no aggregate rules.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteSimpleStreamStrategy;

impl PersistenceStrategy<Sqlite> for SqliteSimpleStreamStrategy {
    fn create_schema(&self, table_name: &str) -> Vec<String> {
        vec![format!(
            "CREATE TABLE {} (\n{}\n)",
            quote_table(table_name),
            columns_ddl("INTEGER PRIMARY KEY AUTOINCREMENT")
        )]
    }

    fn column_names(&self) -> Vec<&'static str> {
        SEQUENCED_STREAM_COLUMNS.to_vec()
    }

    fn prepare_data(&self, events: &[Event]) -> Result<Vec<SimpleExpr>> {
        let mut data = Vec::with_capacity(events.len() * SEQUENCED_STREAM_COLUMNS.len());
        for event in events {
            data.extend(event_values(event)?);
        }
        Ok(data)
    }

    fn unique_violation_error_codes(&self) -> &'static [&'static str] {
        UNIQUE_VIOLATION_CODES
    }
}
