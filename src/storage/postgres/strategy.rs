//! PostgreSQL persistence strategies.
//!
//! Payloads are stored as `JSON` so the document text round-trips exactly;
//! metadata is `JSONB` so predicates and expression indexes can use it.

use sea_query::{Alias, Func, SimpleExpr, Value};

use super::{bare_table, quote_table, Postgres, UNIQUE_VIOLATION_CODES};
use crate::event::Event;
use crate::interfaces::{PersistenceStrategy, Result};
use crate::storage::helpers::{
    aggregate_version, created_at_value, encode_json, encode_metadata, hash_table_name,
    require_aggregate_keys,
};
use crate::storage::schema::{AGGREGATE_STREAM_COLUMNS, SEQUENCED_STREAM_COLUMNS};
use crate::stream::StreamName;

/// Table name, schema-qualified when the stream name carries a `schema.` prefix.
fn table_name(stream_name: &StreamName) -> String {
    match stream_name.schema() {
        Some(schema) => format!("{}.{}", schema, hash_table_name(stream_name)),
        None => hash_table_name(stream_name),
    }
}

/// `CREATE SCHEMA` for a schema-qualified table, if any.
fn schema_statement(table: &str) -> Option<String> {
    table
        .split_once('.')
        .map(|(schema, _)| format!("CREATE SCHEMA IF NOT EXISTS {}", quote_table(schema)))
}

fn columns_ddl(position: &str) -> String {
    format!(
        "    no {position},
    event_id UUID NOT NULL,
    event_name VARCHAR(100) NOT NULL,
    payload JSON NOT NULL,
    metadata JSONB NOT NULL,
    created_at TIMESTAMP(6) NOT NULL,"
    )
}

fn json_value(json: String, type_name: &str) -> SimpleExpr {
    Func::cast_as(json, Alias::new(type_name)).into()
}

/// Common values of one row, without `no`.
fn event_values(event: &Event) -> Result<Vec<SimpleExpr>> {
    Ok(vec![
        Value::Uuid(Some(Box::new(event.id()))).into(),
        event.name().into(),
        json_value(encode_json(event.payload())?, "JSON"),
        json_value(encode_metadata(event)?, "JSONB"),
        created_at_value(event),
    ])
}

fn with_schema(table: &str, mut statements: Vec<String>) -> Vec<String> {
    if let Some(create_schema) = schema_statement(table) {
        statements.insert(0, create_schema);
    }
    statements
}

/// One table per aggregate instance; `no` is the aggregate version.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresAggregateStreamStrategy;

impl PersistenceStrategy<Postgres> for PostgresAggregateStreamStrategy {
    fn generate_table_name(&self, stream_name: &StreamName) -> String {
        table_name(stream_name)
    }

    fn create_schema(&self, table_name: &str) -> Vec<String> {
        with_schema(
            table_name,
            vec![format!(
                "CREATE TABLE {} (
{}
    PRIMARY KEY (no),
    CONSTRAINT aggregate_version_not_null CHECK ((metadata->>'_aggregate_version') IS NOT NULL),
    CONSTRAINT aggregate_version_match CHECK ((metadata->>'_aggregate_version')::BIGINT = no),
    UNIQUE (event_id)
)",
                quote_table(table_name),
                columns_ddl("BIGINT NOT NULL")
            )],
        )
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

/// One table per aggregate type; `no` is auto-assigned and
/// `(type, id, version)` is unique.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresSingleStreamStrategy;

impl PersistenceStrategy<Postgres> for PostgresSingleStreamStrategy {
    fn generate_table_name(&self, stream_name: &StreamName) -> String {
        table_name(stream_name)
    }

    fn create_schema(&self, table_name: &str) -> Vec<String> {
        let quoted = quote_table(table_name);
        let bare = bare_table(table_name);
        with_schema(
            table_name,
            vec![
                format!(
                    "CREATE TABLE {} (
{}
    PRIMARY KEY (no),
    CONSTRAINT aggregate_version_not_null CHECK ((metadata->>'_aggregate_version') IS NOT NULL),
    CONSTRAINT aggregate_type_not_null CHECK ((metadata->>'_aggregate_type') IS NOT NULL),
    CONSTRAINT aggregate_id_not_null CHECK ((metadata->>'_aggregate_id') IS NOT NULL),
    UNIQUE (event_id)
)",
                    quoted,
                    columns_ddl("BIGSERIAL")
                ),
                format!(
                    "CREATE UNIQUE INDEX \"{bare}_unique_event_idx\" ON {quoted}
((metadata->>'_aggregate_type'), (metadata->>'_aggregate_id'), (metadata->>'_aggregate_version'))"
                ),
                format!(
                    "CREATE INDEX \"{bare}_aggregate_idx\" ON {quoted}
((metadata->>'_aggregate_type'), (metadata->>'_aggregate_id'), no)"
                ),
            ],
        )
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
pub struct PostgresSimpleStreamStrategy;

impl PersistenceStrategy<Postgres> for PostgresSimpleStreamStrategy {
    fn generate_table_name(&self, stream_name: &StreamName) -> String {
        table_name(stream_name)
    }

    fn create_schema(&self, table_name: &str) -> Vec<String> {
        with_schema(
            table_name,
            vec![format!(
                "CREATE TABLE {} (
{}
    PRIMARY KEY (no),
    UNIQUE (event_id)
)",
                quote_table(table_name),
                columns_ddl("BIGSERIAL")
            )],
        )
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
