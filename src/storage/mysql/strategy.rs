//! MySQL persistence strategies.
//!
//! The single-stream layout projects the aggregate keys into stored
//! generated columns; uniqueness and the read index live on those columns,
//! and predicates on the keys target them directly.

use sea_query::SimpleExpr;

use super::{quote_table, MySql, UNIQUE_VIOLATION_CODES};
use crate::event::{Event, AGGREGATE_ID, AGGREGATE_TYPE, AGGREGATE_VERSION};
use crate::interfaces::{PersistenceStrategy, Result};
use crate::storage::helpers::{
    aggregate_version, created_at_value, encode_json, encode_metadata, require_aggregate_keys,
};
use crate::storage::schema::{AGGREGATE_STREAM_COLUMNS, SEQUENCED_STREAM_COLUMNS};

const TABLE_OPTIONS: &str = "ENGINE=InnoDB DEFAULT CHARSET=utf8mb4 COLLATE=utf8mb4_bin";

/// Read index of the single-stream layout.
const QUERY_AGGREGATE_INDEX: &str = "ix_query_aggregate";

const INDEXED_AGGREGATE_FIELDS: &[(&str, &str)] = &[
    (AGGREGATE_ID, "aggregate_id"),
    (AGGREGATE_TYPE, "aggregate_type"),
    (AGGREGATE_VERSION, "aggregate_version"),
];

fn columns_ddl(position: &str) -> String {
    format!(
        "    `no` {position},
    `event_id` CHAR(36) NOT NULL,
    `event_name` VARCHAR(100) NOT NULL,
    `payload` JSON NOT NULL,
    `metadata` JSON NOT NULL,
    `created_at` DATETIME(6) NOT NULL,"
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
pub struct MySqlAggregateStreamStrategy;

impl PersistenceStrategy<MySql> for MySqlAggregateStreamStrategy {
    fn create_schema(&self, table_name: &str) -> Vec<String> {
        vec![format!(
            "CREATE TABLE {} (
{}
    PRIMARY KEY (`no`),
    UNIQUE KEY `ix_event_id` (`event_id`)
) {}",
            quote_table(table_name),
            columns_ddl("BIGINT NOT NULL"),
            TABLE_OPTIONS
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

/// One table per aggregate type, aggregate keys projected into generated columns.
#[derive(Debug, Clone, Copy, Default)]
pub struct MySqlSingleStreamStrategy;

impl PersistenceStrategy<MySql> for MySqlSingleStreamStrategy {
    fn create_schema(&self, table_name: &str) -> Vec<String> {
        vec![format!(
            "CREATE TABLE {} (
{}
    `aggregate_version` BIGINT GENERATED ALWAYS AS (JSON_EXTRACT(`metadata`, '$._aggregate_version')) STORED NOT NULL,
    `aggregate_id` VARCHAR(150) GENERATED ALWAYS AS (JSON_UNQUOTE(JSON_EXTRACT(`metadata`, '$._aggregate_id'))) STORED NOT NULL,
    `aggregate_type` VARCHAR(150) GENERATED ALWAYS AS (JSON_UNQUOTE(JSON_EXTRACT(`metadata`, '$._aggregate_type'))) STORED NOT NULL,
    PRIMARY KEY (`no`),
    UNIQUE KEY `ix_event_id` (`event_id`),
    UNIQUE KEY `ix_unique_event` (`aggregate_type`, `aggregate_id`, `aggregate_version`),
    KEY `{}` (`aggregate_type`, `aggregate_id`, `no`)
) {}",
            quote_table(table_name),
            columns_ddl("BIGINT NOT NULL AUTO_INCREMENT"),
            QUERY_AGGREGATE_INDEX,
            TABLE_OPTIONS
        )]
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

    fn indexed_metadata_fields(&self) -> &'static [(&'static str, &'static str)] {
        INDEXED_AGGREGATE_FIELDS
    }

    fn index_hint(&self) -> Option<&'static str> {
        Some(QUERY_AGGREGATE_INDEX)
    }
}

/// One table per stream with auto-assigned positions and no aggregate rules.
#[derive(Debug, Clone, Copy, Default)]
pub struct MySqlSimpleStreamStrategy;

impl PersistenceStrategy<MySql> for MySqlSimpleStreamStrategy {
    fn create_schema(&self, table_name: &str) -> Vec<String> {
        vec![format!(
            "CREATE TABLE {} (
{}
    PRIMARY KEY (`no`),
    UNIQUE KEY `ix_event_id` (`event_id`)
) {}",
            quote_table(table_name),
            columns_ddl("BIGINT NOT NULL AUTO_INCREMENT"),
            TABLE_OPTIONS
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
