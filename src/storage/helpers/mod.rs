//! Shared storage helper functions.
//!
//! Common logic for table naming, JSON encoding and aggregate-key checks
//! used across the vendor persistence strategies.

use sea_query::{Alias, IntoTableRef, SimpleExpr, TableRef};
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::event::{Event, AGGREGATE_ID, AGGREGATE_TYPE, AGGREGATE_VERSION};
use crate::interfaces::{EventStoreError, Result};
use crate::stream::StreamName;

/// Hex characters of the stream-name digest kept in a table name.
const TABLE_HASH_LEN: usize = 40;

/// Physical table name for a stream: `_` followed by a SHA-256 prefix.
///
/// The leading underscore keeps the name a valid identifier on every vendor
/// even when the digest starts with a digit.
pub fn hash_table_name(stream_name: &StreamName) -> String {
    let digest = hex::encode(Sha256::digest(stream_name.as_str().as_bytes()));
    format!("_{}", &digest[..TABLE_HASH_LEN])
}

/// Name of the write lock guarding appends to `table`.
pub fn write_lock_name(table: &str) -> String {
    format!("_{}_write_lock", table)
}

/// Split an optionally schema-qualified name into a sea-query table reference.
pub fn table_ref(name: &str) -> TableRef {
    match name.split_once('.') {
        Some((schema, table)) => (Alias::new(schema), Alias::new(table)).into_table_ref(),
        None => Alias::new(name).into_table_ref(),
    }
}

/// Serialize a JSON document to the text stored in payload/metadata columns.
pub fn encode_json(value: &Value) -> Result<String> {
    Ok(serde_json::to_string(value)?)
}

/// Serialize event metadata.
pub fn encode_metadata(event: &Event) -> Result<String> {
    Ok(serde_json::to_string(event.metadata())?)
}

/// The event's aggregate version, required by version-keyed tables.
pub fn aggregate_version(event: &Event) -> Result<i64> {
    match event.metadata().get(AGGREGATE_VERSION) {
        None => Err(EventStoreError::Configuration(format!(
            "{} metadata key is required for event {}",
            AGGREGATE_VERSION,
            event.id()
        ))),
        Some(value) => value.as_i64().ok_or_else(|| {
            EventStoreError::Configuration(format!(
                "{} must be an integer for event {}, got {}",
                AGGREGATE_VERSION,
                event.id(),
                value
            ))
        }),
    }
}

/// Check that all three aggregate keys are present.
pub fn require_aggregate_keys(event: &Event) -> Result<()> {
    for key in [AGGREGATE_ID, AGGREGATE_TYPE] {
        if !event.metadata().contains_key(key) {
            return Err(EventStoreError::Configuration(format!(
                "{} metadata key is required for event {}",
                key,
                event.id()
            )));
        }
    }
    aggregate_version(event).map(|_| ())
}

/// The event's creation time as a naive UTC timestamp value.
pub fn created_at_value(event: &Event) -> SimpleExpr {
    event.created_at().naive_utc().into()
}
