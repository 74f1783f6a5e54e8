//! Immutable event records.

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Metadata key carrying the aggregate identifier.
pub const AGGREGATE_ID: &str = "_aggregate_id";
/// Metadata key carrying the aggregate type.
pub const AGGREGATE_TYPE: &str = "_aggregate_type";
/// Metadata key carrying the aggregate version.
pub const AGGREGATE_VERSION: &str = "_aggregate_version";
/// Metadata key injected on read with the row's position.
pub const POSITION: &str = "_position";

/// A single immutable event.
///
/// Events are built by the caller before being handed to the store and are
/// never mutated after append. `created_at` is kept at microsecond precision
/// because that is what every supported column type stores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    id: Uuid,
    name: String,
    payload: Value,
    metadata: Map<String, Value>,
    created_at: DateTime<Utc>,
}

impl Event {
    /// Create a new event with a random id, stamped with the current time.
    pub fn new(name: impl Into<String>, payload: Value) -> Self {
        Self::with_id(Uuid::new_v4(), name, payload, Utc::now())
    }

    /// Create an event with an explicit id and creation time.
    pub fn with_id(
        id: Uuid,
        name: impl Into<String>,
        payload: Value,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            payload,
            metadata: Map::new(),
            created_at: created_at.trunc_subsecs(6),
        }
    }

    /// Return a copy with `key` set to `value` in the metadata.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Return a copy carrying the reserved aggregate keys.
    pub fn with_aggregate(
        self,
        aggregate_id: impl Into<String>,
        aggregate_type: impl Into<String>,
        version: u64,
    ) -> Self {
        self.with_metadata(AGGREGATE_ID, aggregate_id.into())
            .with_metadata(AGGREGATE_TYPE, aggregate_type.into())
            .with_metadata(AGGREGATE_VERSION, version)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn payload(&self) -> &Value {
        &self.payload
    }

    pub fn metadata(&self) -> &Map<String, Value> {
        &self.metadata
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// The aggregate version from metadata, if present and integral.
    pub fn aggregate_version(&self) -> Option<i64> {
        self.metadata.get(AGGREGATE_VERSION).and_then(Value::as_i64)
    }

    /// The position injected on read, if any.
    pub fn position(&self) -> Option<i64> {
        self.metadata.get(POSITION).and_then(Value::as_i64)
    }

    pub(crate) fn from_parts(
        id: Uuid,
        name: String,
        payload: Value,
        metadata: Map<String, Value>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name,
            payload,
            metadata,
            created_at,
        }
    }

    pub(crate) fn metadata_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.metadata
    }
}
