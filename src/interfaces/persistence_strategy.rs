//! Persistence strategy interface.

use sea_query::SimpleExpr;

use crate::event::Event;
use crate::interfaces::Result;
use crate::storage::helpers::hash_table_name;
use crate::storage::sql::SqlDatabase;
use crate::stream::StreamName;

/// Maps streams to physical tables for one database vendor.
///
/// Pure policy: no I/O beyond producing DDL text and row values. The type
/// parameter ties a strategy to the vendor whose DDL it emits.
pub trait PersistenceStrategy<D: SqlDatabase>: Send + Sync {
    /// Deterministic physical table name for a stream.
    fn generate_table_name(&self, stream_name: &StreamName) -> String {
        hash_table_name(stream_name)
    }

    /// DDL statements creating the table, executed in order.
    fn create_schema(&self, table_name: &str) -> Vec<String>;

    /// Insert column order, matching `prepare_data`.
    fn column_names(&self) -> Vec<&'static str>;

    /// Row-major column values for `events`.
    ///
    /// Fails with `Configuration` before any SQL runs when a required
    /// aggregate key is missing.
    fn prepare_data(&self, events: &[Event]) -> Result<Vec<SimpleExpr>>;

    /// Vendor error codes that mean a uniqueness conflict.
    fn unique_violation_error_codes(&self) -> &'static [&'static str];

    /// Metadata keys projected into indexed columns, as `(key, column)`.
    fn indexed_metadata_fields(&self) -> &'static [(&'static str, &'static str)] {
        &[]
    }

    /// Index the read query should be pinned to, where the vendor supports hints.
    fn index_hint(&self) -> Option<&'static str> {
        None
    }
}
