//! Unified SQL storage implementation.
//!
//! This module provides the shared event store, cursor and predicate
//! compiler for the SQL backends (PostgreSQL, MySQL, SQLite). The
//! implementations are parameterized by database type using the
//! `SqlDatabase` trait; the marker types live in the vendor modules.

mod event_store;
mod iterator;
mod query;
mod where_clause;

pub use event_store::{SqlEventStore, DEFAULT_EVENT_STREAMS_TABLE, DEFAULT_LOAD_BATCH_SIZE};
pub use iterator::{Direction, EventRow, StreamIterator};
pub use query::SqlDatabase;
pub use where_clause::{Condition, WhereClause};
