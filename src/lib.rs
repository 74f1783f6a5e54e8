//! sql-event-store - append-only event streams on relational databases
//!
//! Each stream is a physical table addressed by a hashed name and listed in
//! a registry table. Events are appended atomically, read lazily in bounded
//! batches, and filtered by compiled metadata predicates. Conflicting
//! writers are rejected by uniqueness constraints, optionally preceded by a
//! named write lock.
//!
//! Backends are selected with Cargo features: `sqlite` (default),
//! `postgres`, `mysql`.

pub mod config;
pub mod event;
pub mod interfaces;
pub mod matcher;
pub mod plugin;
pub mod storage;
pub mod stream;
pub mod utils;

pub use config::StoreConfig;
pub use event::Event;
pub use interfaces::{
    EventStore, EventStoreError, EventStreamIterator, PersistenceStrategy, Result,
    WriteLockStrategy,
};
pub use matcher::{FieldType, MatchValue, MetadataMatcher, Operator};
pub use plugin::{PluggableEventStore, Plugin};
pub use storage::{connect, SqlEventStore};
pub use stream::{Stream, StreamMetadata, StreamName};
