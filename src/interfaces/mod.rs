//! Abstract interfaces for the event store.
//!
//! These traits define the contracts for:
//! - Event storage (the public operation surface)
//! - Event cursors (lazy, restartable reads)
//! - Persistence strategies (stream to table mapping)
//! - Write locks (pessimistic writer serialization)

pub mod event_store;
pub mod iterator;
pub mod persistence_strategy;
pub mod write_lock;

pub use event_store::{EventStore, EventStoreError, Result};
pub use iterator::{EventStreamIterator, InMemoryIterator};
pub use persistence_strategy::PersistenceStrategy;
pub use write_lock::WriteLockStrategy;
