//! Utility functions.
//!
//! Process-level helpers shared by binaries embedding the event store.

pub mod bootstrap;
