//! Shared storage integration tests.
//!
//! Tests the EventStore interface against all backends. Each backend test
//! binary imports these test functions and runs them.

pub mod event_store_tests;
