//! Vendor-neutral write lock.

use std::marker::PhantomData;

use async_trait::async_trait;

use crate::interfaces::{Result, WriteLockStrategy};
use crate::storage::sql::SqlDatabase;

/// Lock that always succeeds.
///
/// For single-writer deployments that rely only on the position uniqueness
/// constraint to reject conflicting appends.
pub struct NoLockStrategy<D> {
    _database: PhantomData<fn() -> D>,
}

impl<D> NoLockStrategy<D> {
    pub fn new() -> Self {
        Self {
            _database: PhantomData,
        }
    }
}

impl<D> Default for NoLockStrategy<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D> std::fmt::Debug for NoLockStrategy<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("NoLockStrategy")
    }
}

#[async_trait]
impl<D: SqlDatabase> WriteLockStrategy<D> for NoLockStrategy<D> {
    async fn get_lock(&self, _conn: &mut D::Connection, _name: &str) -> Result<bool> {
        Ok(true)
    }

    async fn release_lock(&self, _conn: &mut D::Connection, _name: &str) -> Result<bool> {
        Ok(true)
    }
}
