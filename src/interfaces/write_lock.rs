//! Write lock interface.

use async_trait::async_trait;

use crate::interfaces::Result;
use crate::storage::sql::SqlDatabase;

/// Named, session-scoped lock serializing writers of one stream.
///
/// Locks are taken on the store's own connection so they share its session.
#[async_trait]
pub trait WriteLockStrategy<D: SqlDatabase>: Send + Sync {
    /// Acquire `name`. `Ok(false)` means the lock could not be obtained.
    async fn get_lock(&self, conn: &mut D::Connection, name: &str) -> Result<bool>;

    /// Release `name`. `Ok(false)` means this session did not hold it.
    async fn release_lock(&self, conn: &mut D::Connection, name: &str) -> Result<bool>;
}
