//! PostgreSQL advisory write lock.

use async_trait::async_trait;
use sqlx::PgConnection;
use tracing::debug;

use super::Postgres;
use crate::interfaces::{Result, WriteLockStrategy};

/// Session-level advisory lock keyed by `hashtext(name)`.
///
/// `pg_advisory_lock` waits until the lock is free, so acquisition only
/// fails through a database error.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresAdvisoryLockStrategy;

#[async_trait]
impl WriteLockStrategy<Postgres> for PostgresAdvisoryLockStrategy {
    async fn get_lock(&self, conn: &mut PgConnection, name: &str) -> Result<bool> {
        sqlx::query("SELECT pg_advisory_lock(hashtext($1))")
            .bind(name)
            .execute(&mut *conn)
            .await?;
        debug!(lock = name, "Acquired advisory lock");
        Ok(true)
    }

    async fn release_lock(&self, conn: &mut PgConnection, name: &str) -> Result<bool> {
        let released: bool = sqlx::query_scalar("SELECT pg_advisory_unlock(hashtext($1))")
            .bind(name)
            .fetch_one(&mut *conn)
            .await?;
        Ok(released)
    }
}
