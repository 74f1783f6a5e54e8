//! MySQL named write lock.

use async_trait::async_trait;
use sqlx::mysql::MySqlDatabaseError;
use sqlx::MySqlConnection;
use tracing::warn;

use super::MySql;
use crate::interfaces::{Result, WriteLockStrategy};

/// Server error number for a deadlock detected while acquiring a user lock.
const ER_USER_LOCK_DEADLOCK: u16 = 3058;

/// `GET_LOCK` / `RELEASE_LOCK` named lock.
///
/// A timeout of `-1` waits forever. A lock deadlock reported by the server
/// counts as a failed acquisition rather than an error.
#[derive(Debug, Clone, Copy)]
pub struct MySqlMetadataLockStrategy {
    timeout_secs: i64,
}

impl MySqlMetadataLockStrategy {
    pub fn new(timeout_secs: i64) -> Self {
        Self { timeout_secs }
    }

    pub fn timeout_secs(&self) -> i64 {
        self.timeout_secs
    }
}

impl Default for MySqlMetadataLockStrategy {
    fn default() -> Self {
        Self::new(-1)
    }
}

fn is_lock_deadlock(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .and_then(|db_err| db_err.try_downcast_ref::<MySqlDatabaseError>())
        .is_some_and(|db_err| db_err.number() == ER_USER_LOCK_DEADLOCK)
}

#[async_trait]
impl WriteLockStrategy<MySql> for MySqlMetadataLockStrategy {
    async fn get_lock(&self, conn: &mut MySqlConnection, name: &str) -> Result<bool> {
        let acquired: std::result::Result<Option<i64>, sqlx::Error> =
            sqlx::query_scalar("SELECT GET_LOCK(?, ?)")
                .bind(name)
                .bind(self.timeout_secs)
                .fetch_one(&mut *conn)
                .await;

        match acquired {
            Ok(result) => Ok(result == Some(1)),
            Err(err) if is_lock_deadlock(&err) => {
                warn!(lock = name, "Deadlock while acquiring write lock");
                Ok(false)
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn release_lock(&self, conn: &mut MySqlConnection, name: &str) -> Result<bool> {
        let released: Option<i64> = sqlx::query_scalar("SELECT RELEASE_LOCK(?)")
            .bind(name)
            .fetch_one(&mut *conn)
            .await?;
        Ok(released == Some(1))
    }
}
