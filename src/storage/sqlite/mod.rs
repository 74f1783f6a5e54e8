//! SQLite backend.
//!
//! Regular expression filters need the `REGEXP` function, which the
//! connection gets from `SqliteConnectOptions::with_regexp`.

mod strategy;

pub use strategy::{
    SqliteAggregateStreamStrategy, SqliteSimpleStreamStrategy, SqliteSingleStreamStrategy,
};

use async_trait::async_trait;
use sea_query::{
    DeleteStatement, InsertStatement, SelectStatement, SqliteQueryBuilder, UpdateStatement, Values,
};
use sea_query_binder::SqlxValues;
use sqlx::SqliteConnection;

use super::sql::{EventRow, SqlDatabase, SqlEventStore};

/// Message prefix SQLite reports for an unknown table.
const NO_SUCH_TABLE: &str = "no such table";

/// Extended result codes `SQLITE_CONSTRAINT_UNIQUE` and `SQLITE_CONSTRAINT_PRIMARYKEY`.
pub(crate) const UNIQUE_VIOLATION_CODES: &[&str] = &["2067", "1555"];

/// SQLite database marker type.
pub struct Sqlite;

/// SQLite event store.
pub type SqliteEventStore = SqlEventStore<Sqlite>;

pub(crate) fn quote_table(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

#[async_trait]
impl SqlDatabase for Sqlite {
    type Connection = SqliteConnection;

    const NAME: &'static str = "sqlite";
    const PLACEHOLDER: &'static str = "?";
    const TEXT_TYPE: &'static str = "TEXT";
    const REGEX_OPERATOR: &'static str = "REGEXP";
    const BEGIN_TRANSACTION: &'static str = "BEGIN";

    fn build_select(stmt: &SelectStatement) -> (String, Values) {
        stmt.build(SqliteQueryBuilder)
    }

    fn build_insert(stmt: &InsertStatement) -> (String, Values) {
        stmt.build(SqliteQueryBuilder)
    }

    fn build_update(stmt: &UpdateStatement) -> (String, Values) {
        stmt.build(SqliteQueryBuilder)
    }

    fn build_delete(stmt: &DeleteStatement) -> (String, Values) {
        stmt.build(SqliteQueryBuilder)
    }

    fn quote_table(name: &str) -> String {
        quote_table(name)
    }

    fn event_streams_schema(table: &str) -> Vec<String> {
        let quoted = quote_table(table);
        vec![
            format!(
                r#"CREATE TABLE IF NOT EXISTS {quoted} (
    no INTEGER PRIMARY KEY AUTOINCREMENT,
    real_stream_name TEXT NOT NULL UNIQUE,
    stream_name TEXT NOT NULL UNIQUE,
    metadata TEXT,
    category TEXT
)"#
            ),
            format!(
                r#"CREATE INDEX IF NOT EXISTS "{}_category_idx" ON {quoted} (category)"#,
                table.replace('"', "\"\"")
            ),
        ]
    }

    fn is_table_not_found(err: &sqlx::Error) -> bool {
        err.as_database_error()
            .is_some_and(|db_err| db_err.message().starts_with(NO_SUCH_TABLE))
    }

    fn json_text_field(column: &str, field: &str) -> String {
        format!("json_extract({}, '$.\"{}\"')", column, field)
    }

    fn json_value_field(column: &str, field: &str) -> String {
        Self::json_text_field(column, field)
    }

    async fn execute(conn: &mut SqliteConnection, sql: &str, values: Values) -> sqlx::Result<u64> {
        let result = sqlx::query_with(sql, SqlxValues(values))
            .execute(&mut *conn)
            .await?;
        Ok(result.rows_affected())
    }

    async fn execute_raw(conn: &mut SqliteConnection, sql: &str) -> sqlx::Result<()> {
        sqlx::Executor::execute(&mut *conn, sql).await?;
        Ok(())
    }

    async fn fetch_events(
        conn: &mut SqliteConnection,
        sql: &str,
        values: Values,
    ) -> sqlx::Result<Vec<EventRow>> {
        sqlx::query_as_with::<_, EventRow, _>(sql, SqlxValues(values))
            .fetch_all(&mut *conn)
            .await
    }

    async fn fetch_strings(
        conn: &mut SqliteConnection,
        sql: &str,
        values: Values,
    ) -> sqlx::Result<Vec<String>> {
        sqlx::query_scalar_with::<_, String, _>(sql, SqlxValues(values))
            .fetch_all(&mut *conn)
            .await
    }
}
