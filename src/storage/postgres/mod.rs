//! PostgreSQL backend.

mod lock;
mod strategy;

pub use lock::PostgresAdvisoryLockStrategy;
pub use strategy::{
    PostgresAggregateStreamStrategy, PostgresSimpleStreamStrategy, PostgresSingleStreamStrategy,
};

use async_trait::async_trait;
use sea_query::{
    Alias, DeleteStatement, Func, InsertStatement, PostgresQueryBuilder, SelectStatement,
    SimpleExpr, UpdateStatement, Values,
};
use sea_query_binder::SqlxValues;
use sqlx::PgConnection;

use super::sql::{EventRow, SqlDatabase, SqlEventStore};

/// SQLSTATE for an undefined table.
const UNDEFINED_TABLE: &str = "42P01";

/// SQLSTATE for a unique violation.
pub(crate) const UNIQUE_VIOLATION_CODES: &[&str] = &["23505"];

/// PostgreSQL database marker type.
pub struct Postgres;

/// PostgreSQL event store.
pub type PostgresEventStore = SqlEventStore<Postgres>;

/// Quote each dot-separated part of a possibly schema-qualified name.
pub(crate) fn quote_table(name: &str) -> String {
    name.split('.')
        .map(|part| format!("\"{}\"", part.replace('"', "\"\"")))
        .collect::<Vec<_>>()
        .join(".")
}

/// Unqualified part of a possibly schema-qualified name.
pub(crate) fn bare_table(name: &str) -> &str {
    name.rsplit('.').next().unwrap_or(name)
}

#[async_trait]
impl SqlDatabase for Postgres {
    type Connection = PgConnection;

    const NAME: &'static str = "postgres";
    const PLACEHOLDER: &'static str = "$";
    const TEXT_TYPE: &'static str = "TEXT";
    const REGEX_OPERATOR: &'static str = "~";
    const BEGIN_TRANSACTION: &'static str = "BEGIN";

    fn build_select(stmt: &SelectStatement) -> (String, Values) {
        stmt.build(PostgresQueryBuilder)
    }

    fn build_insert(stmt: &InsertStatement) -> (String, Values) {
        stmt.build(PostgresQueryBuilder)
    }

    fn build_update(stmt: &UpdateStatement) -> (String, Values) {
        stmt.build(PostgresQueryBuilder)
    }

    fn build_delete(stmt: &DeleteStatement) -> (String, Values) {
        stmt.build(PostgresQueryBuilder)
    }

    fn quote_table(name: &str) -> String {
        quote_table(name)
    }

    fn event_streams_schema(table: &str) -> Vec<String> {
        let quoted = quote_table(table);
        vec![
            format!(
                r#"CREATE TABLE IF NOT EXISTS {quoted} (
    no BIGSERIAL,
    real_stream_name VARCHAR(150) NOT NULL,
    stream_name VARCHAR(150) NOT NULL,
    metadata JSONB,
    category VARCHAR(150),
    PRIMARY KEY (no),
    UNIQUE (real_stream_name),
    UNIQUE (stream_name)
)"#
            ),
            format!(
                r#"CREATE INDEX IF NOT EXISTS "{}_category_idx" ON {quoted} (category)"#,
                bare_table(table)
            ),
        ]
    }

    fn is_table_not_found(err: &sqlx::Error) -> bool {
        err.as_database_error()
            .and_then(|db_err| db_err.code())
            .is_some_and(|code| code == UNDEFINED_TABLE)
    }

    fn json_document(json: String) -> SimpleExpr {
        Func::cast_as(json, Alias::new("JSONB")).into()
    }

    fn json_text_field(column: &str, field: &str) -> String {
        format!("{}->>'{}'", column, field)
    }

    fn json_value_field(column: &str, field: &str) -> String {
        format!("{}->'{}'", column, field)
    }

    fn json_number_placeholder() -> String {
        format!("to_jsonb({})", Self::PLACEHOLDER)
    }

    fn json_bool_literal(value: bool) -> &'static str {
        if value {
            "'true'"
        } else {
            "'false'"
        }
    }

    async fn execute(conn: &mut PgConnection, sql: &str, values: Values) -> sqlx::Result<u64> {
        let result = sqlx::query_with(sql, SqlxValues(values))
            .execute(&mut *conn)
            .await?;
        Ok(result.rows_affected())
    }

    async fn execute_raw(conn: &mut PgConnection, sql: &str) -> sqlx::Result<()> {
        sqlx::Executor::execute(&mut *conn, sql).await?;
        Ok(())
    }

    async fn fetch_events(
        conn: &mut PgConnection,
        sql: &str,
        values: Values,
    ) -> sqlx::Result<Vec<EventRow>> {
        sqlx::query_as_with::<_, EventRow, _>(sql, SqlxValues(values))
            .fetch_all(&mut *conn)
            .await
    }

    async fn fetch_strings(
        conn: &mut PgConnection,
        sql: &str,
        values: Values,
    ) -> sqlx::Result<Vec<String>> {
        sqlx::query_scalar_with::<_, String, _>(sql, SqlxValues(values))
            .fetch_all(&mut *conn)
            .await
    }
}
