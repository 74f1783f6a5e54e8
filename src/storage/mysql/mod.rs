//! MySQL backend.

mod lock;
mod strategy;

pub use lock::MySqlMetadataLockStrategy;
pub use strategy::{
    MySqlAggregateStreamStrategy, MySqlSimpleStreamStrategy, MySqlSingleStreamStrategy,
};

use async_trait::async_trait;
use sea_query::extension::mysql::{IndexHintScope, MySqlSelectStatementExt};
use sea_query::{
    Alias, DeleteStatement, InsertStatement, MysqlQueryBuilder, SelectStatement, UpdateStatement,
    Values,
};
use sea_query_binder::SqlxValues;
use sqlx::MySqlConnection;

use super::sql::{EventRow, SqlDatabase, SqlEventStore};

/// SQLSTATE for an unknown table.
const NO_SUCH_TABLE: &str = "42S02";

/// SQLSTATE for an integrity constraint violation (duplicate key).
pub(crate) const UNIQUE_VIOLATION_CODES: &[&str] = &["23000"];

/// MySQL database marker type.
pub struct MySql;

/// MySQL event store.
pub type MySqlEventStore = SqlEventStore<MySql>;

pub(crate) fn quote_table(name: &str) -> String {
    name.split('.')
        .map(|part| format!("`{}`", part.replace('`', "``")))
        .collect::<Vec<_>>()
        .join(".")
}

#[async_trait]
impl SqlDatabase for MySql {
    type Connection = MySqlConnection;

    const NAME: &'static str = "mysql";
    const PLACEHOLDER: &'static str = "?";
    const TEXT_TYPE: &'static str = "CHAR";
    const REGEX_OPERATOR: &'static str = "REGEXP";
    const BEGIN_TRANSACTION: &'static str = "START TRANSACTION";

    fn build_select(stmt: &SelectStatement) -> (String, Values) {
        stmt.build(MysqlQueryBuilder)
    }

    fn build_insert(stmt: &InsertStatement) -> (String, Values) {
        stmt.build(MysqlQueryBuilder)
    }

    fn build_update(stmt: &UpdateStatement) -> (String, Values) {
        stmt.build(MysqlQueryBuilder)
    }

    fn build_delete(stmt: &DeleteStatement) -> (String, Values) {
        stmt.build(MysqlQueryBuilder)
    }

    fn quote_table(name: &str) -> String {
        quote_table(name)
    }

    fn event_streams_schema(table: &str) -> Vec<String> {
        vec![format!(
            "CREATE TABLE IF NOT EXISTS {} (
    `no` BIGINT NOT NULL AUTO_INCREMENT,
    `real_stream_name` VARCHAR(150) NOT NULL,
    `stream_name` VARCHAR(150) NOT NULL,
    `metadata` JSON,
    `category` VARCHAR(150),
    PRIMARY KEY (`no`),
    UNIQUE KEY `ix_rsn` (`real_stream_name`),
    UNIQUE KEY `ix_sn` (`stream_name`),
    KEY `ix_cat` (`category`)
) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4 COLLATE=utf8mb4_bin",
            quote_table(table)
        )]
    }

    fn is_table_not_found(err: &sqlx::Error) -> bool {
        err.as_database_error()
            .and_then(|db_err| db_err.code())
            .is_some_and(|code| code == NO_SUCH_TABLE)
    }

    fn json_text_field(column: &str, field: &str) -> String {
        format!("JSON_UNQUOTE({})", Self::json_value_field(column, field))
    }

    fn json_value_field(column: &str, field: &str) -> String {
        format!("JSON_EXTRACT({}, '$.\"{}\"')", column, field)
    }

    fn apply_index_hint(stmt: &mut SelectStatement, index: &str) {
        stmt.use_index(Alias::new(index), IndexHintScope::All);
    }

    async fn execute(conn: &mut MySqlConnection, sql: &str, values: Values) -> sqlx::Result<u64> {
        let result = sqlx::query_with(sql, SqlxValues(values))
            .execute(&mut *conn)
            .await?;
        Ok(result.rows_affected())
    }

    async fn execute_raw(conn: &mut MySqlConnection, sql: &str) -> sqlx::Result<()> {
        sqlx::Executor::execute(&mut *conn, sql).await?;
        Ok(())
    }

    async fn fetch_events(
        conn: &mut MySqlConnection,
        sql: &str,
        values: Values,
    ) -> sqlx::Result<Vec<EventRow>> {
        sqlx::query_as_with::<_, EventRow, _>(sql, SqlxValues(values))
            .fetch_all(&mut *conn)
            .await
    }

    async fn fetch_strings(
        conn: &mut MySqlConnection,
        sql: &str,
        values: Values,
    ) -> sqlx::Result<Vec<String>> {
        sqlx::query_scalar_with::<_, String, _>(sql, SqlxValues(values))
            .fetch_all(&mut *conn)
            .await
    }
}
