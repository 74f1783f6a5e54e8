//! SQL database abstraction trait.

use async_trait::async_trait;
use sea_query::{
    DeleteStatement, InsertStatement, SelectStatement, SimpleExpr, UpdateStatement, Values,
};

use super::EventRow;

/// Trait for SQL database backends.
///
/// This trait abstracts over the supported databases (PostgreSQL, MySQL,
/// SQLite) by providing the connection type, query building, statement
/// execution and the dialect fragments the store and the predicate compiler
/// cannot express through sea-query.
#[async_trait]
pub trait SqlDatabase: Send + Sync + 'static {
    /// The single connection a store owns.
    type Connection: Send;

    /// Vendor name used in logs.
    const NAME: &'static str;

    /// Bind marker understood inside custom sea-query expressions.
    const PLACEHOLDER: &'static str;

    /// Type name for `CAST(.. AS ..)` to text.
    const TEXT_TYPE: &'static str;

    /// Native regular expression match operator.
    const REGEX_OPERATOR: &'static str;

    /// Statement opening a transaction.
    const BEGIN_TRANSACTION: &'static str;

    /// Build a SQL query string and bind values from a sea-query SELECT statement.
    fn build_select(stmt: &SelectStatement) -> (String, Values);

    /// Build a SQL query string and bind values from a sea-query INSERT statement.
    fn build_insert(stmt: &InsertStatement) -> (String, Values);

    /// Build a SQL query string and bind values from a sea-query UPDATE statement.
    fn build_update(stmt: &UpdateStatement) -> (String, Values);

    /// Build a SQL query string and bind values from a sea-query DELETE statement.
    fn build_delete(stmt: &DeleteStatement) -> (String, Values);

    /// Quote an optionally schema-qualified table name for hand-written DDL.
    fn quote_table(name: &str) -> String;

    /// DDL creating the registry table.
    fn event_streams_schema(table: &str) -> Vec<String>;

    /// Whether the error reports a missing table or relation.
    fn is_table_not_found(err: &sqlx::Error) -> bool;

    /// JSON document value bound into a registry `metadata` column.
    fn json_document(json: String) -> SimpleExpr {
        json.into()
    }

    /// Metadata field extracted as unquoted text.
    fn json_text_field(column: &str, field: &str) -> String;

    /// Metadata field extracted as a JSON value, for number and boolean comparisons.
    fn json_value_field(column: &str, field: &str) -> String;

    /// Bind marker for a number compared against `json_value_field`.
    fn json_number_placeholder() -> String {
        Self::PLACEHOLDER.to_string()
    }

    /// Literal token for a boolean compared against `json_value_field`.
    fn json_bool_literal(value: bool) -> &'static str {
        if value {
            "true"
        } else {
            "false"
        }
    }

    /// Attach a strategy's index hint to an event SELECT. Ignored unless the
    /// dialect has hint syntax.
    fn apply_index_hint(_stmt: &mut SelectStatement, _index: &str) {}

    /// Execute a statement with bound values, returning affected rows.
    async fn execute(
        conn: &mut Self::Connection,
        sql: &str,
        values: Values,
    ) -> sqlx::Result<u64>;

    /// Execute unparameterized SQL (DDL, transaction control).
    async fn execute_raw(conn: &mut Self::Connection, sql: &str) -> sqlx::Result<()>;

    /// Fetch event rows.
    async fn fetch_events(
        conn: &mut Self::Connection,
        sql: &str,
        values: Values,
    ) -> sqlx::Result<Vec<EventRow>>;

    /// Fetch the first column of every row as text.
    async fn fetch_strings(
        conn: &mut Self::Connection,
        sql: &str,
        values: Values,
    ) -> sqlx::Result<Vec<String>>;
}
