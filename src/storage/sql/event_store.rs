//! Unified SQL EventStore implementation.
//!
//! One generic store drives every vendor: the `SqlDatabase` marker type
//! supplies execution and dialect fragments, the persistence strategy
//! supplies the table layout, and the optional write lock serializes
//! writers.

use async_trait::async_trait;
use futures::future::BoxFuture;
use sea_query::{Alias, Expr, Func, Order, Query, SelectStatement, Values};
use serde_json::Value;
use tracing::{debug, info, warn};

use super::iterator::{Direction, StreamIterator};
use super::where_clause::WhereClause;
use super::SqlDatabase;
use crate::event::Event;
use crate::interfaces::{
    EventStore, EventStoreError, EventStreamIterator, PersistenceStrategy, Result,
    WriteLockStrategy,
};
use crate::matcher::MetadataMatcher;
use crate::storage::helpers::{table_ref, write_lock_name};
use crate::storage::schema::{EventStreams, StreamEvents};
use crate::stream::{Stream, StreamMetadata, StreamName};

/// Rows fetched per cursor batch unless configured otherwise.
pub const DEFAULT_LOAD_BATCH_SIZE: u64 = 10_000;

/// Registry table name unless configured otherwise.
pub const DEFAULT_EVENT_STREAMS_TABLE: &str = "event_streams";

/// Upper bound on rows per INSERT, keeping bind parameter counts under vendor limits.
const INSERT_CHUNK_ROWS: usize = 1000;

const COMMIT: &str = "COMMIT";
const ROLLBACK: &str = "ROLLBACK";

const SAVEPOINT: &str = "SAVEPOINT event_store_append";
const RELEASE_SAVEPOINT: &str = "RELEASE SAVEPOINT event_store_append";
const ROLLBACK_TO_SAVEPOINT: &str = "ROLLBACK TO SAVEPOINT event_store_append";

/// SQL-based implementation of EventStore.
///
/// This generic implementation works with any SQL database that implements
/// the `SqlDatabase` trait (PostgreSQL, MySQL, SQLite). It owns a single
/// connection; a cursor returned by `load` borrows it until dropped.
pub struct SqlEventStore<D: SqlDatabase> {
    conn: D::Connection,
    strategy: Box<dyn PersistenceStrategy<D>>,
    write_lock: Option<Box<dyn WriteLockStrategy<D>>>,
    load_batch_size: u64,
    event_streams_table: String,
    disable_transaction_handling: bool,
    in_transaction: bool,
    during_create: bool,
}

impl<D: SqlDatabase> SqlEventStore<D> {
    /// Create a new SQL event store over `conn`.
    pub fn new(conn: D::Connection, strategy: impl PersistenceStrategy<D> + 'static) -> Self {
        Self::with_boxed_strategy(conn, Box::new(strategy))
    }

    /// Create a store from a strategy chosen at runtime.
    pub fn with_boxed_strategy(
        conn: D::Connection,
        strategy: Box<dyn PersistenceStrategy<D>>,
    ) -> Self {
        Self {
            conn,
            strategy,
            write_lock: None,
            load_batch_size: DEFAULT_LOAD_BATCH_SIZE,
            event_streams_table: DEFAULT_EVENT_STREAMS_TABLE.to_string(),
            disable_transaction_handling: false,
            in_transaction: false,
            during_create: false,
        }
    }

    pub fn with_load_batch_size(mut self, load_batch_size: u64) -> Self {
        self.load_batch_size = load_batch_size.max(1);
        self
    }

    pub fn with_event_streams_table(mut self, table: impl Into<String>) -> Self {
        self.event_streams_table = table.into();
        self
    }

    pub fn with_write_lock_strategy(self, lock: impl WriteLockStrategy<D> + 'static) -> Self {
        self.with_boxed_write_lock(Box::new(lock))
    }

    pub fn with_boxed_write_lock(mut self, lock: Box<dyn WriteLockStrategy<D>>) -> Self {
        self.write_lock = Some(lock);
        self
    }

    /// Leave transaction control to the caller; the store never begins,
    /// commits or rolls back on its own.
    pub fn with_disabled_transaction_handling(mut self) -> Self {
        self.disable_transaction_handling = true;
        self
    }

    /// Get the underlying connection.
    pub fn connection(&mut self) -> &mut D::Connection {
        &mut self.conn
    }

    pub fn event_streams_table(&self) -> &str {
        &self.event_streams_table
    }

    /// Create the registry table if it does not exist.
    pub async fn create_event_streams_table(&mut self) -> Result<()> {
        for statement in D::event_streams_schema(&self.event_streams_table) {
            D::execute_raw(&mut self.conn, &statement).await?;
        }
        info!(
            backend = D::NAME,
            table = %self.event_streams_table,
            "Event streams table ready"
        );
        Ok(())
    }

    pub async fn begin_transaction(&mut self) -> Result<()> {
        if self.in_transaction {
            return Err(EventStoreError::TransactionAlreadyStarted);
        }
        D::execute_raw(&mut self.conn, D::BEGIN_TRANSACTION).await?;
        self.in_transaction = true;
        Ok(())
    }

    pub async fn commit(&mut self) -> Result<()> {
        if !self.in_transaction {
            return Err(EventStoreError::TransactionNotStarted);
        }
        self.in_transaction = false;
        D::execute_raw(&mut self.conn, COMMIT).await?;
        Ok(())
    }

    pub async fn rollback(&mut self) -> Result<()> {
        if !self.in_transaction {
            return Err(EventStoreError::TransactionNotStarted);
        }
        self.in_transaction = false;
        D::execute_raw(&mut self.conn, ROLLBACK).await?;
        Ok(())
    }

    pub fn in_transaction(&self) -> bool {
        self.in_transaction
    }

    /// Run `f` inside a transaction: commit on `Ok`, roll back on `Err`.
    ///
    /// The closure's future may only borrow the store, so move any other
    /// inputs into it.
    pub async fn transactional<T, F>(&mut self, f: F) -> Result<T>
    where
        F: for<'s> FnOnce(&'s mut Self) -> BoxFuture<'s, Result<T>>,
    {
        self.begin_transaction().await?;
        match f(&mut *self).await {
            Ok(value) => {
                self.commit().await?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = self.rollback().await {
                    warn!(error = %rollback_err, "Rollback after failed transactional block failed");
                }
                Err(err)
            }
        }
    }

    fn owns_transaction(&self) -> bool {
        !self.disable_transaction_handling && !self.in_transaction && !self.during_create
    }

    fn is_unique_violation(&self, err: &sqlx::Error) -> bool {
        error_code(err).is_some_and(|code| {
            self.strategy
                .unique_violation_error_codes()
                .contains(&code.as_str())
        })
    }

    /// Map an append failure to the domain error it stands for.
    fn classify_write_error(&self, err: sqlx::Error, stream_name: &StreamName) -> EventStoreError {
        if D::is_table_not_found(&err) {
            return EventStoreError::StreamNotFound(stream_name.clone());
        }
        if self.is_unique_violation(&err) {
            if let Some(db_err) = err.as_database_error() {
                return EventStoreError::Concurrency {
                    code: error_code(&err),
                    message: db_err.message().to_string(),
                };
            }
        }
        err.into()
    }

    async fn add_stream_to_registry(
        &mut self,
        stream_name: &StreamName,
        table: &str,
        metadata: &StreamMetadata,
    ) -> Result<()> {
        let metadata = serde_json::to_string(metadata)?;
        let stmt = Query::insert()
            .into_table(table_ref(&self.event_streams_table))
            .columns([
                EventStreams::RealStreamName,
                EventStreams::StreamName,
                EventStreams::Metadata,
                EventStreams::Category,
            ])
            .values([
                stream_name.as_str().into(),
                table.into(),
                D::json_document(metadata),
                stream_name.category().map(str::to_string).into(),
            ])
            .map_err(builder_error)?
            .to_owned();

        let (sql, values) = D::build_insert(&stmt);
        match D::execute(&mut self.conn, &sql, values).await {
            Ok(_) => Ok(()),
            Err(err) if D::is_table_not_found(&err) => Err(EventStoreError::Runtime {
                code: error_code(&err),
                message: format!(
                    "event streams table {} is missing, create it before adding streams",
                    self.event_streams_table
                ),
            }),
            Err(err) if self.is_unique_violation(&err) => {
                Err(EventStoreError::StreamExistsAlready(stream_name.clone()))
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn create_stream_table(&mut self, table: &str) -> Result<()> {
        for statement in self.strategy.create_schema(table) {
            D::execute_raw(&mut self.conn, &statement).await?;
        }
        Ok(())
    }

    /// Best-effort removal of a half-created stream. Failures are logged only.
    async fn cleanup_failed_create(&mut self, stream_name: &StreamName, table: &str) {
        if let Err(err) = self.drop_stream_table(table).await {
            warn!(stream = %stream_name, table, error = %err, "Failed to drop table of failed stream");
        }
        if let Err(err) = self.remove_from_registry(stream_name).await {
            warn!(stream = %stream_name, error = %err, "Failed to remove registry row of failed stream");
        }
    }

    async fn drop_stream_table(&mut self, table: &str) -> sqlx::Result<()> {
        let sql = format!("DROP TABLE IF EXISTS {}", D::quote_table(table));
        D::execute_raw(&mut self.conn, &sql).await
    }

    async fn remove_from_registry(&mut self, stream_name: &StreamName) -> sqlx::Result<u64> {
        let stmt = Query::delete()
            .from_table(table_ref(&self.event_streams_table))
            .and_where(Expr::col(EventStreams::RealStreamName).eq(stream_name.as_str()))
            .to_owned();
        let (sql, values) = D::build_delete(&stmt);
        D::execute(&mut self.conn, &sql, values).await
    }

    async fn delete_stream(&mut self, stream_name: &StreamName, table: &str) -> Result<()> {
        if self.remove_from_registry(stream_name).await? == 0 {
            return Err(EventStoreError::StreamNotFound(stream_name.clone()));
        }
        self.drop_stream_table(table).await?;
        Ok(())
    }

    /// Multi-row INSERT statements for row-major `data`.
    fn insert_statements(
        &self,
        table: &str,
        data: Vec<sea_query::SimpleExpr>,
    ) -> Result<Vec<(String, Values)>> {
        let columns = self.strategy.column_names();
        let width = columns.len();
        let mut statements = Vec::new();

        for chunk in data.chunks(width * INSERT_CHUNK_ROWS) {
            let mut stmt = Query::insert();
            stmt.into_table(table_ref(table))
                .columns(columns.iter().map(|column| Alias::new(*column)));
            for row in chunk.chunks(width) {
                stmt.values(row.to_vec()).map_err(builder_error)?;
            }
            statements.push(D::build_insert(&stmt));
        }
        Ok(statements)
    }

    /// Run insert statements, inside a transaction when the store owns one.
    ///
    /// Inside an already open transaction the inserts are fenced by a
    /// savepoint: a failed insert is rolled back to it so the transaction
    /// stays usable for the write lock release (Postgres aborts the whole
    /// transaction on any error otherwise).
    async fn write_rows(
        &mut self,
        stream_name: &StreamName,
        statements: Vec<(String, Values)>,
    ) -> Result<()> {
        let owns_transaction = self.owns_transaction();
        let savepoint = !owns_transaction && self.in_transaction;
        if owns_transaction {
            D::execute_raw(&mut self.conn, D::BEGIN_TRANSACTION).await?;
        } else if savepoint {
            D::execute_raw(&mut self.conn, SAVEPOINT).await?;
        }

        let mut outcome = Ok(());
        for (sql, values) in statements {
            if let Err(err) = D::execute(&mut self.conn, &sql, values).await {
                outcome = Err(err);
                break;
            }
        }

        if owns_transaction {
            outcome = match outcome {
                Ok(()) => D::execute_raw(&mut self.conn, COMMIT).await,
                Err(err) => {
                    if let Err(rollback_err) = D::execute_raw(&mut self.conn, ROLLBACK).await {
                        warn!(stream = %stream_name, error = %rollback_err, "Rollback after failed append failed");
                    }
                    Err(err)
                }
            };
        } else if savepoint {
            outcome = match outcome {
                Ok(()) => D::execute_raw(&mut self.conn, RELEASE_SAVEPOINT).await,
                Err(err) => {
                    if let Err(rollback_err) =
                        D::execute_raw(&mut self.conn, ROLLBACK_TO_SAVEPOINT).await
                    {
                        warn!(stream = %stream_name, error = %rollback_err, "Rollback to savepoint after failed append failed");
                    }
                    Err(err)
                }
            };
        }

        outcome.map_err(|err| self.classify_write_error(err, stream_name))
    }

    fn select_events(&self, table: &str, filter: WhereClause, direction: Direction) -> SelectStatement {
        let text = Alias::new(D::TEXT_TYPE);
        let mut stmt = Query::select();
        stmt.column(StreamEvents::No)
            .expr_as(
                Func::cast_as(Expr::col(StreamEvents::EventId), text.clone()),
                Alias::new("event_id"),
            )
            .column(StreamEvents::EventName)
            .expr_as(
                Func::cast_as(Expr::col(StreamEvents::Payload), text.clone()),
                Alias::new("payload"),
            )
            .expr_as(
                Func::cast_as(Expr::col(StreamEvents::Metadata), text),
                Alias::new("metadata"),
            )
            .column(StreamEvents::CreatedAt)
            .from(table_ref(table));

        if let Some(index) = self.strategy.index_hint() {
            D::apply_index_hint(&mut stmt, index);
        }
        for condition in filter.into_exprs() {
            stmt.and_where(condition);
        }
        stmt.order_by(
            StreamEvents::No,
            match direction {
                Direction::Forward => Order::Asc,
                Direction::Backward => Order::Desc,
            },
        );
        stmt
    }

    async fn open_cursor(
        &mut self,
        stream_name: &StreamName,
        from_number: i64,
        count: Option<u64>,
        matcher: Option<&MetadataMatcher>,
        direction: Direction,
    ) -> Result<StreamIterator<'_, D>> {
        if count == Some(0) {
            return Err(EventStoreError::InvalidArgument(
                "count must be greater than zero".to_string(),
            ));
        }

        let table = self.strategy.generate_table_name(stream_name);
        let filter = WhereClause::compile::<D>(matcher, self.strategy.indexed_metadata_fields())?;
        let query = self.select_events(&table, filter, direction);
        debug!(
            stream = %stream_name,
            table = %table,
            from = from_number,
            ?count,
            ?direction,
            "Loading events"
        );

        let cursor = StreamIterator::<D>::start(
            &mut self.conn,
            query,
            self.load_batch_size,
            from_number,
            count,
            direction,
        )
        .await
        .map_err(|err| {
            if D::is_table_not_found(&err) {
                EventStoreError::StreamNotFound(stream_name.clone())
            } else {
                err.into()
            }
        })?;

        if cursor.is_empty() {
            return Err(EventStoreError::StreamNotFound(stream_name.clone()));
        }
        Ok(cursor)
    }

    async fn fetch_names(&mut self, stmt: SelectStatement) -> Result<Vec<String>> {
        let (sql, values) = D::build_select(&stmt);
        Ok(D::fetch_strings(&mut self.conn, &sql, values).await?)
    }

    fn stream_names_query(
        &self,
        matcher: Option<&MetadataMatcher>,
        limit: u64,
        offset: u64,
    ) -> Result<SelectStatement> {
        let mut stmt = Query::select();
        stmt.column(EventStreams::RealStreamName)
            .from(table_ref(&self.event_streams_table))
            .order_by(EventStreams::RealStreamName, Order::Asc)
            .limit(limit)
            .offset(offset);
        for condition in WhereClause::compile_registry::<D>(matcher)?.into_exprs() {
            stmt.and_where(condition);
        }
        Ok(stmt)
    }

    fn category_names_query(&self, limit: u64, offset: u64) -> SelectStatement {
        let mut stmt = Query::select();
        stmt.distinct()
            .column(EventStreams::Category)
            .from(table_ref(&self.event_streams_table))
            .and_where(Expr::col(EventStreams::Category).is_not_null())
            .order_by(EventStreams::Category, Order::Asc)
            .limit(limit)
            .offset(offset);
        stmt
    }

    fn regex_condition(column: &str, pattern: &str) -> Result<sea_query::SimpleExpr> {
        validate_pattern(pattern)?;
        Ok(Expr::cust_with_values(
            format!("{} {} {}", column, D::REGEX_OPERATOR, D::PLACEHOLDER),
            [pattern.to_string()],
        ))
    }
}

#[async_trait]
impl<D: SqlDatabase> EventStore for SqlEventStore<D> {
    async fn create(&mut self, stream: &Stream) -> Result<()> {
        let table = self.strategy.generate_table_name(&stream.name);
        self.add_stream_to_registry(&stream.name, &table, &stream.metadata)
            .await?;

        if let Err(err) = self.create_stream_table(&table).await {
            self.cleanup_failed_create(&stream.name, &table).await;
            return Err(err);
        }

        let owns_transaction = self.owns_transaction();
        if owns_transaction {
            if let Err(err) = self.begin_transaction().await {
                self.cleanup_failed_create(&stream.name, &table).await;
                return Err(err);
            }
        }

        self.during_create = true;
        let appended = self.append_to(&stream.name, &stream.events).await;
        self.during_create = false;

        let outcome = match appended {
            Ok(()) if owns_transaction => self.commit().await,
            Ok(()) => Ok(()),
            Err(err) => {
                if owns_transaction {
                    if let Err(rollback_err) = self.rollback().await {
                        warn!(stream = %stream.name, error = %rollback_err, "Rollback after failed create failed");
                    }
                }
                Err(err)
            }
        };

        match outcome {
            Ok(()) => {
                info!(
                    backend = D::NAME,
                    stream = %stream.name,
                    table = %table,
                    events = stream.events.len(),
                    "Created stream"
                );
                Ok(())
            }
            Err(err) => {
                self.cleanup_failed_create(&stream.name, &table).await;
                Err(err)
            }
        }
    }

    async fn append_to(&mut self, stream_name: &StreamName, events: &[Event]) -> Result<()> {
        let table = self.strategy.generate_table_name(stream_name);
        let data = self.strategy.prepare_data(events)?;
        if events.is_empty() {
            return Ok(());
        }
        let statements = self.insert_statements(&table, data)?;

        let lock_name = write_lock_name(&table);
        if let Some(lock) = &self.write_lock {
            if !lock.get_lock(&mut self.conn, &lock_name).await? {
                warn!(stream = %stream_name, lock = %lock_name, "Failed to acquire write lock");
                return Err(EventStoreError::lock_not_acquired(&lock_name));
            }
        }

        let written = self.write_rows(stream_name, statements).await;

        // Release regardless of the write outcome; a release failure never
        // turns a durable append into an error.
        if let Some(lock) = &self.write_lock {
            match lock.release_lock(&mut self.conn, &lock_name).await {
                Ok(true) => {}
                Ok(false) => {
                    warn!(stream = %stream_name, lock = %lock_name, "Write lock was not held on release")
                }
                Err(err) => {
                    warn!(stream = %stream_name, lock = %lock_name, error = %err, "Failed to release write lock")
                }
            }
        }
        written?;

        debug!(
            stream = %stream_name,
            table = %table,
            count = events.len(),
            "Appended events"
        );
        Ok(())
    }

    async fn load<'a>(
        &'a mut self,
        stream_name: &StreamName,
        from_number: u64,
        count: Option<u64>,
        matcher: Option<&MetadataMatcher>,
    ) -> Result<Box<dyn EventStreamIterator + 'a>> {
        let from = i64::try_from(from_number).unwrap_or(i64::MAX);
        let cursor = self
            .open_cursor(stream_name, from, count, matcher, Direction::Forward)
            .await?;
        Ok(Box::new(cursor))
    }

    async fn load_reverse<'a>(
        &'a mut self,
        stream_name: &StreamName,
        from_number: Option<u64>,
        count: Option<u64>,
        matcher: Option<&MetadataMatcher>,
    ) -> Result<Box<dyn EventStreamIterator + 'a>> {
        let from = from_number
            .map(|n| i64::try_from(n).unwrap_or(i64::MAX))
            .unwrap_or(i64::MAX);
        let cursor = self
            .open_cursor(stream_name, from, count, matcher, Direction::Backward)
            .await?;
        Ok(Box::new(cursor))
    }

    async fn delete(&mut self, stream_name: &StreamName) -> Result<()> {
        let table = self.strategy.generate_table_name(stream_name);
        let owns_transaction = self.owns_transaction();
        if owns_transaction {
            self.begin_transaction().await?;
        }

        match self.delete_stream(stream_name, &table).await {
            Ok(()) => {
                if owns_transaction {
                    self.commit().await?;
                }
                info!(backend = D::NAME, stream = %stream_name, table = %table, "Deleted stream");
                Ok(())
            }
            Err(err) => {
                if owns_transaction {
                    if let Err(rollback_err) = self.rollback().await {
                        warn!(stream = %stream_name, error = %rollback_err, "Rollback after failed delete failed");
                    }
                }
                Err(err)
            }
        }
    }

    async fn has_stream(&mut self, stream_name: &StreamName) -> Result<bool> {
        let stmt = Query::select()
            .column(EventStreams::RealStreamName)
            .from(table_ref(&self.event_streams_table))
            .and_where(Expr::col(EventStreams::RealStreamName).eq(stream_name.as_str()))
            .limit(1)
            .to_owned();
        let (sql, values) = D::build_select(&stmt);

        match D::fetch_strings(&mut self.conn, &sql, values).await {
            Ok(rows) => Ok(!rows.is_empty()),
            Err(err) if D::is_table_not_found(&err) => Ok(false),
            Err(err) => Err(err.into()),
        }
    }

    async fn fetch_stream_metadata(&mut self, stream_name: &StreamName) -> Result<StreamMetadata> {
        let stmt = Query::select()
            .expr(Func::cast_as(
                Expr::col(EventStreams::Metadata),
                Alias::new(D::TEXT_TYPE),
            ))
            .from(table_ref(&self.event_streams_table))
            .and_where(Expr::col(EventStreams::RealStreamName).eq(stream_name.as_str()))
            .limit(1)
            .to_owned();

        let rows = self.fetch_names(stmt).await?;
        let text = rows
            .into_iter()
            .next()
            .ok_or_else(|| EventStoreError::StreamNotFound(stream_name.clone()))?;

        match serde_json::from_str(&text)? {
            Value::Object(metadata) => Ok(metadata),
            Value::Null => Ok(StreamMetadata::new()),
            other => Err(EventStoreError::JsonDecode(serde::de::Error::custom(
                format!("stream metadata must be a JSON object, got {}", other),
            ))),
        }
    }

    async fn update_stream_metadata(
        &mut self,
        stream_name: &StreamName,
        metadata: &StreamMetadata,
    ) -> Result<()> {
        let metadata = serde_json::to_string(metadata)?;
        let stmt = Query::update()
            .table(table_ref(&self.event_streams_table))
            .value(EventStreams::Metadata, D::json_document(metadata))
            .and_where(Expr::col(EventStreams::RealStreamName).eq(stream_name.as_str()))
            .to_owned();
        let (sql, values) = D::build_update(&stmt);

        // Some vendors only count rows whose value actually changed.
        if D::execute(&mut self.conn, &sql, values).await? == 0
            && !self.has_stream(stream_name).await?
        {
            return Err(EventStoreError::StreamNotFound(stream_name.clone()));
        }
        Ok(())
    }

    async fn fetch_stream_names(
        &mut self,
        filter: Option<&StreamName>,
        matcher: Option<&MetadataMatcher>,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<StreamName>> {
        let mut stmt = self.stream_names_query(matcher, limit, offset)?;
        if let Some(name) = filter {
            stmt.and_where(Expr::col(EventStreams::RealStreamName).eq(name.as_str()));
        }
        self.fetch_names(stmt)
            .await?
            .into_iter()
            .map(StreamName::new)
            .collect()
    }

    async fn fetch_stream_names_regex(
        &mut self,
        pattern: &str,
        matcher: Option<&MetadataMatcher>,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<StreamName>> {
        let mut stmt = self.stream_names_query(matcher, limit, offset)?;
        stmt.and_where(Self::regex_condition("real_stream_name", pattern)?);
        self.fetch_names(stmt)
            .await?
            .into_iter()
            .map(StreamName::new)
            .collect()
    }

    async fn fetch_category_names(
        &mut self,
        filter: Option<&str>,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<String>> {
        let mut stmt = self.category_names_query(limit, offset);
        if let Some(category) = filter {
            stmt.and_where(Expr::col(EventStreams::Category).eq(category));
        }
        self.fetch_names(stmt).await
    }

    async fn fetch_category_names_regex(
        &mut self,
        pattern: &str,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<String>> {
        let mut stmt = self.category_names_query(limit, offset);
        stmt.and_where(Self::regex_condition("category", pattern)?);
        self.fetch_names(stmt).await
    }
}

/// Vendor error code of a database error.
fn error_code(err: &sqlx::Error) -> Option<String> {
    err.as_database_error()
        .and_then(|db_err| db_err.code())
        .map(|code| code.into_owned())
}

fn builder_error(err: sea_query::error::Error) -> EventStoreError {
    EventStoreError::Runtime {
        code: None,
        message: format!("failed to build query: {}", err),
    }
}

fn validate_pattern(pattern: &str) -> Result<()> {
    if pattern.is_empty() {
        return Err(EventStoreError::InvalidArgument(
            "regex pattern must not be empty".to_string(),
        ));
    }
    regex::Regex::new(pattern)
        .map(|_| ())
        .map_err(|e| EventStoreError::InvalidArgument(format!("invalid regex '{}': {}", pattern, e)))
}
