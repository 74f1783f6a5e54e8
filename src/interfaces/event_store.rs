//! Event storage interface.

use async_trait::async_trait;

use crate::event::Event;
use crate::interfaces::EventStreamIterator;
use crate::matcher::MetadataMatcher;
use crate::stream::{Stream, StreamMetadata, StreamName};

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, EventStoreError>;

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum EventStoreError {
    #[error("Stream not found: {0}")]
    StreamNotFound(StreamName),

    #[error("Stream already exists: {0}")]
    StreamExistsAlready(StreamName),

    #[error("Concurrency conflict{}: {message}", fmt_code(.code))]
    Concurrency {
        code: Option<String>,
        message: String,
    },

    #[error("Database error{}: {message}", fmt_code(.code))]
    Runtime {
        code: Option<String>,
        message: String,
    },

    #[error("JSON decode error: {0}")]
    JsonDecode(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Transaction already started")]
    TransactionAlreadyStarted,

    #[error("Transaction not started")]
    TransactionNotStarted,
}

fn fmt_code(code: &Option<String>) -> String {
    code.as_deref()
        .map(|code| format!(" [{}]", code))
        .unwrap_or_default()
}

impl EventStoreError {
    /// Vendor error code carried by `Concurrency` and `Runtime` errors.
    pub fn code(&self) -> Option<&str> {
        match self {
            EventStoreError::Concurrency { code, .. } | EventStoreError::Runtime { code, .. } => {
                code.as_deref()
            }
            _ => None,
        }
    }

    pub(crate) fn lock_not_acquired(lock_name: &str) -> Self {
        EventStoreError::Concurrency {
            code: None,
            message: format!("failed to acquire write lock {}", lock_name),
        }
    }
}

impl From<sqlx::Error> for EventStoreError {
    fn from(err: sqlx::Error) -> Self {
        match err.as_database_error() {
            Some(db_err) => EventStoreError::Runtime {
                code: db_err.code().map(|c| c.into_owned()),
                message: db_err.message().to_string(),
            },
            None => EventStoreError::Runtime {
                code: None,
                message: err.to_string(),
            },
        }
    }
}

/// Public operation surface of an event store.
///
/// One store owns one database session; callers serialize use of an
/// instance, which `&mut self` enforces. A cursor returned by `load`
/// borrows the store until it is dropped.
///
/// Implementations:
/// - `SqlEventStore<Postgres>`: PostgreSQL storage
/// - `SqlEventStore<MySql>`: MySQL storage
/// - `SqlEventStore<Sqlite>`: SQLite storage
/// - `PluggableEventStore`: hook-running decorator over any of the above
#[async_trait]
pub trait EventStore: Send {
    /// Register the stream, create its table and append its initial events.
    async fn create(&mut self, stream: &Stream) -> Result<()>;

    /// Append events atomically. An empty slice is a no-op.
    async fn append_to(&mut self, stream_name: &StreamName, events: &[Event]) -> Result<()>;

    /// Read forward from `from_number` (inclusive).
    async fn load<'a>(
        &'a mut self,
        stream_name: &StreamName,
        from_number: u64,
        count: Option<u64>,
        matcher: Option<&MetadataMatcher>,
    ) -> Result<Box<dyn EventStreamIterator + 'a>>;

    /// Read backward from `from_number` (inclusive), or from the end when `None`.
    async fn load_reverse<'a>(
        &'a mut self,
        stream_name: &StreamName,
        from_number: Option<u64>,
        count: Option<u64>,
        matcher: Option<&MetadataMatcher>,
    ) -> Result<Box<dyn EventStreamIterator + 'a>>;

    /// Remove the registry row and drop the stream's table.
    async fn delete(&mut self, stream_name: &StreamName) -> Result<()>;

    /// Registry-only existence check.
    async fn has_stream(&mut self, stream_name: &StreamName) -> Result<bool>;

    async fn fetch_stream_metadata(&mut self, stream_name: &StreamName) -> Result<StreamMetadata>;

    /// Replace the stream-level metadata document.
    async fn update_stream_metadata(
        &mut self,
        stream_name: &StreamName,
        metadata: &StreamMetadata,
    ) -> Result<()>;

    /// List registered stream names, optionally restricted to one exact name
    /// and filtered on stream metadata.
    async fn fetch_stream_names(
        &mut self,
        filter: Option<&StreamName>,
        matcher: Option<&MetadataMatcher>,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<StreamName>>;

    /// List registered stream names matching a regular expression.
    async fn fetch_stream_names_regex(
        &mut self,
        pattern: &str,
        matcher: Option<&MetadataMatcher>,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<StreamName>>;

    /// List distinct categories, optionally restricted to one exact category.
    async fn fetch_category_names(
        &mut self,
        filter: Option<&str>,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<String>>;

    /// List distinct categories matching a regular expression.
    async fn fetch_category_names_regex(
        &mut self,
        pattern: &str,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<String>>;
}

/// Forwarding impl so a store returned by `storage::connect` can be decorated.
#[async_trait]
impl<S: EventStore + ?Sized> EventStore for Box<S> {
    async fn create(&mut self, stream: &Stream) -> Result<()> {
        (**self).create(stream).await
    }

    async fn append_to(&mut self, stream_name: &StreamName, events: &[Event]) -> Result<()> {
        (**self).append_to(stream_name, events).await
    }

    async fn load<'a>(
        &'a mut self,
        stream_name: &StreamName,
        from_number: u64,
        count: Option<u64>,
        matcher: Option<&MetadataMatcher>,
    ) -> Result<Box<dyn EventStreamIterator + 'a>> {
        (**self).load(stream_name, from_number, count, matcher).await
    }

    async fn load_reverse<'a>(
        &'a mut self,
        stream_name: &StreamName,
        from_number: Option<u64>,
        count: Option<u64>,
        matcher: Option<&MetadataMatcher>,
    ) -> Result<Box<dyn EventStreamIterator + 'a>> {
        (**self)
            .load_reverse(stream_name, from_number, count, matcher)
            .await
    }

    async fn delete(&mut self, stream_name: &StreamName) -> Result<()> {
        (**self).delete(stream_name).await
    }

    async fn has_stream(&mut self, stream_name: &StreamName) -> Result<bool> {
        (**self).has_stream(stream_name).await
    }

    async fn fetch_stream_metadata(&mut self, stream_name: &StreamName) -> Result<StreamMetadata> {
        (**self).fetch_stream_metadata(stream_name).await
    }

    async fn update_stream_metadata(
        &mut self,
        stream_name: &StreamName,
        metadata: &StreamMetadata,
    ) -> Result<()> {
        (**self).update_stream_metadata(stream_name, metadata).await
    }

    async fn fetch_stream_names(
        &mut self,
        filter: Option<&StreamName>,
        matcher: Option<&MetadataMatcher>,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<StreamName>> {
        (**self)
            .fetch_stream_names(filter, matcher, limit, offset)
            .await
    }

    async fn fetch_stream_names_regex(
        &mut self,
        pattern: &str,
        matcher: Option<&MetadataMatcher>,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<StreamName>> {
        (**self)
            .fetch_stream_names_regex(pattern, matcher, limit, offset)
            .await
    }

    async fn fetch_category_names(
        &mut self,
        filter: Option<&str>,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<String>> {
        (**self).fetch_category_names(filter, limit, offset).await
    }

    async fn fetch_category_names_regex(
        &mut self,
        pattern: &str,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<String>> {
        (**self)
            .fetch_category_names_regex(pattern, limit, offset)
            .await
    }
}
