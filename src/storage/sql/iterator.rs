//! Batched stream cursor.
//!
//! Streams a position-ordered read without pinning the whole result in
//! memory: at most one batch of rows is buffered, and the next batch is
//! queried from the last delivered position once the buffer drains.

use std::collections::VecDeque;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use sea_query::{Expr, SelectStatement};
use serde_json::{Map, Value};
use tracing::debug;
use uuid::Uuid;

use super::SqlDatabase;
use crate::event::{Event, POSITION};
use crate::interfaces::{EventStoreError, EventStreamIterator, Result};
use crate::storage::schema::StreamEvents;

/// Raw stream table row, every JSON column read back as text.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct EventRow {
    pub no: i64,
    pub event_id: String,
    pub event_name: String,
    pub payload: String,
    pub metadata: String,
    pub created_at: NaiveDateTime,
}

impl EventRow {
    /// Decode into an event, injecting `_position` unless already present.
    pub fn decode(self) -> Result<Event> {
        let id = Uuid::parse_str(&self.event_id).map_err(|e| EventStoreError::Runtime {
            code: None,
            message: format!("invalid event id '{}': {}", self.event_id, e),
        })?;
        let payload: Value = serde_json::from_str(&self.payload)?;
        let mut metadata = match serde_json::from_str(&self.metadata)? {
            Value::Object(map) => map,
            other => {
                return Err(EventStoreError::JsonDecode(serde::de::Error::custom(
                    format!("event metadata must be a JSON object, got {}", other),
                )))
            }
        };
        inject_position(&mut metadata, self.no);

        Ok(Event::from_parts(
            id,
            self.event_name,
            payload,
            metadata,
            self.created_at.and_utc(),
        ))
    }
}

fn inject_position(metadata: &mut Map<String, Value>, position: i64) {
    if !metadata.contains_key(POSITION) {
        metadata.insert(POSITION.to_string(), position.into());
    }
}

/// Read direction of a cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

impl Direction {
    fn next_position(self, last: i64) -> i64 {
        match self {
            Direction::Forward => last.saturating_add(1),
            Direction::Backward => last.saturating_sub(1),
        }
    }
}

/// Cursor over one stream table, borrowing the store's connection.
pub struct StreamIterator<'c, D: SqlDatabase> {
    conn: &'c mut D::Connection,
    /// Base query: table, columns, filters and order, without position bound or limit.
    query: SelectStatement,
    batch_size: u64,
    from_number: i64,
    count: Option<u64>,
    direction: Direction,
    buffer: VecDeque<EventRow>,
    delivered: u64,
    last_position: Option<i64>,
    source_exhausted: bool,
    current: Option<Event>,
}

impl<'c, D: SqlDatabase> StreamIterator<'c, D> {
    /// Open the cursor and fetch the first batch.
    pub async fn start(
        conn: &'c mut D::Connection,
        query: SelectStatement,
        batch_size: u64,
        from_number: i64,
        count: Option<u64>,
        direction: Direction,
    ) -> sqlx::Result<Self> {
        let mut iter = Self {
            conn,
            query,
            batch_size: batch_size.max(1),
            from_number,
            count,
            direction,
            buffer: VecDeque::new(),
            delivered: 0,
            last_position: None,
            source_exhausted: false,
            current: None,
        };
        iter.fetch_batch(from_number).await?;
        Ok(iter)
    }

    /// True when the first batch came back empty.
    pub fn is_empty(&self) -> bool {
        self.delivered == 0 && self.buffer.is_empty()
    }

    fn remaining(&self) -> Option<u64> {
        self.count.map(|count| count.saturating_sub(self.delivered))
    }

    async fn fetch_batch(&mut self, from: i64) -> sqlx::Result<()> {
        let limit = match self.remaining() {
            Some(remaining) => remaining.min(self.batch_size),
            None => self.batch_size,
        };

        let mut stmt = self.query.clone();
        let bound = Expr::col(StreamEvents::No);
        stmt.and_where(match self.direction {
            Direction::Forward => bound.gte(from),
            Direction::Backward => bound.lte(from),
        })
        .limit(limit);

        let (sql, values) = D::build_select(&stmt);
        let rows = D::fetch_events(&mut *self.conn, &sql, values).await?;
        debug!(
            backend = D::NAME,
            from,
            limit,
            fetched = rows.len(),
            "Fetched event batch"
        );

        self.source_exhausted = (rows.len() as u64) < limit;
        self.buffer.extend(rows);
        Ok(())
    }
}

#[async_trait]
impl<'c, D: SqlDatabase> EventStreamIterator for StreamIterator<'c, D> {
    async fn next(&mut self) -> Result<Option<Event>> {
        if self.remaining() == Some(0) {
            self.current = None;
            return Ok(None);
        }

        if self.buffer.is_empty() && !self.source_exhausted {
            let from = match self.last_position {
                Some(last) => self.direction.next_position(last),
                None => self.from_number,
            };
            self.fetch_batch(from).await?;
        }

        match self.buffer.pop_front() {
            Some(row) => {
                self.last_position = Some(row.no);
                let event = row.decode()?;
                self.delivered += 1;
                self.current = Some(event.clone());
                Ok(Some(event))
            }
            None => {
                self.current = None;
                Ok(None)
            }
        }
    }

    async fn rewind(&mut self) -> Result<()> {
        if self.delivered == 0 {
            return Ok(());
        }
        self.buffer.clear();
        self.delivered = 0;
        self.last_position = None;
        self.source_exhausted = false;
        self.current = None;
        self.fetch_batch(self.from_number).await?;
        Ok(())
    }

    fn key(&self) -> Option<u64> {
        self.current.as_ref().map(|_| self.delivered - 1)
    }

    fn current(&self) -> Option<&Event> {
        self.current.as_ref()
    }
}
