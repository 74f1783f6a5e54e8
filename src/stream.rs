//! Stream names and stream definitions.

use std::fmt;
use std::str::FromStr;

use serde_json::{Map, Value};

use crate::event::Event;
use crate::interfaces::{EventStoreError, Result};

/// Stream-level metadata, distinct from per-event metadata.
pub type StreamMetadata = Map<String, Value>;

/// Separator between a category and the rest of a stream name.
const CATEGORY_SEPARATOR: char = '-';
/// Separator between a schema namespace and the rest of a stream name.
const SCHEMA_SEPARATOR: char = '.';

/// Name of a logical stream. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StreamName(String);

impl StreamName {
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(EventStoreError::InvalidArgument(
                "stream name must not be empty".to_string(),
            ));
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Substring before the first `-`, e.g. `user` for `user-123`.
    pub fn category(&self) -> Option<&str> {
        self.0
            .split_once(CATEGORY_SEPARATOR)
            .map(|(category, _)| category)
    }

    /// Substring before the first `.`, e.g. `billing` for `billing.invoice-1`.
    pub fn schema(&self) -> Option<&str> {
        self.0
            .split_once(SCHEMA_SEPARATOR)
            .map(|(schema, _)| schema)
            .filter(|schema| !schema.is_empty())
    }
}

impl fmt::Display for StreamName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for StreamName {
    type Err = EventStoreError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<&str> for StreamName {
    type Error = EventStoreError;

    fn try_from(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl AsRef<str> for StreamName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A stream as handed to `create`: name, stream metadata and initial events.
#[derive(Debug, Clone)]
pub struct Stream {
    pub name: StreamName,
    pub metadata: StreamMetadata,
    pub events: Vec<Event>,
}

impl Stream {
    pub fn new(name: StreamName, events: Vec<Event>) -> Self {
        Self {
            name,
            metadata: StreamMetadata::new(),
            events,
        }
    }

    pub fn with_metadata(mut self, metadata: StreamMetadata) -> Self {
        self.metadata = metadata;
        self
    }
}
