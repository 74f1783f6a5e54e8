//! Database schema definitions using sea-query.
//!
//! These define the column identifiers for type-safe query building. Table
//! names are dynamic (configured registry name, hashed stream tables) and
//! are passed as aliases.

use sea_query::Iden;

/// Registry table columns.
#[derive(Iden, Clone, Copy)]
pub enum EventStreams {
    #[iden = "no"]
    No,
    #[iden = "real_stream_name"]
    RealStreamName,
    #[iden = "stream_name"]
    StreamName,
    #[iden = "metadata"]
    Metadata,
    #[iden = "category"]
    Category,
}

/// Stream table columns.
#[derive(Iden, Clone, Copy)]
pub enum StreamEvents {
    #[iden = "no"]
    No,
    #[iden = "event_id"]
    EventId,
    #[iden = "event_name"]
    EventName,
    #[iden = "payload"]
    Payload,
    #[iden = "metadata"]
    Metadata,
    #[iden = "created_at"]
    CreatedAt,
}

/// Column names of the version-keyed layout, `no` carrying the aggregate version.
pub const AGGREGATE_STREAM_COLUMNS: [&str; 6] = [
    "no",
    "event_id",
    "event_name",
    "payload",
    "metadata",
    "created_at",
];

/// Column names of the auto-increment layouts.
pub const SEQUENCED_STREAM_COLUMNS: [&str; 5] =
    ["event_id", "event_name", "payload", "metadata", "created_at"];
