//! EventStore interface tests.
//!
//! These tests verify the contract of the EventStore trait.
//! Each backend should run these tests against a store whose persistence
//! strategy positions events by `_aggregate_version`, with a small load
//! batch size so reads cross batch boundaries.

use serde_json::{json, Map, Value};
use uuid::Uuid;

use sql_event_store::event::POSITION;
use sql_event_store::{
    Event, EventStore, EventStoreError, FieldType, MatchValue, MetadataMatcher, Operator, Stream,
    StreamName,
};

/// Stream name unique to one test run, so tests can share a database.
pub fn unique_stream(prefix: &str) -> StreamName {
    StreamName::new(format!("{}-{}", prefix, Uuid::new_v4().simple()))
        .expect("stream name should be valid")
}

/// Create a test event at the given aggregate version.
pub fn make_event(version: u64, name: &str) -> Event {
    Event::new(name, json!({"version": version, "name": name}))
        .with_aggregate("agg-1", "user", version)
}

/// Create `count` sequential events starting at version `start`.
pub fn make_events(start: u64, count: u64) -> Vec<Event> {
    (start..start + count)
        .map(|v| make_event(v, &format!("Event{}", v)))
        .collect()
}

fn versions(events: &[Event]) -> Vec<i64> {
    events
        .iter()
        .map(|e| e.aggregate_version().expect("loaded event should carry a version"))
        .collect()
}

fn positions(events: &[Event]) -> Vec<i64> {
    events
        .iter()
        .map(|e| e.position().expect("loaded event should carry a position"))
        .collect()
}

fn without_position(event: &Event) -> Map<String, Value> {
    let mut metadata = event.metadata().clone();
    metadata.remove(POSITION);
    metadata
}

async fn load_all<S: EventStore>(store: &mut S, name: &StreamName) -> Vec<Event> {
    store
        .load(name, 1, None, None)
        .await
        .expect("load should succeed")
        .collect_events()
        .await
        .expect("iteration should succeed")
}

// =============================================================================
// create tests
// =============================================================================

pub async fn test_create_and_load<S: EventStore>(store: &mut S) {
    let name = unique_stream("create");
    store
        .create(&Stream::new(name.clone(), make_events(1, 3)))
        .await
        .expect("create should succeed");

    assert!(store.has_stream(&name).await.expect("has_stream should succeed"));
    let events = load_all(store, &name).await;
    assert_eq!(versions(&events), vec![1, 2, 3]);
    assert_eq!(positions(&events), vec![1, 2, 3]);
}

pub async fn test_create_without_events<S: EventStore>(store: &mut S) {
    let name = unique_stream("create_empty");
    store
        .create(&Stream::new(name.clone(), vec![]))
        .await
        .expect("create should succeed");

    assert!(store.has_stream(&name).await.unwrap());
    let result = store.load(&name, 1, None, None).await;
    assert!(
        matches!(result, Err(EventStoreError::StreamNotFound(_))),
        "empty stream should load as not found"
    );
}

pub async fn test_create_existing_stream<S: EventStore>(store: &mut S) {
    let name = unique_stream("create_dup");
    store
        .create(&Stream::new(name.clone(), make_events(1, 1)))
        .await
        .expect("first create should succeed");

    let result = store.create(&Stream::new(name.clone(), make_events(1, 1))).await;
    assert!(
        matches!(result, Err(EventStoreError::StreamExistsAlready(ref n)) if *n == name),
        "second create should fail with StreamExistsAlready, got {:?}",
        result
    );
    assert_eq!(load_all(store, &name).await.len(), 1);
}

pub async fn test_create_failure_leaves_nothing<S: EventStore>(store: &mut S) {
    let name = unique_stream("create_fail");
    let missing_version = Event::new("Created", json!({}));

    let result = store
        .create(&Stream::new(name.clone(), vec![missing_version]))
        .await;
    assert!(
        matches!(result, Err(EventStoreError::Configuration(_))),
        "missing aggregate version should be a configuration error, got {:?}",
        result
    );
    assert!(!store.has_stream(&name).await.unwrap(), "failed create should be undone");

    store
        .create(&Stream::new(name.clone(), make_events(1, 2)))
        .await
        .expect("create after failed create should succeed");
    assert_eq!(load_all(store, &name).await.len(), 2);
}

pub async fn test_create_failure_on_duplicate_versions<S: EventStore>(store: &mut S) {
    let name = unique_stream("create_conflict");
    let events = vec![make_event(1, "A"), make_event(1, "B")];

    let result = store.create(&Stream::new(name.clone(), events)).await;
    assert!(
        matches!(result, Err(EventStoreError::Concurrency { .. })),
        "duplicate versions should conflict, got {:?}",
        result
    );
    assert!(!store.has_stream(&name).await.unwrap());
}

// =============================================================================
// append_to tests
// =============================================================================

pub async fn test_append_to<S: EventStore>(store: &mut S) {
    let name = unique_stream("append");
    store
        .create(&Stream::new(name.clone(), make_events(1, 2)))
        .await
        .unwrap();

    store
        .append_to(&name, &make_events(3, 3))
        .await
        .expect("append should succeed");

    let events = load_all(store, &name).await;
    assert_eq!(versions(&events), vec![1, 2, 3, 4, 5]);
}

pub async fn test_append_empty_is_noop<S: EventStore>(store: &mut S) {
    let name = unique_stream("append_empty");
    store
        .create(&Stream::new(name.clone(), make_events(1, 1)))
        .await
        .unwrap();

    store
        .append_to(&name, &[])
        .await
        .expect("empty append should succeed");
    assert_eq!(load_all(store, &name).await.len(), 1);
}

pub async fn test_append_to_missing_stream<S: EventStore>(store: &mut S) {
    let name = unique_stream("append_missing");
    let result = store.append_to(&name, &make_events(1, 1)).await;
    assert!(
        matches!(result, Err(EventStoreError::StreamNotFound(_))),
        "append to missing stream should fail with StreamNotFound, got {:?}",
        result
    );
}

pub async fn test_append_version_conflict<S: EventStore>(store: &mut S) {
    let name = unique_stream("append_conflict");
    store
        .create(&Stream::new(name.clone(), make_events(1, 3)))
        .await
        .unwrap();

    let result = store.append_to(&name, &[make_event(2, "Rewrite")]).await;
    assert!(
        matches!(result, Err(EventStoreError::Concurrency { .. })),
        "rewriting a version should conflict, got {:?}",
        result
    );
    assert_eq!(load_all(store, &name).await.len(), 3);
}

pub async fn test_append_is_atomic<S: EventStore>(store: &mut S) {
    let name = unique_stream("append_atomic");
    store
        .create(&Stream::new(name.clone(), make_events(1, 2)))
        .await
        .unwrap();

    // Versions 3 and 4 are new, version 2 conflicts: nothing may be written.
    let batch = vec![make_event(3, "C"), make_event(4, "D"), make_event(2, "B")];
    assert!(store.append_to(&name, &batch).await.is_err());
    assert_eq!(versions(&load_all(store, &name).await), vec![1, 2]);
}

pub async fn test_append_missing_version<S: EventStore>(store: &mut S) {
    let name = unique_stream("append_no_version");
    store
        .create(&Stream::new(name.clone(), make_events(1, 1)))
        .await
        .unwrap();

    let result = store
        .append_to(&name, &[Event::new("Unversioned", json!({}))])
        .await;
    assert!(matches!(result, Err(EventStoreError::Configuration(_))));
}

// =============================================================================
// load tests
// =============================================================================

pub async fn test_load_preserves_event_data<S: EventStore>(store: &mut S) {
    let name = unique_stream("load_data");
    let original = Event::new(
        "Registered",
        json!({"email": "a@example.com", "tags": ["x", "ü"], "nested": {"n": 1.5, "ok": true}}),
    )
    .with_aggregate("agg-1", "user", 1)
    .with_metadata("causation", "cmd-1");
    store
        .create(&Stream::new(name.clone(), vec![original.clone()]))
        .await
        .unwrap();

    let loaded = load_all(store, &name).await;
    assert_eq!(loaded.len(), 1);
    let event = &loaded[0];
    assert_eq!(event.id(), original.id());
    assert_eq!(event.name(), original.name());
    assert_eq!(event.payload(), original.payload());
    assert_eq!(event.created_at(), original.created_at());
    assert_eq!(without_position(event), *original.metadata());
    assert_eq!(event.position(), Some(1));
}

pub async fn test_load_keeps_existing_position_key<S: EventStore>(store: &mut S) {
    let name = unique_stream("load_own_position");
    let event = make_event(1, "A").with_metadata(POSITION, 99);
    store
        .create(&Stream::new(name.clone(), vec![event]))
        .await
        .unwrap();

    let loaded = load_all(store, &name).await;
    assert_eq!(loaded[0].position(), Some(99));
}

pub async fn test_load_missing_stream<S: EventStore>(store: &mut S) {
    let name = unique_stream("load_missing");
    let result = store.load(&name, 1, None, None).await;
    assert!(matches!(result, Err(EventStoreError::StreamNotFound(_))));
}

pub async fn test_load_from_and_count<S: EventStore>(store: &mut S) {
    let name = unique_stream("load_range");
    store
        .create(&Stream::new(name.clone(), make_events(1, 10)))
        .await
        .unwrap();

    let events = store
        .load(&name, 3, Some(5), None)
        .await
        .unwrap()
        .collect_events()
        .await
        .unwrap();
    assert_eq!(versions(&events), vec![3, 4, 5, 6, 7]);
}

pub async fn test_load_beyond_end<S: EventStore>(store: &mut S) {
    let name = unique_stream("load_beyond");
    store
        .create(&Stream::new(name.clone(), make_events(1, 3)))
        .await
        .unwrap();

    let result = store.load(&name, 4, None, None).await;
    assert!(matches!(result, Err(EventStoreError::StreamNotFound(_))));
}

pub async fn test_load_count_zero_rejected<S: EventStore>(store: &mut S) {
    let name = unique_stream("load_zero");
    store
        .create(&Stream::new(name.clone(), make_events(1, 3)))
        .await
        .unwrap();

    let result = store.load(&name, 1, Some(0), None).await;
    assert!(matches!(result, Err(EventStoreError::InvalidArgument(_))));
}

pub async fn test_load_across_batches<S: EventStore>(store: &mut S) {
    let name = unique_stream("load_batches");
    store
        .create(&Stream::new(name.clone(), make_events(1, 25)))
        .await
        .unwrap();

    let events = load_all(store, &name).await;
    let expected: Vec<i64> = (1..=25).collect();
    assert_eq!(versions(&events), expected);

    let partial = store
        .load(&name, 2, Some(9), None)
        .await
        .unwrap()
        .collect_events()
        .await
        .unwrap();
    assert_eq!(versions(&partial), (2..=10).collect::<Vec<i64>>());
}

pub async fn test_load_reverse<S: EventStore>(store: &mut S) {
    let name = unique_stream("load_reverse");
    store
        .create(&Stream::new(name.clone(), make_events(1, 9)))
        .await
        .unwrap();

    let all = store
        .load_reverse(&name, None, None, None)
        .await
        .unwrap()
        .collect_events()
        .await
        .unwrap();
    assert_eq!(versions(&all), (1..=9).rev().collect::<Vec<i64>>());

    let some = store
        .load_reverse(&name, Some(6), Some(2), None)
        .await
        .unwrap()
        .collect_events()
        .await
        .unwrap();
    assert_eq!(versions(&some), vec![6, 5]);
}

pub async fn test_load_reverse_missing_stream<S: EventStore>(store: &mut S) {
    let name = unique_stream("load_reverse_missing");
    let result = store.load_reverse(&name, None, None, None).await;
    assert!(matches!(result, Err(EventStoreError::StreamNotFound(_))));
}

pub async fn test_load_with_metadata_matcher<S: EventStore>(store: &mut S) {
    let name = unique_stream("load_matcher");
    let events: Vec<Event> = (1..=8)
        .map(|v| {
            make_event(v, "Tick").with_metadata("parity", if v % 2 == 0 { "even" } else { "odd" })
        })
        .collect();
    store
        .create(&Stream::new(name.clone(), events))
        .await
        .unwrap();

    let matcher = MetadataMatcher::new()
        .with_metadata_match("parity", Operator::Equals, "even", FieldType::Metadata)
        .unwrap();
    let even = store
        .load(&name, 1, None, Some(&matcher))
        .await
        .unwrap()
        .collect_events()
        .await
        .unwrap();
    assert_eq!(versions(&even), vec![2, 4, 6, 8]);

    let matcher = MetadataMatcher::new()
        .with_metadata_match("_aggregate_version", Operator::GreaterThan, 5, FieldType::Metadata)
        .unwrap();
    let late = store
        .load(&name, 1, None, Some(&matcher))
        .await
        .unwrap()
        .collect_events()
        .await
        .unwrap();
    assert_eq!(versions(&late), vec![6, 7, 8]);

    let matcher = MetadataMatcher::new()
        .with_metadata_match("parity", Operator::Equals, "none", FieldType::Metadata)
        .unwrap();
    let result = store.load(&name, 1, None, Some(&matcher)).await;
    assert!(matches!(result, Err(EventStoreError::StreamNotFound(_))));
}

pub async fn test_load_with_message_property_matcher<S: EventStore>(store: &mut S) {
    let name = unique_stream("load_property");
    store
        .create(&Stream::new(name.clone(), make_events(1, 5)))
        .await
        .unwrap();

    let matcher = MetadataMatcher::new()
        .with_metadata_match(
            "event_name",
            Operator::In,
            vec!["Event1", "Event3"],
            FieldType::MessageProperty,
        )
        .unwrap();
    let events = store
        .load(&name, 1, None, Some(&matcher))
        .await
        .unwrap()
        .collect_events()
        .await
        .unwrap();
    assert_eq!(versions(&events), vec![1, 3]);

    let matcher = MetadataMatcher::new()
        .with_metadata_match("position", Operator::LowerThanEquals, 2, FieldType::MessageProperty)
        .unwrap();
    let events = store
        .load_reverse(&name, None, None, Some(&matcher))
        .await
        .unwrap()
        .collect_events()
        .await
        .unwrap();
    assert_eq!(versions(&events), vec![2, 1]);
}

pub async fn test_load_invalid_matcher_rejected<S: EventStore>(store: &mut S) {
    let name = unique_stream("load_bad_matcher");
    store
        .create(&Stream::new(name.clone(), make_events(1, 1)))
        .await
        .unwrap();

    let matcher = MetadataMatcher::new()
        .with_metadata_match("payload", Operator::Equals, "x", FieldType::MessageProperty)
        .unwrap();
    let result = store.load(&name, 1, None, Some(&matcher)).await;
    assert!(matches!(result, Err(EventStoreError::InvalidArgument(_))));
}

/// EQ + GT + IN + REGEX over metadata. `flip` replaces one predicate's value
/// with one that no event matches.
fn combined_matcher(flip: Option<usize>) -> MetadataMatcher {
    let pick = |index: usize, value: MatchValue, flipped: MatchValue| {
        if flip == Some(index) {
            flipped
        } else {
            value
        }
    };
    MetadataMatcher::new()
        .with_metadata_match(
            "kind",
            Operator::Equals,
            pick(0, MatchValue::from("order"), MatchValue::from("refund")),
            FieldType::Metadata,
        )
        .unwrap()
        .with_metadata_match(
            "amount",
            Operator::GreaterThan,
            pick(1, MatchValue::from(15i64), MatchValue::from(500i64)),
            FieldType::Metadata,
        )
        .unwrap()
        .with_metadata_match(
            "region",
            Operator::In,
            pick(2, MatchValue::from(vec!["eu", "apac"]), MatchValue::from(vec!["latam"])),
            FieldType::Metadata,
        )
        .unwrap()
        .with_metadata_match(
            "tag",
            Operator::Regex,
            pick(3, MatchValue::from("^alpha-"), MatchValue::from("^beta-")),
            FieldType::Metadata,
        )
        .unwrap()
}

pub async fn test_load_with_combined_matcher<S: EventStore>(store: &mut S) {
    let name = unique_stream("load_combined");
    let rows = [
        ("order", 10i64, "eu", "alpha-1"),
        ("order", 20, "eu", "alpha-2"),
        ("order", 30, "us", "alpha-3"),
        ("invoice", 40, "eu", "gamma-4"),
    ];
    let events: Vec<Event> = rows
        .iter()
        .zip(1u64..)
        .map(|((kind, amount, region, tag), version)| {
            make_event(version, "Tick")
                .with_metadata("kind", *kind)
                .with_metadata("amount", *amount)
                .with_metadata("region", *region)
                .with_metadata("tag", *tag)
        })
        .collect();
    store
        .create(&Stream::new(name.clone(), events))
        .await
        .unwrap();

    let matcher = combined_matcher(None);
    let matched = store
        .load(&name, 1, None, Some(&matcher))
        .await
        .unwrap()
        .collect_events()
        .await
        .unwrap();
    assert_eq!(versions(&matched), vec![2]);

    for flip in 0..4 {
        let matcher = combined_matcher(Some(flip));
        let result = store.load(&name, 1, None, Some(&matcher)).await;
        assert!(
            matches!(result, Err(EventStoreError::StreamNotFound(_))),
            "flipping predicate {} should match nothing",
            flip
        );
    }
}

pub async fn test_payload_round_trip<S: EventStore>(store: &mut S) {
    let name = unique_stream("payload_round_trip");
    let documents = [
        r#"{}"#,
        r#"{"n":null}"#,
        r#"{"i":-10}"#,
        r#"{"f":-0.0}"#,
        r#"{"u":"\u1000"}"#,
    ];
    let events: Vec<Event> = documents
        .iter()
        .zip(1u64..)
        .map(|(document, version)| {
            let payload: Value = serde_json::from_str(document).unwrap();
            Event::new("Payload", payload).with_aggregate("agg-1", "user", version)
        })
        .collect();
    store
        .create(&Stream::new(name.clone(), events.clone()))
        .await
        .unwrap();

    let loaded = load_all(store, &name).await;
    assert_eq!(loaded.len(), events.len());
    for (original, event) in events.iter().zip(&loaded) {
        assert_eq!(
            serde_json::to_string(event.payload()).unwrap(),
            serde_json::to_string(original.payload()).unwrap(),
        );
    }
    assert_eq!(
        loaded[4].payload()["u"].as_str(),
        Some("\u{1000}"),
        "escaped code point should decode to the character"
    );
}

/// Forward and reverse reads with `count` on a five-event stream. Driven with
/// the suite's batch size and by the backend tests with a batch size of one.
pub async fn test_load_count_across_small_batches<S: EventStore>(store: &mut S) {
    let name = unique_stream("load_small_batches");
    store
        .create(&Stream::new(name.clone(), make_events(1, 5)))
        .await
        .unwrap();

    let first_three = store
        .load(&name, 1, Some(3), None)
        .await
        .unwrap()
        .collect_events()
        .await
        .unwrap();
    assert_eq!(positions(&first_three), vec![1, 2, 3]);

    let tail = store
        .load(&name, 2, Some(4), None)
        .await
        .unwrap()
        .collect_events()
        .await
        .unwrap();
    assert_eq!(positions(&tail), vec![2, 3, 4, 5]);

    let reversed = store
        .load_reverse(&name, None, None, None)
        .await
        .unwrap()
        .collect_events()
        .await
        .unwrap();
    assert_eq!(positions(&reversed), vec![5, 4, 3, 2, 1]);

    let reversed_count = store
        .load_reverse(&name, Some(5), Some(3), None)
        .await
        .unwrap()
        .collect_events()
        .await
        .unwrap();
    assert_eq!(positions(&reversed_count), vec![5, 4, 3]);
}

pub async fn test_iterator_rewind_and_key<S: EventStore>(store: &mut S) {
    let name = unique_stream("iter_rewind");
    store
        .create(&Stream::new(name.clone(), make_events(1, 6)))
        .await
        .unwrap();

    let mut iter = store.load(&name, 1, None, None).await.unwrap();
    assert_eq!(iter.key(), None);
    let first = iter.next().await.unwrap().expect("first event");
    assert_eq!(iter.key(), Some(0));
    iter.next().await.unwrap().expect("second event");
    assert_eq!(iter.key(), Some(1));
    assert_eq!(iter.current().and_then(|e| e.aggregate_version()), Some(2));

    iter.rewind().await.unwrap();
    let again = iter.next().await.unwrap().expect("first event after rewind");
    assert_eq!(again.id(), first.id());
    assert_eq!(iter.key(), Some(0));

    let rest = iter.collect_events().await.unwrap();
    assert_eq!(versions(&rest), vec![2, 3, 4, 5, 6]);
    assert!(iter.next().await.unwrap().is_none());
}

// =============================================================================
// delete / has_stream tests
// =============================================================================

pub async fn test_delete<S: EventStore>(store: &mut S) {
    let name = unique_stream("delete");
    store
        .create(&Stream::new(name.clone(), make_events(1, 2)))
        .await
        .unwrap();

    store.delete(&name).await.expect("delete should succeed");
    assert!(!store.has_stream(&name).await.unwrap());
    assert!(matches!(
        store.load(&name, 1, None, None).await,
        Err(EventStoreError::StreamNotFound(_))
    ));
    assert!(matches!(
        store.delete(&name).await,
        Err(EventStoreError::StreamNotFound(_))
    ));

    store
        .create(&Stream::new(name.clone(), make_events(1, 1)))
        .await
        .expect("re-create after delete should succeed");
    assert_eq!(load_all(store, &name).await.len(), 1);
}

pub async fn test_has_stream_unknown<S: EventStore>(store: &mut S) {
    let name = unique_stream("unknown");
    assert!(!store.has_stream(&name).await.unwrap());
}

// =============================================================================
// stream metadata tests
// =============================================================================

pub async fn test_stream_metadata<S: EventStore>(store: &mut S) {
    let name = unique_stream("meta");
    let mut metadata = Map::new();
    metadata.insert("owner".to_string(), json!("alice"));
    store
        .create(&Stream::new(name.clone(), vec![]).with_metadata(metadata.clone()))
        .await
        .unwrap();

    assert_eq!(store.fetch_stream_metadata(&name).await.unwrap(), metadata);

    metadata.insert("limit".to_string(), json!(10));
    store
        .update_stream_metadata(&name, &metadata)
        .await
        .expect("update should succeed");
    assert_eq!(store.fetch_stream_metadata(&name).await.unwrap(), metadata);

    // Same document again: no rows change but the stream exists.
    store
        .update_stream_metadata(&name, &metadata)
        .await
        .expect("idempotent update should succeed");
}

pub async fn test_stream_metadata_missing_stream<S: EventStore>(store: &mut S) {
    let name = unique_stream("meta_missing");
    assert!(matches!(
        store.fetch_stream_metadata(&name).await,
        Err(EventStoreError::StreamNotFound(_))
    ));
    assert!(matches!(
        store.update_stream_metadata(&name, &Map::new()).await,
        Err(EventStoreError::StreamNotFound(_))
    ));
}

// =============================================================================
// registry listing tests
// =============================================================================

pub async fn test_fetch_stream_names<S: EventStore>(store: &mut S) {
    let category = format!("names{}", Uuid::new_v4().simple());
    let mut names = Vec::new();
    for (suffix, owner) in [("a", "alice"), ("b", "bob"), ("c", "alice")] {
        let name = StreamName::new(format!("{}-{}", category, suffix)).unwrap();
        let mut metadata = Map::new();
        metadata.insert("owner".to_string(), json!(owner));
        store
            .create(&Stream::new(name.clone(), vec![]).with_metadata(metadata))
            .await
            .unwrap();
        names.push(name);
    }

    let exact = store
        .fetch_stream_names(Some(&names[1]), None, 10, 0)
        .await
        .unwrap();
    assert_eq!(exact, vec![names[1].clone()]);

    let pattern = format!("^{}-", category);
    let all = store
        .fetch_stream_names_regex(&pattern, None, 10, 0)
        .await
        .unwrap();
    assert_eq!(all, names);

    let page = store
        .fetch_stream_names_regex(&pattern, None, 1, 1)
        .await
        .unwrap();
    assert_eq!(page, vec![names[1].clone()]);

    let matcher = MetadataMatcher::new()
        .with_metadata_match("owner", Operator::Equals, "alice", FieldType::Metadata)
        .unwrap();
    let alice = store
        .fetch_stream_names_regex(&pattern, Some(&matcher), 10, 0)
        .await
        .unwrap();
    assert_eq!(alice, vec![names[0].clone(), names[2].clone()]);

    let alice_exact = store
        .fetch_stream_names(Some(&names[0]), Some(&matcher), 10, 0)
        .await
        .unwrap();
    assert_eq!(alice_exact, vec![names[0].clone()]);
}

pub async fn test_fetch_stream_names_regex_rejects_empty<S: EventStore>(store: &mut S) {
    assert!(matches!(
        store.fetch_stream_names_regex("", None, 10, 0).await,
        Err(EventStoreError::InvalidArgument(_))
    ));
    assert!(matches!(
        store.fetch_category_names_regex("", 10, 0).await,
        Err(EventStoreError::InvalidArgument(_))
    ));
}

pub async fn test_fetch_category_names<S: EventStore>(store: &mut S) {
    let category = format!("cat{}", Uuid::new_v4().simple());
    for suffix in ["1", "2"] {
        let name = StreamName::new(format!("{}-{}", category, suffix)).unwrap();
        store.create(&Stream::new(name, vec![])).await.unwrap();
    }

    let exact = store
        .fetch_category_names(Some(&category), 10, 0)
        .await
        .unwrap();
    assert_eq!(exact, vec![category.clone()], "category should be listed once");

    let by_regex = store
        .fetch_category_names_regex(&format!("^{}$", category), 10, 0)
        .await
        .unwrap();
    assert_eq!(by_regex, vec![category.clone()]);

    let none = store
        .fetch_category_names(Some("no-such-category"), 10, 0)
        .await
        .unwrap();
    assert!(none.is_empty());
}

// =============================================================================
// integration tests
// =============================================================================

pub async fn test_stream_isolation<S: EventStore>(store: &mut S) {
    let first = unique_stream("iso");
    let second = unique_stream("iso");
    store
        .create(&Stream::new(first.clone(), make_events(1, 3)))
        .await
        .unwrap();
    store
        .create(&Stream::new(second.clone(), make_events(1, 2)))
        .await
        .unwrap();

    assert_eq!(load_all(store, &first).await.len(), 3);
    assert_eq!(load_all(store, &second).await.len(), 2);
}

pub async fn test_large_batch<S: EventStore>(store: &mut S) {
    let name = unique_stream("large");
    store
        .create(&Stream::new(name.clone(), vec![]))
        .await
        .unwrap();
    store
        .append_to(&name, &make_events(1, 1500))
        .await
        .expect("append spanning several insert chunks should succeed");

    let events = load_all(store, &name).await;
    assert_eq!(events.len(), 1500);
    assert_eq!(events.last().and_then(|e| e.aggregate_version()), Some(1500));
}

// =============================================================================
// Test runner macro
// =============================================================================

/// Run all EventStore interface tests against a store implementation.
#[macro_export]
macro_rules! run_event_store_tests {
    ($store:expr) => {
        use $crate::storage::event_store_tests::*;

        // create tests
        test_create_and_load($store).await;
        println!("  test_create_and_load: PASSED");

        test_create_without_events($store).await;
        println!("  test_create_without_events: PASSED");

        test_create_existing_stream($store).await;
        println!("  test_create_existing_stream: PASSED");

        test_create_failure_leaves_nothing($store).await;
        println!("  test_create_failure_leaves_nothing: PASSED");

        test_create_failure_on_duplicate_versions($store).await;
        println!("  test_create_failure_on_duplicate_versions: PASSED");

        // append_to tests
        test_append_to($store).await;
        println!("  test_append_to: PASSED");

        test_append_empty_is_noop($store).await;
        println!("  test_append_empty_is_noop: PASSED");

        test_append_to_missing_stream($store).await;
        println!("  test_append_to_missing_stream: PASSED");

        test_append_version_conflict($store).await;
        println!("  test_append_version_conflict: PASSED");

        test_append_is_atomic($store).await;
        println!("  test_append_is_atomic: PASSED");

        test_append_missing_version($store).await;
        println!("  test_append_missing_version: PASSED");

        // load tests
        test_load_preserves_event_data($store).await;
        println!("  test_load_preserves_event_data: PASSED");

        test_load_keeps_existing_position_key($store).await;
        println!("  test_load_keeps_existing_position_key: PASSED");

        test_load_missing_stream($store).await;
        println!("  test_load_missing_stream: PASSED");

        test_load_from_and_count($store).await;
        println!("  test_load_from_and_count: PASSED");

        test_load_beyond_end($store).await;
        println!("  test_load_beyond_end: PASSED");

        test_load_count_zero_rejected($store).await;
        println!("  test_load_count_zero_rejected: PASSED");

        test_load_across_batches($store).await;
        println!("  test_load_across_batches: PASSED");

        test_load_reverse($store).await;
        println!("  test_load_reverse: PASSED");

        test_load_reverse_missing_stream($store).await;
        println!("  test_load_reverse_missing_stream: PASSED");

        test_load_with_metadata_matcher($store).await;
        println!("  test_load_with_metadata_matcher: PASSED");

        test_load_with_message_property_matcher($store).await;
        println!("  test_load_with_message_property_matcher: PASSED");

        test_load_invalid_matcher_rejected($store).await;
        println!("  test_load_invalid_matcher_rejected: PASSED");

        test_load_with_combined_matcher($store).await;
        println!("  test_load_with_combined_matcher: PASSED");

        test_payload_round_trip($store).await;
        println!("  test_payload_round_trip: PASSED");

        test_load_count_across_small_batches($store).await;
        println!("  test_load_count_across_small_batches: PASSED");

        test_iterator_rewind_and_key($store).await;
        println!("  test_iterator_rewind_and_key: PASSED");

        // delete / has_stream tests
        test_delete($store).await;
        println!("  test_delete: PASSED");

        test_has_stream_unknown($store).await;
        println!("  test_has_stream_unknown: PASSED");

        // stream metadata tests
        test_stream_metadata($store).await;
        println!("  test_stream_metadata: PASSED");

        test_stream_metadata_missing_stream($store).await;
        println!("  test_stream_metadata_missing_stream: PASSED");

        // registry listing tests
        test_fetch_stream_names($store).await;
        println!("  test_fetch_stream_names: PASSED");

        test_fetch_stream_names_regex_rejects_empty($store).await;
        println!("  test_fetch_stream_names_regex_rejects_empty: PASSED");

        test_fetch_category_names($store).await;
        println!("  test_fetch_category_names: PASSED");

        // integration tests
        test_stream_isolation($store).await;
        println!("  test_stream_isolation: PASSED");

        test_large_batch($store).await;
        println!("  test_large_batch: PASSED");
    };
}
