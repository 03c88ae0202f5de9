//! JournalStore interface tests.
//!
//! These tests verify the contract of the JournalStore trait. They share one
//! table, so every test scopes its data with a unique topic prefix.

use chrono::{DateTime, Duration, FixedOffset};
use serde_json::json;
use uuid::Uuid;

use journal::interfaces::{JournalError, JournalStore, DEFAULT_FIND_LIMIT};
use journal::message::JournalMessage;
use journal::query::Query;

/// Unique topic namespace for a test.
pub fn scope(name: &str) -> String {
    format!("{}.{}", name, Uuid::new_v4().simple())
}

pub fn at(rfc3339: &str) -> DateTime<FixedOffset> {
    DateTime::parse_from_rfc3339(rfc3339).expect("valid timestamp")
}

/// Insert `count` messages one minute apart under `topic`.
pub async fn insert_series<S: JournalStore>(
    store: &mut S,
    topic: &str,
    start: DateTime<FixedOffset>,
    count: i64,
) -> Vec<JournalMessage> {
    let mut messages = Vec::new();
    for i in 0..count {
        let message = JournalMessage::with_timestamp(
            topic,
            start + Duration::minutes(i),
            json!({"seq": i, "meta": {"level": i % 3}}),
        );
        store.insert(&message).await.expect("insert should succeed");
        messages.push(message);
    }
    messages
}

// =============================================================================
// insert / find round-trip
// =============================================================================

pub async fn test_insert_and_find_by_id<S: JournalStore>(store: &mut S) {
    let topic = scope("roundtrip");
    let message = JournalMessage::with_timestamp(
        topic.as_str(),
        at("2024-03-01T12:30:45.123456+02:00"),
        json!({
            "nick": "ferret",
            "text": "Grüße aus Köln, 你好 👋",
            "meta": {"level": 3, "flags": [true, false, null], "nested": {"deep": [1, {"x": "y"}]}},
            "ratio": 0.25
        }),
    );

    store.insert(&message).await.expect("insert should succeed");

    let found = store
        .find(&Query::new().id(message.id), DEFAULT_FIND_LIMIT, 0)
        .await
        .expect("find should succeed");

    assert_eq!(found.len(), 1, "should find exactly one message");
    let stored = &found[0];
    assert_eq!(stored.id, message.id);
    assert_eq!(stored.topic, message.topic);
    assert_eq!(stored.timestamp, message.timestamp, "same instant");
    assert_eq!(stored.payload, message.payload);
}

pub async fn test_find_unknown_id_is_empty<S: JournalStore>(store: &mut S) {
    let found = store
        .find(&Query::new().id(Uuid::new_v4()), DEFAULT_FIND_LIMIT, 0)
        .await
        .expect("find should succeed");
    assert!(found.is_empty());
}

pub async fn test_find_multiple_ids<S: JournalStore>(store: &mut S) {
    let topic = scope("ids");
    let messages = insert_series(store, &topic, at("2024-01-01T00:00:00Z"), 3).await;

    let query = Query::new().id(messages[0].id).id(messages[2].id);
    let found = store
        .find(&query, DEFAULT_FIND_LIMIT, 0)
        .await
        .expect("find should succeed");

    let mut ids: Vec<Uuid> = found.iter().map(|m| m.id).collect();
    ids.sort();
    let mut expected = vec![messages[0].id, messages[2].id];
    expected.sort();
    assert_eq!(ids, expected);
}

pub async fn test_duplicate_insert_is_write_error<S: JournalStore>(store: &mut S) {
    let message = JournalMessage::new(scope("duplicate"), json!({}));
    store.insert(&message).await.expect("first insert should succeed");

    let err = store
        .insert(&message)
        .await
        .expect_err("duplicate id must be rejected");
    assert!(
        matches!(err, JournalError::Write(_)),
        "expected Write error, got {:?}",
        err
    );
}

// =============================================================================
// topic
// =============================================================================

pub async fn test_find_by_topic_glob_case_insensitive<S: JournalStore>(store: &mut S) {
    let base = scope("topic");
    let join = JournalMessage::new(format!("{}.Room.Join", base), json!({}));
    let part = JournalMessage::new(format!("{}.room.part", base), json!({}));
    let other = JournalMessage::new(format!("{}.lobby.join", base), json!({}));
    for message in [&join, &part, &other] {
        store.insert(message).await.expect("insert should succeed");
    }

    let query = Query::new().topic(format!("{}.ROOM.*", base));
    let found = store
        .find(&query, DEFAULT_FIND_LIMIT, 0)
        .await
        .expect("find should succeed");
    assert_eq!(found.len(), 2);
    assert!(found.iter().all(|m| m.id == join.id || m.id == part.id));

    let query = Query::new().topic(format!("{}*join", base));
    assert_eq!(store.count(&query).await.expect("count should succeed"), 2);

    let exact = Query::new().topic(format!("{}.lobby.join", base));
    assert_eq!(store.count(&exact).await.expect("count should succeed"), 1);
}

// =============================================================================
// timestamp
// =============================================================================

pub async fn test_find_by_time_range<S: JournalStore>(store: &mut S) {
    let topic = scope("range");
    let start = at("2023-06-01T10:00:00+00:00");
    insert_series(store, &topic, start, 5).await;
    let base = Query::new().topic(topic.as_str());

    let from = base.clone().since(start + Duration::minutes(3));
    assert_eq!(store.count(&from).await.expect("count"), 2, "from is inclusive");

    let to = base.clone().until(start + Duration::minutes(1));
    assert_eq!(store.count(&to).await.expect("count"), 2, "to is inclusive");

    let both = base
        .clone()
        .since(start + Duration::minutes(1))
        .until(start + Duration::minutes(3));
    assert_eq!(store.count(&both).await.expect("count"), 3);

    // Same instant expressed in another offset.
    let shifted = base.since(at("2023-06-01T12:04:00+02:00"));
    assert_eq!(store.count(&shifted).await.expect("count"), 1);
}

// =============================================================================
// payload
// =============================================================================

pub async fn test_find_by_payload_field<S: JournalStore>(store: &mut S) {
    let topic = scope("payload");
    insert_series(store, &topic, at("2024-02-01T00:00:00Z"), 6).await;
    let base = Query::new().topic(topic.as_str());

    // meta.level = i % 3 for i in 0..6: two messages per level.
    let level = base.clone().payload("meta.level", 2);
    let found = store
        .find(&level, DEFAULT_FIND_LIMIT, 0)
        .await
        .expect("find should succeed");
    assert_eq!(found.len(), 2);
    assert!(found.iter().all(|m| m.payload["meta"]["level"] == json!(2)));

    let seq = base.clone().payload("seq", 4);
    assert_eq!(store.count(&seq).await.expect("count"), 1);
}

pub async fn test_payload_fields_are_ored<S: JournalStore>(store: &mut S) {
    let topic = scope("payload_or");
    insert_series(store, &topic, at("2024-02-01T00:00:00Z"), 6).await;

    // seq 0 has level 0; seq 4 has level 1. Either field may match.
    let query = Query::new()
        .topic(topic.as_str())
        .payload("seq", 4)
        .payload("meta.level", 0);
    assert_eq!(store.count(&query).await.expect("count"), 3);
}

pub async fn test_payload_object_and_array_values<S: JournalStore>(store: &mut S) {
    let topic = scope("payload_doc");
    let target = JournalMessage::new(
        topic.as_str(),
        json!({"e": {"f": [1, 2]}, "l": [1, 2], "n": 3}),
    );
    let other = JournalMessage::new(
        topic.as_str(),
        json!({"e": {"f": [2, 1]}, "l": [1, 2, 3], "n": 3}),
    );
    store.insert(&target).await.expect("insert should succeed");
    store.insert(&other).await.expect("insert should succeed");
    let base = Query::new().topic(topic.as_str());

    let by_object = base.clone().payload("e", json!({"f": [1, 2]}));
    let found = store
        .find(&by_object, DEFAULT_FIND_LIMIT, 0)
        .await
        .expect("find should succeed");
    assert_eq!(found.len(), 1, "object value matches exactly one row");
    assert_eq!(found[0].id, target.id);

    let by_array = base.clone().payload("l", json!([1, 2]));
    let found = store
        .find(&by_array, DEFAULT_FIND_LIMIT, 0)
        .await
        .expect("find should succeed");
    assert_eq!(found.len(), 1, "array value matches exactly one row");
    assert_eq!(found[0].id, target.id);

    let nested = base.clone().payload("e.f", json!([2, 1]));
    let found = store
        .find(&nested, DEFAULT_FIND_LIMIT, 0)
        .await
        .expect("find should succeed");
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, other.id);

    let absent = base.clone().payload("e", json!({"f": []}));
    assert_eq!(store.count(&absent).await.expect("count"), 0);

    let scalar = base.payload("n", 3);
    assert_eq!(store.count(&scalar).await.expect("count"), 2);
}

pub async fn test_payload_string_and_unicode<S: JournalStore>(store: &mut S) {
    let topic = scope("payload_text");
    let message = JournalMessage::new(
        topic.as_str(),
        json!({"channel": "#rbot", "who": {"nick": "Zoë's bot"}}),
    );
    store.insert(&message).await.expect("insert should succeed");

    let query = Query::new()
        .topic(topic.as_str())
        .payload("who.nick", "Zoë's bot");
    let found = store
        .find(&query, DEFAULT_FIND_LIMIT, 0)
        .await
        .expect("find should succeed");
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, message.id);
}

pub async fn test_payload_path_injection_is_inert<S: JournalStore>(store: &mut S) {
    let topic = scope("injection");
    insert_series(store, &topic, at("2024-02-01T00:00:00Z"), 2).await;

    let query = Query::new()
        .topic(topic.as_str())
        .payload("meta'; DROP TABLE journal; --.level", 1);
    assert_eq!(store.count(&query).await.expect("count should succeed"), 0);

    // Table still there.
    let all = Query::new().topic(topic.as_str());
    assert_eq!(store.count(&all).await.expect("count should succeed"), 2);
}

// =============================================================================
// combination, pagination, count
// =============================================================================

pub async fn test_groups_are_anded<S: JournalStore>(store: &mut S) {
    let topic = scope("and");
    let messages = insert_series(store, &topic, at("2024-04-01T00:00:00Z"), 3).await;

    let matching = Query::new()
        .id(messages[1].id)
        .topic(topic.as_str())
        .payload("seq", 1);
    assert_eq!(store.count(&matching).await.expect("count"), 1);

    let mismatched = Query::new()
        .id(messages[1].id)
        .topic(format!("{}.elsewhere", topic));
    assert_eq!(store.count(&mismatched).await.expect("count"), 0);
}

pub async fn test_find_pagination<S: JournalStore>(store: &mut S) {
    let topic = scope("page");
    let messages = insert_series(store, &topic, at("2024-05-01T00:00:00Z"), 7).await;
    let query = Query::new().topic(topic.as_str());

    let first = store.find(&query, 3, 0).await.expect("find");
    assert_eq!(first.len(), 3);
    let last = store.find(&query, 3, 6).await.expect("find");
    assert_eq!(last.len(), 1);
    let beyond = store.find(&query, 3, 7).await.expect("find");
    assert!(beyond.is_empty());

    // Row order is unspecified without ORDER BY, so only sizes and
    // membership are stable across pages.
    let ids: Vec<Uuid> = messages.iter().map(|m| m.id).collect();
    let mut returned = 0;
    for offset in (0..7).step_by(3) {
        let page = store.find(&query, 3, offset).await.expect("find");
        assert!(page.iter().all(|m| ids.contains(&m.id)));
        returned += page.len();
    }
    assert_eq!(returned, messages.len());
    assert_eq!(store.count(&query).await.expect("count"), 7);
}

pub async fn test_count_matches_unbounded_find<S: JournalStore>(store: &mut S) {
    let topic = scope("count");
    insert_series(store, &topic, at("2024-06-01T00:00:00Z"), 4).await;

    let queries = [
        Query::new().topic(topic.as_str()),
        Query::new().topic(topic.as_str()).payload("meta.level", 1),
        Query::new()
            .topic(format!("{}*", topic))
            .since(at("2024-06-01T00:02:00Z")),
    ];
    for query in &queries {
        let count = store.count(query).await.expect("count should succeed");
        let found = store.find(query, u64::MAX, 0).await.expect("find should succeed");
        assert_eq!(count, found.len() as u64);
    }
}

pub async fn test_unconstrained_query_matches_all<S: JournalStore>(store: &mut S) {
    let topic = scope("all");
    insert_series(store, &topic, at("2024-07-01T00:00:00Z"), 2).await;

    let total = store.count(&Query::new()).await.expect("count should succeed");
    assert!(total >= 2, "unconstrained query matches every row");

    let page = store.find(&Query::new(), 1, 0).await.expect("find should succeed");
    assert_eq!(page.len(), 1);
}

// =============================================================================
// Test runner macro
// =============================================================================

/// Run all JournalStore interface tests against a store implementation.
#[macro_export]
macro_rules! run_journal_store_tests {
    ($store:expr) => {
        use $crate::storage::journal_store_tests::*;

        test_insert_and_find_by_id($store).await;
        println!("  test_insert_and_find_by_id: PASSED");

        test_find_unknown_id_is_empty($store).await;
        println!("  test_find_unknown_id_is_empty: PASSED");

        test_find_multiple_ids($store).await;
        println!("  test_find_multiple_ids: PASSED");

        test_duplicate_insert_is_write_error($store).await;
        println!("  test_duplicate_insert_is_write_error: PASSED");

        test_find_by_topic_glob_case_insensitive($store).await;
        println!("  test_find_by_topic_glob_case_insensitive: PASSED");

        test_find_by_time_range($store).await;
        println!("  test_find_by_time_range: PASSED");

        test_find_by_payload_field($store).await;
        println!("  test_find_by_payload_field: PASSED");

        test_payload_fields_are_ored($store).await;
        println!("  test_payload_fields_are_ored: PASSED");

        test_payload_object_and_array_values($store).await;
        println!("  test_payload_object_and_array_values: PASSED");

        test_payload_string_and_unicode($store).await;
        println!("  test_payload_string_and_unicode: PASSED");

        test_payload_path_injection_is_inert($store).await;
        println!("  test_payload_path_injection_is_inert: PASSED");

        test_groups_are_anded($store).await;
        println!("  test_groups_are_anded: PASSED");

        test_find_pagination($store).await;
        println!("  test_find_pagination: PASSED");

        test_count_matches_unbounded_find($store).await;
        println!("  test_count_matches_unbounded_find: PASSED");

        test_unconstrained_query_matches_all($store).await;
        println!("  test_unconstrained_query_matches_all: PASSED");
    };
}
