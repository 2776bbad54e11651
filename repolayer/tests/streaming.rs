//! Streaming find behavior against the in-memory backend.

use std::collections::HashSet;

use bson::{doc, oid::ObjectId};
use futures::StreamExt;
use repolayer::{memory::InMemoryStore, prelude::*};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Model)]
#[model(database = "telemetry", collection = "events")]
struct Event {
    #[serde(rename = "_id")]
    id: ObjectId,
    sequence: i64,
}

fn events(count: i64) -> Vec<Event> {
    (0..count)
        .map(|sequence| Event {
            id: ObjectId::new(),
            sequence,
        })
        .collect()
}

fn events_repo() -> (InMemoryStore, Repository<Event, ObjectId, InMemoryStore>) {
    let store = InMemoryStore::new();
    (store.clone(), Repository::new(store))
}

#[tokio::test]
async fn stream_yields_every_document_in_cursor_order() {
    let (_, repo) = events_repo();
    let inserted = events(10);
    repo.insert_many(&inserted).await.unwrap();

    let (values, mut errors, _cancel) = repo.find_stream(doc! {}, None).await.unwrap();

    let received: Vec<Event> = values.collect().await;
    assert_eq!(received.len(), inserted.len());

    // Same identifiers, and in the cursor's native (insertion) order.
    let received_ids: Vec<ObjectId> = received.iter().map(|e| e.id).collect();
    let inserted_ids: Vec<ObjectId> = inserted.iter().map(|e| e.id).collect();
    assert_eq!(received_ids, inserted_ids);

    // The error channel closes without ever carrying anything.
    assert!(errors.next().await.is_none());
}

#[tokio::test]
async fn malformed_document_is_reported_and_skipped() {
    let (store, repo) = events_repo();
    let namespace = Namespace::of::<Event>();

    let first = events(2);
    repo.insert_many(&first).await.unwrap();

    // A document the model cannot decode, wedged into the middle of the set.
    store
        .insert_one(&namespace, doc! { "sequence": "not-a-number" })
        .await
        .unwrap();

    let second = events(2);
    repo.insert_many(&second).await.unwrap();

    let (values, errors, _cancel) = repo.find_stream(doc! {}, None).await.unwrap();

    let (received, reported) = futures::join!(
        values.collect::<Vec<Event>>(),
        errors.collect::<Vec<RepositoryError>>(),
    );

    assert_eq!(received.len(), 4, "well-formed documents still arrive");
    assert_eq!(reported.len(), 1);
    assert_eq!(reported[0].operation(), Operation::FindStream);
    assert!(matches!(reported[0].cause(), StoreError::Serialization(_)));
}

#[tokio::test]
async fn cancellation_stops_production_within_one_document() {
    let (_, repo) = events_repo();
    repo.insert_many(&events(40)).await.unwrap();

    let (mut values, _errors, cancel) = repo.find_stream(doc! {}, None).await.unwrap();

    for _ in 0..3 {
        values.next().await.expect("value before cancellation");
    }

    cancel.cancel();

    let mut trailing = 0;
    while values.next().await.is_some() {
        trailing += 1;
    }
    assert!(trailing <= 1, "got {trailing} values after cancellation");
}

#[tokio::test]
async fn cancelling_an_exhausted_stream_is_harmless() {
    let (_, repo) = events_repo();
    repo.insert_many(&events(3)).await.unwrap();

    let (values, mut errors, cancel) = repo.find_stream(doc! {}, None).await.unwrap();

    assert_eq!(values.collect::<Vec<Event>>().await.len(), 3);
    assert!(errors.next().await.is_none());

    // The drain already stopped; the signal has nowhere to go and that is fine.
    cancel.cancel();
}

#[tokio::test]
async fn concurrent_streams_are_independent() {
    let (_, repo) = events_repo();
    let inserted = events(8);
    repo.insert_many(&inserted).await.unwrap();
    let expected: HashSet<ObjectId> = inserted.iter().map(|e| e.id).collect();

    let (first, _first_errors, _first_cancel) = repo.find_stream(doc! {}, None).await.unwrap();
    let (second, _second_errors, _second_cancel) = repo.find_stream(doc! {}, None).await.unwrap();

    let (a, b) = futures::join!(
        first.collect::<Vec<Event>>(),
        second.collect::<Vec<Event>>(),
    );

    assert_eq!(a.iter().map(|e| e.id).collect::<HashSet<_>>(), expected);
    assert_eq!(b.iter().map(|e| e.id).collect::<HashSet<_>>(), expected);
}

#[tokio::test]
async fn stream_respects_find_options() {
    let (_, repo) = events_repo();
    repo.insert_many(&events(10)).await.unwrap();

    let options = FindOptions::new()
        .sort(doc! { "sequence": -1 })
        .limit(4);
    let (values, _errors, _cancel) = repo.find_stream(doc! {}, options).await.unwrap();

    let sequences: Vec<i64> = values.collect::<Vec<Event>>().await
        .iter()
        .map(|e| e.sequence)
        .collect();
    assert_eq!(sequences, [9, 8, 7, 6]);
}
