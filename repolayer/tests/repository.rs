//! Repository CRUD behavior against the in-memory backend.

use bson::{doc, oid::ObjectId};
use chrono::{DateTime, Utc};
use repolayer::{memory::InMemoryStore, prelude::*};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Model)]
#[model(database = "crm", collection = "contacts")]
struct Contact {
    #[serde(rename = "_id")]
    id: ObjectId,
    name: String,
    email: String,
    signed_up: DateTime<Utc>,
}

fn contact(name: &str) -> Contact {
    Contact {
        id: ObjectId::new(),
        name: name.to_string(),
        email: format!("{name}@example.com"),
        signed_up: Utc::now(),
    }
}

fn contacts_repo() -> (InMemoryStore, Repository<Contact, ObjectId, InMemoryStore>) {
    let store = InMemoryStore::new();
    (store.clone(), Repository::new(store))
}

/// A model without an explicit identifier field; the store assigns one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Model)]
#[model(database = "crm", collection = "notes")]
struct Note {
    body: String,
}

#[tokio::test]
async fn insert_then_find_one_round_trips() {
    let (_, repo) = contacts_repo();
    let alice = contact("alice");

    let id = repo.insert_one(&alice).await.unwrap();
    assert_eq!(id, alice.id);

    let found = repo.find_one(doc! { "_id": id }, None).await.unwrap();
    assert_eq!(found, alice);
}

#[tokio::test]
async fn find_one_reports_not_found() {
    let (_, repo) = contacts_repo();

    let err = repo
        .find_one(doc! { "_id": ObjectId::new() }, None)
        .await
        .unwrap_err();

    assert_eq!(err.operation(), Operation::FindOne);
    assert!(err.is_not_found());
}

#[tokio::test]
async fn find_materializes_matching_models() {
    let (_, repo) = contacts_repo();
    repo.insert_many(&[contact("carol"), contact("alice"), contact("bob")])
        .await
        .unwrap();

    let all = repo
        .find(doc! {}, FindOptions::new().sort(doc! { "name": 1 }))
        .await
        .unwrap();

    let names: Vec<&str> = all.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, ["alice", "bob", "carol"]);
}

#[tokio::test]
async fn undecodable_document_aborts_find() {
    let (store, repo) = contacts_repo();
    repo.insert_one(&contact("alice")).await.unwrap();

    // Slip a document past the typed surface that cannot decode as Contact.
    store
        .insert_one(&Namespace::of::<Contact>(), doc! { "name": 13 })
        .await
        .unwrap();

    let err = repo.find(doc! {}, None).await.unwrap_err();
    assert_eq!(err.operation(), Operation::Find);
    assert!(matches!(err.cause(), StoreError::Serialization(_)));
}

#[tokio::test]
async fn insert_many_returns_ids_in_input_order() {
    let (_, repo) = contacts_repo();
    let batch: Vec<Contact> = ["a", "b", "c", "d"].iter().map(|n| contact(n)).collect();

    let ids = repo.insert_many(&batch).await.unwrap();

    let expected: Vec<ObjectId> = batch.iter().map(|c| c.id).collect();
    assert_eq!(ids, expected);
}

#[tokio::test]
async fn store_assigned_id_is_converted_to_the_declared_type() {
    let store = InMemoryStore::new();
    let notes = Repository::<Note, ObjectId, _>::new(store);

    let id = notes
        .insert_one(&Note {
            body: "remember".to_string(),
        })
        .await
        .unwrap();

    let found = notes.find_one(doc! { "_id": id }, None).await.unwrap();
    assert_eq!(found.body, "remember");
}

#[tokio::test]
async fn incompatible_id_type_fails_the_insert() {
    let store = InMemoryStore::new();
    // The store assigns ObjectIds; declaring i64 must fail loudly.
    let notes = Repository::<Note, i64, _>::new(store);

    let err = notes
        .insert_one(&Note {
            body: "remember".to_string(),
        })
        .await
        .unwrap_err();

    assert_eq!(err.operation(), Operation::InsertOne);
    assert!(matches!(
        err.cause(),
        StoreError::IdentifierMismatch { expected: "i64", .. }
    ));
}

#[tokio::test]
async fn update_one_reports_match_and_modification_counts() {
    let (_, repo) = contacts_repo();
    let alice = contact("alice");
    repo.insert_one(&alice).await.unwrap();

    let result = repo
        .update_one(
            doc! { "_id": alice.id },
            doc! { "$set": { "email": "alice@internal.example" } },
            None,
        )
        .await
        .unwrap();

    assert_eq!(result.matched, 1);
    assert_eq!(result.modified, 1);
    assert_eq!(result.upserted, 0);
    assert!(result.upserted_id.is_none());

    let missed = repo
        .update_one(
            doc! { "_id": ObjectId::new() },
            doc! { "$set": { "email": "nobody@example.com" } },
            None,
        )
        .await
        .unwrap();

    assert_eq!(missed.matched, 0);
    assert_eq!(missed.modified, 0);
}

#[tokio::test]
async fn upsert_returns_the_typed_identifier() {
    let store = InMemoryStore::new();
    let notes = Repository::<Note, ObjectId, _>::new(store);

    let result = notes
        .update_one(
            doc! { "body": "ghost" },
            doc! { "$set": { "pinned": true } },
            UpdateOptions::new().upsert(true),
        )
        .await
        .unwrap();

    assert_eq!(result.upserted, 1);
    let id = result.upserted_id.expect("upserted id");

    let found = notes.find_one(doc! { "_id": id }, None).await.unwrap();
    assert_eq!(found.body, "ghost");
}

#[tokio::test]
async fn update_by_id_targets_one_document() {
    let (_, repo) = contacts_repo();
    let alice = contact("alice");
    let bob = contact("bob");
    repo.insert_many(&[alice.clone(), bob.clone()]).await.unwrap();

    let result = repo
        .update_by_id(&bob.id, doc! { "$set": { "name": "robert" } }, None)
        .await
        .unwrap();
    assert_eq!(result.matched, 1);

    let renamed = repo.find_one(doc! { "_id": bob.id }, None).await.unwrap();
    assert_eq!(renamed.name, "robert");

    let untouched = repo.find_one(doc! { "_id": alice.id }, None).await.unwrap();
    assert_eq!(untouched.name, "alice");
}

#[tokio::test]
async fn update_many_counts_every_match() {
    let (_, repo) = contacts_repo();
    repo.insert_many(&[contact("a"), contact("b"), contact("c")])
        .await
        .unwrap();

    let result = repo
        .update_many(doc! {}, doc! { "$set": { "email": "shared@example.com" } }, None)
        .await
        .unwrap();

    assert_eq!(result.matched, 3);
    assert_eq!(result.modified, 3);
}

#[tokio::test]
async fn delete_reports_counts() {
    let (_, repo) = contacts_repo();
    let alice = contact("alice");
    repo.insert_many(&[alice.clone(), contact("bob"), contact("carol")])
        .await
        .unwrap();

    let one = repo.delete_one(doc! { "_id": alice.id }).await.unwrap();
    assert_eq!(one.deleted, 1);

    let rest = repo.delete_many(doc! {}).await.unwrap();
    assert_eq!(rest.deleted, 2);

    let err = repo.find_one(doc! {}, None).await.unwrap_err();
    assert!(err.is_not_found());
}
