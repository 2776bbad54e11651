//! In-memory storage implementation for repositories.
//!
//! This module provides a simple but complete in-memory collaborator that
//! stores documents as BSON in nested HashMaps behind an async-aware
//! read-write lock.

use std::{cmp::Ordering, collections::HashMap, sync::Arc};

use async_trait::async_trait;
use bson::{Bson, Document, doc, oid::ObjectId};
use mea::rwlock::RwLock;

use repolayer_core::{
    backend::{ModelCursor, StoreBackend, StoreBackendBuilder},
    error::{StoreError, StoreResult},
    model::Namespace,
    options::{FindOneOptions, FindOptions, UpdateOptions},
    result::{DeleteResult, RawUpdateResult},
};

use crate::{
    evaluator::{Comparable, FilterEvaluator},
    update::{apply_update, upsert_document},
};

type Collections = HashMap<String, Vec<Document>>;
type Databases = HashMap<String, Collections>;

/// Thread-safe in-memory storage backend.
///
/// Documents live in insertion order inside per-collection vectors, keyed
/// by database and collection name. A document without an `_id` is
/// assigned a fresh [`ObjectId`] on insert, mirroring MongoDB, so the
/// identifier-extraction path behaves the same against both backends.
///
/// # Thread Safety
///
/// `InMemoryStore` is cloneable and uses an `Arc`-wrapped internal state:
/// clones share the same data and the store can be used concurrently from
/// multiple async tasks.
///
/// # Performance
///
/// Every query scans its collection (no indexing), and cursors iterate a
/// snapshot taken at query time. Intended for development and testing, not
/// for large datasets.
#[derive(Default, Clone, Debug)]
pub struct InMemoryStore {
    databases: Arc<RwLock<Databases>>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            databases: Arc::new(RwLock::new(Databases::new())),
        }
    }

    /// Creates a builder for constructing an `InMemoryStore`.
    pub fn builder() -> InMemoryStoreBuilder {
        InMemoryStoreBuilder
    }
}

fn matching_documents<'a>(
    documents: impl IntoIterator<Item = &'a Document>,
    filter: &Document,
) -> StoreResult<Vec<Document>> {
    let mut matches = Vec::new();

    for document in documents {
        if FilterEvaluator::new(document).matches(filter)? {
            matches.push(document.clone());
        }
    }

    Ok(matches)
}

fn sort_documents(documents: &mut [Document], sort: &Document) -> StoreResult<()> {
    // Validate directions up front; the comparator itself cannot fail.
    for (field, direction) in sort {
        match direction.as_i32() {
            Some(1) | Some(-1) => {}
            _ => match direction.as_i64() {
                Some(1) | Some(-1) => {}
                _ => {
                    return Err(StoreError::Backend(format!(
                        "invalid sort direction for field {field}"
                    )));
                }
            },
        }
    }

    documents.sort_by(|a, b| {
        for (field, direction) in sort {
            let left = a.get(field).map(Comparable::from).unwrap_or(Comparable::Null);
            let right = b.get(field).map(Comparable::from).unwrap_or(Comparable::Null);

            let ordering = left.partial_cmp(&right).unwrap_or(Ordering::Equal);
            let ordering = if direction.as_i64() == Some(-1) || direction.as_i32() == Some(-1) {
                ordering.reverse()
            } else {
                ordering
            };

            if ordering != Ordering::Equal {
                return ordering;
            }
        }

        Ordering::Equal
    });

    Ok(())
}

fn ensure_id(document: &mut Document) -> Bson {
    match document.get("_id") {
        Some(id) => id.clone(),
        None => {
            let id = Bson::ObjectId(ObjectId::new());
            document.insert("_id".to_string(), id.clone());
            id
        }
    }
}

#[async_trait]
impl StoreBackend for InMemoryStore {
    type Cursor = InMemoryCursor;

    async fn find_one(
        &self,
        namespace: &Namespace,
        filter: Document,
        options: FindOneOptions,
    ) -> StoreResult<Option<Document>> {
        let databases = self.databases.read().await;
        let Some(documents) = databases
            .get(namespace.database())
            .and_then(|collections| collections.get(namespace.collection()))
        else {
            return Ok(None);
        };

        let mut matches = matching_documents(documents, &filter)?;

        if let Some(sort) = &options.sort {
            sort_documents(&mut matches, sort)?;
        }

        Ok(matches
            .into_iter()
            .nth(options.skip.unwrap_or(0) as usize))
    }

    async fn find(
        &self,
        namespace: &Namespace,
        filter: Document,
        options: FindOptions,
    ) -> StoreResult<Self::Cursor> {
        let databases = self.databases.read().await;
        let documents = databases
            .get(namespace.database())
            .and_then(|collections| collections.get(namespace.collection()));

        let mut matches = match documents {
            Some(documents) => matching_documents(documents, &filter)?,
            None => Vec::new(),
        };

        if let Some(sort) = &options.sort {
            sort_documents(&mut matches, sort)?;
        }

        let matches = matches
            .into_iter()
            .skip(options.skip.unwrap_or(0) as usize)
            .take(options.limit.unwrap_or(u64::MAX) as usize)
            .collect::<Vec<_>>();

        Ok(InMemoryCursor::new(matches))
    }

    async fn insert_one(&self, namespace: &Namespace, document: Document) -> StoreResult<Bson> {
        let mut databases = self.databases.write().await;
        let documents = databases
            .entry(namespace.database().to_string())
            .or_default()
            .entry(namespace.collection().to_string())
            .or_default();

        let mut document = document;
        let id = ensure_id(&mut document);

        if documents
            .iter()
            .any(|existing| existing.get("_id") == Some(&id))
        {
            return Err(StoreError::Write(format!(
                "duplicate _id {id} in {namespace}"
            )));
        }

        documents.push(document);

        Ok(id)
    }

    async fn insert_many(
        &self,
        namespace: &Namespace,
        documents: Vec<Document>,
    ) -> StoreResult<Vec<Bson>> {
        let mut databases = self.databases.write().await;
        let existing = databases
            .entry(namespace.database().to_string())
            .or_default()
            .entry(namespace.collection().to_string())
            .or_default();

        // All-or-nothing: assign ids and check duplicates before touching
        // the collection.
        let mut prepared = Vec::with_capacity(documents.len());
        let mut ids = Vec::with_capacity(documents.len());

        for mut document in documents {
            let id = ensure_id(&mut document);

            let duplicate = existing
                .iter()
                .any(|existing| existing.get("_id") == Some(&id))
                || ids.contains(&id);
            if duplicate {
                return Err(StoreError::Write(format!(
                    "duplicate _id {id} in {namespace}"
                )));
            }

            ids.push(id);
            prepared.push(document);
        }

        existing.extend(prepared);

        Ok(ids)
    }

    async fn update_one(
        &self,
        namespace: &Namespace,
        filter: Document,
        update: Document,
        options: UpdateOptions,
    ) -> StoreResult<RawUpdateResult> {
        let mut databases = self.databases.write().await;
        let documents = databases
            .entry(namespace.database().to_string())
            .or_default()
            .entry(namespace.collection().to_string())
            .or_default();

        for document in documents.iter_mut() {
            if FilterEvaluator::new(document).matches(&filter)? {
                let modified = apply_update(document, &update)?;

                return Ok(RawUpdateResult {
                    matched: 1,
                    modified: modified as u64,
                    upserted_id: None,
                });
            }
        }

        if options.upsert {
            let mut document = upsert_document(&filter, &update)?;
            let id = ensure_id(&mut document);
            documents.push(document);

            return Ok(RawUpdateResult {
                matched: 0,
                modified: 0,
                upserted_id: Some(id),
            });
        }

        Ok(RawUpdateResult::default())
    }

    async fn update_many(
        &self,
        namespace: &Namespace,
        filter: Document,
        update: Document,
        options: UpdateOptions,
    ) -> StoreResult<RawUpdateResult> {
        let mut databases = self.databases.write().await;
        let documents = databases
            .entry(namespace.database().to_string())
            .or_default()
            .entry(namespace.collection().to_string())
            .or_default();

        let mut matched = 0;
        let mut modified = 0;

        for document in documents.iter_mut() {
            if FilterEvaluator::new(document).matches(&filter)? {
                matched += 1;
                if apply_update(document, &update)? {
                    modified += 1;
                }
            }
        }

        if matched == 0 && options.upsert {
            let mut document = upsert_document(&filter, &update)?;
            let id = ensure_id(&mut document);
            documents.push(document);

            return Ok(RawUpdateResult {
                matched: 0,
                modified: 0,
                upserted_id: Some(id),
            });
        }

        Ok(RawUpdateResult {
            matched,
            modified,
            upserted_id: None,
        })
    }

    async fn update_by_id(
        &self,
        namespace: &Namespace,
        id: Bson,
        update: Document,
        options: UpdateOptions,
    ) -> StoreResult<RawUpdateResult> {
        self.update_one(namespace, doc! { "_id": id }, update, options)
            .await
    }

    async fn delete_one(
        &self,
        namespace: &Namespace,
        filter: Document,
    ) -> StoreResult<DeleteResult> {
        let mut databases = self.databases.write().await;
        let Some(documents) = databases
            .get_mut(namespace.database())
            .and_then(|collections| collections.get_mut(namespace.collection()))
        else {
            return Ok(DeleteResult::default());
        };

        let mut target = None;
        for (index, document) in documents.iter().enumerate() {
            if FilterEvaluator::new(document).matches(&filter)? {
                target = Some(index);
                break;
            }
        }

        match target {
            Some(index) => {
                documents.remove(index);
                Ok(DeleteResult { deleted: 1 })
            }
            None => Ok(DeleteResult::default()),
        }
    }

    async fn delete_many(
        &self,
        namespace: &Namespace,
        filter: Document,
    ) -> StoreResult<DeleteResult> {
        let mut databases = self.databases.write().await;
        let Some(documents) = databases
            .get_mut(namespace.database())
            .and_then(|collections| collections.get_mut(namespace.collection()))
        else {
            return Ok(DeleteResult::default());
        };

        let mut retained = Vec::with_capacity(documents.len());
        let mut deleted = 0;

        for document in documents.drain(..) {
            if FilterEvaluator::new(&document).matches(&filter)? {
                deleted += 1;
            } else {
                retained.push(document);
            }
        }

        *documents = retained;

        Ok(DeleteResult { deleted })
    }
}

/// Cursor over a snapshot of matching documents.
///
/// The snapshot is taken while the query holds the read lock; writes that
/// land after the cursor is created are not visible through it.
#[derive(Debug)]
pub struct InMemoryCursor {
    documents: std::vec::IntoIter<Document>,
    current: Option<Document>,
}

impl InMemoryCursor {
    fn new(documents: Vec<Document>) -> Self {
        Self {
            documents: documents.into_iter(),
            current: None,
        }
    }
}

#[async_trait]
impl ModelCursor for InMemoryCursor {
    async fn advance(&mut self) -> StoreResult<bool> {
        self.current = self.documents.next();
        Ok(self.current.is_some())
    }

    fn current(&self) -> StoreResult<Document> {
        self.current
            .clone()
            .ok_or_else(|| StoreError::Cursor("cursor is not positioned on a document".into()))
    }
}

/// Builder for constructing [`InMemoryStore`] instances.
///
/// Currently a no-op builder, kept for parity with persistent backends so
/// call sites can swap implementations without restructuring.
#[derive(Default)]
pub struct InMemoryStoreBuilder;

#[async_trait]
impl StoreBackendBuilder for InMemoryStoreBuilder {
    type Backend = InMemoryStore;

    async fn build(self) -> StoreResult<Self::Backend> {
        Ok(InMemoryStore::new())
    }
}
