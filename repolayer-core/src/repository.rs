//! Typed repository facade over a storage backend.
//!
//! A [`Repository`] presents find/insert/update/delete as typed operations
//! over one model. It is parameterized by the model type `M`, the
//! identifier type `I`, and the backend `B`; the model's capability
//! contract is resolved once at construction and routes every operation.
//!
//! # Example
//!
//! ```ignore
//! use repolayer::{prelude::*, memory::InMemoryStore};
//! use bson::{doc, oid::ObjectId};
//!
//! let users = Repository::<User, ObjectId, _>::new(InMemoryStore::new());
//! let id = users.insert_one(&user).await?;
//! let found = users.find_one(doc! { "_id": id }, None).await?;
//! ```

use bson::Document;
use std::marker::PhantomData;
use tracing::debug;

use crate::{
    backend::{ModelCursor, StoreBackend},
    error::{RepositoryError, RepositoryResult, StoreError},
    id::Identifier,
    model::{Model, ModelExt, Namespace},
    options::{FindOneOptions, FindOptions, UpdateOptions},
    result::{DeleteResult, UpdateResult},
    stream::{self, ModelStream, StreamCancel, StreamErrors},
};

/// A typed repository for one model.
///
/// Holds the backend handle and the resolved namespace; nothing else. The
/// struct carries no interior mutability and is safe for concurrent use —
/// clone it, share it behind an `Arc`, or construct several repositories
/// over clones of the same backend.
///
/// # Type Parameters
///
/// * `M` - The model type, providing the namespace through its capability contract
/// * `I` - The identifier type store-assigned ids are converted into
/// * `B` - The storage backend
#[derive(Debug)]
pub struct Repository<M: Model, I: Identifier, B: StoreBackend> {
    backend: B,
    namespace: Namespace,
    _marker: PhantomData<fn() -> (M, I)>,
}

impl<M: Model, I: Identifier, B: StoreBackend + Clone> Clone for Repository<M, I, B> {
    fn clone(&self) -> Self {
        Self {
            backend: self.backend.clone(),
            namespace: self.namespace.clone(),
            _marker: PhantomData,
        }
    }
}

impl<M: Model, I: Identifier, B: StoreBackend> Repository<M, I, B> {
    /// Creates a new repository for a model.
    ///
    /// The model's database and collection names are resolved here, once;
    /// the pair never changes for the lifetime of the instance.
    ///
    /// ```ignore
    /// let users = Repository::<User, ObjectId, _>::new(backend);
    /// ```
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            namespace: Namespace::of::<M>(),
            _marker: PhantomData,
        }
    }

    /// Returns the namespace this repository operates on.
    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    /// Finds a single model matching the filter.
    ///
    /// # Errors
    ///
    /// Returns an error under the `FindOne` marker: a
    /// [`StoreError::NotFound`] cause when nothing matches, a
    /// serialization cause when the matched document cannot be decoded
    /// into `M`.
    pub async fn find_one(
        &self,
        filter: Document,
        options: impl Into<Option<FindOneOptions>>,
    ) -> RepositoryResult<M> {
        debug!(namespace = %self.namespace, "find_one");

        let document = self
            .backend
            .find_one(&self.namespace, filter, options.into().unwrap_or_default())
            .await
            .map_err(RepositoryError::FindOne)?
            .ok_or(RepositoryError::FindOne(StoreError::NotFound))?;

        M::from_document(document).map_err(RepositoryError::FindOne)
    }

    /// Finds every model matching the filter, materialized eagerly.
    ///
    /// The whole result set is decoded before returning; a single
    /// undecodable document fails the entire call. Use
    /// [`find_stream`](Repository::find_stream) for result sets that
    /// should not be held in memory at once.
    pub async fn find(
        &self,
        filter: Document,
        options: impl Into<Option<FindOptions>>,
    ) -> RepositoryResult<Vec<M>> {
        debug!(namespace = %self.namespace, "find");

        let mut cursor = self
            .backend
            .find(&self.namespace, filter, options.into().unwrap_or_default())
            .await
            .map_err(RepositoryError::Find)?;

        let mut models = Vec::new();

        loop {
            match cursor.advance().await {
                Ok(true) => models.push(
                    cursor
                        .current()
                        .and_then(M::from_document)
                        .map_err(RepositoryError::Find)?,
                ),
                Ok(false) => break,
                Err(err) => return Err(RepositoryError::Find(err)),
            }
        }

        Ok(models)
    }

    /// Streams every model matching the filter through a cancellable
    /// channel triple.
    ///
    /// The query executes before this method returns; the returned
    /// handles are backed by a single background task draining the cursor
    /// at the consumer's pace. See [`crate::stream`] for the full
    /// backpressure, failure, and cancellation semantics.
    ///
    /// Requires a running tokio runtime.
    pub async fn find_stream(
        &self,
        filter: Document,
        options: impl Into<Option<FindOptions>>,
    ) -> RepositoryResult<(ModelStream<M>, StreamErrors, StreamCancel)> {
        debug!(namespace = %self.namespace, "find_stream");

        let cursor = self
            .backend
            .find(&self.namespace, filter, options.into().unwrap_or_default())
            .await
            .map_err(RepositoryError::FindStream)?;

        Ok(stream::spawn(self.namespace.clone(), cursor))
    }

    /// Inserts a single model and returns its store-assigned identifier.
    ///
    /// # Errors
    ///
    /// Both a rejected write and an identifier that cannot be represented
    /// as `I` fail under the `InsertOne` marker, with distinct causes.
    pub async fn insert_one(&self, model: &M) -> RepositoryResult<I> {
        debug!(namespace = %self.namespace, "insert_one");

        let document = model
            .to_document()
            .map_err(RepositoryError::InsertOne)?;

        let raw_id = self
            .backend
            .insert_one(&self.namespace, document)
            .await
            .map_err(RepositoryError::InsertOne)?;

        I::from_raw(raw_id).map_err(RepositoryError::InsertOne)
    }

    /// Inserts multiple models in one bulk round trip.
    ///
    /// The returned identifiers match the input order. A conversion
    /// failure on any one identifier fails the whole call; no partial
    /// success is reported.
    pub async fn insert_many(&self, models: &[M]) -> RepositoryResult<Vec<I>> {
        debug!(namespace = %self.namespace, count = models.len(), "insert_many");

        let documents = models
            .iter()
            .map(ModelExt::to_document)
            .collect::<Result<Vec<_>, _>>()
            .map_err(RepositoryError::InsertMany)?;

        self.backend
            .insert_many(&self.namespace, documents)
            .await
            .map_err(RepositoryError::InsertMany)?
            .into_iter()
            .map(|raw| I::from_raw(raw).map_err(RepositoryError::InsertMany))
            .collect()
    }

    /// Updates at most one document matching the filter.
    ///
    /// A filter matching nothing is not an error; the result simply
    /// reports zero matches. With
    /// [`UpdateOptions::upsert`](crate::options::UpdateOptions) the
    /// result carries the typed identifier of the inserted document.
    pub async fn update_one(
        &self,
        filter: Document,
        update: Document,
        options: impl Into<Option<UpdateOptions>>,
    ) -> RepositoryResult<UpdateResult<I>> {
        debug!(namespace = %self.namespace, "update_one");

        let raw = self
            .backend
            .update_one(&self.namespace, filter, update, options.into().unwrap_or_default())
            .await
            .map_err(RepositoryError::UpdateOne)?;

        UpdateResult::from_raw(raw).map_err(RepositoryError::UpdateOne)
    }

    /// Updates every document matching the filter.
    pub async fn update_many(
        &self,
        filter: Document,
        update: Document,
        options: impl Into<Option<UpdateOptions>>,
    ) -> RepositoryResult<UpdateResult<I>> {
        debug!(namespace = %self.namespace, "update_many");

        let raw = self
            .backend
            .update_many(&self.namespace, filter, update, options.into().unwrap_or_default())
            .await
            .map_err(RepositoryError::UpdateMany)?;

        UpdateResult::from_raw(raw).map_err(RepositoryError::UpdateMany)
    }

    /// Updates the document with the given identifier.
    pub async fn update_by_id(
        &self,
        id: &I,
        update: Document,
        options: impl Into<Option<UpdateOptions>>,
    ) -> RepositoryResult<UpdateResult<I>> {
        debug!(namespace = %self.namespace, "update_by_id");

        let raw = self
            .backend
            .update_by_id(
                &self.namespace,
                id.to_raw(),
                update,
                options.into().unwrap_or_default(),
            )
            .await
            .map_err(RepositoryError::UpdateById)?;

        UpdateResult::from_raw(raw).map_err(RepositoryError::UpdateById)
    }

    /// Deletes at most one document matching the filter.
    ///
    /// Deleting a document that does not exist is not an error; the
    /// result reports zero deletions.
    pub async fn delete_one(&self, filter: Document) -> RepositoryResult<DeleteResult> {
        debug!(namespace = %self.namespace, "delete_one");

        self.backend
            .delete_one(&self.namespace, filter)
            .await
            .map_err(RepositoryError::DeleteOne)
    }

    /// Deletes every document matching the filter.
    pub async fn delete_many(&self, filter: Document) -> RepositoryResult<DeleteResult> {
        debug!(namespace = %self.namespace, "delete_many");

        self.backend
            .delete_many(&self.namespace, filter)
            .await
            .map_err(RepositoryError::DeleteMany)
    }
}
