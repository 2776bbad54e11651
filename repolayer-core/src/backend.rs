//! Storage backend abstraction for repositories.
//!
//! This module defines the collaborator surface a repository depends on,
//! allowing the facade to work with different document stores (in-memory,
//! MongoDB, etc.).
//!
//! # Overview
//!
//! The [`StoreBackend`] trait provides a unified async interface for the
//! document operations a repository issues: single and bulk reads, writes,
//! and cursor-producing finds. Implementations are required to be
//! thread-safe (`Send + Sync`) and support concurrent access; all interior
//! mutability lives behind the backend's own connection handling.
//!
//! Filters and update specifications are opaque BSON documents: backends
//! interpret them, the repository only passes them through.
//!
//! # Traits
//!
//! - [`StoreBackend`]: the core trait for storage backends
//! - [`ModelCursor`]: incremental retrieval handle returned by [`StoreBackend::find`]
//! - [`StoreBackendBuilder`]: factory trait for creating backend instances

use async_trait::async_trait;
use bson::{Bson, Document};
use std::{fmt::Debug, sync::Arc};

use crate::{
    error::StoreResult,
    model::Namespace,
    options::{FindOneOptions, FindOptions, UpdateOptions},
    result::{DeleteResult, RawUpdateResult},
};

/// Abstract interface for document storage backends.
///
/// Implementers provide the concrete store operations a
/// [`Repository`](crate::repository::Repository) delegates to. Every method
/// performs exactly one round trip; retry policy, pooling, and timeouts
/// belong to the implementation and its driver, never to the caller.
///
/// # Thread Safety
///
/// All implementations must be thread-safe and support concurrent access
/// from multiple async tasks. Backends are typically cheap to clone (or
/// used through `Arc`), so one connection can serve many repositories.
///
/// # Error Handling
///
/// Operations return [`StoreResult<T>`](crate::error::StoreResult).
/// Implementers should map driver failures onto the matching
/// [`StoreError`](crate::error::StoreError) kind: `Write` for rejected
/// writes, `Cursor` for cursor failures, `Backend` for everything else.
#[async_trait]
pub trait StoreBackend: Send + Sync + Debug + 'static {
    /// The cursor type produced by [`find`](StoreBackend::find).
    type Cursor: ModelCursor;

    /// Finds at most one document matching the filter.
    ///
    /// Returns `Ok(None)` when nothing matches; the repository decides
    /// whether that is an error.
    async fn find_one(
        &self,
        namespace: &Namespace,
        filter: Document,
        options: FindOneOptions,
    ) -> StoreResult<Option<Document>>;

    /// Executes a query and returns a live cursor over the matches.
    ///
    /// The cursor owns whatever server-side state the query produced and
    /// releases it when dropped.
    async fn find(
        &self,
        namespace: &Namespace,
        filter: Document,
        options: FindOptions,
    ) -> StoreResult<Self::Cursor>;

    /// Inserts a single document and returns the store-assigned identifier
    /// in its raw representation.
    async fn insert_one(&self, namespace: &Namespace, document: Document) -> StoreResult<Bson>;

    /// Inserts multiple documents in one bulk round trip.
    ///
    /// The returned identifiers match the input document order.
    async fn insert_many(
        &self,
        namespace: &Namespace,
        documents: Vec<Document>,
    ) -> StoreResult<Vec<Bson>>;

    /// Updates at most one document matching the filter.
    async fn update_one(
        &self,
        namespace: &Namespace,
        filter: Document,
        update: Document,
        options: UpdateOptions,
    ) -> StoreResult<RawUpdateResult>;

    /// Updates every document matching the filter.
    async fn update_many(
        &self,
        namespace: &Namespace,
        filter: Document,
        update: Document,
        options: UpdateOptions,
    ) -> StoreResult<RawUpdateResult>;

    /// Updates the document with the given raw identifier.
    async fn update_by_id(
        &self,
        namespace: &Namespace,
        id: Bson,
        update: Document,
        options: UpdateOptions,
    ) -> StoreResult<RawUpdateResult>;

    /// Deletes at most one document matching the filter.
    async fn delete_one(&self, namespace: &Namespace, filter: Document)
    -> StoreResult<DeleteResult>;

    /// Deletes every document matching the filter.
    async fn delete_many(
        &self,
        namespace: &Namespace,
        filter: Document,
    ) -> StoreResult<DeleteResult>;

    /// Cleanly shuts down the backend, releasing all resources.
    ///
    /// The default implementation is a no-op; backends with external
    /// connections should override this.
    async fn shutdown(self) -> StoreResult<()>
    where
        Self: Sized,
    {
        Ok(())
    }
}

/// Incremental retrieval handle for the results of a query.
///
/// The protocol is advance-then-read: [`advance`](ModelCursor::advance)
/// moves to the next result and reports whether one exists;
/// [`current`](ModelCursor::current) reads the document the cursor is
/// positioned on. A cursor that fails mid-iteration surfaces the failure
/// from `advance` itself — there is no separate error probe.
#[async_trait]
pub trait ModelCursor: Send + 'static {
    /// Advances to the next result.
    ///
    /// Returns `Ok(true)` when positioned on a document, `Ok(false)` when
    /// the result set is exhausted, and `Err` when the cursor itself
    /// failed. After `Ok(false)` or `Err`, the cursor must not be advanced
    /// again.
    async fn advance(&mut self) -> StoreResult<bool>;

    /// Returns the document at the current cursor position.
    ///
    /// An `Err` here is a per-document failure; the cursor may still be
    /// advanced past it.
    fn current(&self) -> StoreResult<Document>;
}

#[async_trait]
impl<B> StoreBackend for Arc<B>
where
    B: StoreBackend,
{
    type Cursor = B::Cursor;

    async fn find_one(
        &self,
        namespace: &Namespace,
        filter: Document,
        options: FindOneOptions,
    ) -> StoreResult<Option<Document>> {
        (**self)
            .find_one(namespace, filter, options)
            .await
    }

    async fn find(
        &self,
        namespace: &Namespace,
        filter: Document,
        options: FindOptions,
    ) -> StoreResult<Self::Cursor> {
        (**self)
            .find(namespace, filter, options)
            .await
    }

    async fn insert_one(&self, namespace: &Namespace, document: Document) -> StoreResult<Bson> {
        (**self)
            .insert_one(namespace, document)
            .await
    }

    async fn insert_many(
        &self,
        namespace: &Namespace,
        documents: Vec<Document>,
    ) -> StoreResult<Vec<Bson>> {
        (**self)
            .insert_many(namespace, documents)
            .await
    }

    async fn update_one(
        &self,
        namespace: &Namespace,
        filter: Document,
        update: Document,
        options: UpdateOptions,
    ) -> StoreResult<RawUpdateResult> {
        (**self)
            .update_one(namespace, filter, update, options)
            .await
    }

    async fn update_many(
        &self,
        namespace: &Namespace,
        filter: Document,
        update: Document,
        options: UpdateOptions,
    ) -> StoreResult<RawUpdateResult> {
        (**self)
            .update_many(namespace, filter, update, options)
            .await
    }

    async fn update_by_id(
        &self,
        namespace: &Namespace,
        id: Bson,
        update: Document,
        options: UpdateOptions,
    ) -> StoreResult<RawUpdateResult> {
        (**self)
            .update_by_id(namespace, id, update, options)
            .await
    }

    async fn delete_one(
        &self,
        namespace: &Namespace,
        filter: Document,
    ) -> StoreResult<DeleteResult> {
        (**self)
            .delete_one(namespace, filter)
            .await
    }

    async fn delete_many(
        &self,
        namespace: &Namespace,
        filter: Document,
    ) -> StoreResult<DeleteResult> {
        (**self)
            .delete_many(namespace, filter)
            .await
    }
}

#[async_trait]
pub trait StoreBackendBuilder {
    type Backend: StoreBackend;

    async fn build(self) -> StoreResult<Self::Backend>;
}
