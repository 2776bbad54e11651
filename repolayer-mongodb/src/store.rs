use async_trait::async_trait;
use bson::{Bson, Document, doc};
use mongodb::{
    Client, Collection as MongoCollection, Cursor,
    options::{
        ClientOptions, FindOneOptions as MongoFindOneOptions, FindOptions as MongoFindOptions,
        UpdateOptions as MongoUpdateOptions,
    },
};
use tracing::debug;

use repolayer_core::{
    backend::{ModelCursor, StoreBackend, StoreBackendBuilder},
    error::{StoreError, StoreResult},
    model::Namespace,
    options::{FindOneOptions, FindOptions, UpdateOptions},
    result::{DeleteResult, RawUpdateResult},
};

#[derive(Debug, Clone)]
pub struct MongoDbStore {
    client: Client,
}

impl MongoDbStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn builder(dsn: &str) -> MongoDbStoreBuilder {
        MongoDbStoreBuilder::new(dsn)
    }

    fn get_collection(&self, namespace: &Namespace) -> MongoCollection<Document> {
        self.client
            .database(namespace.database())
            .collection(namespace.collection())
    }

    async fn shutdown(self) -> StoreResult<()> {
        self.client.shutdown().await;

        Ok(())
    }
}

fn find_one_options(options: FindOneOptions) -> MongoFindOneOptions {
    let mut translated = MongoFindOneOptions::default();
    translated.sort = options.sort;
    translated.skip = options.skip;
    translated
}

fn find_options(options: FindOptions) -> MongoFindOptions {
    let mut translated = MongoFindOptions::default();
    translated.sort = options.sort;
    translated.skip = options.skip;
    translated.limit = options.limit.map(|limit| limit as i64);
    translated
}

fn update_options(options: UpdateOptions) -> MongoUpdateOptions {
    let mut translated = MongoUpdateOptions::default();
    translated.upsert = Some(options.upsert);
    translated
}

#[async_trait]
impl StoreBackend for MongoDbStore {
    type Cursor = MongoDbCursor;

    async fn find_one(
        &self,
        namespace: &Namespace,
        filter: Document,
        options: FindOneOptions,
    ) -> StoreResult<Option<Document>> {
        self.get_collection(namespace)
            .find_one(filter)
            .with_options(find_one_options(options))
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))
    }

    async fn find(
        &self,
        namespace: &Namespace,
        filter: Document,
        options: FindOptions,
    ) -> StoreResult<Self::Cursor> {
        debug!(namespace = %namespace, "opening cursor");

        Ok(MongoDbCursor {
            inner: self
                .get_collection(namespace)
                .find(filter)
                .with_options(find_options(options))
                .await
                .map_err(|e| StoreError::Backend(e.to_string()))?,
        })
    }

    async fn insert_one(&self, namespace: &Namespace, document: Document) -> StoreResult<Bson> {
        Ok(self
            .get_collection(namespace)
            .insert_one(document)
            .await
            .map_err(|e| StoreError::Write(e.to_string()))?
            .inserted_id)
    }

    async fn insert_many(
        &self,
        namespace: &Namespace,
        documents: Vec<Document>,
    ) -> StoreResult<Vec<Bson>> {
        let count = documents.len();

        let mut inserted_ids = self
            .get_collection(namespace)
            .insert_many(documents)
            .await
            .map_err(|e| StoreError::Write(e.to_string()))?
            .inserted_ids;

        // The driver keys identifiers by input index; restore input order.
        (0..count)
            .map(|index| {
                inserted_ids
                    .remove(&index)
                    .ok_or_else(|| {
                        StoreError::Write(format!("missing inserted id for document {index}"))
                    })
            })
            .collect()
    }

    async fn update_one(
        &self,
        namespace: &Namespace,
        filter: Document,
        update: Document,
        options: UpdateOptions,
    ) -> StoreResult<RawUpdateResult> {
        let result = self
            .get_collection(namespace)
            .update_one(filter, update)
            .with_options(update_options(options))
            .await
            .map_err(|e| StoreError::Write(e.to_string()))?;

        Ok(RawUpdateResult {
            matched: result.matched_count,
            modified: result.modified_count,
            upserted_id: result.upserted_id,
        })
    }

    async fn update_many(
        &self,
        namespace: &Namespace,
        filter: Document,
        update: Document,
        options: UpdateOptions,
    ) -> StoreResult<RawUpdateResult> {
        let result = self
            .get_collection(namespace)
            .update_many(filter, update)
            .with_options(update_options(options))
            .await
            .map_err(|e| StoreError::Write(e.to_string()))?;

        Ok(RawUpdateResult {
            matched: result.matched_count,
            modified: result.modified_count,
            upserted_id: result.upserted_id,
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
        let result = self
            .get_collection(namespace)
            .delete_one(filter)
            .await
            .map_err(|e| StoreError::Write(e.to_string()))?;

        Ok(DeleteResult {
            deleted: result.deleted_count,
        })
    }

    async fn delete_many(
        &self,
        namespace: &Namespace,
        filter: Document,
    ) -> StoreResult<DeleteResult> {
        let result = self
            .get_collection(namespace)
            .delete_many(filter)
            .await
            .map_err(|e| StoreError::Write(e.to_string()))?;

        Ok(DeleteResult {
            deleted: result.deleted_count,
        })
    }

    async fn shutdown(self) -> StoreResult<()> {
        self.shutdown().await
    }
}

/// Cursor over a live MongoDB result set.
#[derive(Debug)]
pub struct MongoDbCursor {
    inner: Cursor<Document>,
}

#[async_trait]
impl ModelCursor for MongoDbCursor {
    async fn advance(&mut self) -> StoreResult<bool> {
        self.inner
            .advance()
            .await
            .map_err(|e| StoreError::Cursor(e.to_string()))
    }

    fn current(&self) -> StoreResult<Document> {
        self.inner
            .deserialize_current()
            .map_err(|e| StoreError::Serialization(e.to_string()))
    }
}

pub struct MongoDbStoreBuilder {
    dsn: String,
}

impl MongoDbStoreBuilder {
    pub fn new(dsn: &str) -> Self {
        Self {
            dsn: dsn.to_string(),
        }
    }
}

#[async_trait]
impl StoreBackendBuilder for MongoDbStoreBuilder {
    type Backend = MongoDbStore;

    async fn build(self) -> StoreResult<Self::Backend> {
        Ok(MongoDbStore::new(
            Client::with_options(
                ClientOptions::parse(&self.dsn)
                    .await
                    .map_err(|e| StoreError::Backend(e.to_string()))?,
            )
            .map_err(|e| StoreError::Backend(e.to_string()))?,
        ))
    }
}
