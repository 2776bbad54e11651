//! Main repolayer crate providing typed repositories over document stores.
//!
//! This crate is the primary entry point for users of the repolayer
//! framework. It re-exports the core types and functionality from the
//! sub-crates and provides convenient access to the storage backends.
//!
//! # Features
//!
//! - **Typed CRUD** - Parameterize a [`Repository`](repository::Repository)
//!   by a model type and an identifier type; results and errors come back typed
//! - **Streaming queries** - Drain a server-side cursor through a
//!   cancellable, backpressured channel triple
//! - **Multiple backends** - In-memory and MongoDB storage behind one
//!   `StoreBackend` trait
//! - **Uniform errors** - Every failure names the operation it occurred in
//!   and preserves the underlying cause
//!
//! # Quick Start
//!
//! ```ignore
//! use repolayer::{prelude::*, memory::InMemoryStore};
//! use bson::{doc, oid::ObjectId};
//! use serde::{Serialize, Deserialize};
//!
//! #[derive(Debug, Clone, Serialize, Deserialize, Model)]
//! #[model(database = "app", collection = "users")]
//! pub struct User {
//!     #[serde(rename = "_id")]
//!     pub id: ObjectId,
//!     pub name: String,
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let users = Repository::<User, ObjectId, _>::new(InMemoryStore::new());
//!
//!     let id = users
//!         .insert_one(&User { id: ObjectId::new(), name: "Alice".to_string() })
//!         .await?;
//!
//!     let alice = users.find_one(doc! { "_id": id }, None).await?;
//!     println!("found: {alice:?}");
//!
//!     Ok(())
//! }
//! ```
//!
//! # Streaming
//!
//! A streaming find returns a value stream, an error stream, and a cancel
//! handle. The background drain task paces itself to the consumer, reports
//! undecodable documents without aborting, and closes both streams exactly
//! once when it stops:
//!
//! ```ignore
//! use futures::StreamExt;
//!
//! let (mut values, mut errors, cancel) = users.find_stream(doc! {}, None).await?;
//!
//! tokio::spawn(async move {
//!     while let Some(err) = errors.next().await {
//!         eprintln!("skipped document: {err}");
//!     }
//! });
//!
//! while let Some(user) = values.next().await {
//!     println!("{user:?}");
//! }
//! // Dropping `cancel` after the loop is a harmless no-op; calling
//! // `cancel.cancel()` earlier stops the stream within one document.
//! ```
//!
//! # Backends
//!
//! - [`memory`] - Fast in-memory storage for development and testing
//! - [`mongodb`] - Persistent MongoDB backend (requires the `mongodb` feature)

pub mod prelude;

pub use repolayer_core::{backend, error, id, model, options, repository, result, stream};

pub use repolayer_macros::Model;

// Re-export BSON types for convenience
pub use bson;

/// In-memory storage backend implementations.
pub mod memory {
    pub use repolayer_memory::{InMemoryCursor, InMemoryStore, InMemoryStoreBuilder};
}

/// MongoDB storage backend implementations.
///
/// This module is only available when the `mongodb` feature is enabled.
#[cfg(feature = "mongodb")]
pub mod mongodb {
    pub use repolayer_mongodb::{MongoDbCursor, MongoDbStore, MongoDbStoreBuilder};
}
