//! In-memory storage backend for repolayer.
//!
//! This crate provides a thread-safe, in-memory implementation of the
//! `StoreBackend` trait. It uses async-aware read-write locks for
//! concurrent access and is ideal for development and testing.
//!
//! # Features
//!
//! - **Thread-safe access** - Concurrent reads and writes using an async-aware RwLock
//! - **MongoDB-shaped semantics** - ObjectId assignment, `$set`/`$unset` updates,
//!   upserts, and a filter dialect matching the persistent backend
//! - **Snapshot cursors** - Streaming finds iterate the result set as of query time
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
//!     users
//!         .insert_one(&User { id: ObjectId::new(), name: "Alice".to_string() })
//!         .await?;
//!
//!     Ok(())
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as repolayer_memory;

mod evaluator;
mod update;
pub mod store;

pub use store::{InMemoryCursor, InMemoryStore, InMemoryStoreBuilder};
