//! MongoDB backend implementation for repolayer.
//!
//! This crate provides a MongoDB-based implementation of the `StoreBackend`
//! trait, enabling persistent storage with MongoDB's native filter and
//! update dialect passed through verbatim.
//!
//! To use this backend, include the `mongodb` feature in your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! repolayer = { version = "x.y.z", features = ["mongodb"] }
//! ```
//!
//! # Features
//!
//! - **Persistent storage** - Data is persisted to MongoDB Atlas or self-hosted MongoDB
//! - **Verbatim queries** - Filters and updates reach the server exactly as written
//! - **Async/await** - Fully asynchronous API built on MongoDB's async driver
//! - **Live cursors** - Streaming finds drain a genuine server-side cursor
//!
//! # Connection
//!
//! To use this backend, you need a MongoDB connection string. This can be
//! provided through the builder pattern.
//!
//! # Example
//!
//! ```ignore
//! use repolayer::{backend::StoreBackendBuilder, mongodb::MongoDbStore};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = MongoDbStore::builder("mongodb://localhost:27017")
//!         .build()
//!         .await?;
//!
//!     Ok(())
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as repolayer_mongodb;

pub mod store;

pub use store::{MongoDbCursor, MongoDbStore, MongoDbStoreBuilder};
