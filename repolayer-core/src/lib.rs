//! A typed repository layer over document stores.
//!
//! This crate is the core of the repolayer project and provides:
//!
//! - **Model contract** ([`model`]) - The capability contract stored model types satisfy
//! - **Identifier extraction** ([`id`]) - Typed conversion of store-assigned identifiers
//! - **Store backend abstraction** ([`backend`]) - Traits for implementing storage backends
//! - **Repository facade** ([`repository`]) - The public typed CRUD surface
//! - **Streaming queries** ([`stream`]) - Cancellable cursor-to-channel streaming
//! - **Operation options** ([`options`]) - Backend-neutral find/update options
//! - **Result types** ([`result`]) - Typed update and delete results
//! - **Error handling** ([`error`]) - Operation markers wrapping store-level causes
//!
//! # Example
//!
//! ```ignore
//! use repolayer_core::{model::Model, repository::Repository};
//! use bson::{doc, oid::ObjectId};
//! use serde::{Serialize, Deserialize};
//!
//! #[derive(Debug, Clone, Serialize, Deserialize)]
//! pub struct User {
//!     #[serde(rename = "_id")]
//!     pub id: ObjectId,
//!     pub name: String,
//! }
//!
//! impl Model for User {
//!     fn database_name() -> &'static str {
//!         "app"
//!     }
//!
//!     fn collection_name() -> &'static str {
//!         "users"
//!     }
//! }
//!
//! # async fn example(backend: impl repolayer_core::backend::StoreBackend) {
//! let users = Repository::<User, ObjectId, _>::new(backend);
//! let alice = users.find_one(doc! { "name": "Alice" }, None).await;
//! # }
//! ```

#[allow(unused_extern_crates)]
extern crate self as repolayer_core;

pub mod backend;
pub mod error;
pub mod id;
pub mod model;
pub mod options;
pub mod repository;
pub mod result;
pub mod stream;
