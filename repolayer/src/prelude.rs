//! Convenient re-exports of commonly used types from repolayer.
//!
//! Import this prelude module to quickly access the most frequently used
//! types and traits without needing to import from multiple sub-modules:
//!
//! ```ignore
//! use repolayer::prelude::*;
//! ```
//!
//! This provides access to:
//! - The repository facade and its option/result types
//! - The model capability contract and derive macro
//! - Identifier extraction
//! - Store backends and builders
//! - Streaming handles
//! - Error types

pub use repolayer_core::{
    backend::{ModelCursor, StoreBackend, StoreBackendBuilder},
    error::{Operation, RepositoryError, RepositoryResult, StoreError, StoreResult},
    id::Identifier,
    model::{Model, ModelExt, Namespace},
    options::{FindOneOptions, FindOptions, UpdateOptions},
    repository::Repository,
    result::{DeleteResult, UpdateResult},
    stream::{ModelStream, StreamCancel, StreamErrors},
};

pub use repolayer_macros::Model;
