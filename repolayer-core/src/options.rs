//! Operation options passed through to the storage backend.
//!
//! These are deliberately small, backend-neutral structs; each backend
//! translates them into its native option types. All repository methods
//! accept them as `impl Into<Option<...>>`, so `None` works where no
//! options are needed.

use bson::Document;

/// Options for single-document find operations.
#[derive(Debug, Clone, Default)]
pub struct FindOneOptions {
    /// Sort applied before the first match is taken, e.g. `doc! { "age": -1 }`.
    pub sort: Option<Document>,
    /// Number of matching documents to skip.
    pub skip: Option<u64>,
}

impl FindOneOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sort(mut self, sort: Document) -> Self {
        self.sort = Some(sort);
        self
    }

    pub fn skip(mut self, skip: u64) -> Self {
        self.skip = Some(skip);
        self
    }
}

/// Options for multi-document find operations, including streaming finds.
#[derive(Debug, Clone, Default)]
pub struct FindOptions {
    /// Sort order of the result set, e.g. `doc! { "created_at": 1 }`.
    pub sort: Option<Document>,
    /// Number of matching documents to skip.
    pub skip: Option<u64>,
    /// Maximum number of documents to return.
    pub limit: Option<u64>,
}

impl FindOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sort(mut self, sort: Document) -> Self {
        self.sort = Some(sort);
        self
    }

    pub fn skip(mut self, skip: u64) -> Self {
        self.skip = Some(skip);
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Options for update operations.
#[derive(Debug, Clone, Default)]
pub struct UpdateOptions {
    /// Insert a new document when the filter matches nothing.
    pub upsert: bool,
}

impl UpdateOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upsert(mut self, upsert: bool) -> Self {
        self.upsert = upsert;
        self
    }
}
