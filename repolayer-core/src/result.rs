//! Typed and raw result structs for write operations.

use bson::Bson;

use crate::{error::StoreResult, id::Identifier};

/// Backend-level result of an update operation, before identifier typing.
///
/// The upserted identifier, if any, is still in the store's raw
/// representation; the repository converts it with [`Identifier::from_raw`].
#[derive(Debug, Clone, Default)]
pub struct RawUpdateResult {
    /// Number of documents the filter matched.
    pub matched: u64,
    /// Number of documents actually modified.
    pub modified: u64,
    /// Identifier of the document inserted by an upsert, when one occurred.
    pub upserted_id: Option<Bson>,
}

/// Result of an update operation with the upserted identifier converted to
/// the repository's identifier type.
///
/// An update that matched nothing (without upsert) is not an error; all
/// counts are simply zero and `upserted_id` is `None`.
#[derive(Debug, Clone)]
pub struct UpdateResult<I> {
    /// Number of documents the filter matched.
    pub matched: u64,
    /// Number of documents actually modified.
    pub modified: u64,
    /// Number of documents inserted by an upsert (0 or 1).
    pub upserted: u64,
    /// Identifier of the upserted document, present only when an upsert
    /// occurred.
    pub upserted_id: Option<I>,
}

impl<I: Identifier> UpdateResult<I> {
    /// Converts a raw backend result, typing the upserted identifier.
    ///
    /// # Errors
    ///
    /// Returns an identifier-mismatch error if the store-assigned upsert
    /// identifier cannot be represented as `I`.
    pub fn from_raw(raw: RawUpdateResult) -> StoreResult<Self> {
        let upserted_id = raw.upserted_id.map(I::from_raw).transpose()?;

        Ok(Self {
            matched: raw.matched,
            modified: raw.modified,
            upserted: upserted_id.is_some() as u64,
            upserted_id,
        })
    }
}

/// Result of a delete operation.
#[derive(Debug, Clone, Default)]
pub struct DeleteResult {
    /// Number of documents removed.
    pub deleted: u64,
}
