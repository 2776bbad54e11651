//! Error types and result types for repository operations.
//!
//! Failures are reported on two levels: a [`StoreError`] describes *why*
//! something failed, and a [`RepositoryError`] wraps it with *which*
//! repository operation it occurred in. Callers can match the two
//! independently.

use bson::error::Error as BsonError;
use thiserror::Error;

/// Represents the underlying cause of a failed store interaction.
///
/// This enum covers serialization errors, missing documents, identifier
/// conversion failures, and backend-specific errors. It is always surfaced
/// wrapped inside a [`RepositoryError`] naming the operation it occurred in.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Serialization/deserialization error when converting between a model
    /// and its stored document representation.
    #[error("serialization error: {0}")]
    Serialization(String),
    /// No document matched the given filter.
    #[error("document not found")]
    NotFound,
    /// A store-returned identifier could not be converted into the
    /// caller-declared identifier type. Carries the expected Rust type and
    /// the actual BSON element type.
    #[error("identifier type mismatch: expected {expected}, actual {actual}")]
    IdentifierMismatch {
        expected: &'static str,
        actual: String,
    },
    /// A write operation (insert, update, delete) was rejected by the store.
    #[error("write error: {0}")]
    Write(String),
    /// A server-side cursor failed while being advanced.
    #[error("cursor error: {0}")]
    Cursor(String),
    /// An error occurred in the underlying storage backend outside the
    /// write path (connection, query execution).
    #[error("backend error: {0}")]
    Backend(String),
}

/// A specialized `Result` type for backend operations.
pub type StoreResult<T> = Result<T, StoreError>;

impl From<BsonError> for StoreError {
    fn from(err: BsonError) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

/// The repository operation a failure occurred in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    FindOne,
    Find,
    FindStream,
    InsertOne,
    InsertMany,
    UpdateOne,
    UpdateMany,
    UpdateById,
    DeleteOne,
    DeleteMany,
}

/// An error raised by a repository operation.
///
/// Every concrete failure is wrapped under the marker of the public
/// operation it occurred in, preserving the [`StoreError`] cause. This lets
/// callers distinguish "which call failed" from "why it failed":
///
/// ```ignore
/// match repo.find_one(filter, None).await {
///     Err(err) if err.is_not_found() => { /* no match */ }
///     Err(err) => return Err(err.into()),
///     Ok(model) => { /* ... */ }
/// }
/// ```
#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("failed to find document")]
    FindOne(#[source] StoreError),
    #[error("failed to find documents")]
    Find(#[source] StoreError),
    #[error("failed to stream documents")]
    FindStream(#[source] StoreError),
    #[error("failed to insert document")]
    InsertOne(#[source] StoreError),
    #[error("failed to insert documents")]
    InsertMany(#[source] StoreError),
    #[error("failed to update document")]
    UpdateOne(#[source] StoreError),
    #[error("failed to update documents")]
    UpdateMany(#[source] StoreError),
    #[error("failed to update document by id")]
    UpdateById(#[source] StoreError),
    #[error("failed to delete document")]
    DeleteOne(#[source] StoreError),
    #[error("failed to delete documents")]
    DeleteMany(#[source] StoreError),
}

/// A specialized `Result` type for repository operations.
pub type RepositoryResult<T> = Result<T, RepositoryError>;

impl RepositoryError {
    /// Returns the operation this error occurred in.
    pub fn operation(&self) -> Operation {
        match self {
            RepositoryError::FindOne(_) => Operation::FindOne,
            RepositoryError::Find(_) => Operation::Find,
            RepositoryError::FindStream(_) => Operation::FindStream,
            RepositoryError::InsertOne(_) => Operation::InsertOne,
            RepositoryError::InsertMany(_) => Operation::InsertMany,
            RepositoryError::UpdateOne(_) => Operation::UpdateOne,
            RepositoryError::UpdateMany(_) => Operation::UpdateMany,
            RepositoryError::UpdateById(_) => Operation::UpdateById,
            RepositoryError::DeleteOne(_) => Operation::DeleteOne,
            RepositoryError::DeleteMany(_) => Operation::DeleteMany,
        }
    }

    /// Returns the underlying cause of this error.
    pub fn cause(&self) -> &StoreError {
        match self {
            RepositoryError::FindOne(cause)
            | RepositoryError::Find(cause)
            | RepositoryError::FindStream(cause)
            | RepositoryError::InsertOne(cause)
            | RepositoryError::InsertMany(cause)
            | RepositoryError::UpdateOne(cause)
            | RepositoryError::UpdateMany(cause)
            | RepositoryError::UpdateById(cause)
            | RepositoryError::DeleteOne(cause)
            | RepositoryError::DeleteMany(cause) => cause,
        }
    }

    /// Returns `true` if the underlying cause is [`StoreError::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self.cause(), StoreError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operation_marker_matches_variant() {
        let err = RepositoryError::InsertMany(StoreError::Write("boom".into()));
        assert_eq!(err.operation(), Operation::InsertMany);
        assert!(matches!(err.cause(), StoreError::Write(msg) if msg == "boom"));
    }

    #[test]
    fn not_found_is_detected_through_any_marker() {
        assert!(RepositoryError::FindOne(StoreError::NotFound).is_not_found());
        assert!(!RepositoryError::FindOne(StoreError::Serialization("bad".into())).is_not_found());
    }

    #[test]
    fn bson_errors_convert_to_serialization() {
        let bson_err = bson::de::deserialize_from_bson::<i32>(bson::Bson::String("x".into()))
            .expect_err("string should not deserialize as i32");
        let err = StoreError::from(bson_err);
        assert!(matches!(err, StoreError::Serialization(_)));
    }
}
