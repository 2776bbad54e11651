//! Core traits and types for model representation and routing.
//!
//! This module provides the capability contract every stored model type must
//! satisfy, utilities for converting models between formats (BSON, JSON),
//! and the [`Namespace`] a repository routes its operations to.

use bson::{Bson, Document, de::deserialize_from_bson, ser::serialize_to_bson};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Value, from_value, to_value};

use crate::error::{StoreError, StoreResult};

/// Capability contract every repository model must implement.
///
/// The trait carries no logic. It names the logical database and collection
/// a model type lives in, and these two facts route every operation of a
/// [`Repository`](crate::repository::Repository) built for the type. Both
/// are resolved exactly once, when the repository is constructed.
///
/// # Deriving
///
/// The `repolayer` facade crate provides `#[derive(Model)]`:
///
/// ```ignore
/// use repolayer::prelude::*;
/// use bson::oid::ObjectId;
/// use serde::{Serialize, Deserialize};
///
/// #[derive(Debug, Clone, Serialize, Deserialize, Model)]
/// #[model(database = "app", collection = "users")]
/// pub struct User {
///     #[serde(rename = "_id")]
///     pub id: ObjectId,
///     pub username: String,
/// }
/// ```
///
/// # Manual implementation
///
/// ```ignore
/// impl Model for User {
///     fn database_name() -> &'static str {
///         "app"
///     }
///
///     fn collection_name() -> &'static str {
///         "users"
///     }
/// }
/// ```
pub trait Model: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Returns the name of the logical database this model belongs to.
    fn database_name() -> &'static str;

    /// Returns the name of the collection this model belongs to.
    ///
    /// This should be a static, lowercase identifier (e.g., "users").
    fn collection_name() -> &'static str;
}

/// Extension trait providing serialization/deserialization utilities for models.
///
/// This trait is automatically implemented for all types that implement
/// [`Model`]. It provides convenient methods to convert models to and from
/// BSON documents and JSON values.
pub trait ModelExt: Model {
    /// Converts this model to a BSON document for storage.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails or the model does not
    /// serialize to a document (e.g., a bare scalar).
    fn to_document(&self) -> StoreResult<Document>;

    /// Creates a model from a stored BSON document.
    ///
    /// # Errors
    ///
    /// Returns an error if deserialization fails or the structure is invalid.
    fn from_document(document: Document) -> StoreResult<Self>;

    /// Converts this model to a JSON value.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    fn to_json(&self) -> StoreResult<Value>;

    /// Creates a model from a JSON value.
    ///
    /// # Errors
    ///
    /// Returns an error if deserialization fails or the structure is invalid.
    fn from_json(value: Value) -> StoreResult<Self>;
}

impl<M: Model> ModelExt for M {
    fn to_document(&self) -> StoreResult<Document> {
        match serialize_to_bson(self)? {
            Bson::Document(document) => Ok(document),
            other => Err(StoreError::Serialization(format!(
                "model serialized to {:?}, expected a document",
                other.element_type()
            ))),
        }
    }

    fn from_document(document: Document) -> StoreResult<Self> {
        Ok(deserialize_from_bson(Bson::Document(document))?)
    }

    fn to_json(&self) -> StoreResult<Value> {
        to_value(self).map_err(|err| StoreError::Serialization(err.to_string()))
    }

    fn from_json(value: Value) -> StoreResult<Self> {
        from_value(value).map_err(|err| StoreError::Serialization(err.to_string()))
    }
}

/// The database/collection pair a repository is bound to.
///
/// Resolved once from a model's capability contract and immutable for the
/// lifetime of the repository instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Namespace {
    database: String,
    collection: String,
}

impl Namespace {
    /// Resolves the namespace of a model type.
    pub fn of<M: Model>() -> Self {
        Self {
            database: M::database_name().to_string(),
            collection: M::collection_name().to_string(),
        }
    }

    /// Creates a namespace from explicit names.
    pub fn new(database: impl Into<String>, collection: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            collection: collection.into(),
        }
    }

    /// Returns the database name.
    pub fn database(&self) -> &str {
        &self.database
    }

    /// Returns the collection name.
    pub fn collection(&self) -> &str {
        &self.collection
    }
}

impl std::fmt::Display for Namespace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.database, self.collection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Fixture {
        name: String,
        count: i64,
    }

    impl Model for Fixture {
        fn database_name() -> &'static str {
            "fixture_db"
        }

        fn collection_name() -> &'static str {
            "fixtures"
        }
    }

    #[test]
    fn document_round_trip_preserves_fields() {
        let fixture = Fixture {
            name: "alpha".into(),
            count: 7,
        };

        let doc = fixture.to_document().unwrap();
        assert_eq!(doc.get_str("name").unwrap(), "alpha");

        let restored = Fixture::from_document(doc).unwrap();
        assert_eq!(restored, fixture);
    }

    #[test]
    fn json_round_trip_preserves_fields() {
        let fixture = Fixture {
            name: "beta".into(),
            count: -1,
        };

        let restored = Fixture::from_json(fixture.to_json().unwrap()).unwrap();
        assert_eq!(restored, fixture);
    }

    #[test]
    fn namespace_resolves_from_contract() {
        let ns = Namespace::of::<Fixture>();
        assert_eq!(ns.database(), "fixture_db");
        assert_eq!(ns.collection(), "fixtures");
        assert_eq!(ns.to_string(), "fixture_db.fixtures");
    }

    #[test]
    fn malformed_document_fails_to_decode() {
        let doc = bson::doc! { "name": true, "count": "many" };
        let err = Fixture::from_document(doc).unwrap_err();
        assert!(matches!(err, StoreError::Serialization(_)));
    }
}
