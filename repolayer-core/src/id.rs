//! Typed identifier extraction.
//!
//! Document stores hand back identifiers as untyped BSON values. The
//! [`Identifier`] trait maps such a value into the identifier type a
//! repository was declared with, failing explicitly on a type mismatch
//! rather than coercing.

use bson::{Bson, de::deserialize_from_bson, oid::ObjectId};

use crate::error::{StoreError, StoreResult};

/// An identifier type a [`Repository`](crate::repository::Repository) can be
/// parameterized with.
///
/// `from_raw` performs a type-checked conversion from the store's raw
/// representation; on failure it returns
/// [`StoreError::IdentifierMismatch`] carrying the expected Rust type and
/// the actual BSON element type. `to_raw` converts back for operations that
/// address a document by its typed identifier.
pub trait Identifier: Sized + Send + Sync + 'static {
    /// Converts a store-returned raw identifier into this type.
    fn from_raw(raw: Bson) -> StoreResult<Self>;

    /// Converts this identifier into the store's raw representation.
    fn to_raw(&self) -> Bson;
}

fn mismatch<I>(raw: &Bson) -> StoreError {
    StoreError::IdentifierMismatch {
        expected: std::any::type_name::<I>(),
        actual: format!("{:?}", raw.element_type()),
    }
}

impl Identifier for ObjectId {
    fn from_raw(raw: Bson) -> StoreResult<Self> {
        match raw {
            Bson::ObjectId(oid) => Ok(oid),
            other => Err(mismatch::<Self>(&other)),
        }
    }

    fn to_raw(&self) -> Bson {
        Bson::ObjectId(*self)
    }
}

impl Identifier for bson::Uuid {
    fn from_raw(raw: Bson) -> StoreResult<Self> {
        // The UUID-subtype check lives in bson's own deserializer.
        let fallback = mismatch::<Self>(&raw);
        deserialize_from_bson(raw).map_err(|_| fallback)
    }

    fn to_raw(&self) -> Bson {
        Bson::from(*self)
    }
}

impl Identifier for uuid::Uuid {
    fn from_raw(raw: Bson) -> StoreResult<Self> {
        bson::Uuid::from_raw(raw).map(bson::Uuid::into)
    }

    fn to_raw(&self) -> Bson {
        Bson::from(bson::Uuid::from(*self))
    }
}

impl Identifier for String {
    fn from_raw(raw: Bson) -> StoreResult<Self> {
        match raw {
            Bson::String(value) => Ok(value),
            other => Err(mismatch::<Self>(&other)),
        }
    }

    fn to_raw(&self) -> Bson {
        Bson::String(self.clone())
    }
}

impl Identifier for i32 {
    fn from_raw(raw: Bson) -> StoreResult<Self> {
        match raw {
            Bson::Int32(value) => Ok(value),
            other => Err(mismatch::<Self>(&other)),
        }
    }

    fn to_raw(&self) -> Bson {
        Bson::Int32(*self)
    }
}

impl Identifier for i64 {
    fn from_raw(raw: Bson) -> StoreResult<Self> {
        match raw {
            Bson::Int64(value) => Ok(value),
            other => Err(mismatch::<Self>(&other)),
        }
    }

    fn to_raw(&self) -> Bson {
        Bson::Int64(*self)
    }
}

impl Identifier for Bson {
    fn from_raw(raw: Bson) -> StoreResult<Self> {
        Ok(raw)
    }

    fn to_raw(&self) -> Bson {
        self.clone()
    }
}
