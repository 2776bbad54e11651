//! Filter evaluation for in-memory document matching.
//!
//! Filters are opaque BSON documents in the MongoDB dialect. This module
//! implements the subset an in-memory collaborator needs: implicit
//! equality, the comparison operators `$eq $ne $gt $gte $lt $lte`, set
//! membership `$in`/`$nin`, `$exists`, and the logical connectives
//! `$and`/`$or`. Anything else is reported as unsupported rather than
//! silently matched.

use std::{cmp::Ordering, collections::HashMap};

use bson::{Bson, Document, datetime::DateTime, oid::ObjectId};

use repolayer_core::error::{StoreError, StoreResult};

/// Type-erased, comparable representation of BSON values.
///
/// This enum wraps BSON values and provides comparison operations for
/// filtering and sorting. It normalizes numeric types to f64 for easy
/// comparison.
#[derive(Debug)]
pub(crate) enum Comparable<'a> {
    /// Null value (also stands in for a missing field)
    Null,
    /// Boolean value
    Bool(bool),
    /// Numeric value (all integers and floats normalized to f64)
    Number(f64),
    /// DateTime value
    DateTime(DateTime),
    /// String value
    String(&'a str),
    /// Object identifier
    ObjectId(ObjectId),
    /// Binary payload (UUIDs included), compared by bytes
    Binary(&'a [u8]),
    /// Array of comparable values
    Array(Vec<Comparable<'a>>),
    /// Map/Object of comparable values
    Map(HashMap<&'a str, Comparable<'a>>),
}

impl<'a> From<&'a Bson> for Comparable<'a> {
    fn from(bson: &'a Bson) -> Self {
        match bson {
            Bson::Null => Comparable::Null,
            Bson::Boolean(value) => Comparable::Bool(*value),
            Bson::Int32(value) => Comparable::Number(*value as f64),
            Bson::Int64(value) => Comparable::Number(*value as f64),
            Bson::Double(value) => Comparable::Number(*value),
            Bson::DateTime(value) => Comparable::DateTime(*value),
            Bson::String(value) => Comparable::String(value),
            Bson::ObjectId(value) => Comparable::ObjectId(*value),
            Bson::Binary(value) => Comparable::Binary(&value.bytes),
            Bson::Array(arr) => Comparable::Array(
                arr.iter()
                    .map(Comparable::from)
                    .collect::<Vec<_>>(),
            ),
            Bson::Document(doc) => Comparable::Map(
                doc.iter()
                    .map(|(k, v)| (k.as_str(), Comparable::from(v)))
                    .collect::<HashMap<_, _>>(),
            ),
            _ => Comparable::Null, // Other types are not comparable
        }
    }
}

impl<'a> PartialEq for Comparable<'a> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Comparable::Null, Comparable::Null) => true,
            (Comparable::Bool(a), Comparable::Bool(b)) => a == b,
            (Comparable::Number(a), Comparable::Number(b)) => a == b,
            (Comparable::DateTime(a), Comparable::DateTime(b)) => a == b,
            (Comparable::String(a), Comparable::String(b)) => a == b,
            (Comparable::ObjectId(a), Comparable::ObjectId(b)) => a == b,
            (Comparable::Binary(a), Comparable::Binary(b)) => a == b,
            (Comparable::Array(a), Comparable::Array(b)) => a == b,
            (Comparable::Map(a), Comparable::Map(b)) => a == b,
            _ => false,
        }
    }
}

impl<'a> PartialOrd for Comparable<'a> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Comparable::Bool(a), Comparable::Bool(b)) => a.partial_cmp(b),
            (Comparable::Number(a), Comparable::Number(b)) => a.partial_cmp(b),
            (Comparable::DateTime(a), Comparable::DateTime(b)) => a.partial_cmp(b),
            (Comparable::String(a), Comparable::String(b)) => a.partial_cmp(b),
            (Comparable::ObjectId(a), Comparable::ObjectId(b)) => a.partial_cmp(b),
            (Comparable::Binary(a), Comparable::Binary(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

pub(crate) struct FilterEvaluator<'a> {
    document: &'a Document,
}

impl<'a> FilterEvaluator<'a> {
    pub fn new(document: &'a Document) -> Self {
        Self { document }
    }

    /// Evaluates the filter against the wrapped document.
    ///
    /// An empty filter matches everything. Errors are reserved for
    /// malformed filters and unsupported operators; a well-formed filter
    /// that simply does not match returns `Ok(false)`.
    pub fn matches(&self, filter: &Document) -> StoreResult<bool> {
        for (key, condition) in filter {
            let matched = match key.as_str() {
                "$and" => self.matches_all(key, condition)?,
                "$or" => self.matches_any(key, condition)?,
                other if other.starts_with('$') => {
                    return Err(unsupported_operator(other));
                }
                field => self.matches_field(field, condition)?,
            };

            if !matched {
                return Ok(false);
            }
        }

        Ok(true)
    }

    fn matches_all(&self, key: &str, condition: &Bson) -> StoreResult<bool> {
        for filter in sub_filters(key, condition)? {
            if !self.matches(filter)? {
                return Ok(false);
            }
        }

        Ok(true)
    }

    fn matches_any(&self, key: &str, condition: &Bson) -> StoreResult<bool> {
        for filter in sub_filters(key, condition)? {
            if self.matches(filter)? {
                return Ok(true);
            }
        }

        Ok(false)
    }

    fn matches_field(&self, field: &str, condition: &Bson) -> StoreResult<bool> {
        let value = self.document.get(field);

        match condition {
            Bson::Document(ops) if ops.keys().any(|k| k.starts_with('$')) => {
                for (op, operand) in ops {
                    if !self.matches_operator(field, value, op, operand)? {
                        return Ok(false);
                    }
                }

                Ok(true)
            }
            // Implicit equality; a missing field only equals an explicit null.
            expected => Ok(comparable(value) == Comparable::from(expected)),
        }
    }

    fn matches_operator(
        &self,
        field: &str,
        value: Option<&'a Bson>,
        op: &str,
        operand: &Bson,
    ) -> StoreResult<bool> {
        match op {
            "$eq" => Ok(comparable(value) == Comparable::from(operand)),
            "$ne" => Ok(comparable(value) != Comparable::from(operand)),
            "$gt" | "$gte" | "$lt" | "$lte" => {
                match comparable(value).partial_cmp(&Comparable::from(operand)) {
                    Some(ordering) => Ok(match op {
                        "$gt" => ordering == Ordering::Greater,
                        "$gte" => ordering != Ordering::Less,
                        "$lt" => ordering == Ordering::Less,
                        "$lte" => ordering != Ordering::Greater,
                        _ => unreachable!(),
                    }),
                    None => Ok(false),
                }
            }
            "$in" => Ok(operand_array(op, operand)?
                .iter()
                .any(|candidate| comparable(value) == Comparable::from(candidate))),
            "$nin" => Ok(!operand_array(op, operand)?
                .iter()
                .any(|candidate| comparable(value) == Comparable::from(candidate))),
            "$exists" => {
                let should_exist = operand.as_bool().ok_or_else(|| {
                    StoreError::Backend(format!(
                        "$exists on field {field} requires a boolean operand"
                    ))
                })?;

                Ok(value.is_some() == should_exist)
            }
            other => Err(unsupported_operator(other)),
        }
    }
}

fn comparable(value: Option<&Bson>) -> Comparable<'_> {
    value.map(Comparable::from).unwrap_or(Comparable::Null)
}

fn sub_filters<'b>(key: &str, condition: &'b Bson) -> StoreResult<Vec<&'b Document>> {
    condition
        .as_array()
        .ok_or_else(|| StoreError::Backend(format!("{key} requires an array of filters")))?
        .iter()
        .map(|entry| {
            entry
                .as_document()
                .ok_or_else(|| StoreError::Backend(format!("{key} entries must be documents")))
        })
        .collect()
}

fn operand_array<'b>(op: &str, operand: &'b Bson) -> StoreResult<&'b Vec<Bson>> {
    operand
        .as_array()
        .ok_or_else(|| StoreError::Backend(format!("{op} requires an array operand")))
}

fn unsupported_operator(op: &str) -> StoreError {
    StoreError::Backend(format!("unsupported filter operator: {op}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    fn matches(document: Document, filter: Document) -> bool {
        FilterEvaluator::new(&document)
            .matches(&filter)
            .unwrap()
    }

    #[test]
    fn empty_filter_matches_everything() {
        assert!(matches(doc! { "a": 1 }, doc! {}));
    }

    #[test]
    fn implicit_equality() {
        assert!(matches(doc! { "name": "alice" }, doc! { "name": "alice" }));
        assert!(!matches(doc! { "name": "alice" }, doc! { "name": "bob" }));
        assert!(!matches(doc! {}, doc! { "name": "alice" }));
    }

    #[test]
    fn equality_over_object_ids() {
        let id = ObjectId::new();
        assert!(matches(doc! { "_id": id }, doc! { "_id": id }));
        assert!(!matches(doc! { "_id": id }, doc! { "_id": ObjectId::new() }));
    }

    #[test]
    fn numeric_comparison_crosses_integer_widths() {
        assert!(matches(doc! { "n": 5_i64 }, doc! { "n": 5_i32 }));
        assert!(matches(doc! { "n": 5_i32 }, doc! { "n": { "$gt": 4.5 } }));
        assert!(!matches(doc! { "n": 5_i32 }, doc! { "n": { "$lt": 5_i64 } }));
        assert!(matches(doc! { "n": 5_i32 }, doc! { "n": { "$lte": 5_i64 } }));
    }

    #[test]
    fn in_and_nin() {
        assert!(matches(doc! { "n": 2 }, doc! { "n": { "$in": [1, 2, 3] } }));
        assert!(!matches(doc! { "n": 4 }, doc! { "n": { "$in": [1, 2, 3] } }));
        assert!(matches(doc! { "n": 4 }, doc! { "n": { "$nin": [1, 2, 3] } }));
    }

    #[test]
    fn exists() {
        assert!(matches(doc! { "a": 1 }, doc! { "a": { "$exists": true } }));
        assert!(matches(doc! { "a": 1 }, doc! { "b": { "$exists": false } }));
        assert!(!matches(doc! { "a": 1 }, doc! { "a": { "$exists": false } }));
    }

    #[test]
    fn logical_connectives() {
        let document = doc! { "a": 1, "b": "x" };
        assert!(matches(
            document.clone(),
            doc! { "$and": [ { "a": 1 }, { "b": "x" } ] },
        ));
        assert!(!matches(
            document.clone(),
            doc! { "$and": [ { "a": 1 }, { "b": "y" } ] },
        ));
        assert!(matches(
            document,
            doc! { "$or": [ { "a": 2 }, { "b": "x" } ] },
        ));
    }

    #[test]
    fn unsupported_operator_is_an_error_not_a_mismatch() {
        let document = doc! { "a": "abc" };
        let err = FilterEvaluator::new(&document)
            .matches(&doc! { "a": { "$regex": "^a" } })
            .unwrap_err();
        assert!(matches!(err, StoreError::Backend(_)));
    }
}
