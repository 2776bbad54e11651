//! Update-document application for the in-memory store.
//!
//! Update specifications are opaque BSON documents in the MongoDB dialect.
//! The in-memory collaborator applies the `$set` and `$unset` operators;
//! anything else is reported as unsupported. `_id` is immutable.

use bson::{Bson, Document};

use repolayer_core::error::{StoreError, StoreResult};

/// Applies an update specification to a document in place.
///
/// Returns whether the document actually changed, which feeds the
/// modified-count of the update result.
pub(crate) fn apply_update(document: &mut Document, update: &Document) -> StoreResult<bool> {
    let mut modified = false;

    for (op, operand) in update {
        let fields = operand.as_document().ok_or_else(|| {
            StoreError::Write(format!("{op} requires a document operand"))
        })?;

        match op.as_str() {
            "$set" => {
                for (field, value) in fields {
                    if field == "_id" {
                        return Err(StoreError::Write("the _id field is immutable".into()));
                    }

                    if document.get(field) != Some(value) {
                        document.insert(field.clone(), value.clone());
                        modified = true;
                    }
                }
            }
            "$unset" => {
                for (field, _) in fields {
                    if document.remove(field).is_some() {
                        modified = true;
                    }
                }
            }
            other => {
                return Err(StoreError::Write(format!(
                    "unsupported update operator: {other}"
                )));
            }
        }
    }

    Ok(modified)
}

/// Builds the document an upsert inserts when the filter matched nothing.
///
/// Seeded from the filter's implicit-equality fields (operator conditions
/// contribute nothing), then the update specification is applied on top.
pub(crate) fn upsert_document(filter: &Document, update: &Document) -> StoreResult<Document> {
    let mut document = Document::new();

    for (field, condition) in filter {
        if field.starts_with('$') {
            continue;
        }

        if let Bson::Document(ops) = condition {
            if ops.keys().any(|k| k.starts_with('$')) {
                continue;
            }
        }

        document.insert(field.clone(), condition.clone());
    }

    apply_update(&mut document, update)?;

    Ok(document)
}
