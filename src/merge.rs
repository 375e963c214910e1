//! Structural merging of object schemas for `allOf`.
//!
//! The merge is object-only and shallow: required sets union, property
//! maps union with duplicates rejected (merging two sub-schemas for the
//! same property is out of scope), and `additionalProperties` combines
//! along the lattice forbidden < schema-constrained < allowed-any.

use crate::error::Error;
use crate::schema::{kind_name, Additional, ObjectSchema, Schema, SchemaKind};

/// Fold a list of `allOf` branches into one object schema.
///
/// Every branch must be typed `object`; anything else is a configuration
/// error.
pub(crate) fn merge_all_of(branches: &[Schema]) -> Result<ObjectSchema, Error> {
    let mut merged = ObjectSchema::default();
    for branch in branches {
        let object = match &branch.kind {
            SchemaKind::Object(object) => object,
            other => {
                return Err(Error::AllOfBranchNotObject {
                    found: kind_name(other),
                })
            }
        };
        merged = merge_objects(merged, object)?;
    }
    Ok(merged)
}

pub(crate) fn merge_objects(mut base: ObjectSchema, sub: &ObjectSchema) -> Result<ObjectSchema, Error> {
    for name in &sub.required {
        base.required.insert(name.clone());
    }

    for (name, property) in &sub.properties {
        if base.properties.contains_key(name) {
            return Err(Error::DuplicateProperty(name.clone()));
        }
        base.properties.insert(name.clone(), property.clone());
    }

    base.additional = merge_additional(base.additional, sub.additional.clone())?;
    Ok(base)
}

fn merge_additional(base: Additional, sub: Additional) -> Result<Additional, Error> {
    use Additional::{Any, Constrained, Forbidden};

    Ok(match (base, sub) {
        (Forbidden, _) | (_, Forbidden) => Forbidden,
        (Any, Any) => Any,
        (Any, Constrained(schema)) | (Constrained(schema), Any) => Constrained(schema),
        (Constrained(base), Constrained(sub)) => {
            let (base_object, sub_object) = match (&base.kind, &sub.kind) {
                (SchemaKind::Object(base_object), SchemaKind::Object(sub_object)) => {
                    (base_object.clone(), sub_object)
                }
                _ => return Err(Error::AdditionalMergeNotObject),
            };
            let merged = merge_objects(base_object, sub_object)?;
            Constrained(Box::new(Schema {
                kind: SchemaKind::Object(merged),
                nullable: false,
                enum_values: Vec::new(),
            }))
        }
    })
}
