//! Schema nodes: the loose document form and the lifted typed form.
//!
//! Input schemas arrive as OpenAPI 3.0 schema objects (a superset of JSON
//! Schema Draft 4) in which everything is optional. [`RawSchema`] is that
//! loose form, straight off serde. [`Schema`] is the lifted form the
//! engine consumes: the compositors, the type tag, and the three-state
//! `additionalProperties` become explicit variants, and impossible
//! combinations (several non-null type tags on one node) are rejected at
//! load time.
//!
//! Lifting assumes references have already been resolved by the schema
//! reader; a `$ref` surviving to this point is ignored like any other
//! unknown field.

use std::collections::{BTreeMap, BTreeSet};

use serde::Deserialize;
use serde_json::Value;

use crate::error::Error;

/// The loose, everything-optional schema object as it appears in an
/// OpenAPI document.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawSchema {
    #[serde(rename = "type")]
    pub types: Option<RawTypes>,
    pub nullable: bool,
    #[serde(rename = "enum")]
    pub enum_values: Option<Vec<Value>>,
    pub format: Option<String>,

    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
    pub exclusive_minimum: bool,
    pub exclusive_maximum: bool,
    pub multiple_of: Option<f64>,

    pub min_length: u64,
    pub max_length: Option<u64>,
    pub pattern: Option<String>,

    pub items: Option<Box<RawSchema>>,
    pub min_items: u64,
    pub max_items: Option<u64>,
    pub unique_items: bool,

    pub properties: BTreeMap<String, RawSchema>,
    pub required: Vec<String>,
    pub additional_properties: Option<RawAdditional>,

    pub all_of: Vec<RawSchema>,
    pub any_of: Vec<RawSchema>,
    pub one_of: Vec<RawSchema>,
}

/// `type` is a single tag in OpenAPI 3.0, but JSON Schema allows a list;
/// both are accepted on input.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawTypes {
    One(String),
    Many(Vec<String>),
}

/// `additionalProperties` is either a boolean or a schema.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawAdditional {
    Allowed(bool),
    Constrained(Box<RawSchema>),
}

/// A lifted schema node.
#[derive(Debug, Clone)]
pub struct Schema {
    pub kind: SchemaKind,
    pub nullable: bool,
    /// Allowed literal values; non-empty overrides constraint-driven
    /// generation for every non-compositor node.
    pub enum_values: Vec<Value>,
}

/// What a node describes, with the compositors lifted to explicit
/// variants. Compositors take precedence over a `type` tag, matching the
/// dispatch order of the generator.
#[derive(Debug, Clone)]
pub enum SchemaKind {
    /// No type, no compositor: any JSON value fits.
    Any,
    Null,
    Boolean,
    Integer(NumericSchema),
    Number(NumericSchema),
    String(StringSchema),
    Array(ArraySchema),
    Object(ObjectSchema),
    AllOf(Vec<Schema>),
    AnyOf(Vec<Schema>),
    OneOf(Vec<Schema>),
}

#[derive(Debug, Clone, Default)]
pub struct NumericSchema {
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
    /// Legacy boolean semantics: the flag tightens the corresponding
    /// bound rather than carrying a bound of its own.
    pub exclusive_minimum: bool,
    pub exclusive_maximum: bool,
    pub multiple_of: Option<f64>,
    pub format: Option<NumericFormat>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericFormat {
    Int32,
    Int64,
    Float,
    Double,
}

#[derive(Debug, Clone, Default)]
pub struct StringSchema {
    pub min_length: usize,
    pub max_length: Option<usize>,
    pub pattern: Option<String>,
    pub format: Option<StringFormat>,
}

/// The named string formats the generator knows how to produce.
/// Unrecognized format names are dropped during lifting and the node
/// falls back to pattern or plain-string generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringFormat {
    Uuid,
    DateTime,
    Date,
    Email,
    Hostname,
    Ipv4,
    Ipv6,
    Uri,
    UriReference,
    Byte,
    Binary,
}

impl StringFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            StringFormat::Uuid => "uuid",
            StringFormat::DateTime => "date-time",
            StringFormat::Date => "date",
            StringFormat::Email => "email",
            StringFormat::Hostname => "hostname",
            StringFormat::Ipv4 => "ipv4",
            StringFormat::Ipv6 => "ipv6",
            StringFormat::Uri => "uri",
            StringFormat::UriReference => "uri-reference",
            StringFormat::Byte => "byte",
            StringFormat::Binary => "binary",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ArraySchema {
    /// Absent means items may be anything.
    pub items: Option<Box<Schema>>,
    pub min_items: usize,
    pub max_items: Option<usize>,
    pub unique_items: bool,
}

#[derive(Debug, Clone, Default)]
pub struct ObjectSchema {
    pub properties: BTreeMap<String, Schema>,
    pub required: BTreeSet<String>,
    pub additional: Additional,
}

/// The three-state `additionalProperties`.
#[derive(Debug, Clone, Default)]
pub enum Additional {
    /// `additionalProperties: false`
    Forbidden,
    /// Absent or `additionalProperties: true`
    #[default]
    Any,
    /// `additionalProperties: { ... }`
    Constrained(Box<Schema>),
}

impl Schema {
    /// Lift a schema node out of a JSON document.
    ///
    /// ```
    /// use oas_fuzz::{Schema, SchemaKind};
    ///
    /// let schema = Schema::from_value(&serde_json::json!({
    ///     "type": "string",
    ///     "minLength": 1,
    /// })).unwrap();
    /// assert!(matches!(schema.kind, SchemaKind::String(_)));
    /// ```
    pub fn from_value(value: &Value) -> Result<Self, Error> {
        let raw: RawSchema = serde_json::from_value(value.clone())?;
        Self::from_raw(&raw)
    }

    /// Lift an already-deserialized loose schema.
    pub fn from_raw(raw: &RawSchema) -> Result<Self, Error> {
        let mut nullable = raw.nullable;
        let enum_values = raw.enum_values.clone().unwrap_or_default();

        let kind = if !raw.all_of.is_empty() {
            SchemaKind::AllOf(lift_all(&raw.all_of)?)
        } else if !raw.any_of.is_empty() {
            SchemaKind::AnyOf(lift_all(&raw.any_of)?)
        } else if !raw.one_of.is_empty() {
            SchemaKind::OneOf(lift_all(&raw.one_of)?)
        } else {
            let mut tags: Vec<&str> = match &raw.types {
                None => Vec::new(),
                Some(RawTypes::One(tag)) => vec![tag.as_str()],
                Some(RawTypes::Many(tags)) => tags.iter().map(String::as_str).collect(),
            };
            let had_null = tags.iter().any(|t| *t == "null");
            if had_null {
                nullable = true;
                tags.retain(|t| *t != "null");
            }

            match tags.as_slice() {
                [] if had_null => SchemaKind::Null,
                [] => SchemaKind::Any,
                [tag] => lift_typed(*tag, raw)?,
                many => {
                    return Err(Error::MultipleTypes(
                        many.iter().map(|t| t.to_string()).collect(),
                    ))
                }
            }
        };

        Ok(Schema {
            kind,
            nullable,
            enum_values,
        })
    }
}

fn lift_all(raws: &[RawSchema]) -> Result<Vec<Schema>, Error> {
    raws.iter().map(Schema::from_raw).collect()
}

fn lift_typed(tag: &str, raw: &RawSchema) -> Result<SchemaKind, Error> {
    Ok(match tag {
        "boolean" => SchemaKind::Boolean,
        "integer" => SchemaKind::Integer(lift_numeric(raw)),
        "number" => SchemaKind::Number(lift_numeric(raw)),
        "string" => SchemaKind::String(StringSchema {
            min_length: raw.min_length as usize,
            max_length: raw.max_length.map(|n| n as usize),
            pattern: raw.pattern.clone(),
            format: raw.format.as_deref().and_then(string_format),
        }),
        "array" => SchemaKind::Array(ArraySchema {
            items: match &raw.items {
                Some(items) => Some(Box::new(Schema::from_raw(items)?)),
                None => None,
            },
            min_items: raw.min_items as usize,
            max_items: raw.max_items.map(|n| n as usize),
            unique_items: raw.unique_items,
        }),
        "object" => SchemaKind::Object(ObjectSchema {
            properties: raw
                .properties
                .iter()
                .map(|(name, prop)| Ok((name.clone(), Schema::from_raw(prop)?)))
                .collect::<Result<_, Error>>()?,
            required: raw.required.iter().cloned().collect(),
            additional: match &raw.additional_properties {
                None | Some(RawAdditional::Allowed(true)) => Additional::Any,
                Some(RawAdditional::Allowed(false)) => Additional::Forbidden,
                Some(RawAdditional::Constrained(schema)) => {
                    Additional::Constrained(Box::new(Schema::from_raw(schema)?))
                }
            },
        }),
        // Unknown tags get the untyped treatment.
        _ => SchemaKind::Any,
    })
}

fn lift_numeric(raw: &RawSchema) -> NumericSchema {
    NumericSchema {
        minimum: raw.minimum,
        maximum: raw.maximum,
        exclusive_minimum: raw.exclusive_minimum,
        exclusive_maximum: raw.exclusive_maximum,
        multiple_of: raw.multiple_of,
        format: raw.format.as_deref().and_then(numeric_format),
    }
}

fn string_format(name: &str) -> Option<StringFormat> {
    Some(match name {
        "uuid" => StringFormat::Uuid,
        "date-time" => StringFormat::DateTime,
        "date" => StringFormat::Date,
        "email" => StringFormat::Email,
        "hostname" => StringFormat::Hostname,
        "ipv4" => StringFormat::Ipv4,
        "ipv6" => StringFormat::Ipv6,
        "uri" => StringFormat::Uri,
        "uri-reference" => StringFormat::UriReference,
        "byte" => StringFormat::Byte,
        "binary" => StringFormat::Binary,
        _ => return None,
    })
}

fn numeric_format(name: &str) -> Option<NumericFormat> {
    Some(match name {
        "int32" => NumericFormat::Int32,
        "int64" => NumericFormat::Int64,
        "float" => NumericFormat::Float,
        "double" => NumericFormat::Double,
        _ => return None,
    })
}

pub(crate) fn kind_name(kind: &SchemaKind) -> &'static str {
    match kind {
        SchemaKind::Any => "untyped",
        SchemaKind::Null => "null",
        SchemaKind::Boolean => "boolean",
        SchemaKind::Integer(_) => "integer",
        SchemaKind::Number(_) => "number",
        SchemaKind::String(_) => "string",
        SchemaKind::Array(_) => "array",
        SchemaKind::Object(_) => "object",
        SchemaKind::AllOf(_) => "allOf",
        SchemaKind::AnyOf(_) => "anyOf",
        SchemaKind::OneOf(_) => "oneOf",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn lifts_single_type() {
        let schema = Schema::from_value(&json!({ "type": "integer", "minimum": 3 })).unwrap();
        match schema.kind {
            SchemaKind::Integer(numeric) => assert_eq!(numeric.minimum, Some(3.0)),
            other => panic!("expected integer, got {}", kind_name(&other)),
        }
        assert!(!schema.nullable);
    }

    #[test]
    fn null_in_type_list_becomes_nullable() {
        let schema = Schema::from_value(&json!({ "type": ["string", "null"] })).unwrap();
        assert!(schema.nullable);
        assert!(matches!(schema.kind, SchemaKind::String(_)));

        let schema = Schema::from_value(&json!({ "type": "null" })).unwrap();
        assert!(matches!(schema.kind, SchemaKind::Null));
    }

    #[test]
    fn multiple_types_are_rejected() {
        let err = Schema::from_value(&json!({ "type": ["string", "integer"] })).unwrap_err();
        assert!(matches!(err, Error::MultipleTypes(_)));
    }

    #[test]
    fn missing_type_and_compositors_is_any() {
        let schema = Schema::from_value(&json!({})).unwrap();
        assert!(matches!(schema.kind, SchemaKind::Any));
    }

    #[test]
    fn compositors_take_precedence_over_type() {
        let schema = Schema::from_value(&json!({
            "type": "object",
            "allOf": [{ "type": "object" }],
        }))
        .unwrap();
        assert!(matches!(schema.kind, SchemaKind::AllOf(_)));
    }

    #[test]
    fn additional_properties_three_states() {
        let forbid = Schema::from_value(&json!({ "type": "object", "additionalProperties": false }))
            .unwrap();
        let allow = Schema::from_value(&json!({ "type": "object" })).unwrap();
        let shaped = Schema::from_value(&json!({
            "type": "object",
            "additionalProperties": { "type": "integer" },
        }))
        .unwrap();

        let additional = |schema: &Schema| match &schema.kind {
            SchemaKind::Object(object) => object.additional.clone(),
            _ => panic!("expected object"),
        };
        assert!(matches!(additional(&forbid), Additional::Forbidden));
        assert!(matches!(additional(&allow), Additional::Any));
        assert!(matches!(additional(&shaped), Additional::Constrained(_)));
    }

    #[test]
    fn unknown_formats_are_dropped() {
        let schema =
            Schema::from_value(&json!({ "type": "string", "format": "social-handle" })).unwrap();
        match schema.kind {
            SchemaKind::String(string) => assert_eq!(string.format, None),
            _ => panic!("expected string"),
        }
    }

    #[test]
    fn enum_values_survive_lifting() {
        let schema = Schema::from_value(&json!({ "enum": [1, "two", null] })).unwrap();
        assert_eq!(schema.enum_values.len(), 3);
        assert!(matches!(schema.kind, SchemaKind::Any));
    }
}
