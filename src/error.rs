//! Error types for schema compilation and drawing.

use thiserror::Error;

/// Everything that can go wrong while lifting a schema, compiling a
/// generator from it, or drawing a value.
///
/// With the single exception of [`Error::UniqueItemsExhausted`], every
/// variant is a configuration error raised before the first draw: the
/// schema asks for something the generator cannot satisfy, and retrying
/// with a different random source would not help.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// A schema node carries more than one non-null type tag.
    #[error("schema declares multiple non-null types {0:?}; exactly one is supported")]
    MultipleTypes(Vec<String>),

    /// An `allOf` branch is not an object schema.
    #[error("allOf branch must be an object schema, found {found}")]
    AllOfBranchNotObject { found: &'static str },

    /// Two object schemas being merged declare the same property.
    #[error("duplicate property `{0}` while merging object schemas")]
    DuplicateProperty(String),

    /// Both merge sides constrain `additionalProperties` with non-object
    /// schemas, which cannot be merged structurally.
    #[error("additionalProperties sub-schemas must be object schemas to merge")]
    AdditionalMergeNotObject,

    /// `minimum` exceeds `maximum` (after exclusive-bound adjustment), or
    /// `minItems` exceeds `maxItems`.
    #[error("range is empty: lower bound {lo} exceeds upper bound {hi}")]
    EmptyRange { lo: f64, hi: f64 },

    /// `multipleOf` is zero, negative, or unusable for the node's type.
    #[error("multipleOf {multiple_of} is not usable for this schema")]
    InvalidMultipleOf { multiple_of: f64 },

    /// No multiple of `multipleOf` lies inside the effective range.
    #[error("no multiple of {multiple_of} lies within [{lo}, {hi}]")]
    UnsatisfiableMultipleOf { multiple_of: f64, lo: f64, hi: f64 },

    /// A `uniqueItems` array kept redrawing duplicates until the retry
    /// budget ran out.
    #[error("uniqueItems: gave up after {attempts} redraws with {have} of {want} distinct items")]
    UniqueItemsExhausted { attempts: usize, have: usize, want: usize },

    /// The schema needs pattern-driven string generation but no pattern
    /// function is installed in the options.
    #[error("schema requires a pattern function for {0}, but none is installed")]
    MissingPatternFn(String),

    /// The installed pattern backend rejected a pattern.
    #[error("pattern `{pattern}` rejected by the pattern backend: {message}")]
    Pattern { pattern: String, message: String },

    /// The schema reader failed to produce a document.
    #[error("failed to read schema document: {0}")]
    SchemaRead(String),

    /// JSON (de)serialization failure.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
