//! The generation engine: compile a schema into a plan, draw values from it.
//!
//! [`Generator::new`] lowers a lifted [`Schema`] into a [`Plan`] tree,
//! surfacing every statically decidable configuration error before the
//! first draw: non-object `allOf` branches, duplicate merged properties,
//! empty ranges, unsatisfiable `multipleOf`, and pattern needs with no
//! installed pattern function. [`Generator::draw`] then walks the plan
//! against a [`RandomSource`]; the only error left at draw time is a
//! `uniqueItems` array running out of redraws.
//!
//! Values are carried as raw, already-serialized JSON so nested
//! generators splice object members and array items without reparsing.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use base64::{engine::general_purpose, Engine as _};
use chrono::{SecondsFormat, Utc};
use serde_json::value::{to_raw_value, RawValue};
use serde_json::Value;

use crate::error::Error;
use crate::merge::merge_all_of;
use crate::pattern::{
    PatternFn, PatternRequest, EMAIL_PATTERN, HOSTNAME_PATTERN, IPV4_PATTERN, IPV6_PATTERN,
    URI_PATTERN, URI_REFERENCE_PATTERN,
};
use crate::schema::{
    Additional, ArraySchema, NumericFormat, NumericSchema, ObjectSchema, Schema, SchemaKind,
    StringFormat, StringSchema,
};
use crate::source::RandomSource;
use crate::GenerationOptions;

/// One generated JSON document, already serialized.
pub type RawJson = Box<RawValue>;

// Default ceiling for sequence-ish draws: string lengths, array sizes,
// and ad-hoc object member counts when the schema gives no upper bound.
const MAX_SEQ_LENGTH: usize = 8;

// Ad-hoc object keys are long enough that colliding with a declared
// property takes deliberate effort from the schema author.
const EXTRA_KEY_MIN: usize = 20;
const EXTRA_KEY_MAX: usize = 30;
const KEY_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

// Consecutive duplicate redraws tolerated per uniqueItems array.
const UNIQUE_RETRY_LIMIT: usize = 100;

/// A compiled, reusable value generator for one schema.
///
/// Cheap to clone; drawing is a pure function of the random source.
#[derive(Clone)]
pub struct Generator {
    plan: Plan,
    options: GenerationOptions,
}

impl std::fmt::Debug for Generator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Generator").finish_non_exhaustive()
    }
}

impl Generator {
    /// Compile `schema` under `options`, raising configuration errors
    /// eagerly.
    pub fn new(schema: &Schema, options: &GenerationOptions) -> Result<Self, Error> {
        Ok(Generator {
            plan: compile(schema, options)?,
            options: options.clone(),
        })
    }

    /// Produce one JSON document.
    pub fn draw(&self, source: &mut dyn RandomSource) -> Result<RawJson, Error> {
        self.plan.draw(source, &self.options, 0)
    }
}

#[derive(Clone)]
enum Plan {
    Null,
    Enum(Vec<RawJson>),
    Boolean,
    Integer(IntegerPlan),
    Number(NumberPlan),
    String(StringPlan),
    Array(ArrayPlan),
    Object(ObjectPlan),
    AnyOf(Vec<Plan>),
    OneOf(Vec<Plan>),
    Nullable(Box<Plan>),
    Any,
}

#[derive(Clone)]
enum IntegerPlan {
    Uniform { lo: i64, hi: i64 },
    /// Draw a multiplier in `[lo, hi]` and emit `multiplier * multiple_of`.
    Multiple { multiple_of: i64, lo: i64, hi: i64 },
}

#[derive(Clone)]
enum NumberPlan {
    Uniform {
        lo: f64,
        hi: f64,
    },
    Multiple {
        multiple_of: f64,
        lo: i64,
        hi: i64,
        // Value bounds after clamping, for rounding corrections.
        min: f64,
        max: f64,
    },
}

#[derive(Clone)]
enum StringPlan {
    Uuid,
    DateTime,
    Date,
    Base64,
    Pattern {
        pattern: String,
        format: Option<StringFormat>,
        min_length: usize,
        max_length: Option<usize>,
        func: Arc<PatternFn>,
    },
    Plain {
        min: usize,
        max: usize,
    },
}

#[derive(Clone)]
struct ArrayPlan {
    item: Box<Plan>,
    min: usize,
    max: usize,
    unique: bool,
}

#[derive(Clone)]
struct ObjectPlan {
    required: Vec<(String, Plan)>,
    optional: Vec<(String, Plan)>,
    /// `None` means additional properties are forbidden.
    additional: Option<Box<Plan>>,
}

fn compile(schema: &Schema, options: &GenerationOptions) -> Result<Plan, Error> {
    // Compositors first; they are never nullable-wrapped and keep their
    // own semantics for enum and null.
    match &schema.kind {
        SchemaKind::AllOf(branches) => {
            let merged = merge_all_of(branches)?;
            return Ok(Plan::Object(compile_object(&merged, options)?));
        }
        SchemaKind::AnyOf(branches) => return Ok(Plan::AnyOf(compile_all(branches, options)?)),
        SchemaKind::OneOf(branches) => return Ok(Plan::OneOf(compile_all(branches, options)?)),
        _ => {}
    }

    // A non-empty enum overrides constraint-driven generation outright.
    if !schema.enum_values.is_empty() {
        let choices = schema
            .enum_values
            .iter()
            .map(|value| to_raw_value(value).map_err(Error::from))
            .collect::<Result<Vec<_>, _>>()?;
        return Ok(Plan::Enum(choices));
    }

    let plan = match &schema.kind {
        SchemaKind::Any => Plan::Any,
        SchemaKind::Null => return Ok(Plan::Null),
        SchemaKind::Boolean => Plan::Boolean,
        SchemaKind::Integer(numeric) => Plan::Integer(compile_integer(numeric)?),
        SchemaKind::Number(numeric) => Plan::Number(compile_number(numeric, options)?),
        SchemaKind::String(string) => Plan::String(compile_string(string, options)?),
        SchemaKind::Array(array) => Plan::Array(compile_array(array, options)?),
        SchemaKind::Object(object) => Plan::Object(compile_object(object, options)?),
        SchemaKind::AllOf(_) | SchemaKind::AnyOf(_) | SchemaKind::OneOf(_) => unreachable!(),
    };

    Ok(if schema.nullable {
        Plan::Nullable(Box::new(plan))
    } else {
        plan
    })
}

fn compile_all(branches: &[Schema], options: &GenerationOptions) -> Result<Vec<Plan>, Error> {
    branches.iter().map(|branch| compile(branch, options)).collect()
}

fn compile_integer(schema: &NumericSchema) -> Result<IntegerPlan, Error> {
    let mut lo = i64::MIN;
    let mut hi = i64::MAX;
    if let Some(minimum) = schema.minimum {
        lo = minimum as i64;
        if schema.exclusive_minimum {
            lo = lo.saturating_add(1);
        }
    }
    if let Some(maximum) = schema.maximum {
        hi = maximum as i64;
        if schema.exclusive_maximum {
            hi = hi.saturating_sub(1);
        }
    }
    if schema.format == Some(NumericFormat::Int32) {
        lo = lo.max(i32::MIN as i64);
        hi = hi.min(i32::MAX as i64);
    }
    if lo > hi {
        return Err(Error::EmptyRange {
            lo: lo as f64,
            hi: hi as f64,
        });
    }

    let Some(multiple_of) = schema.multiple_of else {
        return Ok(IntegerPlan::Uniform { lo, hi });
    };
    if multiple_of <= 0.0 || multiple_of.fract() != 0.0 || multiple_of >= i64::MAX as f64 {
        return Err(Error::InvalidMultipleOf { multiple_of });
    }
    let step = multiple_of as i64;
    let step_wide = step as i128;
    let multiplier_lo = div_ceil(lo as i128, step_wide);
    let multiplier_hi = div_floor(hi as i128, step_wide);
    if multiplier_lo > multiplier_hi {
        return Err(Error::UnsatisfiableMultipleOf {
            multiple_of,
            lo: lo as f64,
            hi: hi as f64,
        });
    }
    Ok(IntegerPlan::Multiple {
        multiple_of: step,
        lo: multiplier_lo as i64,
        hi: multiplier_hi as i64,
    })
}

fn compile_number(schema: &NumericSchema, options: &GenerationOptions) -> Result<NumberPlan, Error> {
    let mut lo = -f64::MAX;
    let mut hi = f64::MAX;
    if let Some(minimum) = schema.minimum {
        lo = if schema.exclusive_minimum {
            minimum.next_up()
        } else {
            minimum
        };
    }
    if let Some(maximum) = schema.maximum {
        hi = if schema.exclusive_maximum {
            maximum.next_down()
        } else {
            maximum
        };
    }
    if lo > hi {
        return Err(Error::EmptyRange { lo, hi });
    }

    let Some(multiple_of) = schema.multiple_of else {
        return Ok(NumberPlan::Uniform { lo, hi });
    };
    if multiple_of <= 0.0 || !multiple_of.is_finite() {
        return Err(Error::InvalidMultipleOf { multiple_of });
    }

    // Far from zero, float multiples lose the granularity to stay inside
    // tight bounds; the working window is clamped and configurable.
    let (clamp_lo, clamp_hi) = options.multiple_of_range;
    let min = lo.max(clamp_lo);
    let max = hi.min(clamp_hi);
    if min > max {
        return Err(Error::UnsatisfiableMultipleOf {
            multiple_of,
            lo,
            hi,
        });
    }
    let multiplier_lo = (min / multiple_of).ceil();
    let multiplier_hi = (max / multiple_of).floor();
    if multiplier_lo > multiplier_hi {
        return Err(Error::UnsatisfiableMultipleOf {
            multiple_of,
            lo: min,
            hi: max,
        });
    }
    Ok(NumberPlan::Multiple {
        multiple_of,
        lo: multiplier_lo as i64,
        hi: multiplier_hi as i64,
        min,
        max,
    })
}

fn compile_string(schema: &StringSchema, options: &GenerationOptions) -> Result<StringPlan, Error> {
    if let Some(format) = schema.format {
        match format {
            StringFormat::Uuid => return Ok(StringPlan::Uuid),
            StringFormat::DateTime => return Ok(StringPlan::DateTime),
            StringFormat::Date => return Ok(StringPlan::Date),
            StringFormat::Byte | StringFormat::Binary => return Ok(StringPlan::Base64),
            StringFormat::Email
            | StringFormat::Hostname
            | StringFormat::Ipv4
            | StringFormat::Ipv6
            | StringFormat::Uri
            | StringFormat::UriReference => {
                return pattern_plan(
                    format_pattern(format).to_owned(),
                    Some(format),
                    schema,
                    options,
                )
            }
        }
    }

    if let Some(pattern) = &schema.pattern {
        return pattern_plan(pattern.clone(), None, schema, options);
    }

    let min = schema.min_length;
    let max = schema.max_length.unwrap_or(min + MAX_SEQ_LENGTH);
    if min > max {
        return Err(Error::EmptyRange {
            lo: min as f64,
            hi: max as f64,
        });
    }
    Ok(StringPlan::Plain { min, max })
}

fn pattern_plan(
    pattern: String,
    format: Option<StringFormat>,
    schema: &StringSchema,
    options: &GenerationOptions,
) -> Result<StringPlan, Error> {
    let func = options.pattern_fn().cloned().ok_or_else(|| {
        Error::MissingPatternFn(match format {
            Some(format) => format!("format `{}`", format.as_str()),
            None => format!("pattern `{pattern}`"),
        })
    })?;
    Ok(StringPlan::Pattern {
        pattern,
        format,
        min_length: schema.min_length,
        max_length: schema.max_length,
        func,
    })
}

fn format_pattern(format: StringFormat) -> &'static str {
    match format {
        StringFormat::Email => EMAIL_PATTERN,
        StringFormat::Hostname => HOSTNAME_PATTERN,
        StringFormat::Ipv4 => IPV4_PATTERN,
        StringFormat::Ipv6 => IPV6_PATTERN,
        StringFormat::Uri => URI_PATTERN,
        StringFormat::UriReference => URI_REFERENCE_PATTERN,
        _ => unreachable!("format has a canonical generator, not a pattern"),
    }
}

fn compile_array(schema: &ArraySchema, options: &GenerationOptions) -> Result<ArrayPlan, Error> {
    let item = match &schema.items {
        Some(items) => compile(items, options)?,
        None => Plan::Any,
    };
    let min = schema.min_items;
    let max = schema.max_items.unwrap_or(min + MAX_SEQ_LENGTH);
    if min > max {
        return Err(Error::EmptyRange {
            lo: min as f64,
            hi: max as f64,
        });
    }
    Ok(ArrayPlan {
        item: Box::new(item),
        min,
        max,
        unique: schema.unique_items,
    })
}

fn compile_object(schema: &ObjectSchema, options: &GenerationOptions) -> Result<ObjectPlan, Error> {
    let mut required = Vec::new();
    let mut optional = Vec::new();
    for (name, property) in &schema.properties {
        let plan = compile(property, options)?;
        if schema.required.contains(name) {
            required.push((name.clone(), plan));
        } else {
            optional.push((name.clone(), plan));
        }
    }
    // Required names without a declared property still have to show up.
    for name in &schema.required {
        if !schema.properties.contains_key(name) {
            required.push((name.clone(), Plan::Any));
        }
    }

    let additional = match &schema.additional {
        Additional::Forbidden => None,
        Additional::Any => Some(Box::new(Plan::Any)),
        Additional::Constrained(schema) => Some(Box::new(compile(schema, options)?)),
    };

    Ok(ObjectPlan {
        required,
        optional,
        additional,
    })
}

impl Plan {
    fn draw(
        &self,
        source: &mut dyn RandomSource,
        options: &GenerationOptions,
        depth: usize,
    ) -> Result<RawJson, Error> {
        match self {
            Plan::Null => to_raw(&Value::Null),
            Plan::Enum(choices) => Ok(choices[source.size_in(0, choices.len() - 1)].clone()),
            Plan::Boolean => to_raw(&source.flip()),
            Plan::Integer(plan) => plan.draw(source),
            Plan::Number(plan) => plan.draw(source),
            Plan::String(plan) => plan.draw(source),
            Plan::Array(plan) => plan.draw(source, options, depth),
            Plan::Object(plan) => plan.draw(source, options, depth),
            Plan::AnyOf(branches) => draw_any_of(branches, source, options, depth),
            Plan::OneOf(branches) => {
                branches[source.size_in(0, branches.len() - 1)].draw(source, options, depth + 1)
            }
            Plan::Nullable(inner) => {
                if source.flip() {
                    to_raw(&Value::Null)
                } else {
                    inner.draw(source, options, depth)
                }
            }
            Plan::Any => draw_any(source, options, depth),
        }
    }
}

impl IntegerPlan {
    fn draw(&self, source: &mut dyn RandomSource) -> Result<RawJson, Error> {
        match *self {
            IntegerPlan::Uniform { lo, hi } => to_raw(&source.int_in(lo, hi)),
            IntegerPlan::Multiple {
                multiple_of,
                lo,
                hi,
            } => to_raw(&(source.int_in(lo, hi) * multiple_of)),
        }
    }
}

impl NumberPlan {
    fn draw(&self, source: &mut dyn RandomSource) -> Result<RawJson, Error> {
        match *self {
            NumberPlan::Uniform { lo, hi } => to_raw(&draw_f64(source, lo, hi)),
            NumberPlan::Multiple {
                multiple_of,
                lo,
                hi,
                min,
                max,
            } => {
                let mut multiplier = source.int_in(lo, hi);
                let mut value = multiplier as f64 * multiple_of;
                // Rounding in the product can push the value one step past
                // a bound; nudge the multiplier back inward.
                if value > max && multiplier > lo {
                    multiplier -= 1;
                    value = multiplier as f64 * multiple_of;
                }
                if value < min && multiplier < hi {
                    multiplier += 1;
                    value = multiplier as f64 * multiple_of;
                }
                if value < min || value > max {
                    return Err(Error::UnsatisfiableMultipleOf {
                        multiple_of,
                        lo: min,
                        hi: max,
                    });
                }
                to_raw(&value)
            }
        }
    }
}

impl StringPlan {
    fn draw(&self, source: &mut dyn RandomSource) -> Result<RawJson, Error> {
        match self {
            StringPlan::Uuid => {
                let mut bytes = [0u8; 16];
                source.fill(&mut bytes);
                to_raw(&uuid::Builder::from_random_bytes(bytes).into_uuid().to_string())
            }
            StringPlan::DateTime => to_raw(&Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)),
            StringPlan::Date => to_raw(&Utc::now().format("%Y-%m-%d").to_string()),
            StringPlan::Base64 => {
                let len = source.size_in(0, 2 * MAX_SEQ_LENGTH);
                let mut bytes = vec![0u8; len];
                source.fill(&mut bytes);
                to_raw(&general_purpose::STANDARD.encode(&bytes))
            }
            StringPlan::Pattern {
                pattern,
                format,
                min_length,
                max_length,
                func,
            } => {
                let request = PatternRequest {
                    pattern,
                    format: format.map(StringFormat::as_str),
                    min_length: *min_length,
                    max_length: *max_length,
                };
                to_raw(&func(&request, source)?)
            }
            StringPlan::Plain { min, max } => {
                let len = source.size_in(*min, *max);
                to_raw(&plain_string(source, len))
            }
        }
    }
}

impl ArrayPlan {
    fn draw(
        &self,
        source: &mut dyn RandomSource,
        options: &GenerationOptions,
        depth: usize,
    ) -> Result<RawJson, Error> {
        let want = source.size_in(self.min, self.max);
        if !self.unique {
            let items = (0..want)
                .map(|_| self.item.draw(source, options, depth + 1))
                .collect::<Result<Vec<_>, _>>()?;
            return to_raw(&items);
        }

        // Deduplicate by JSON text, redrawing duplicates up to the retry
        // budget.
        let mut seen = BTreeSet::new();
        let mut items = Vec::with_capacity(want);
        let mut misses = 0;
        while items.len() < want {
            let item = self.item.draw(source, options, depth + 1)?;
            if seen.insert(item.get().to_owned()) {
                items.push(item);
                misses = 0;
            } else {
                misses += 1;
                if misses > UNIQUE_RETRY_LIMIT {
                    return Err(Error::UniqueItemsExhausted {
                        attempts: UNIQUE_RETRY_LIMIT,
                        have: items.len(),
                        want,
                    });
                }
            }
        }
        to_raw(&items)
    }
}

impl ObjectPlan {
    fn draw(
        &self,
        source: &mut dyn RandomSource,
        options: &GenerationOptions,
        depth: usize,
    ) -> Result<RawJson, Error> {
        let mut members: BTreeMap<String, RawJson> = BTreeMap::new();

        // Assembly order makes later writes win: an ad-hoc key that
        // happens to collide with a declared property is overwritten by
        // the declared value.
        if let Some(extra) = &self.additional {
            let count = source.size_in(0, options.additional_properties_max);
            for _ in 0..count {
                let key = extra_key(source);
                let value = extra.draw(source, options, depth + 1)?;
                members.insert(key, value);
            }
        }

        for (name, property) in &self.optional {
            if source.flip() {
                continue;
            }
            members.insert(name.clone(), property.draw(source, options, depth + 1)?);
        }

        for (name, property) in &self.required {
            members.insert(name.clone(), property.draw(source, options, depth + 1)?);
        }

        to_raw(&members)
    }
}

fn draw_any_of(
    branches: &[Plan],
    source: &mut dyn RandomSource,
    options: &GenerationOptions,
    depth: usize,
) -> Result<RawJson, Error> {
    // Satisfy a random non-empty subset of the branches.
    let count = source.size_in(1, branches.len());
    let mut indices: Vec<usize> = (0..branches.len()).collect();
    for slot in 0..count {
        let pick = source.size_in(slot, indices.len() - 1);
        indices.swap(slot, pick);
    }

    if count == 1 {
        return branches[indices[0]].draw(source, options, depth + 1);
    }

    // Shallow-merge object values, later branches winning on shared
    // keys. The first non-object value short-circuits unmerged.
    let mut merged: BTreeMap<String, RawJson> = BTreeMap::new();
    for &index in &indices[..count] {
        let value = branches[index].draw(source, options, depth + 1)?;
        match serde_json::from_str::<BTreeMap<String, RawJson>>(value.get()) {
            Ok(fields) => merged.extend(fields),
            Err(_) => return Ok(value),
        }
    }
    to_raw(&merged)
}

fn draw_any(
    source: &mut dyn RandomSource,
    options: &GenerationOptions,
    depth: usize,
) -> Result<RawJson, Error> {
    // Past the depth limit, degenerate to a string so recursion always
    // bottoms out.
    if depth >= options.max_depth {
        let len = source.size_in(0, MAX_SEQ_LENGTH);
        return to_raw(&plain_string(source, len));
    }

    match source.size_in(0, 6) {
        0 => {
            let len = source.size_in(0, MAX_SEQ_LENGTH);
            to_raw(&plain_string(source, len))
        }
        1 => to_raw(&source.int_in(i64::MIN, i64::MAX)),
        2 => to_raw(&draw_f64(source, -f64::MAX, f64::MAX)),
        3 => to_raw(&source.flip()),
        4 => to_raw(&Value::Null),
        5 => {
            let len = source.size_in(0, MAX_SEQ_LENGTH);
            let items = (0..len)
                .map(|_| draw_any(source, options, depth + 1))
                .collect::<Result<Vec<_>, _>>()?;
            to_raw(&items)
        }
        6 => {
            let count = source.size_in(0, MAX_SEQ_LENGTH);
            let mut members = BTreeMap::new();
            for _ in 0..count {
                let key = extra_key(source);
                members.insert(key, draw_any(source, options, depth + 1)?);
            }
            to_raw(&members)
        }
        _ => unreachable!(),
    }
}

fn plain_string(source: &mut dyn RandomSource, len: usize) -> String {
    (0..len)
        .map(|_| source.int_in(32, 126) as u8 as char)
        .collect()
}

fn extra_key(source: &mut dyn RandomSource) -> String {
    let len = source.size_in(EXTRA_KEY_MIN, EXTRA_KEY_MAX);
    (0..len)
        .map(|_| KEY_ALPHABET[source.size_in(0, KEY_ALPHABET.len() - 1)] as char)
        .collect()
}

fn draw_f64(source: &mut dyn RandomSource, lo: f64, hi: f64) -> f64 {
    // A span wider than f64::MAX overflows uniform sampling; split it.
    if hi - lo == f64::INFINITY {
        let mid = lo / 2.0 + hi / 2.0;
        if source.flip() {
            source.float_in(lo, mid)
        } else {
            source.float_in(mid, hi)
        }
    } else {
        source.float_in(lo, hi)
    }
}

// Floor/ceiling division for a positive divisor.
fn div_floor(a: i128, b: i128) -> i128 {
    a.div_euclid(b)
}

fn div_ceil(a: i128, b: i128) -> i128 {
    -(-a).div_euclid(b)
}

fn to_raw<T: serde::Serialize>(value: &T) -> Result<RawJson, Error> {
    Ok(to_raw_value(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::string_regex_pattern_fn;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;
    use serde_json::json;

    fn generator(schema: serde_json::Value) -> Generator {
        let schema = Schema::from_value(&schema).unwrap();
        Generator::new(&schema, &GenerationOptions::new()).unwrap()
    }

    fn draws(schema: serde_json::Value, count: u64) -> Vec<Value> {
        let generator = generator(schema);
        (0..count)
            .map(|seed| {
                let mut rng = Pcg32::seed_from_u64(seed);
                let raw = generator.draw(&mut rng).unwrap();
                serde_json::from_str(raw.get()).unwrap()
            })
            .collect()
    }

    #[test]
    fn integer_respects_bounds() {
        for value in draws(json!({ "type": "integer", "minimum": -3, "maximum": 7 }), 200) {
            let n = value.as_i64().unwrap();
            assert!((-3..=7).contains(&n));
        }
    }

    #[test]
    fn integer_exclusive_bounds_tighten() {
        for value in draws(
            json!({
                "type": "integer",
                "minimum": 0, "exclusiveMinimum": true,
                "maximum": 3, "exclusiveMaximum": true,
            }),
            100,
        ) {
            let n = value.as_i64().unwrap();
            assert!((1..=2).contains(&n));
        }
    }

    #[test]
    fn integer_multiple_of_with_negative_bounds_stays_inside() {
        for value in draws(
            json!({ "type": "integer", "minimum": -5, "maximum": -1, "multipleOf": 3 }),
            100,
        ) {
            assert_eq!(value.as_i64().unwrap(), -3);
        }
    }

    #[test]
    fn int32_format_clamps() {
        for value in draws(json!({ "type": "integer", "format": "int32" }), 300) {
            let n = value.as_i64().unwrap();
            assert!(n >= i32::MIN as i64 && n <= i32::MAX as i64);
        }
    }

    #[test]
    fn unsatisfiable_integer_multiple_of_is_an_error() {
        let schema =
            Schema::from_value(&json!({ "type": "integer", "minimum": 1, "maximum": 2, "multipleOf": 5 }))
                .unwrap();
        let err = Generator::new(&schema, &GenerationOptions::new()).unwrap_err();
        assert!(matches!(err, Error::UnsatisfiableMultipleOf { .. }));
    }

    #[test]
    fn number_multiple_of_divides_evenly() {
        for value in draws(
            json!({ "type": "number", "minimum": 0.5, "maximum": 20, "multipleOf": 0.5 }),
            200,
        ) {
            let v = value.as_f64().unwrap();
            assert!((0.5..=20.0).contains(&v));
            assert_eq!((v / 0.5).fract(), 0.0);
        }
    }

    #[test]
    fn number_exclusive_bounds_are_strict() {
        for value in draws(
            json!({
                "type": "number",
                "minimum": 0, "exclusiveMinimum": true,
                "maximum": 1, "exclusiveMaximum": true,
            }),
            200,
        ) {
            let v = value.as_f64().unwrap();
            assert!(v > 0.0 && v < 1.0);
        }
    }

    #[test]
    fn string_lengths_are_bounded() {
        for value in draws(json!({ "type": "string", "minLength": 2, "maxLength": 5 }), 200) {
            let len = value.as_str().unwrap().chars().count();
            assert!((2..=5).contains(&len));
        }
    }

    #[test]
    fn enum_draws_stay_in_the_set() {
        let allowed = [json!(1), json!("two"), json!(null), json!(true)];
        for value in draws(json!({ "enum": [1, "two", null, true] }), 100) {
            assert!(allowed.contains(&value));
        }
    }

    #[test]
    fn nullable_string_produces_both_cases() {
        let values = draws(json!({ "type": "string", "nullable": true, "maxLength": 3 }), 200);
        assert!(values.iter().any(Value::is_null));
        assert!(values
            .iter()
            .any(|v| v.as_str().is_some_and(|s| s.chars().count() <= 3)));
        assert!(values
            .iter()
            .all(|v| v.is_null() || v.as_str().unwrap().chars().count() <= 3));
    }

    #[test]
    fn non_nullable_never_null() {
        for value in draws(json!({ "type": "boolean" }), 200) {
            assert!(value.is_boolean());
        }
    }

    #[test]
    fn required_keys_always_present() {
        for value in draws(
            json!({
                "type": "object",
                "required": ["a", "ghost"],
                "properties": { "a": { "type": "integer" }, "b": { "type": "boolean" } },
            }),
            100,
        ) {
            let object = value.as_object().unwrap();
            assert!(object.contains_key("a"), "missing a in {value}");
            assert!(object.contains_key("ghost"), "missing ghost in {value}");
        }
    }

    #[test]
    fn forbidden_additional_properties_stay_out() {
        for value in draws(
            json!({
                "type": "object",
                "required": ["a"],
                "properties": { "a": { "type": "boolean" } },
                "additionalProperties": false,
            }),
            200,
        ) {
            let object = value.as_object().unwrap();
            assert_eq!(object.len(), 1);
            assert!(object["a"].is_boolean());
        }
    }

    #[test]
    fn unique_items_have_distinct_text() {
        for value in draws(
            json!({
                "type": "array",
                "items": { "type": "integer", "minimum": 0, "maximum": 1000 },
                "minItems": 0, "maxItems": 5,
                "uniqueItems": true,
            }),
            200,
        ) {
            let items = value.as_array().unwrap();
            let distinct: BTreeSet<String> = items.iter().map(Value::to_string).collect();
            assert_eq!(distinct.len(), items.len());
        }
    }

    #[test]
    fn unique_items_exhaustion_is_reported() {
        let generator = generator(json!({
            "type": "array",
            "items": { "type": "integer", "minimum": 1, "maximum": 1 },
            "minItems": 2, "maxItems": 2,
            "uniqueItems": true,
        }));
        let mut rng = Pcg32::seed_from_u64(0);
        let err = generator.draw(&mut rng).unwrap_err();
        assert!(matches!(err, Error::UniqueItemsExhausted { .. }));
    }

    #[test]
    fn all_of_merges_objects() {
        for value in draws(
            json!({
                "allOf": [
                    {
                        "type": "object",
                        "required": ["x"],
                        "properties": { "x": { "type": "integer", "minimum": 0, "maximum": 9 } },
                    },
                    {
                        "type": "object",
                        "required": ["y"],
                        "properties": { "y": { "type": "string", "maxLength": 4 } },
                    },
                ],
            }),
            100,
        ) {
            let object = value.as_object().unwrap();
            assert!(object["x"].is_i64());
            assert!(object["y"].is_string());
        }
    }

    #[test]
    fn one_of_hits_every_branch() {
        let values = draws(
            json!({ "oneOf": [{ "type": "integer" }, { "type": "string" }] }),
            200,
        );
        assert!(values.iter().any(Value::is_i64));
        assert!(values.iter().any(Value::is_string));
    }

    #[test]
    fn any_of_merges_objects_or_returns_a_branch() {
        for value in draws(
            json!({
                "anyOf": [
                    {
                        "type": "object",
                        "required": ["p"],
                        "properties": { "p": { "type": "boolean" } },
                        "additionalProperties": false,
                    },
                    {
                        "type": "object",
                        "required": ["q"],
                        "properties": { "q": { "type": "integer" } },
                        "additionalProperties": false,
                    },
                ],
            }),
            200,
        ) {
            let object = value.as_object().unwrap();
            assert!(object.contains_key("p") || object.contains_key("q"));
        }
    }

    #[test]
    fn missing_pattern_fn_is_eager() {
        let schema = Schema::from_value(&json!({ "type": "string", "pattern": "[a-z]+" })).unwrap();
        let err = Generator::new(&schema, &GenerationOptions::new()).unwrap_err();
        assert!(matches!(err, Error::MissingPatternFn(_)));
    }

    #[test]
    fn pattern_strings_use_the_installed_backend() {
        let schema =
            Schema::from_value(&json!({ "type": "string", "pattern": "[0-9]{4}" })).unwrap();
        let options = GenerationOptions::new().with_pattern_fn(string_regex_pattern_fn());
        let generator = Generator::new(&schema, &options).unwrap();
        for seed in 0..50 {
            let mut rng = Pcg32::seed_from_u64(seed);
            let raw = generator.draw(&mut rng).unwrap();
            let value: Value = serde_json::from_str(raw.get()).unwrap();
            let text = value.as_str().unwrap();
            assert_eq!(text.len(), 4);
            assert!(text.bytes().all(|b| b.is_ascii_digit()));
        }
    }

    #[test]
    fn uuid_format_has_rfc4122_shape() {
        for value in draws(json!({ "type": "string", "format": "uuid" }), 50) {
            let text = value.as_str().unwrap();
            assert_eq!(text.len(), 36);
            let dashes: Vec<usize> =
                text.char_indices().filter(|(_, c)| *c == '-').map(|(i, _)| i).collect();
            assert_eq!(dashes, vec![8, 13, 18, 23]);
            assert_eq!(text.as_bytes()[14], b'4');
        }
    }

    #[test]
    fn byte_format_is_valid_base64() {
        for value in draws(json!({ "type": "string", "format": "byte" }), 50) {
            let text = value.as_str().unwrap();
            assert!(general_purpose::STANDARD.decode(text).is_ok());
        }
    }

    #[test]
    fn date_formats_parse() {
        for value in draws(json!({ "type": "string", "format": "date-time" }), 5) {
            let text = value.as_str().unwrap();
            assert!(chrono::DateTime::parse_from_rfc3339(text).is_ok());
        }
        for value in draws(json!({ "type": "string", "format": "date" }), 5) {
            let text = value.as_str().unwrap();
            assert!(chrono::NaiveDate::parse_from_str(text, "%Y-%m-%d").is_ok());
        }
    }

    #[test]
    fn untyped_draws_terminate_and_respect_depth() {
        fn json_depth(value: &Value) -> usize {
            match value {
                Value::Array(items) => 1 + items.iter().map(json_depth).max().unwrap_or(0),
                Value::Object(members) => {
                    1 + members.values().map(json_depth).max().unwrap_or(0)
                }
                _ => 1,
            }
        }

        let schema = Schema::from_value(&json!({})).unwrap();
        let options = GenerationOptions::new().with_max_depth(2);
        let generator = Generator::new(&schema, &options).unwrap();
        for seed in 0..300 {
            let mut rng = Pcg32::seed_from_u64(seed);
            let raw = generator.draw(&mut rng).unwrap();
            let value: Value = serde_json::from_str(raw.get()).unwrap();
            assert!(json_depth(&value) <= 3, "too deep: {value}");
        }
    }

    #[test]
    fn draws_are_deterministic_per_seed() {
        let generator = generator(json!({
            "type": "object",
            "required": ["id"],
            "properties": { "id": { "type": "integer" } },
        }));
        let mut a = Pcg32::seed_from_u64(99);
        let mut b = Pcg32::seed_from_u64(99);
        assert_eq!(generator.draw(&mut a).unwrap().get(), generator.draw(&mut b).unwrap().get());
    }
}
