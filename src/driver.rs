//! The property-check driver.
//!
//! The driver wires the engine to its two external collaborators: a
//! [`SchemaReader`] that yields a normalized OpenAPI document (references
//! resolved, meta-schema validated), and a [`ValidatorOracle`] that judges
//! every generated payload. For each POST operation with a JSON request
//! body it compiles a generator and runs a property loop: u64 seeds flow
//! through a proptest runner, each seed is replayed deterministically into
//! a draw, and the first oracle rejection is shrunk seed-wise before being
//! reported as a [`Failure`].

use proptest::arbitrary::any;
use proptest::test_runner::{Config, TestCaseError, TestError, TestRunner};
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde_json::Value;

use crate::error::Error;
use crate::generate::{Generator, RawJson};
use crate::schema::Schema;
use crate::GenerationOptions;

const JSON_MEDIA_TYPE: &str = "application/json";

/// Yields normalized schema documents. Reference resolution and
/// meta-schema validation happen behind this trait.
pub trait SchemaReader {
    fn read(&self, location: &str) -> Result<Value, Error>;
}

/// The independent validator used as an oracle for generated payloads.
pub trait ValidatorOracle {
    /// `Ok(())` if the payload is acceptable, `Err(reason)` otherwise.
    fn validate(
        &self,
        path: &str,
        method: &str,
        content_type: &str,
        body: &[u8],
    ) -> Result<(), String>;
}

/// One oracle disagreement, minimized by seed shrinking.
#[derive(Debug, Clone)]
pub struct Failure {
    /// The request path whose schema produced the payload.
    pub path: String,
    /// The shrunk payload bytes.
    pub payload: Vec<u8>,
    /// The oracle's (or generator's) complaint.
    pub message: String,
    /// The seed that replays the shrunk payload.
    pub seed: u64,
}

/// Outcome of a driver run.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Request schemas that passed their full property loop.
    pub paths_checked: usize,
    /// The first failure, if any; the run stops there.
    pub failure: Option<Failure>,
}

/// Drives the property loop over every JSON request schema a document
/// declares.
pub struct Driver<R, V> {
    reader: R,
    oracle: V,
    options: GenerationOptions,
    cases: u32,
}

impl<R: SchemaReader, V: ValidatorOracle> Driver<R, V> {
    pub fn new(reader: R, oracle: V) -> Self {
        Driver {
            reader,
            oracle,
            options: GenerationOptions::new(),
            cases: 256,
        }
    }

    pub fn with_options(mut self, options: GenerationOptions) -> Self {
        self.options = options;
        self
    }

    /// Number of draws per request schema.
    pub fn with_cases(mut self, cases: u32) -> Self {
        self.cases = cases;
        self
    }

    /// Read the document at `location` and property-check every POST
    /// request schema in it. Stops at the first oracle rejection.
    pub fn run(&self, location: &str) -> Result<RunReport, Error> {
        let document = self.reader.read(location)?;
        let mut paths_checked = 0;

        for (path, schema) in request_schemas(&document)? {
            tracing::debug!(path = %path, cases = self.cases, "checking request schema");
            let generator = Generator::new(&schema, &self.options)?;

            if let Some(failure) = self.check_path(&path, &generator) {
                tracing::warn!(
                    path = %path,
                    seed = failure.seed,
                    message = %failure.message,
                    "oracle rejected a generated payload"
                );
                return Ok(RunReport {
                    paths_checked,
                    failure: Some(failure),
                });
            }
            paths_checked += 1;
        }

        Ok(RunReport {
            paths_checked,
            failure: None,
        })
    }

    fn check_path(&self, path: &str, generator: &Generator) -> Option<Failure> {
        let mut runner = TestRunner::new(Config {
            cases: self.cases,
            failure_persistence: None,
            ..Config::default()
        });

        let outcome = runner.run(&any::<u64>(), |seed| {
            let payload = self
                .replay(generator, seed)
                .map_err(|error| TestCaseError::fail(error.to_string()))?;
            self.oracle
                .validate(path, "POST", JSON_MEDIA_TYPE, payload.get().as_bytes())
                .map_err(TestCaseError::fail)?;
            Ok(())
        });

        match outcome {
            Ok(()) => None,
            Err(TestError::Fail(reason, seed)) => {
                let payload = self
                    .replay(generator, seed)
                    .map(|payload| payload.get().as_bytes().to_vec())
                    .unwrap_or_default();
                Some(Failure {
                    path: path.to_owned(),
                    payload,
                    message: reason.to_string(),
                    seed,
                })
            }
            Err(TestError::Abort(reason)) => Some(Failure {
                path: path.to_owned(),
                payload: Vec::new(),
                message: reason.to_string(),
                seed: 0,
            }),
        }
    }

    fn replay(&self, generator: &Generator, seed: u64) -> Result<RawJson, Error> {
        let mut rng = Pcg32::seed_from_u64(seed);
        generator.draw(&mut rng)
    }
}

/// Enumerate `(path, schema)` for every POST operation that declares an
/// `application/json` request body.
pub fn request_schemas(document: &Value) -> Result<Vec<(String, Schema)>, Error> {
    let Some(paths) = document.get("paths").and_then(Value::as_object) else {
        return Ok(Vec::new());
    };

    let mut schemas = Vec::new();
    for (path, item) in paths {
        let Some(schema_value) = item
            .get("post")
            .and_then(|operation| operation.get("requestBody"))
            .and_then(|body| body.get("content"))
            .and_then(|content| content.get(JSON_MEDIA_TYPE))
            .and_then(|media| media.get("schema"))
        else {
            continue;
        };
        schemas.push((path.clone(), Schema::from_value(schema_value)?));
    }
    Ok(schemas)
}
