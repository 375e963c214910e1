//! Pattern-driven string generation.
//!
//! Real-world OpenAPI documents write `pattern` in ECMA regex syntax, and
//! several named formats (`email`, `hostname`, ...) are most honestly
//! described as regexes too. Which regex dialects are generatable is a
//! backend decision the engine refuses to make: it hands every such
//! request to a caller-installed [`PatternFn`] and treats a schema that
//! needs one while none is installed as a configuration error.
//!
//! [`string_regex_pattern_fn`] is the batteries-included backend, built on
//! `proptest::string::string_regex`. It draws its entropy from the
//! engine's [`RandomSource`], so pattern strings replay deterministically
//! under a reused seed like every other draw.

use std::sync::Arc;

use proptest::strategy::{Strategy, ValueTree};
use proptest::string::string_regex;
use proptest::test_runner::{Config, RngAlgorithm, TestRng, TestRunner};

use crate::error::Error;
use crate::source::RandomSource;

/// One request for a pattern-shaped string.
#[derive(Debug, Clone, Copy)]
pub struct PatternRequest<'a> {
    /// The regex to satisfy.
    pub pattern: &'a str,
    /// The named format this pattern stands in for, when there is one.
    pub format: Option<&'a str>,
    /// Declared length bounds, for backends that can honor them.
    pub min_length: usize,
    pub max_length: Option<usize>,
}

/// The pluggable regex-to-string delegate.
pub type PatternFn =
    dyn Fn(&PatternRequest<'_>, &mut dyn RandomSource) -> Result<String, Error> + Send + Sync;

// Canonical shapes suggested for the regex-backed formats.
pub(crate) const EMAIL_PATTERN: &str = r"[a-zA-Z0-9._%+\-]+@[a-zA-Z0-9.\-]+\.[a-zA-Z]{2,}";
pub(crate) const HOSTNAME_PATTERN: &str = r"[a-zA-Z0-9\-\.]{1,253}";
pub(crate) const IPV4_PATTERN: &str = r"[0-9]{1,3}(\.[0-9]{1,3}){3}";
pub(crate) const IPV6_PATTERN: &str = r"([0-9a-fA-F]{1,4}:){7}[0-9a-fA-F]{1,4}";
pub(crate) const URI_PATTERN: &str = r"https?://[^\s]+";
pub(crate) const URI_REFERENCE_PATTERN: &str = r"[-A-Za-z0-9._~:/?#@!$&'()*+,;=%]+";

/// A [`PatternFn`] backed by `proptest`'s regex string strategy.
///
/// The backend accepts the regex subset `proptest` (and the `regex-syntax`
/// crate underneath it) can enumerate; anchors and look-around are
/// rejected as [`Error::Pattern`].
pub fn string_regex_pattern_fn() -> Arc<PatternFn> {
    Arc::new(|request: &PatternRequest<'_>, source: &mut dyn RandomSource| {
        let strategy = string_regex(request.pattern).map_err(|cause| Error::Pattern {
            pattern: request.pattern.to_owned(),
            message: cause.to_string(),
        })?;

        let mut seed = [0u8; 32];
        source.fill(&mut seed);
        let mut runner = TestRunner::new_with_rng(
            Config::default(),
            TestRng::from_seed(RngAlgorithm::ChaCha, &seed),
        );
        let tree = strategy.new_tree(&mut runner).map_err(|cause| Error::Pattern {
            pattern: request.pattern.to_owned(),
            message: cause.to_string(),
        })?;
        Ok(tree.current())
    })
}
