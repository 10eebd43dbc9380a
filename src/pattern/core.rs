use std::sync::Arc;

use regex::Regex;
use smallvec::SmallVec;
use thiserror::Error;

use super::glob;

/// Maximum number of captured parameters before heap allocation.
/// Most routes carry well under eight (`/users/:id/books/:bookId` has two).
pub const MAX_INLINE_PARAMS: usize = 8;

/// Stack-allocated parameter storage for the match hot path.
///
/// Param names are `Arc<str>` because they come from the compiled pattern
/// (known at registration time) and clone in O(1); values are per-request
/// data captured from the URL and stay `String`.
pub type ParamVec = SmallVec<[(Arc<str>, String); MAX_INLINE_PARAMS]>;

/// Registration-time failure to turn a path specification into a pattern.
#[derive(Debug, Error)]
pub enum InvalidPatternError {
    /// A `:` segment with no name following it.
    #[error("parameter segment is missing a name in `{pattern}`")]
    MissingParamName { pattern: String },

    /// The expression (a glob translation or a user regex) does not compile.
    #[error("expression `{pattern}` does not compile")]
    Expression {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// Mount prefixes must be plain literal paths.
    #[error("mount prefix `{pattern}` must be a literal path")]
    NonLiteralPrefix { pattern: String },
}

/// One piece of a parameterized pattern.
#[derive(Debug, Clone)]
pub enum Segment {
    /// Must equal the corresponding path segment exactly.
    Literal(String),
    /// Captures the corresponding path segment under this name.
    Param(Arc<str>),
}

/// Compiled, matchable form of a route path specification.
///
/// Compiling the same source string always yields an equivalent pattern.
#[derive(Debug, Clone)]
pub enum PathPattern {
    /// `/`-delimited literal segments, matched by exact equality.
    Literal(Vec<String>),
    /// Mixed literal and `:name` segments; equal segment counts required.
    Parameterized(Vec<Segment>),
    /// Character-level glob over the full path, compiled to an anchored
    /// expression (`+`, `*`, `?` tokens).
    Wildcarded(Regex),
    /// User-supplied expression applied to the full path, anchored only by
    /// its own anchors.
    Regex(Regex),
}

impl PathPattern {
    /// Short tag for log fields and route dumps.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            PathPattern::Literal(_) => "literal",
            PathPattern::Parameterized(_) => "parameterized",
            PathPattern::Wildcarded(_) => "wildcard",
            PathPattern::Regex(_) => "regex",
        }
    }

    /// Test a query-stripped path against this pattern.
    ///
    /// Returns the captured parameters on success (empty for every variant
    /// except `Parameterized` — captured values stay strings, numeric-looking
    /// or not), `None` on no match.
    #[must_use]
    pub fn matches(&self, path: &str) -> Option<ParamVec> {
        match self {
            PathPattern::Literal(segments) => {
                if path.split('/').eq(segments.iter().map(String::as_str)) {
                    Some(ParamVec::new())
                } else {
                    None
                }
            }
            PathPattern::Parameterized(segments) => {
                let parts: SmallVec<[&str; 16]> = path.split('/').collect();
                if parts.len() != segments.len() {
                    return None;
                }
                let mut params = ParamVec::new();
                for (segment, part) in segments.iter().zip(parts.iter()) {
                    match segment {
                        Segment::Literal(lit) if lit == part => {}
                        Segment::Literal(_) => return None,
                        Segment::Param(name) => {
                            params.push((Arc::clone(name), (*part).to_string()));
                        }
                    }
                }
                Some(params)
            }
            PathPattern::Wildcarded(re) | PathPattern::Regex(re) => {
                if re.is_match(path) {
                    Some(ParamVec::new())
                } else {
                    None
                }
            }
        }
    }
}

/// Compile a string path specification.
///
/// Classification: a bare `:` segment is rejected; any glob token (`+`, `*`,
/// `?`) makes the whole path a [`PathPattern::Wildcarded`] (a `:name`
/// segment inside it still matches one segment but captures nothing); any
/// `:name` segment otherwise makes it [`PathPattern::Parameterized`]; plain
/// paths compile to [`PathPattern::Literal`].
pub fn compile(path: &str) -> Result<PathPattern, InvalidPatternError> {
    if path.split('/').any(|s| s == ":") {
        return Err(InvalidPatternError::MissingParamName {
            pattern: path.to_string(),
        });
    }
    if path.contains(['+', '*', '?']) {
        return glob::compile_glob(path).map(PathPattern::Wildcarded);
    }
    if path.split('/').any(|s| s.starts_with(':')) {
        let segments = path
            .split('/')
            .map(|s| match s.strip_prefix(':') {
                Some(name) => Segment::Param(Arc::from(name)),
                None => Segment::Literal(s.to_string()),
            })
            .collect();
        return Ok(PathPattern::Parameterized(segments));
    }
    Ok(PathPattern::Literal(
        path.split('/').map(str::to_string).collect(),
    ))
}

/// Compile a regular-expression path specification.
///
/// The expression is used as-is for full-path matching; it is not anchored
/// beyond whatever anchors it carries itself.
pub fn compile_regex(expr: &str) -> Result<PathPattern, InvalidPatternError> {
    Regex::new(expr)
        .map(PathPattern::Regex)
        .map_err(|source| InvalidPatternError::Expression {
            pattern: expr.to_string(),
            source,
        })
}
