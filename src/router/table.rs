use std::fmt;
use std::sync::Arc;

use http::Method;
use tracing::debug;

use crate::middleware::ChainHandler;
use crate::pattern::{self, InvalidPatternError, PathPattern};

/// Which methods a registration accepts: one, or ALL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MethodFilter {
    /// Matches every method (the ALL registration).
    Any,
    /// Matches exactly one method.
    Only(Method),
}

impl MethodFilter {
    #[must_use]
    pub fn accepts(&self, method: &Method) -> bool {
        match self {
            MethodFilter::Any => true,
            MethodFilter::Only(m) => m == method,
        }
    }
}

impl fmt::Display for MethodFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MethodFilter::Any => f.write_str("ALL"),
            MethodFilter::Only(m) => f.write_str(m.as_str()),
        }
    }
}

const SUPPORTED_METHODS: [Method; 7] = [
    Method::GET,
    Method::POST,
    Method::PUT,
    Method::DELETE,
    Method::PATCH,
    Method::HEAD,
    Method::OPTIONS,
];

/// Parse a raw method token from the transport.
///
/// Only the supported set is accepted; extension tokens get `None` so the
/// caller can reject them before matching.
#[must_use]
pub fn parse_method_token(token: &str) -> Option<Method> {
    let upper = token.to_ascii_uppercase();
    SUPPORTED_METHODS.iter().find(|m| m.as_str() == upper).cloned()
}

/// How a table entry matches: against the whole path, or as a mount prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteKind {
    /// Whole-path match with parameter extraction.
    Full,
    /// Literal-prefix match on a segment boundary; no parameters, the
    /// unmatched suffix becomes the request's remaining path.
    Prefix,
}

/// One registration: method filter, compiled pattern, and handler chain.
///
/// Immutable after registration; the table owns it and shares it with match
/// results as `Arc<Route>`.
pub struct Route {
    pub method: MethodFilter,
    pub pattern: PathPattern,
    pub chain: Vec<ChainHandler>,
    /// Position in registration order; the tie-break for overlapping
    /// patterns is first registered, first matched.
    pub index: usize,
    pub kind: RouteKind,
    /// The textual form the pattern was compiled from, kept for logs.
    pub source: String,
}

/// Registration-ordered route storage.
///
/// Read-only during the serving phase: registration must complete before
/// concurrent dispatch begins, after which the table is shared freely.
#[derive(Default)]
pub struct RouteTable {
    routes: Vec<Arc<Route>>,
}

impl RouteTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a string-pattern route. A compile failure leaves the table
    /// untouched.
    pub fn register(
        &mut self,
        method: MethodFilter,
        path: &str,
        chain: Vec<ChainHandler>,
    ) -> Result<(), InvalidPatternError> {
        let compiled = pattern::compile(path)?;
        self.push(method, compiled, path, chain, RouteKind::Full);
        Ok(())
    }

    /// Register a regular-expression route.
    pub fn register_regex(
        &mut self,
        method: MethodFilter,
        expr: &str,
        chain: Vec<ChainHandler>,
    ) -> Result<(), InvalidPatternError> {
        let compiled = pattern::compile_regex(expr)?;
        self.push(method, compiled, expr, chain, RouteKind::Full);
        Ok(())
    }

    /// Register an ALL-method prefix mount. The prefix must be a plain
    /// literal path; `/` (or empty) mounts at the root.
    pub fn register_prefix(
        &mut self,
        prefix: &str,
        chain: Vec<ChainHandler>,
    ) -> Result<(), InvalidPatternError> {
        let trimmed = if prefix.len() > 1 {
            prefix.trim_end_matches('/')
        } else {
            prefix
        };
        let normalized = if trimmed == "/" { "" } else { trimmed };
        let compiled = pattern::compile(normalized)?;
        if !matches!(compiled, PathPattern::Literal(_)) {
            return Err(InvalidPatternError::NonLiteralPrefix {
                pattern: prefix.to_string(),
            });
        }
        self.push(MethodFilter::Any, compiled, prefix, chain, RouteKind::Prefix);
        Ok(())
    }

    fn push(
        &mut self,
        method: MethodFilter,
        pattern: PathPattern,
        source: &str,
        chain: Vec<ChainHandler>,
        kind: RouteKind,
    ) {
        let index = self.routes.len();
        debug!(
            method = %method,
            source = %source,
            pattern_kind = pattern.kind(),
            handlers = chain.len(),
            index,
            "route registered"
        );
        self.routes.push(Arc::new(Route {
            method,
            pattern,
            chain,
            index,
            kind,
            source: source.to_string(),
        }));
    }

    /// All routes whose filter accepts `method`, in registration order.
    pub fn lookup<'a>(&'a self, method: &'a Method) -> impl Iterator<Item = &'a Arc<Route>> + 'a {
        self.routes.iter().filter(move |r| r.method.accepts(method))
    }

    #[must_use]
    pub fn routes(&self) -> &[Arc<Route>] {
        &self.routes
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
