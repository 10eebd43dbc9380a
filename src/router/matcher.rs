use std::sync::Arc;
use std::time::{Duration, Instant};

use http::Method;
use tracing::{debug, info, warn};

use super::table::{Route, RouteKind, RouteTable};
use crate::context::strip_query;
use crate::pattern::{ParamVec, PathPattern};

/// Result of successfully matching a request against the table.
///
/// Ephemeral: created per dispatch and discarded when the request completes.
#[derive(Clone)]
pub struct RouteMatch {
    /// The matched registration.
    pub route: Arc<Route>,
    /// Parameters captured from the path (empty for non-parameterized
    /// patterns and for prefix mounts).
    pub params: ParamVec,
    /// For prefix mounts: the unmatched path suffix a sub-router dispatches
    /// against. `None` for whole-path matches.
    pub remaining_path: Option<String>,
}

/// Find the first table entry matching `(method, path)`.
///
/// Entries are tried in registration order and iteration short-circuits at
/// the first success. `None` is a normal outcome ("no route for this
/// request"), not an error.
pub(crate) fn match_route(table: &RouteTable, method: &Method, path: &str) -> Option<RouteMatch> {
    let path = strip_query(path);
    debug!(method = %method, path = %path, "route match attempt");
    let match_start = Instant::now();

    for route in table.lookup(method) {
        let matched = match route.kind {
            RouteKind::Full => route.pattern.matches(path).map(|params| (params, None)),
            RouteKind::Prefix => {
                prefix_remaining(&route.pattern, path).map(|rest| (ParamVec::new(), Some(rest)))
            }
        };
        if let Some((params, remaining_path)) = matched {
            let duration = match_start.elapsed();
            if duration > Duration::from_millis(1) {
                warn!(
                    method = %method,
                    path = %path,
                    source = %route.source,
                    index = route.index,
                    duration_us = duration.as_micros() as u64,
                    "slow route matching detected"
                );
            } else {
                info!(
                    method = %method,
                    path = %path,
                    source = %route.source,
                    index = route.index,
                    path_params = ?params,
                    duration_us = duration.as_micros() as u64,
                    "route matched"
                );
            }
            return Some(RouteMatch {
                route: Arc::clone(route),
                params,
                remaining_path,
            });
        }
    }

    debug!(
        method = %method,
        path = %path,
        duration_us = match_start.elapsed().as_micros() as u64,
        "no route matched"
    );
    None
}

/// Literal-prefix match on a segment boundary; returns the unmatched suffix
/// (at least `/`).
fn prefix_remaining(pattern: &PathPattern, path: &str) -> Option<String> {
    let PathPattern::Literal(prefix) = pattern else {
        return None;
    };
    let parts: Vec<&str> = path.split('/').collect();
    if parts.len() < prefix.len() {
        return None;
    }
    if !prefix.iter().zip(parts.iter()).all(|(a, b)| a.as_str() == *b) {
        return None;
    }
    let rest = parts[prefix.len()..].join("/");
    Some(if rest.is_empty() {
        "/".to_string()
    } else {
        format!("/{rest}")
    })
}
