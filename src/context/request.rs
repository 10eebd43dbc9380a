use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use http::Method;
use serde_json::Value;
use smallvec::SmallVec;

use crate::dispatcher::CancelToken;
use crate::ids::RequestId;
use crate::pattern::ParamVec;

/// Maximum inline headers/cookies before heap allocation.
pub const MAX_INLINE_HEADERS: usize = 16;

/// Stack-allocated header/cookie storage.
///
/// Header names use `Arc<str>` — they repeat across requests
/// (`content-type`, `authorization`, …) and clone in O(1); values are
/// per-request data and stay `String`.
pub type HeaderVec = SmallVec<[(Arc<str>, String); MAX_INLINE_HEADERS]>;

/// Drop the query-string suffix from a request path.
///
/// Query strings are never part of path matching; the matcher calls this
/// before testing any pattern.
#[must_use]
pub fn strip_query(path: &str) -> &str {
    match path.find('?') {
        Some(pos) => &path[..pos],
        None => path,
    }
}

/// Parse query-string parameters from a raw request path.
///
/// Everything after the first `?` is percent-decoded pairwise. Duplicate
/// names are kept in order; accessors use last-write-wins.
#[must_use]
pub fn parse_query_params(path: &str) -> ParamVec {
    match path.find('?') {
        Some(pos) => url::form_urlencoded::parse(path[pos + 1..].as_bytes())
            .map(|(k, v)| (Arc::from(k.as_ref()), v.into_owned()))
            .collect(),
        None => ParamVec::new(),
    }
}

/// Parse the `Cookie` header (if any) into name/value pairs.
#[must_use]
pub fn parse_cookies(headers: &HeaderVec) -> HeaderVec {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case("cookie"))
        .map(|(_, raw)| {
            raw.split(';')
                .filter_map(|pair| {
                    let mut parts = pair.trim().splitn(2, '=');
                    let name = parts.next()?.trim();
                    if name.is_empty() {
                        return None;
                    }
                    let value = parts.next().unwrap_or("").trim().to_string();
                    Some((Arc::from(name), value))
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Per-request state handed to every handler in the dispatched chain.
///
/// Built by the transport from its parsed HTTP request. The path is stored
/// query-stripped; the query parameters are parsed out at construction.
/// Path parameters are written by the router after a successful match and
/// are therefore behind a lock, since the context is shared with handlers
/// through an `Arc`.
#[derive(Debug)]
pub struct RequestContext {
    /// Correlation id for this dispatch (forwardable via `x-request-id`).
    pub request_id: RequestId,
    /// HTTP method.
    pub method: Method,
    /// HTTP headers (lowercase names recommended, lookup is case-insensitive).
    pub headers: HeaderVec,
    /// Cookies parsed from the `Cookie` header.
    pub cookies: HeaderVec,
    /// Request body parsed by the transport, if any.
    pub body: Option<Value>,
    path: String,
    raw_path: String,
    query_params: ParamVec,
    path_params: RwLock<ParamVec>,
    remaining_path: RwLock<Option<String>>,
    cancel: CancelToken,
}

impl RequestContext {
    /// Build a context from a method and a raw request path (query string
    /// included, if the transport has one).
    #[must_use]
    pub fn new(method: Method, path: &str) -> Self {
        Self {
            request_id: RequestId::new(),
            method,
            headers: HeaderVec::new(),
            cookies: HeaderVec::new(),
            body: None,
            path: strip_query(path).to_string(),
            raw_path: path.to_string(),
            query_params: parse_query_params(path),
            path_params: RwLock::new(ParamVec::new()),
            remaining_path: RwLock::new(None),
            cancel: CancelToken::new(),
        }
    }

    /// Attach headers; re-derives cookies and adopts a forwarded
    /// `x-request-id` when present and valid.
    #[must_use]
    pub fn with_headers(mut self, headers: HeaderVec) -> Self {
        self.request_id = RequestId::from_header_or_new(
            headers
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case("x-request-id"))
                .map(|(_, v)| v.as_str()),
        );
        self.cookies = parse_cookies(&headers);
        self.headers = headers;
        self
    }

    /// Attach a parsed request body.
    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Attach the transport's cancellation token for this connection.
    #[must_use]
    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// The query-stripped request path used for matching.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The path as the transport received it, query string and all.
    #[must_use]
    pub fn raw_path(&self) -> &str {
        &self.raw_path
    }

    /// Get a path parameter by name.
    ///
    /// Last write wins: with duplicate names at different depths
    /// (`/org/:id/user/:id`), the deepest occurrence is returned.
    #[must_use]
    pub fn get_path_param(&self, name: &str) -> Option<String> {
        self.path_params
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.clone())
    }

    /// Get a query parameter by name (last write wins for duplicates).
    #[must_use]
    pub fn get_query_param(&self, name: &str) -> Option<&str> {
        self.query_params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    /// Get a header by name (case-insensitive per RFC 7230).
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Get a cookie by name.
    #[must_use]
    pub fn get_cookie(&self, name: &str) -> Option<&str> {
        self.cookies
            .iter()
            .find(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    /// Snapshot of the current path parameters.
    #[must_use]
    pub fn path_params(&self) -> ParamVec {
        self.path_params
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Path parameters as a map. This allocates; prefer
    /// [`RequestContext::get_path_param`] in hot paths.
    #[must_use]
    pub fn path_params_map(&self) -> HashMap<String, String> {
        self.path_params
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    /// The unmatched path suffix, set when this request reached its chain
    /// through a prefix mount. Sub-routers match against this.
    #[must_use]
    pub fn remaining_path(&self) -> Option<String> {
        self.remaining_path
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// A clone of this request's cancellation token.
    #[must_use]
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub(crate) fn merge_path_params(&self, params: &ParamVec) {
        self.path_params
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .extend(params.iter().cloned());
    }

    pub(crate) fn set_remaining_path(&self, value: Option<String>) -> Option<String> {
        std::mem::replace(
            &mut *self
                .remaining_path
                .write()
                .unwrap_or_else(PoisonError::into_inner),
            value,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smallvec::smallvec;

    #[test]
    fn strips_and_parses_query_string() {
        let req = RequestContext::new(Method::GET, "/search/rust?limit=10&limit=20&q=a%20b");
        assert_eq!(req.path(), "/search/rust");
        assert_eq!(req.raw_path(), "/search/rust?limit=10&limit=20&q=a%20b");
        assert_eq!(req.get_query_param("limit"), Some("20"));
        assert_eq!(req.get_query_param("q"), Some("a b"));
    }

    #[test]
    fn header_lookup_is_case_insensitive() {
        let headers: HeaderVec = smallvec![(Arc::from("content-type"), "text/plain".to_string())];
        let req = RequestContext::new(Method::GET, "/").with_headers(headers);
        assert_eq!(req.get_header("Content-Type"), Some("text/plain"));
    }

    #[test]
    fn cookies_come_from_the_cookie_header() {
        let headers: HeaderVec =
            smallvec![(Arc::from("cookie"), "session=abc; theme=dark".to_string())];
        let req = RequestContext::new(Method::GET, "/").with_headers(headers);
        assert_eq!(req.get_cookie("session"), Some("abc"));
        assert_eq!(req.get_cookie("theme"), Some("dark"));
    }

    #[test]
    fn path_param_lookup_is_last_write_wins() {
        let req = RequestContext::new(Method::GET, "/org/1/user/2");
        let params: ParamVec = smallvec![
            (Arc::from("id"), "1".to_string()),
            (Arc::from("id"), "2".to_string())
        ];
        req.merge_path_params(&params);
        assert_eq!(req.get_path_param("id"), Some("2".to_string()));
    }
}
