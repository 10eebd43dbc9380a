//! Request and response contexts shared between the router core and the
//! handlers it dispatches to.
//!
//! The router itself only reads and writes a narrow slice of these types:
//! the request's method, path, and parameter map, and the response's
//! sent-flag. Everything else (headers, cookies, bodies, status) is carried
//! for the handlers' benefit. Both contexts are designed to sit behind an
//! `Arc` so a handler can hand them to a spawned coroutine and finish its
//! work after returning.

mod request;
mod response;

pub use request::{
    parse_cookies, parse_query_params, strip_query, HeaderVec, RequestContext, MAX_INLINE_HEADERS,
};
pub use response::{DoubleResponseError, ResponseContext, ResponseParts};
