//! # stackroute
//!
//! **stackroute** is a middleware-stack HTTP request router for Rust: it
//! matches an incoming request (method + path) against registered route
//! patterns, extracts named parameters, and executes an ordered chain of
//! handlers with explicit continuation control, on the `may` coroutine
//! runtime.
//!
//! It is the dispatch core a router library ships, not a web framework: the
//! listener, TLS, HTTP parsing, and wire serialization belong to the
//! transport that embeds it. Static-file serving is likewise consumed as a
//! pre-built handler mounted under a prefix, never implemented here.
//!
//! ## Architecture
//!
//! - **[`pattern`]** — compiles route path specifications (literal, `:param`,
//!   character-glob, regex) into matchable patterns
//! - **[`router`]** — the registration-ordered route table, the matcher, and
//!   the `Router` facade with its dispatch entry point
//! - **[`dispatcher`]** — the chain executor: continuation signalling,
//!   timeout and cancellation handling, panic recovery
//! - **[`middleware`]** — handler traits, the ordinary/error chain variant,
//!   and built-in middleware (auth, request logging)
//! - **[`context`]** — the per-request request/response state shared with
//!   handlers
//! - **[`runtime_config`]** — environment-driven runtime settings
//! - **[`ids`]** — ULID request identifiers for log correlation
//!
//! ## Matching model
//!
//! Routes are tried strictly in registration order and the first match wins:
//! a sequential middleware-stack model, not most-specific-match. Overlap is
//! resolved by putting the route you want matched first, first.
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use http::Method;
//! use stackroute::{Outcome, RequestContext, ResponseContext, Router, TracingMiddleware};
//!
//! let mut router = Router::new();
//! router
//!     .use_middleware(stackroute::ChainHandler::ordinary(Arc::new(TracingMiddleware)))
//!     .get("/users/:userId/books/:bookId", |req: Arc<RequestContext>,
//!                                           res: Arc<ResponseContext>,
//!                                           _next| {
//!         let _ = res.send_json(200, serde_json::json!({
//!             "user": req.get_path_param("userId"),
//!             "book": req.get_path_param("bookId"),
//!         }));
//!     })?;
//!
//! let req = Arc::new(RequestContext::new(Method::GET, "/users/34/books/8989"));
//! let res = Arc::new(ResponseContext::new());
//! match router.dispatch(&req, &res) {
//!     Outcome::Completed => { /* transport writes res.parts() to the wire */ }
//!     other => { /* Unhandled / Failed / TimedOut / Cancelled */ }
//! }
//! ```
//!
//! ## The continuation contract
//!
//! Every handler must send a response, `proceed()`, or `fail(err)`. A
//! handler that does none of the three hangs its request by design; set
//! `STACKROUTE_DISPATCH_TIMEOUT_MS` (or a [`RuntimeConfig`] timeout) to have
//! such chains reported as [`Outcome::TimedOut`] instead.

pub mod context;
pub mod dispatcher;
pub mod ids;
pub mod middleware;
pub mod pattern;
pub mod router;
pub mod runtime_config;

pub use context::{
    DoubleResponseError, HeaderVec, RequestContext, ResponseContext, ResponseParts,
    MAX_INLINE_HEADERS,
};
pub use dispatcher::{CancelToken, ChainExecutor, Continuation, HandlerError, Outcome};
pub use ids::RequestId;
pub use middleware::{
    AuthMiddleware, ChainHandler, ErrorMiddleware, IntoHandlerChain, Middleware, TracingMiddleware,
};
pub use pattern::{InvalidPatternError, PathPattern};
pub use router::{
    parse_method_token, MethodFilter, ParamVec, Route, RouteMatch, Router, RouterMetrics,
    MAX_INLINE_PARAMS,
};
pub use runtime_config::RuntimeConfig;
