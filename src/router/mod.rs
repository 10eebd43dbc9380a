//! # Router Module
//!
//! Route registration, lookup, and the dispatch facade.
//!
//! ## Overview
//!
//! The router is responsible for:
//! - Building the routing table from programmatic registrations
//! - Matching incoming requests to registered routes
//! - Extracting path parameters from matched routes
//! - Handing the matched chain (and any global middleware) to the executor
//!
//! ## Matching model
//!
//! Entries are tried strictly in registration order and the first match
//! wins — a sequential middleware-stack model, not most-specific-match.
//! Prefix mounts registered with [`Router::mount`] live in the same table
//! and compete under the same rule, so a mount that matches first shadows
//! later routes; middleware that should run in front of every route belongs
//! in [`Router::use_middleware`] instead.
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use http::Method;
//! use stackroute::{RequestContext, ResponseContext, Router};
//!
//! let mut router = Router::new();
//! router.get("/pets/:id", |req: Arc<RequestContext>, res: Arc<ResponseContext>, _next| {
//!     let id = req.get_path_param("id").unwrap_or_default();
//!     let _ = res.send_json(200, serde_json::json!({ "id": id }));
//! })?;
//!
//! let req = Arc::new(RequestContext::new(Method::GET, "/pets/123"));
//! let res = Arc::new(ResponseContext::new());
//! let outcome = router.dispatch(&req, &res);
//! ```

mod core;
mod matcher;
mod metrics;
mod table;
#[cfg(test)]
mod tests;

pub use self::core::Router;
pub use crate::pattern::{ParamVec, MAX_INLINE_PARAMS};
pub use matcher::RouteMatch;
pub use metrics::RouterMetrics;
pub use table::{parse_method_token, MethodFilter, Route, RouteKind, RouteTable};
