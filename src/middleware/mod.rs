//! # Middleware Module
//!
//! Handler traits and the chain units the router dispatches.
//!
//! A chain element is either an ordinary handler ([`Middleware`]) or an
//! error-capable handler ([`ErrorMiddleware`]); the distinction is a tagged
//! variant on [`ChainHandler`], not runtime signature inspection. Closures
//! with the matching shapes implement both traits, and
//! [`ChainHandler::from_fn`] / [`ChainHandler::from_err_fn`] wrap them for
//! registration.

mod auth;
mod core;
mod tracing;

pub use self::auth::AuthMiddleware;
pub use self::core::{ChainHandler, ErrorMiddleware, IntoHandlerChain, Middleware};
pub use self::tracing::TracingMiddleware;
