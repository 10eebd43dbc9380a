//! # Dispatcher Module
//!
//! The dispatcher module executes a matched handler chain with explicit
//! continuation control.
//!
//! ## Overview
//!
//! A chain is an ordered sequence of [`crate::middleware::ChainHandler`]s.
//! Each ordinary handler receives the shared request/response contexts and a
//! one-shot [`Continuation`]. It then does exactly one of three things:
//!
//! - sends a response through the response context — the chain ends with
//!   [`Outcome::Completed`];
//! - calls [`Continuation::proceed`] — control moves to the next ordinary
//!   handler, or the chain ends with [`Outcome::Unhandled`] when none remain;
//! - calls [`Continuation::fail`] — remaining ordinary handlers are skipped
//!   and control transfers to the error-capable handlers, in their own
//!   registration order.
//!
//! ## The wait loop
//!
//! "Response sent" and "continuation fired" are alternative signals a
//! handler chooses between, so after each invocation the executor polls
//! both: the response sent-flag first, then the continuation channel, then
//! cancellation and the optional deadline. The poll yields through
//! `may::coroutine::sleep` inside a coroutine and a thread sleep otherwise,
//! which is what lets a handler hand its continuation (or the response
//! context) to a spawned coroutine and resolve the chain later.
//!
//! A handler that does none of the three leaves the request hanging. That
//! hazard is intended and documented; it is only converted into
//! [`Outcome::TimedOut`] when a dispatch timeout is configured.
//!
//! ## Error handling
//!
//! Handler panics are caught and converted into chain errors, so a broken
//! handler degrades into the error chain instead of unwinding through the
//! dispatch entry point.

mod core;

pub use self::core::{CancelToken, ChainExecutor, Continuation, HandlerError, Outcome};
