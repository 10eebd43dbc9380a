use std::sync::atomic::{AtomicBool, AtomicU16, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::warn;

use super::request::HeaderVec;

/// A handler tried to send after a response was already sent.
///
/// Programmer error: reported to the offending handler and counted, never
/// fatal to the dispatch of this or any other request.
#[derive(Debug, Error)]
#[error("response already sent")]
pub struct DoubleResponseError;

/// Snapshot of a sent response, taken by the transport for serialization.
#[derive(Debug, Clone, Serialize)]
pub struct ResponseParts {
    /// HTTP status code.
    pub status: u16,
    /// Response headers.
    #[serde(skip_serializing)]
    pub headers: HeaderVec,
    /// Response body.
    pub body: Value,
}

/// Per-request response state shared between the executor and handlers.
///
/// The sent-flag is the executor's chain-termination signal: a handler that
/// sends a response (instead of firing its continuation) ends the chain with
/// a `Completed` outcome. Exactly one send wins; later attempts get
/// [`DoubleResponseError`].
#[derive(Debug, Default)]
pub struct ResponseContext {
    status: AtomicU16,
    headers: Mutex<HeaderVec>,
    body: Mutex<Value>,
    claimed: AtomicBool,
    sent: AtomicBool,
    double_sends: AtomicUsize,
}

impl ResponseContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a response has been sent. Observed by the chain executor
    /// after every handler invocation.
    #[must_use]
    pub fn is_sent(&self) -> bool {
        self.sent.load(Ordering::Acquire)
    }

    /// Add or replace a header (case-insensitive on the name).
    pub fn set_header(&self, name: &str, value: impl Into<String>) {
        let mut headers = self.headers.lock().unwrap_or_else(PoisonError::into_inner);
        headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        headers.push((Arc::from(name), value.into()));
    }

    /// Get a header by name.
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<String> {
        self.headers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.clone())
    }

    /// Send a response, terminating the chain.
    ///
    /// The first send wins; any later attempt is counted, logged, and
    /// reported back to the caller as [`DoubleResponseError`].
    pub fn send(&self, status: u16, body: Value) -> Result<(), DoubleResponseError> {
        if self.claimed.swap(true, Ordering::AcqRel) {
            self.double_sends.fetch_add(1, Ordering::Relaxed);
            warn!(status, "response already sent; duplicate send dropped");
            return Err(DoubleResponseError);
        }
        {
            let mut guard = self.body.lock().unwrap_or_else(PoisonError::into_inner);
            *guard = body;
        }
        self.status.store(status, Ordering::Relaxed);
        // Parts are in place before the flag flips, so an executor that
        // observes `sent` can snapshot immediately.
        self.sent.store(true, Ordering::Release);
        Ok(())
    }

    /// Send a JSON body with the matching `content-type` header.
    pub fn send_json(&self, status: u16, body: Value) -> Result<(), DoubleResponseError> {
        self.set_header("content-type", "application/json");
        self.send(status, body)
    }

    /// Send a `{ "error": message }` JSON body.
    pub fn send_error(&self, status: u16, message: &str) -> Result<(), DoubleResponseError> {
        self.send_json(status, json!({ "error": message }))
    }

    /// How many duplicate sends were attempted against this response.
    #[must_use]
    pub fn double_send_count(&self) -> usize {
        self.double_sends.load(Ordering::Relaxed)
    }

    /// The sent status code, if a response has been sent.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        if self.is_sent() {
            Some(self.status.load(Ordering::Relaxed))
        } else {
            None
        }
    }

    /// Snapshot the sent response for the transport. `None` until sent.
    #[must_use]
    pub fn parts(&self) -> Option<ResponseParts> {
        if !self.is_sent() {
            return None;
        }
        Some(ResponseParts {
            status: self.status.load(Ordering::Relaxed),
            headers: self
                .headers
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone(),
            body: self
                .body
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone(),
        })
    }
}
