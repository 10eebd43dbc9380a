use std::fmt;
use std::sync::Arc;

use crate::context::{RequestContext, ResponseContext};
use crate::dispatcher::{Continuation, HandlerError};

/// An ordinary handler in a dispatch chain.
///
/// Receives the shared contexts and a one-shot continuation, and must either
/// send a response, call [`Continuation::proceed`], or call
/// [`Continuation::fail`]. Doing none of the three hangs the chain (or trips
/// the dispatch timeout when one is configured).
pub trait Middleware: Send + Sync {
    fn handle(&self, req: Arc<RequestContext>, res: Arc<ResponseContext>, next: Continuation);
}

/// An error-capable handler, reached only after a chain error.
///
/// May recover by sending a response, pass the error on with
/// [`Continuation::proceed`], or replace it with [`Continuation::fail`].
pub trait ErrorMiddleware: Send + Sync {
    fn handle(
        &self,
        err: HandlerError,
        req: Arc<RequestContext>,
        res: Arc<ResponseContext>,
        next: Continuation,
    );
}

impl<F> Middleware for F
where
    F: Fn(Arc<RequestContext>, Arc<ResponseContext>, Continuation) + Send + Sync,
{
    fn handle(&self, req: Arc<RequestContext>, res: Arc<ResponseContext>, next: Continuation) {
        self(req, res, next)
    }
}

impl<F> ErrorMiddleware for F
where
    F: Fn(HandlerError, Arc<RequestContext>, Arc<ResponseContext>, Continuation) + Send + Sync,
{
    fn handle(
        &self,
        err: HandlerError,
        req: Arc<RequestContext>,
        res: Arc<ResponseContext>,
        next: Continuation,
    ) {
        self(err, req, res, next)
    }
}

/// One unit of a registered handler chain: ordinary or error-capable.
#[derive(Clone)]
pub enum ChainHandler {
    Ordinary(Arc<dyn Middleware>),
    Error(Arc<dyn ErrorMiddleware>),
}

impl ChainHandler {
    /// Wrap an ordinary handler closure.
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(Arc<RequestContext>, Arc<ResponseContext>, Continuation) + Send + Sync + 'static,
    {
        ChainHandler::Ordinary(Arc::new(f))
    }

    /// Wrap an error-handler closure.
    pub fn from_err_fn<F>(f: F) -> Self
    where
        F: Fn(HandlerError, Arc<RequestContext>, Arc<ResponseContext>, Continuation)
            + Send
            + Sync
            + 'static,
    {
        ChainHandler::Error(Arc::new(f))
    }

    /// Wrap an already-shared ordinary handler.
    #[must_use]
    pub fn ordinary(handler: Arc<dyn Middleware>) -> Self {
        ChainHandler::Ordinary(handler)
    }

    /// Wrap an already-shared error handler.
    #[must_use]
    pub fn error(handler: Arc<dyn ErrorMiddleware>) -> Self {
        ChainHandler::Error(handler)
    }

    #[must_use]
    pub fn is_error(&self) -> bool {
        matches!(self, ChainHandler::Error(_))
    }

    /// Short tag for log fields.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            ChainHandler::Ordinary(_) => "ordinary",
            ChainHandler::Error(_) => "error",
        }
    }
}

impl fmt::Debug for ChainHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kind())
    }
}

/// Anything the registration API accepts as a handler chain: a single
/// [`ChainHandler`], a `Vec` of them, or a bare ordinary-handler closure.
pub trait IntoHandlerChain {
    fn into_chain(self) -> Vec<ChainHandler>;
}

impl IntoHandlerChain for ChainHandler {
    fn into_chain(self) -> Vec<ChainHandler> {
        vec![self]
    }
}

impl IntoHandlerChain for Vec<ChainHandler> {
    fn into_chain(self) -> Vec<ChainHandler> {
        self
    }
}

impl<F> IntoHandlerChain for F
where
    F: Fn(Arc<RequestContext>, Arc<ResponseContext>, Continuation) + Send + Sync + 'static,
{
    fn into_chain(self) -> Vec<ChainHandler> {
        vec![ChainHandler::from_fn(self)]
    }
}
