use std::sync::Arc;

use tracing::info;

use super::core::Middleware;
use crate::context::{RequestContext, ResponseContext};
use crate::dispatcher::Continuation;

/// Logs each request entering the chain, then yields to the next handler.
pub struct TracingMiddleware;

impl Middleware for TracingMiddleware {
    fn handle(&self, req: Arc<RequestContext>, _res: Arc<ResponseContext>, next: Continuation) {
        info!(
            request_id = %req.request_id,
            method = %req.method,
            path = %req.path(),
            "request received"
        );
        next.proceed();
    }
}
