use std::sync::Arc;

use super::core::Middleware;
use crate::context::{RequestContext, ResponseContext};
use crate::dispatcher::Continuation;

/// Shared-token authentication middleware.
///
/// Compares the `authorization` header against a configured token and
/// either yields to the rest of the chain or answers 401 on the spot.
pub struct AuthMiddleware {
    token: String,
}

impl AuthMiddleware {
    #[must_use]
    pub fn new(token: String) -> Self {
        Self { token }
    }
}

impl Middleware for AuthMiddleware {
    fn handle(&self, req: Arc<RequestContext>, res: Arc<ResponseContext>, next: Continuation) {
        match req.get_header("authorization") {
            Some(value) if value == self.token => next.proceed(),
            _ => {
                let _ = res.send_error(401, "Unauthorized");
            }
        }
    }
}
