use std::sync::Arc;
use std::time::{Duration, Instant};

use http::Method;
use tracing::{debug, info, warn};

use super::matcher::{self, RouteMatch};
use super::metrics::RouterMetrics;
use super::table::{parse_method_token, MethodFilter, RouteTable};
use crate::context::{RequestContext, ResponseContext};
use crate::dispatcher::{ChainExecutor, Continuation, HandlerError, Outcome};
use crate::middleware::{ChainHandler, IntoHandlerChain, Middleware};
use crate::pattern::InvalidPatternError;
use crate::runtime_config::RuntimeConfig;

/// The dispatch facade: registration API on one side, `dispatch` on the
/// other.
///
/// Build and register during startup, then share the router (behind an
/// `Arc`) with the transport; the table is read-only during the serving
/// phase, so concurrent dispatches need no synchronization. There is no
/// process-wide router value — the transport holds whichever routers it
/// builds.
pub struct Router {
    table: RouteTable,
    globals: Vec<ChainHandler>,
    not_found: ChainHandler,
    executor: ChainExecutor,
    metrics: RouterMetrics,
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl Router {
    #[must_use]
    pub fn new() -> Self {
        Self::from_config(RuntimeConfig::default())
    }

    #[must_use]
    pub fn from_config(config: RuntimeConfig) -> Self {
        Self {
            table: RouteTable::new(),
            globals: Vec::new(),
            not_found: default_not_found(),
            executor: ChainExecutor::from_config(&config),
            metrics: RouterMetrics::new(),
        }
    }

    /// Register a route for an explicit method filter.
    pub fn route<C: IntoHandlerChain>(
        &mut self,
        method: MethodFilter,
        path: &str,
        chain: C,
    ) -> Result<&mut Self, InvalidPatternError> {
        self.table.register(method, path, chain.into_chain())?;
        Ok(self)
    }

    /// Register a regular-expression route for an explicit method filter.
    pub fn route_regex<C: IntoHandlerChain>(
        &mut self,
        method: MethodFilter,
        expr: &str,
        chain: C,
    ) -> Result<&mut Self, InvalidPatternError> {
        self.table.register_regex(method, expr, chain.into_chain())?;
        Ok(self)
    }

    pub fn get<C: IntoHandlerChain>(
        &mut self,
        path: &str,
        chain: C,
    ) -> Result<&mut Self, InvalidPatternError> {
        self.route(MethodFilter::Only(Method::GET), path, chain)
    }

    pub fn post<C: IntoHandlerChain>(
        &mut self,
        path: &str,
        chain: C,
    ) -> Result<&mut Self, InvalidPatternError> {
        self.route(MethodFilter::Only(Method::POST), path, chain)
    }

    pub fn put<C: IntoHandlerChain>(
        &mut self,
        path: &str,
        chain: C,
    ) -> Result<&mut Self, InvalidPatternError> {
        self.route(MethodFilter::Only(Method::PUT), path, chain)
    }

    pub fn delete<C: IntoHandlerChain>(
        &mut self,
        path: &str,
        chain: C,
    ) -> Result<&mut Self, InvalidPatternError> {
        self.route(MethodFilter::Only(Method::DELETE), path, chain)
    }

    pub fn patch<C: IntoHandlerChain>(
        &mut self,
        path: &str,
        chain: C,
    ) -> Result<&mut Self, InvalidPatternError> {
        self.route(MethodFilter::Only(Method::PATCH), path, chain)
    }

    pub fn head<C: IntoHandlerChain>(
        &mut self,
        path: &str,
        chain: C,
    ) -> Result<&mut Self, InvalidPatternError> {
        self.route(MethodFilter::Only(Method::HEAD), path, chain)
    }

    pub fn options<C: IntoHandlerChain>(
        &mut self,
        path: &str,
        chain: C,
    ) -> Result<&mut Self, InvalidPatternError> {
        self.route(MethodFilter::Only(Method::OPTIONS), path, chain)
    }

    /// Register a route matching every method.
    pub fn all<C: IntoHandlerChain>(
        &mut self,
        path: &str,
        chain: C,
    ) -> Result<&mut Self, InvalidPatternError> {
        self.route(MethodFilter::Any, path, chain)
    }

    /// Register globally-mounted middleware, prepended to every dispatched
    /// chain (including dispatches that match no route).
    pub fn use_middleware<C: IntoHandlerChain>(&mut self, chain: C) -> &mut Self {
        self.globals.extend(chain.into_chain());
        self
    }

    /// Mount ALL-method, prefix-matched middleware under a literal prefix.
    ///
    /// The entry competes in the route table under strict registration
    /// order, so a mount registered before an overlapping route wins the
    /// match. No parameters are extracted; the unmatched suffix is exposed
    /// as the request's remaining path, which is what a mounted sub-router
    /// dispatches against.
    pub fn mount<C: IntoHandlerChain>(
        &mut self,
        prefix: &str,
        chain: C,
    ) -> Result<&mut Self, InvalidPatternError> {
        self.table.register_prefix(prefix, chain.into_chain())?;
        Ok(self)
    }

    /// Replace the default not-found handler (404 JSON).
    pub fn set_not_found(&mut self, handler: ChainHandler) {
        self.not_found = handler;
    }

    #[must_use]
    pub fn metrics(&self) -> &RouterMetrics {
        &self.metrics
    }

    /// Print all registered routes to stdout.
    pub fn dump_routes(&self) {
        println!("[routes] count={} globals={}", self.table.len(), self.globals.len());
        for route in self.table.routes() {
            println!(
                "[route] {} {} kind={} handlers={}",
                route.method,
                route.source,
                route.pattern.kind(),
                route.chain.len()
            );
        }
    }

    /// Dispatch one request to its terminal outcome.
    ///
    /// Runs the matcher, executes the composed chain (global middleware
    /// first, then the matched entry's handlers), and falls through to the
    /// not-found handler when nothing matches or the chain runs out
    /// unhandled. Never unwinds: handler panics surface as `Failed`.
    #[must_use]
    pub fn dispatch(&self, req: &Arc<RequestContext>, res: &Arc<ResponseContext>) -> Outcome {
        let start = Instant::now();
        self.metrics.record_dispatch();
        info!(
            request_id = %req.request_id,
            method = %req.method,
            path = %req.path(),
            "dispatching request"
        );

        let matched = matcher::match_route(&self.table, &req.method, req.path());
        if let Some(m) = &matched {
            req.set_remaining_path(m.remaining_path.clone());
        }
        let outcome = self.run_match(&matched, req, res);
        let outcome = match outcome {
            Outcome::Unhandled => {
                self.metrics.record_not_found();
                debug!(
                    request_id = %req.request_id,
                    "chain unhandled; invoking not-found handler"
                );
                let fallback = [self.not_found.clone()];
                self.executor.execute(&fallback, req, res)
            }
            other => other,
        };

        let latency = start.elapsed();
        self.metrics.record_outcome(&outcome, latency);
        info!(
            request_id = %req.request_id,
            outcome = outcome.label(),
            status = res.status(),
            latency_us = latency.as_micros() as u64,
            "dispatch complete"
        );
        outcome
    }

    /// Dispatch from raw transport tokens.
    ///
    /// Unsupported method tokens short-circuit straight to a 404 response
    /// without consulting the table.
    pub fn dispatch_parts(&self, method: &str, path: &str, res: &Arc<ResponseContext>) -> Outcome {
        match parse_method_token(method) {
            Some(method) => {
                let req = Arc::new(RequestContext::new(method, path));
                self.dispatch(&req, res)
            }
            None => {
                warn!(method = %method, path = %path, "unsupported method token; request not routed");
                self.metrics.record_dispatch();
                self.metrics.record_not_found();
                let _ = res.send_error(404, "Not Found");
                let outcome = Outcome::Completed;
                self.metrics.record_outcome(&outcome, Duration::ZERO);
                outcome
            }
        }
    }

    /// Compose and execute the chain for a match (or lack of one).
    fn run_match(
        &self,
        matched: &Option<RouteMatch>,
        req: &Arc<RequestContext>,
        res: &Arc<ResponseContext>,
    ) -> Outcome {
        let route_len = matched.as_ref().map_or(0, |m| m.route.chain.len());
        let mut chain: Vec<ChainHandler> = Vec::with_capacity(self.globals.len() + route_len);
        chain.extend(self.globals.iter().cloned());
        if let Some(m) = matched {
            req.merge_path_params(&m.params);
            chain.extend(m.route.chain.iter().cloned());
        }
        if chain.is_empty() {
            return Outcome::Unhandled;
        }
        self.executor.execute(&chain, req, res)
    }

    /// Dispatch as a mounted sub-router: match against the remaining path
    /// left by the parent's prefix mount, with no not-found fallback so an
    /// unmatched request falls back through the parent chain.
    fn handle_mounted(&self, req: &Arc<RequestContext>, res: &Arc<ResponseContext>) -> Outcome {
        let effective = req
            .remaining_path()
            .unwrap_or_else(|| req.path().to_string());
        debug!(
            request_id = %req.request_id,
            path = %effective,
            "dispatching into mounted router"
        );
        let matched = matcher::match_route(&self.table, &req.method, &effective);
        if matched.is_none() && self.globals.is_empty() {
            return Outcome::Unhandled;
        }
        let previous = req.set_remaining_path(
            matched.as_ref().and_then(|m| m.remaining_path.clone()),
        );
        let outcome = self.run_match(&matched, req, res);
        req.set_remaining_path(previous);
        outcome
    }
}

/// A router is itself mountable as middleware: dispatch against the mount's
/// remaining path and translate the sub-outcome back into continuation
/// signals.
impl Middleware for Router {
    fn handle(&self, req: Arc<RequestContext>, res: Arc<ResponseContext>, next: Continuation) {
        match self.handle_mounted(&req, &res) {
            Outcome::Completed | Outcome::Cancelled => {}
            Outcome::Unhandled => next.proceed(),
            Outcome::Failed(err) => next.fail(err),
            Outcome::TimedOut => next.fail(HandlerError::msg("mounted router dispatch timed out")),
        }
    }
}

fn default_not_found() -> ChainHandler {
    ChainHandler::from_fn(
        |_req: Arc<RequestContext>, res: Arc<ResponseContext>, _next: Continuation| {
            let _ = res.send_error(404, "Not Found");
        },
    )
}
