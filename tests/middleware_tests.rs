//! Tests for built-in middleware, globally-mounted middleware ordering, and
//! dispatch metrics.

use std::sync::{Arc, Mutex};

use http::Method;
use serde_json::json;
use smallvec::smallvec;
use stackroute::{
    AuthMiddleware, ChainHandler, Continuation, HeaderVec, Outcome, RequestContext,
    ResponseContext, Router, TracingMiddleware,
};

mod tracing_util;
use tracing_util::TestTracing;

fn make_res() -> Arc<ResponseContext> {
    Arc::new(ResponseContext::new())
}

fn send_tag(tag: &'static str) -> ChainHandler {
    ChainHandler::from_fn(move |_req, res: Arc<ResponseContext>, _next| {
        let _ = res.send_json(200, json!({ "tag": tag }));
    })
}

fn request_with_auth(path: &str, token: Option<&str>) -> Arc<RequestContext> {
    let mut headers = HeaderVec::new();
    if let Some(token) = token {
        headers.push((Arc::from("authorization"), token.to_string()));
    }
    Arc::new(RequestContext::new(Method::GET, path).with_headers(headers))
}

#[test]
fn auth_middleware_rejects_missing_or_wrong_tokens() {
    let _tracing = TestTracing::init();
    let mut router = Router::new();
    router.use_middleware(ChainHandler::ordinary(Arc::new(AuthMiddleware::new(
        "sesame".to_string(),
    ))));
    router.get("/private", send_tag("private")).unwrap();

    for token in [None, Some("wrong")] {
        let res = make_res();
        let outcome = router.dispatch(&request_with_auth("/private", token), &res);
        assert!(matches!(outcome, Outcome::Completed));
        let parts = res.parts().unwrap();
        assert_eq!(parts.status, 401);
        assert_eq!(parts.body, json!({ "error": "Unauthorized" }));
    }
}

#[test]
fn auth_middleware_passes_valid_tokens_through() {
    let _tracing = TestTracing::init();
    let mut router = Router::new();
    router.use_middleware(ChainHandler::ordinary(Arc::new(AuthMiddleware::new(
        "sesame".to_string(),
    ))));
    router.get("/private", send_tag("private")).unwrap();

    let res = make_res();
    let outcome = router.dispatch(&request_with_auth("/private", Some("sesame")), &res);
    assert!(matches!(outcome, Outcome::Completed));
    assert_eq!(res.parts().unwrap().body, json!({ "tag": "private" }));
}

#[test]
fn tracing_middleware_is_transparent() {
    let _tracing = TestTracing::init();
    let mut router = Router::new();
    router.use_middleware(ChainHandler::ordinary(Arc::new(TracingMiddleware)));
    router.get("/traced", send_tag("traced")).unwrap();

    let req = Arc::new(RequestContext::new(Method::GET, "/traced"));
    let res = make_res();
    assert!(matches!(router.dispatch(&req, &res), Outcome::Completed));
    assert_eq!(res.parts().unwrap().body, json!({ "tag": "traced" }));
}

#[test]
fn globals_run_before_the_matched_chain() {
    let _tracing = TestTracing::init();
    let order = Arc::new(Mutex::new(Vec::new()));

    let mut router = Router::new();
    let sink = Arc::clone(&order);
    router.use_middleware(ChainHandler::from_fn(move |_req, _res, next: Continuation| {
        sink.lock().unwrap().push("global");
        next.proceed();
    }));
    let sink = Arc::clone(&order);
    router
        .get(
            "/ordered",
            ChainHandler::from_fn(move |_req, res: Arc<ResponseContext>, _next| {
                sink.lock().unwrap().push("route");
                let _ = res.send_json(200, json!(null));
            }),
        )
        .unwrap();

    let req = Arc::new(RequestContext::new(Method::GET, "/ordered"));
    let res = make_res();
    let _ = router.dispatch(&req, &res);
    assert_eq!(*order.lock().unwrap(), vec!["global", "route"]);
}

#[test]
fn globals_may_short_circuit_the_route() {
    let _tracing = TestTracing::init();
    let mut router = Router::new();
    router.use_middleware(ChainHandler::from_fn(
        |_req, res: Arc<ResponseContext>, _next| {
            let _ = res.send_json(503, json!({ "maintenance": true }));
        },
    ));
    router.get("/anything", send_tag("never")).unwrap();

    let req = Arc::new(RequestContext::new(Method::GET, "/anything"));
    let res = make_res();
    assert!(matches!(router.dispatch(&req, &res), Outcome::Completed));
    assert_eq!(res.status(), Some(503));
}

#[test]
fn globals_run_even_when_no_route_matches() {
    let _tracing = TestTracing::init();
    let order = Arc::new(Mutex::new(Vec::new()));

    let mut router = Router::new();
    let sink = Arc::clone(&order);
    router.use_middleware(ChainHandler::from_fn(move |_req, _res, next: Continuation| {
        sink.lock().unwrap().push("global");
        next.proceed();
    }));

    let req = Arc::new(RequestContext::new(Method::GET, "/nothing-here"));
    let res = make_res();
    let outcome = router.dispatch(&req, &res);

    assert!(matches!(outcome, Outcome::Completed));
    assert_eq!(res.status(), Some(404));
    assert_eq!(*order.lock().unwrap(), vec!["global"]);
}

#[test]
fn error_middleware_recovers_route_failures() {
    let _tracing = TestTracing::init();
    let mut router = Router::new();
    router
        .get(
            "/fragile",
            vec![
                ChainHandler::from_fn(|_req, _res, next: Continuation| next.fail("backend down")),
                ChainHandler::from_err_fn(
                    |err: stackroute::HandlerError,
                     _req,
                     res: Arc<ResponseContext>,
                     _next: Continuation| {
                        let _ = res.send_error(502, &err.to_string());
                    },
                ),
            ],
        )
        .unwrap();

    let req = Arc::new(RequestContext::new(Method::GET, "/fragile"));
    let res = make_res();
    assert!(matches!(router.dispatch(&req, &res), Outcome::Completed));
    let parts = res.parts().unwrap();
    assert_eq!(parts.status, 502);
    assert_eq!(parts.body, json!({ "error": "backend down" }));
}

#[test]
fn metrics_count_dispatches_and_outcomes() {
    let _tracing = TestTracing::init();
    let mut router = Router::new();
    router.get("/hit", send_tag("hit")).unwrap();

    for _ in 0..3 {
        let req = Arc::new(RequestContext::new(Method::GET, "/hit"));
        let res = make_res();
        let _ = router.dispatch(&req, &res);
    }
    let req = Arc::new(RequestContext::new(Method::GET, "/miss"));
    let res = make_res();
    let _ = router.dispatch(&req, &res);

    let metrics = router.metrics();
    assert_eq!(metrics.request_count(), 4);
    assert_eq!(metrics.completed_count(), 4);
    assert_eq!(metrics.not_found_count(), 1);
    assert_eq!(metrics.failed_count(), 0);
}

#[test]
fn cookies_and_headers_reach_handlers() {
    let _tracing = TestTracing::init();
    let mut router = Router::new();
    router
        .get(
            "/whoami",
            |req: Arc<RequestContext>, res: Arc<ResponseContext>, _next: Continuation| {
                let _ = res.send_json(
                    200,
                    json!({
                        "agent": req.get_header("User-Agent"),
                        "session": req.get_cookie("session"),
                    }),
                );
            },
        )
        .unwrap();

    let headers: HeaderVec = smallvec![
        (Arc::from("user-agent"), "curl/8".to_string()),
        (Arc::from("cookie"), "session=abc123".to_string()),
    ];
    let req = Arc::new(RequestContext::new(Method::GET, "/whoami").with_headers(headers));
    let res = make_res();
    let _ = router.dispatch(&req, &res);

    assert_eq!(
        res.parts().unwrap().body,
        json!({ "agent": "curl/8", "session": "abc123" })
    );
}
