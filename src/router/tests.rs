use http::Method;

use super::matcher::match_route;
use super::table::{parse_method_token, MethodFilter, RouteKind, RouteTable};
use crate::middleware::ChainHandler;

fn noop() -> Vec<ChainHandler> {
    vec![ChainHandler::from_fn(|_req, _res, next| next.proceed())]
}

#[test]
fn method_filter_accepts() {
    assert!(MethodFilter::Any.accepts(&Method::DELETE));
    assert!(MethodFilter::Only(Method::GET).accepts(&Method::GET));
    assert!(!MethodFilter::Only(Method::GET).accepts(&Method::POST));
}

#[test]
fn parse_method_token_covers_the_supported_set() {
    for token in ["GET", "post", "Put", "DELETE", "patch", "HEAD", "options"] {
        assert!(parse_method_token(token).is_some(), "token {token}");
    }
    assert!(parse_method_token("BREW").is_none());
}

#[test]
fn lookup_preserves_registration_order() {
    let mut table = RouteTable::new();
    table
        .register(MethodFilter::Only(Method::GET), "/a", noop())
        .unwrap();
    table.register(MethodFilter::Any, "/b", noop()).unwrap();
    table
        .register(MethodFilter::Only(Method::POST), "/c", noop())
        .unwrap();

    let indices: Vec<usize> = table.lookup(&Method::GET).map(|r| r.index).collect();
    assert_eq!(indices, vec![0, 1]);
}

#[test]
fn failed_registration_leaves_the_table_untouched() {
    let mut table = RouteTable::new();
    assert!(table
        .register(MethodFilter::Only(Method::GET), "/users/:", noop())
        .is_err());
    assert!(table.is_empty());
}

#[test]
fn first_registered_first_matched() {
    let mut table = RouteTable::new();
    table
        .register(MethodFilter::Only(Method::GET), "/users/:id", noop())
        .unwrap();
    table
        .register(MethodFilter::Only(Method::GET), "/users/admin", noop())
        .unwrap();

    let matched = match_route(&table, &Method::GET, "/users/admin").unwrap();
    assert_eq!(matched.route.index, 0);
    assert_eq!(matched.params[0].1, "admin");
}

#[test]
fn query_string_never_participates_in_matching() {
    let mut table = RouteTable::new();
    table
        .register(MethodFilter::Only(Method::GET), "/search/:term", noop())
        .unwrap();

    let matched = match_route(&table, &Method::GET, "/search/rust?limit=10").unwrap();
    assert_eq!(matched.params[0].1, "rust");
}

#[test]
fn prefix_mounts_match_on_segment_boundaries() {
    let mut table = RouteTable::new();
    table.register_prefix("/static", noop()).unwrap();

    let matched = match_route(&table, &Method::GET, "/static/css/app.css").unwrap();
    assert_eq!(matched.route.kind, RouteKind::Prefix);
    assert_eq!(matched.remaining_path.as_deref(), Some("/css/app.css"));

    let exact = match_route(&table, &Method::GET, "/static").unwrap();
    assert_eq!(exact.remaining_path.as_deref(), Some("/"));

    assert!(match_route(&table, &Method::GET, "/staticfile").is_none());
}

#[test]
fn root_mount_matches_everything() {
    let mut table = RouteTable::new();
    table.register_prefix("/", noop()).unwrap();

    let matched = match_route(&table, &Method::PUT, "/anything/at/all").unwrap();
    assert_eq!(matched.remaining_path.as_deref(), Some("/anything/at/all"));
}

#[test]
fn non_literal_prefix_is_rejected() {
    let mut table = RouteTable::new();
    assert!(table.register_prefix("/api/:version", noop()).is_err());
    assert!(table.register_prefix("/files/*", noop()).is_err());
}

#[test]
fn no_match_is_a_normal_outcome() {
    let mut table = RouteTable::new();
    table
        .register(MethodFilter::Only(Method::GET), "/only", noop())
        .unwrap();
    assert!(match_route(&table, &Method::POST, "/only").is_none());
    assert!(match_route(&table, &Method::GET, "/other").is_none());
}
