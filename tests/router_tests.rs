//! Tests for the pattern router
//!
//! # Test Coverage
//!
//! Validates the router's core responsibilities:
//! - Pattern matching and part extraction
//! - Reverse registration-order matching (last registered wins)
//! - Method and hostname constraints via the request collaborator
//! - Converters, before-match predicates, and lifecycle listeners
//! - Defaults, not-found paths, and extra-slash handling

use std::cell::RefCell;
use std::rc::Rc;

use http::Method;
use peregrine::errors::RouterError;
use peregrine::events::Flow;
use peregrine::router::{ParamVec, PathSpec, PathTarget, RoutePosition, Router, RouterEvent};
use peregrine::request::RequestSnapshot;
use smallvec::smallvec;

fn get() -> RequestSnapshot {
    RequestSnapshot::new(Method::GET)
}

#[test]
fn test_shorthand_route_resolves_controller_and_action() {
    let mut router = Router::new();
    router.add("/users/{id:[0-9]+}", "Users::show", None).unwrap();

    router.handle("/users/42", Some(&get())).unwrap();

    assert!(router.was_matched());
    assert_eq!(router.controller_name(), Some("users"));
    assert_eq!(router.action_name(), Some("show"));
    assert_eq!(router.params().as_slice(), &[("id".to_string(), "42".to_string())]);
}

#[test]
fn test_empty_uri_is_handled_as_root() {
    let mut router = Router::new();
    router.add("/", "Index::index", None).unwrap();

    router.handle("", Some(&get())).unwrap();

    assert!(router.was_matched());
    assert_eq!(router.controller_name(), Some("index"));
}

#[test]
fn last_registered_route_wins_tie_break() {
    let mut router = Router::new();
    let first = router.add("/ping", "First::hit", None).unwrap().route_id();
    let second = router.add("/ping", "Second::hit", None).unwrap().route_id();
    assert_ne!(first, second);

    router.handle("/ping", Some(&get())).unwrap();

    assert!(router.was_matched());
    assert_eq!(router.controller_name(), Some("second"));
    assert_eq!(router.matched_route().map(|r| r.route_id()), Some(second));
}

#[test]
fn test_add_at_first_loses_the_tie_break() {
    let mut router = Router::new();
    router.add("/ping", "Old::hit", None).unwrap();
    router
        .add_at("/ping", "New::hit", None, RoutePosition::First)
        .unwrap();

    router.handle("/ping", Some(&get())).unwrap();

    // Placed first in the list, so tried last under reverse iteration.
    assert_eq!(router.controller_name(), Some("old"));
}

#[test]
fn test_method_constraint_filters_overlapping_routes() {
    let mut router = Router::new();
    router.add_get("/ping", "Ping::viaGet").unwrap();
    router.add_post("/ping", "Ping::viaPost").unwrap();

    router.handle("/ping", Some(&RequestSnapshot::new(Method::GET))).unwrap();
    assert_eq!(router.action_name(), Some("viaGet"));

    router.handle("/ping", Some(&RequestSnapshot::new(Method::POST))).unwrap();
    assert_eq!(router.action_name(), Some("viaPost"));

    router.handle("/ping", Some(&RequestSnapshot::new(Method::DELETE))).unwrap();
    assert!(!router.was_matched());
}

#[test]
fn test_constrained_route_without_request_is_an_error() {
    let mut router = Router::new();
    router.add_get("/ping", "Ping::hit").unwrap();

    let err = router.handle("/ping", None).unwrap_err();
    assert!(matches!(err, RouterError::RequestUnavailable { .. }));
}

#[test]
fn test_unconstrained_routes_match_without_a_request() {
    let mut router = Router::new();
    router.add("/ping", "Ping::hit", None).unwrap();

    router.handle("/ping", None).unwrap();
    assert!(router.was_matched());
}

#[test]
fn test_literal_hostname_constraint() {
    let mut router = Router::new();
    router
        .add("/reports", "Public::reports", None)
        .unwrap();
    router
        .add("/reports", "Admin::reports", None)
        .unwrap()
        .set_hostname("admin.example.com")
        .unwrap();

    let admin = RequestSnapshot::new(Method::GET).with_host("admin.example.com");
    router.handle("/reports", Some(&admin)).unwrap();
    assert_eq!(router.controller_name(), Some("admin"));

    let public = RequestSnapshot::new(Method::GET).with_host("www.example.com");
    router.handle("/reports", Some(&public)).unwrap();
    assert_eq!(router.controller_name(), Some("public"));
}

#[test]
fn test_regex_hostname_constraint() {
    let mut router = Router::new();
    router
        .add("/reports", "Tenant::reports", None)
        .unwrap()
        .set_hostname(r"([a-z]+)\.example\.com")
        .unwrap();

    let tenant = RequestSnapshot::new(Method::GET).with_host("acme.example.com");
    router.handle("/reports", Some(&tenant)).unwrap();
    assert!(router.was_matched());

    let other = RequestSnapshot::new(Method::GET).with_host("acme.example.org");
    router.handle("/reports", Some(&other)).unwrap();
    assert!(!router.was_matched());
}

#[test]
fn test_host_constrained_route_skipped_when_request_has_no_host() {
    let mut router = Router::new();
    router
        .add("/reports", "Admin::reports", None)
        .unwrap()
        .set_hostname("admin.example.com")
        .unwrap();

    router.handle("/reports", Some(&get())).unwrap();
    assert!(!router.was_matched());
}

#[test]
fn test_converters_transform_extracted_values() {
    let mut router = Router::new();
    router
        .add("/posts/{slug}", "Posts::show", None)
        .unwrap()
        .convert("slug", |value| value.to_uppercase());

    router.handle("/posts/hello-world", Some(&get())).unwrap();
    assert_eq!(
        router.params().as_slice(),
        &[("slug".to_string(), "HELLO-WORLD".to_string())]
    );
}

#[test]
fn test_converters_apply_to_literal_parts_too() {
    let mut router = Router::new();
    router
        .add("/about", "About::index", None)
        .unwrap()
        .convert("action", |value| format!("{value}Page"));

    router.handle("/about", Some(&get())).unwrap();
    assert_eq!(router.action_name(), Some("indexPage"));
}

#[test]
fn test_before_match_rejection_falls_through_to_earlier_routes() {
    let mut router = Router::new();
    router.add("/api/data", "V1::data", None).unwrap();
    router
        .add("/api/data", "V2::data", None)
        .unwrap()
        .before_match(|_uri, _route| false);

    router.handle("/api/data", Some(&get())).unwrap();
    assert_eq!(router.controller_name(), Some("v1"));
}

#[test]
fn test_before_match_receives_the_handled_uri() {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let mut router = Router::new();
    let uris = Rc::clone(&seen);
    router
        .add("/api/data", "Api::data", None)
        .unwrap()
        .before_match(move |uri, _route| {
            uris.borrow_mut().push(uri.to_string());
            true
        });

    router.handle("/api/data", Some(&get())).unwrap();
    assert!(router.was_matched());
    assert_eq!(seen.borrow().as_slice(), &["/api/data".to_string()]);
}

#[test]
fn test_not_found_paths_apply_when_nothing_matches() {
    let mut router = Router::new();
    router.add("/known", "Known::index", None).unwrap();
    router.not_found("Errors::show404").unwrap();

    router.handle("/missing", Some(&get())).unwrap();

    assert!(!router.was_matched());
    assert_eq!(router.controller_name(), Some("errors"));
    assert_eq!(router.action_name(), Some("show404"));
}

#[test]
fn test_defaults_fill_unresolved_parts() {
    let mut router = Router::new();
    router.set_defaults(Some("App"), Some("frontend"), Some("index"), Some("index"));
    router
        .add(
            "/sessions/{action}",
            PathSpec::map([("controller", PathTarget::Literal("sessions".to_string()))]),
            None,
        )
        .unwrap();

    router.handle("/sessions/login", Some(&get())).unwrap();

    assert_eq!(router.namespace_name(), Some("App"));
    assert_eq!(router.module_name(), Some("frontend"));
    assert_eq!(router.controller_name(), Some("sessions"));
    assert_eq!(router.action_name(), Some("login"));
}

#[test]
fn test_default_params_apply_only_when_nothing_matches() {
    let defaults: ParamVec = smallvec![("page".to_string(), "1".to_string())];
    let mut router = Router::new();
    router.set_default_params(defaults);
    router.add("/list", "Items::list", None).unwrap();

    // A match rebuilds the params from scratch, even when it captures none.
    router.handle("/list", Some(&get())).unwrap();
    assert!(router.params().is_empty());

    router.handle("/absent", Some(&get())).unwrap();
    assert_eq!(router.params().as_slice(), &[("page".to_string(), "1".to_string())]);
}

#[test]
fn test_numeric_capture_never_clobbers_semantic_slots() {
    let mut router = Router::new();
    router.set_default_controller("index");
    router
        .add(
            r"^/c/([a-zA-Z0-9]+)$",
            PathSpec::map([("controller", PathTarget::Position(1))]),
            None,
        )
        .unwrap();

    router.handle("/c/12", Some(&get())).unwrap();
    assert!(router.was_matched());
    assert_eq!(router.controller_name(), Some("index"));

    router.handle("/c/shop", Some(&get())).unwrap();
    assert_eq!(router.controller_name(), Some("shop"));
}

#[test]
fn test_params_part_is_split_into_positional_entries() {
    let mut router = Router::with_default_routes().unwrap();

    router.handle("/users/show/7/full", Some(&get())).unwrap();

    assert_eq!(router.controller_name(), Some("users"));
    assert_eq!(router.action_name(), Some("show"));
    assert_eq!(
        router.params().as_slice(),
        &[
            ("0".to_string(), "7".to_string()),
            ("1".to_string(), "full".to_string()),
        ]
    );
}

#[test]
fn test_conventional_route_without_params() {
    let mut router = Router::with_default_routes().unwrap();

    router.handle("/users", Some(&get())).unwrap();
    assert_eq!(router.controller_name(), Some("users"));
    assert!(router.params().is_empty());
}

#[test]
fn test_remove_extra_slashes() {
    let mut router = Router::new();
    router.remove_extra_slashes(true);
    router.add("/users", "Users::index", None).unwrap();
    router.add("/", "Index::index", None).unwrap();

    router.handle("/users///", Some(&get())).unwrap();
    assert_eq!(router.controller_name(), Some("users"));

    // The root URI is never stripped to an empty string.
    router.handle("/", Some(&get())).unwrap();
    assert_eq!(router.controller_name(), Some("index"));
}

#[test]
fn test_trailing_slash_differs_without_slash_removal() {
    let mut router = Router::new();
    router.add("/users", "Users::index", None).unwrap();

    router.handle("/users/", Some(&get())).unwrap();
    assert!(!router.was_matched());
}

#[test]
fn test_route_lookup_by_id_and_name() {
    let mut router = Router::new();
    let id = {
        let route = router.add("/users", "Users::index", None).unwrap();
        route.set_name("users-index");
        route.route_id()
    };
    router.add("/posts", "Posts::index", None).unwrap();

    assert_eq!(router.get_route_by_id(id).map(|r| r.pattern()), Some("/users"));
    assert_eq!(
        router.get_route_by_name("users-index").map(|r| r.route_id()),
        Some(id)
    );
    assert!(router.get_route_by_name("missing").is_none());
}

#[test]
fn test_route_ids_stay_unique_across_clear() {
    let mut router = Router::new();
    let first = router.add("/a", "A::index", None).unwrap().route_id();
    router.clear();
    assert!(router.routes().is_empty());

    let second = router.add("/b", "B::index", None).unwrap().route_id();
    assert_ne!(first, second);
}

#[test]
fn test_before_check_routes_cancel_skips_matching_and_not_found() {
    let mut router = Router::new();
    router.set_default_controller("home");
    router.add("/known", "Known::index", None).unwrap();
    router.not_found("Errors::show404").unwrap();
    router.on(RouterEvent::BeforeCheckRoutes, |_uri, _route| Flow::Cancel);

    router.handle("/known", Some(&get())).unwrap();

    assert!(!router.was_matched());
    // Cancelled handling counts as "never checked": the not-found paths do
    // not apply and only defaults remain.
    assert_eq!(router.controller_name(), Some("home"));
}

#[test]
fn test_before_check_route_cancel_skips_a_single_route() {
    let mut router = Router::new();
    router.add("/ping", "First::hit", None).unwrap();
    let skipped = router.add("/ping", "Second::hit", None).unwrap().route_id();
    router.on(RouterEvent::BeforeCheckRoute, move |_uri, route| {
        if route.map(|r| r.route_id()) == Some(skipped) {
            Flow::Cancel
        } else {
            Flow::Continue
        }
    });

    router.handle("/ping", Some(&get())).unwrap();
    assert_eq!(router.controller_name(), Some("first"));
}

#[test]
fn test_lifecycle_events_fire_in_order() {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let mut router = Router::new();
    router.add("/miss", "Miss::index", None).unwrap();
    router.add("/ping", "Ping::hit", None).unwrap();

    for (event, label) in [
        (RouterEvent::BeforeCheckRoutes, "before_check_routes"),
        (RouterEvent::BeforeCheckRoute, "before_check_route"),
        (RouterEvent::NotMatchedRoute, "not_matched"),
        (RouterEvent::MatchedRoute, "matched"),
        (RouterEvent::AfterCheckRoutes, "after_check_routes"),
    ] {
        let log = Rc::clone(&seen);
        router.on(event, move |_uri, _route| {
            log.borrow_mut().push(label);
            Flow::Continue
        });
    }

    router.handle("/ping", Some(&get())).unwrap();

    assert_eq!(
        seen.borrow().as_slice(),
        &[
            "before_check_routes",
            "before_check_route",
            "matched",
            "after_check_routes",
        ]
    );

    seen.borrow_mut().clear();
    router.handle("/absent", Some(&get())).unwrap();
    assert_eq!(
        seen.borrow().as_slice(),
        &[
            "before_check_routes",
            "before_check_route",
            "not_matched",
            "before_check_route",
            "not_matched",
        ]
    );
}

#[test]
fn test_matched_route_is_observable_after_handle() {
    let mut router = Router::new();
    router.add("/users/{id}", "Users::show", None).unwrap();

    router.handle("/users/3", Some(&get())).unwrap();
    let matched = router.matched_route().unwrap();
    assert_eq!(matched.pattern(), "/users/{id}");

    router.handle("/nope", Some(&get())).unwrap();
    assert!(router.matched_route().is_none());
}
