use http::Method;

use crate::errors::RouterError;

use super::route::{PathSpec, PathTarget, Route};

fn route(pattern: &str) -> Route {
    Route::new(0, pattern, PathSpec::None, None).expect("route should compile")
}

#[test]
fn test_literal_pattern_compiles_to_string_comparison() {
    let r = route("/about");
    assert_eq!(r.compiled_pattern(), "/about");
    assert!(r.try_match("/about").is_some());
    assert!(r.try_match("/about/us").is_none());
}

#[test]
fn test_placeholder_pattern() {
    let r = route("/items/{id}");
    assert_eq!(r.paths(), &[("id".to_string(), PathTarget::Position(1))]);
    let captures = r.try_match("/items/123").expect("should match");
    assert_eq!(captures[1].as_deref(), Some("123"));
    assert!(r.try_match("/items/").is_none());
    assert!(r.try_match("/items/1/2").is_none());
}

#[test]
fn test_placeholder_with_custom_regex() {
    let r = route("/users/{id:[0-9]+}");
    assert!(r.try_match("/users/42").is_some());
    assert!(r.try_match("/users/abc").is_none());
}

#[test]
fn test_placeholder_regex_with_repetition_braces() {
    let r = route("/year/{y:[0-9]{4}}");
    assert!(r.try_match("/year/2015").is_some());
    assert!(r.try_match("/year/15").is_none());
}

#[test]
fn test_positions_are_assigned_left_to_right_from_one() {
    let r = route("/docs/{chapter}/{name:[a-z]+}");
    assert_eq!(
        r.paths(),
        &[
            ("chapter".to_string(), PathTarget::Position(1)),
            ("name".to_string(), PathTarget::Position(2)),
        ]
    );
    let captures = r.try_match("/docs/intro/routing").expect("should match");
    assert_eq!(captures[1].as_deref(), Some("intro"));
    assert_eq!(captures[2].as_deref(), Some("routing"));
}

#[test]
fn test_fragment_capture_groups_shift_later_positions() {
    let r = route("/a/{x:([a-z]+)-([0-9]+)}/{y}");
    let paths = r.paths();
    assert_eq!(paths[0], ("x".to_string(), PathTarget::Position(1)));
    assert_eq!(paths[1], ("y".to_string(), PathTarget::Position(4)));
    let captures = r.try_match("/a/post-7/extra").expect("should match");
    assert_eq!(captures[1].as_deref(), Some("post-7"));
    assert_eq!(captures[4].as_deref(), Some("extra"));
}

#[test]
fn test_parenthesis_inside_character_class_is_not_a_group() {
    let r = route("/a/{x:[(x)]+}/{y}");
    assert_eq!(
        r.paths(),
        &[
            ("x".to_string(), PathTarget::Position(1)),
            ("y".to_string(), PathTarget::Position(2)),
        ]
    );
    let captures = r.try_match("/a/(x)/later").expect("should match");
    assert_eq!(captures[1].as_deref(), Some("(x)"));
    assert_eq!(captures[2].as_deref(), Some("later"));
}

#[test]
fn test_raw_regex_pattern_is_accepted_verbatim() {
    let r = Route::new(
        0,
        r"^/blog(/.*)*$",
        PathSpec::map([("params", PathTarget::Position(1))]),
        None,
    )
    .expect("route should compile");
    assert!(r.try_match("/blog").is_some());
    let captures = r.try_match("/blog/2015/intro").expect("should match");
    assert_eq!(captures[1].as_deref(), Some("/2015/intro"));
}

#[test]
fn test_malformed_fragment_fails_at_construction() {
    let err = Route::new(0, "/users/{id:[0-9}", PathSpec::None, None).unwrap_err();
    assert!(matches!(err, RouterError::InvalidPattern { .. }));

    let err = Route::new(0, "/users/{}", PathSpec::None, None).unwrap_err();
    assert!(matches!(err, RouterError::InvalidPattern { .. }));

    let err = Route::new(0, "/users/{id", PathSpec::None, None).unwrap_err();
    assert!(matches!(err, RouterError::InvalidPattern { .. }));
}

#[test]
fn test_shorthand_paths_resolve_to_controller_and_action() {
    let r = Route::new(0, "/about", PathSpec::from("About::index"), None).expect("route");
    assert_eq!(
        r.paths(),
        &[
            ("controller".to_string(), PathTarget::Literal("about".to_string())),
            ("action".to_string(), PathTarget::Literal("index".to_string())),
        ]
    );
}

#[test]
fn test_shorthand_with_namespace_keeps_interior_separators() {
    let r = Route::new(0, "/x", PathSpec::from("App::Admin::Users::show"), None).expect("route");
    assert_eq!(
        r.paths(),
        &[
            ("namespace".to_string(), PathTarget::Literal("App::Admin".to_string())),
            ("controller".to_string(), PathTarget::Literal("users".to_string())),
            ("action".to_string(), PathTarget::Literal("show".to_string())),
        ]
    );
}

#[test]
fn test_shorthand_controller_is_uncamelized() {
    let r = Route::new(0, "/x", PathSpec::from("SomeUsers"), None).expect("route");
    assert_eq!(
        r.paths(),
        &[("controller".to_string(), PathTarget::Literal("some_users".to_string()))]
    );
}

#[test]
fn test_malformed_shorthand_fails_at_construction() {
    let err = Route::new(0, "/x", PathSpec::from("Users::"), None).unwrap_err();
    assert!(matches!(err, RouterError::InvalidShorthand(_)));
}

#[test]
fn test_placeholder_overrides_explicit_entry_of_same_name() {
    let r = Route::new(
        0,
        "/tag/{action}",
        PathSpec::map([
            ("controller", PathTarget::Literal("tags".to_string())),
            ("action", PathTarget::Literal("list".to_string())),
        ]),
        None,
    )
    .expect("route");
    assert_eq!(
        r.paths(),
        &[
            ("controller".to_string(), PathTarget::Literal("tags".to_string())),
            ("action".to_string(), PathTarget::Position(1)),
        ]
    );
}

#[test]
fn test_compilation_is_idempotent() {
    let a = route("/docs/{chapter}/{name:[a-z]+}");
    let b = route("/docs/{chapter}/{name:[a-z]+}");
    assert_eq!(a.compiled_pattern(), b.compiled_pattern());
    assert_eq!(a.paths(), b.paths());
    assert_eq!(a.try_match("/docs/one/two"), b.try_match("/docs/one/two"));
    assert_eq!(a.try_match("/nope"), b.try_match("/nope"));
}

#[test]
fn test_invalid_hostname_constraint_is_rejected() {
    let mut r = route("/x");
    assert!(r.set_hostname("api.example.com").is_ok());
    let err = r.set_hostname("([a-z").unwrap_err();
    assert!(matches!(err, RouterError::InvalidHostname { .. }));
}

#[test]
fn test_via_replaces_method_constraint() {
    let mut r = route("/x");
    assert!(r.http_methods().is_none());
    r.via(vec![Method::GET, Method::POST]);
    assert_eq!(r.http_methods(), Some(&[Method::GET, Method::POST][..]));
}
