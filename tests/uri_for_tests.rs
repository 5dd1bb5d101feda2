use std::sync::Arc;

use http::Method;
use wayfarer::{PathVersioner, Route, Router};

mod common;

fn compiled(routes: Vec<Route>) -> Router {
    common::init_tracing();

    let mut router = Router::new();
    for route in routes {
        router.add_route(route).expect("route registers");
    }
    router.compile().expect("routes compile");
    router
}

#[test]
fn substitutes_path_parameters() {
    let router = compiled(vec![Route::get("/user/{email}/{id: .*}", "user")]);

    let uri = router.uri_for("/user/{email}/{id: .*}", &[("email", "test@test.com"), ("id", "5")]);
    assert_eq!(uri.as_deref(), Some("/user/test@test.com/5"));
}

#[test]
fn substitutes_multiple_regex_parameters() {
    let router = compiled(vec![Route::get("/user/{email: .*}/test/{id: .*}", "user")]);

    let uri = router.uri_for(
        "/user/{email: .*}/test/{id: .*}",
        &[("email", "test@test.com"), ("id", "5")],
    );
    assert_eq!(uri.as_deref(), Some("/user/test@test.com/test/5"));
}

#[test]
fn round_trips_catch_all_values_with_slashes() {
    let pattern = "/repository/{repo: .*}/ticket/{id: .*}";
    let router = compiled(vec![Route::get(pattern, "ticket")]);

    let uri = router.uri_for(pattern, &[("repo", "test/myrepo"), ("id", "5")]);
    assert_eq!(uri.as_deref(), Some("/repository/test/myrepo/ticket/5"));

    let matches = router.find_routes(&Method::GET, "/repository/test/myrepo/ticket/5");
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].get_path_param("repo"), Some("test/myrepo"));
    assert_eq!(matches[0].get_path_param("id"), Some("5"));
}

#[test]
fn unconsumed_parameters_become_query_string() {
    let router = compiled(vec![Route::get("/user/{email}/{id: .*}", "user")]);

    let uri = router.uri_for(
        "/user/{email}/{id: .*}",
        &[("email", "test@test.com"), ("id", "5"), ("query", "recent_changes")],
    );
    assert_eq!(uri.as_deref(), Some("/user/test@test.com/5?query=recent_changes"));
}

#[test]
fn query_values_are_urlencoded() {
    let router = compiled(vec![Route::get("/user/{email}", "user")]);

    let uri = router.uri_for(
        "/user/{email}",
        &[("email", "test@test.com"), ("name", "Decebal Suiu")],
    );
    assert_eq!(uri.as_deref(), Some("/user/test@test.com?name=Decebal+Suiu"));
}

#[test]
fn query_parameters_keep_caller_order() {
    let router = compiled(vec![Route::get("/search", "search")]);

    let uri = router.uri_for("/search", &[("b", "2"), ("a", "1")]);
    assert_eq!(uri.as_deref(), Some("/search?b=2&a=1"));
}

#[test]
fn route_name_takes_priority_over_pattern() {
    let router = compiled(vec![
        // a route whose *pattern* equals the other route's *name*
        Route::get("/contact", "by_pattern"),
        Route::get("/contacts/{id}", "by_name").named("/contact"),
    ]);

    let uri = router.uri_for("/contact", &[("id", "7")]);
    assert_eq!(uri.as_deref(), Some("/contacts/7"));
}

#[test]
fn resolves_by_name() {
    let router = compiled(vec![Route::get("/contact/{id: [0-9]+}", "contact").named("contact")]);

    let uri = router.uri_for("contact", &[("id", "42")]);
    assert_eq!(uri.as_deref(), Some("/contact/42"));
}

#[test]
fn unknown_name_or_pattern_yields_none() {
    let router = compiled(vec![Route::get("/contact", "contact")]);
    assert_eq!(router.uri_for("/nope", &[]), None);
}

#[test]
fn missing_path_parameter_fails_generation() {
    // never emit literal {placeholder} text
    let router = compiled(vec![Route::get("/user/{email}/{id}", "user")]);
    assert_eq!(router.uri_for("/user/{email}/{id}", &[("email", "a@b.com")]), None);
}

#[test]
fn round_trip_reproduces_matched_path() {
    let pattern = "/contact/{id: [0-9]+}/{field}";
    let router = compiled(vec![Route::get(pattern, "field")]);

    let matches = router.find_routes(&Method::GET, "/contact/57/telephone");
    assert_eq!(matches.len(), 1);

    let params: Vec<(&str, &str)> = matches[0]
        .path_params
        .iter()
        .map(|(k, v)| (k.as_ref(), v.as_str()))
        .collect();
    let uri = router.uri_for(pattern, &params);
    assert_eq!(uri.as_deref(), Some("/contact/57/telephone"));
}

#[test]
fn application_path_prefixes_generated_uris() {
    let mut router = Router::new();
    router.add_route(Route::get("/contact/{id}", "contact").named("contact")).unwrap();
    router.set_application_path("myapp");
    router.compile().unwrap();

    let uri = router.uri_for("contact", &[("id", "3")]);
    assert_eq!(uri.as_deref(), Some("/myapp/contact/3"));

    assert_eq!(router.uri_for_relative("dashboard"), "/myapp/dashboard");
    assert_eq!(router.uri_for_relative("/dashboard"), "/myapp/dashboard");
}

#[test]
fn relative_uris_use_the_compiled_application_path() {
    let mut router = Router::new();
    router.set_application_path("myapp");
    router.compile().unwrap();

    // a pending change is invisible until the next compile
    router.set_application_path("other");
    assert_eq!(router.uri_for_relative("dashboard"), "/myapp/dashboard");

    router.compile().unwrap();
    assert_eq!(router.uri_for_relative("dashboard"), "/other/dashboard");
}

#[test]
fn application_path_of_slash_normalizes_to_empty() {
    let mut router = Router::new();
    router.set_application_path("/");
    router.compile().unwrap();

    assert_eq!(router.uri_for_relative("contact"), "/contact");
}

struct QueryVersioner;

impl PathVersioner for QueryVersioner {
    fn inject_version(&self, path: &str) -> String {
        format!("{}?v=1.2.3", path)
    }
}

#[test]
fn versioned_resource_routes_rewrite_the_path_parameter() {
    let router = compiled(vec![Route::get("/assets/{path: .*}", "assets")
        .named("assets")
        .versioned(Arc::new(QueryVersioner))]);

    let uri = router.uri_for("assets", &[("path", "css/app.css")]);
    assert_eq!(uri.as_deref(), Some("/assets/css/app.css?v=1.2.3"));
}

#[test]
fn unversioned_routes_leave_the_path_parameter_alone() {
    let router = compiled(vec![Route::get("/assets/{path: .*}", "assets").named("assets")]);

    let uri = router.uri_for("assets", &[("path", "css/app.css")]);
    assert_eq!(uri.as_deref(), Some("/assets/css/app.css"));
}
