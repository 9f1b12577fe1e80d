//! Integration tests for DeepLinkParser
//!
//! These tests verify dispatch order, fallback handling and parser
//! construction errors.

use std::sync::Arc;
use std::thread;

use deeplink::*;

struct Environment {
    logged_in: bool,
}

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn uri(input: &str) -> DeepLinkUri {
    DeepLinkUri::parse(input).unwrap()
}

fn recipe_route() -> Route<Environment, String> {
    Route::new(["recipes", "recipe/:id"], |_, params, _| {
        params.get("id").unwrap_or("RecipeRoute").to_string()
    })
}

fn subscription_route() -> Route<Environment, String> {
    Route::new(["subscription"], |_, _, env: &Environment| {
        if env.logged_in {
            "SubscriptionRoute".to_string()
        } else {
            "Login".to_string()
        }
    })
}

fn conflicting_route() -> Route<Environment, String> {
    Route::new(["recipes"], |_, _, _| "Conflict".to_string())
}

fn parser() -> DeepLinkParser<Environment, String> {
    DeepLinkParser::of(Environment { logged_in: true })
        .add_route(recipe_route())
        .add_route(subscription_route())
        .add_fallback(|_, _, _| "Fallback".to_string())
        .build()
        .unwrap()
}

// ============================================================================
// Construction Tests
// ============================================================================

#[test]
fn test_missing_fallback_fails() {
    init_logging();
    let result = DeepLinkParser::of(Environment { logged_in: true })
        .add_route(recipe_route())
        .build();

    assert!(matches!(result, Err(BuildError::MissingFallback)));
}

#[test]
fn test_duplicate_templates_fail() {
    init_logging();
    let result = DeepLinkParser::of(Environment { logged_in: true })
        .add_route(recipe_route())
        .add_route(recipe_route())
        .add_fallback(|_, _, _| "Fallback".to_string())
        .build();

    match result {
        Err(BuildError::DuplicateRoute { templates }) => {
            assert_eq!(templates, ["recipes", "recipe/:id"]);
        }
        other => panic!("expected DuplicateRoute, got {:?}", other.err()),
    }
}

// ============================================================================
// Dispatch Tests
// ============================================================================

#[test]
fn test_parse_simple() {
    init_logging();
    assert_eq!(parser().parse(&uri("http://world.com/recipes")).unwrap(), "RecipeRoute");
}

#[test]
fn test_parse_with_param() {
    assert_eq!(parser().parse(&uri("http://world.com/recipe/1234")).unwrap(), "1234");
}

#[test]
fn test_parse_with_next_route() {
    assert_eq!(
        parser().parse(&uri("hellofresh://host/subscription")).unwrap(),
        "SubscriptionRoute"
    );
}

#[test]
fn test_parse_uses_environment() {
    let parser = DeepLinkParser::of(Environment { logged_in: false })
        .add_route(subscription_route())
        .add_fallback(|_, _, _| "Fallback".to_string())
        .build()
        .unwrap();

    assert_eq!(parser.parse(&uri("hellofresh://host/subscription")).unwrap(), "Login");
}

#[test]
fn test_parse_with_conflicting_routes() {
    let recipe_first = DeepLinkParser::of(Environment { logged_in: true })
        .add_route(recipe_route())
        .add_route(conflicting_route())
        .add_fallback(|_, _, _| "Fallback".to_string())
        .build()
        .unwrap();
    assert_eq!(recipe_first.parse(&uri("http://world.com/recipes")).unwrap(), "RecipeRoute");

    let conflict_first = DeepLinkParser::of(Environment { logged_in: true })
        .add_route(conflicting_route())
        .add_route(recipe_route())
        .add_fallback(|_, _, _| "Fallback".to_string())
        .build()
        .unwrap();
    assert_eq!(conflict_first.parse(&uri("http://world.com/recipes")).unwrap(), "Conflict");
}

#[test]
fn test_parse_fallback() {
    assert_eq!(parser().parse(&uri("http://world.com/unknown")).unwrap(), "Fallback");
}

#[test]
fn test_parse_valueless_query_fails() {
    let err = parser().parse(&uri("http://world.com/recipes?flag")).unwrap_err();
    assert!(matches!(err, RouteError::ValuelessQueryParameter { .. }));
}

#[test]
fn test_parser_shared_across_threads() {
    let parser = Arc::new(parser());

    let handles: Vec<_> = ["http://world.com/recipe/1", "http://world.com/recipe/2"]
        .into_iter()
        .map(|input| {
            let parser = Arc::clone(&parser);
            thread::spawn(move || parser.parse(&uri(input)).unwrap())
        })
        .collect();

    let results: Vec<String> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(results, ["1", "2"]);
}
