//! Tests for the route registry and handler definitions.

use std::collections::HashMap;

use http::Method;
use restling::registry::{Definition, Fields, Handler, HandlerResult, Registry};
use restling::ContentType;

fn fixed(body: &'static str) -> impl Fn(&Fields, &Fields, &Fields) -> HandlerResult + Send + Sync {
    move |_arguments: &Fields, _headers: &Fields, _fields: &Fields| Ok(body.to_string())
}

fn empty() -> Fields {
    HashMap::new()
}

#[test]
fn test_link_contains_get() {
    let registry = Registry::new();
    assert!(!registry.contains("/a"));

    registry.link("/a", Definition::new(Method::GET, ContentType::TEXT_PLAIN, fixed("a")));
    assert!(registry.contains("/a"));

    let definition = registry.get("/a").expect("definition linked");
    assert_eq!(definition.method(), &Method::GET);
    assert_eq!(definition.content_type(), &ContentType::TEXT_PLAIN);
    let body = definition.invoke(&empty(), &empty(), &empty()).expect("handler output");
    assert_eq!(body, "a");
}

#[test]
fn test_relink_replaces_definition_wholesale() {
    let registry = Registry::new();
    registry.link("/a", Definition::new(Method::GET, ContentType::TEXT_PLAIN, fixed("old")));
    registry.link("/a", Definition::new(Method::POST, ContentType::TEXT_HTML, fixed("new")));

    let definition = registry.get("/a").expect("definition linked");
    assert_eq!(definition.method(), &Method::POST);
    assert_eq!(definition.content_type(), &ContentType::TEXT_HTML);
    let body = definition.invoke(&empty(), &empty(), &empty()).expect("handler output");
    assert_eq!(body, "new");
}

#[test]
fn test_unlink_removes_definition() {
    let registry = Registry::new();
    registry.link("/a", Definition::new(Method::GET, ContentType::TEXT_PLAIN, fixed("a")));
    registry.unlink("/a");
    assert!(!registry.contains("/a"));
    assert!(registry.get("/a").is_none());

    // Unlinking an unknown path is a no-op.
    registry.unlink("/never-linked");
}

fn plain_function(
    _arguments: &Fields,
    _headers: &Fields,
    _fields: &Fields,
) -> HandlerResult {
    Ok("from fn".to_string())
}

#[test]
fn test_plain_function_registers_as_handler() {
    let registry = Registry::new();
    registry.link("/fn", Definition::new(Method::GET, ContentType::TEXT_PLAIN, plain_function));
    let definition = registry.get("/fn").expect("definition linked");
    let body = definition.invoke(&empty(), &empty(), &empty()).expect("handler output");
    assert_eq!(body, "from fn");
}

/// Handlers are values: a type implementing `Handler` carries its own state.
struct Greeter {
    greeting: String,
}

impl Handler for Greeter {
    fn handle(&self, arguments: &Fields, _headers: &Fields, _fields: &Fields) -> HandlerResult {
        let name = arguments.get("name").map(String::as_str).unwrap_or("world");
        Ok(format!("{} {}", self.greeting, name))
    }
}

#[test]
fn test_stateful_handler() {
    let registry = Registry::new();
    let greeter = Greeter {
        greeting: "hello".to_string(),
    };
    registry.link("/greet", Definition::new(Method::GET, ContentType::TEXT_PLAIN, greeter));

    let mut arguments = empty();
    arguments.insert("name".to_string(), "tester".to_string());
    let definition = registry.get("/greet").expect("definition linked");
    let body = definition.invoke(&arguments, &empty(), &empty()).expect("handler output");
    assert_eq!(body, "hello tester");
}
