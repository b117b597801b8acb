//! Validator and endpoint extraction tests

use serde_json::{json, Value};
use specforge::spec::{
    extract_endpoints, validate_spec, validate_text, DocumentFormat, NO_AUTH_WARNING,
    NO_ENDPOINTS_WARNING,
};

fn document(paths: Value) -> Value {
    json!({
        "openapi": "3.0.3",
        "info": {"title": "Catalog", "version": "2.1.0"},
        "paths": paths
    })
}

fn operation() -> Value {
    json!({"responses": {"200": {"description": "ok"}}})
}

#[test]
fn test_three_paths_two_methods_without_auth() {
    let doc = document(json!({
        "/products": {"get": operation(), "post": operation()},
        "/products/{id}": {"get": operation(), "delete": operation()},
        "/orders": {"get": operation(), "put": operation()}
    }));

    let result = validate_spec(&doc);
    assert!(result.is_valid, "{:?}", result.errors);
    assert_eq!(result.endpoint_count, 6);
    assert!(!result.has_authentication);
    assert!(result.warnings.iter().any(|w| w == NO_AUTH_WARNING));
    assert!(!result.warnings.iter().any(|w| w == NO_ENDPOINTS_WARNING));
}

#[test]
fn test_missing_paths_is_invalid() {
    let doc = json!({
        "openapi": "3.1.0",
        "info": {"title": "Catalog", "version": "1"}
    });

    let result = validate_spec(&doc);
    assert!(!result.is_valid);
    assert_eq!(result.endpoint_count, 0);
    assert_eq!(result.errors, vec!["paths: Required"]);
    assert!(result.resource_types.is_empty());
    assert!(result.warnings.is_empty());
}

#[test]
fn test_endpoint_count_ignores_non_operation_keys() {
    let doc = document(json!({
        "/pets": {
            "summary": "Pets",
            "description": "All pets",
            "parameters": [],
            "servers": [],
            "x-internal": true,
            "get": operation(),
            "HEAD": operation()
        }
    }));

    let result = validate_spec(&doc);
    assert!(result.is_valid, "{:?}", result.errors);
    assert_eq!(result.endpoint_count, 2);

    let endpoints = extract_endpoints(&doc);
    let methods: Vec<_> = endpoints.iter().map(|e| e.method.as_str()).collect();
    assert_eq!(methods, vec!["get", "head"]);
}

#[test]
fn test_resource_types_first_appearance_without_duplicates() {
    let doc = document(json!({
        "/users/{id}": {"get": operation()},
        "/orders": {"get": operation()},
        "/users": {"get": operation()},
        "/orders/{id}/items": {"get": operation()},
        "/": {"get": operation()}
    }));

    let result = validate_spec(&doc);
    assert_eq!(result.resource_types, vec!["users", "orders"]);
}

#[test]
fn test_security_schemes_count_as_authentication() {
    let mut doc = document(json!({"/pets": {"get": operation()}}));
    doc["components"] = json!({
        "securitySchemes": {"apiKey": {"type": "apiKey", "in": "header", "name": "X-API-Key"}}
    });

    let result = validate_spec(&doc);
    assert!(result.has_authentication);
    assert!(result.warnings.is_empty());
}

#[test]
fn test_type_errors_are_reported_per_field() {
    let doc = json!({
        "openapi": 3,
        "info": {"title": "Catalog"},
        "servers": [{"description": "no url"}],
        "paths": {
            "/pets": {
                "get": {"operationId": 7, "tags": ["ok", 1], "responses": []}
            }
        },
        "components": {"securitySchemes": []}
    });

    let result = validate_spec(&doc);
    assert!(!result.is_valid);
    assert_eq!(
        result.errors,
        vec![
            "openapi: Expected string, received number",
            "info.version: Required",
            "servers.0.url: Required",
            "paths./pets.get.operationId: Expected string, received number",
            "paths./pets.get.tags.1: Expected string, received number",
            "paths./pets.get.responses: Expected object, received array",
            "components.securitySchemes: Expected object, received array",
        ]
    );
}

#[test]
fn test_yaml_and_json_agree() {
    let json_text = serde_json::to_string(&document(json!({
        "/pets": {"get": operation()}
    })))
    .unwrap();
    let yaml_text = r#"
openapi: 3.0.3
info:
  title: Catalog
  version: 2.1.0
paths:
  /pets:
    get:
      responses:
        "200":
          description: ok
"#;

    let (from_json, _) = validate_text(&json_text, DocumentFormat::Json);
    let (from_yaml, _) = validate_text(yaml_text, DocumentFormat::Yaml);
    assert_eq!(from_json, from_yaml);
}
