//! Structural validation of OpenAPI 3.x documents

use std::sync::LazyLock;

use platform_models::ValidationResult;
use regex::Regex;
use serde_json::{Map, Value};
use tracing::debug;

use crate::spec::endpoints::is_http_method;

static OPENAPI_VERSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^3\.\d").expect("openapi version pattern is valid"));

pub const NO_ENDPOINTS_WARNING: &str = "No endpoints found in the specification";
pub const NO_AUTH_WARNING: &str = "No authentication schemes defined";

/// Validate a parsed document
///
/// Structural problems are reported as `"<dotted path>: <message>"` in the
/// order the rules are checked. Metadata and warnings are only computed for
/// valid documents.
pub fn validate_spec(doc: &Value) -> ValidationResult {
    let Some(root) = doc.as_object() else {
        return parse_failure(format!(
            "expected a document object, received {}",
            kind_of(doc)
        ));
    };

    let mut issues = Issues::default();
    check_root(root, &mut issues);
    if !issues.is_empty() {
        debug!("Specification rejected with {} issue(s)", issues.0.len());
        return ValidationResult::invalid(issues.0);
    }

    summarize(root)
}

/// Result for a document that could not be read at all
pub fn parse_failure(message: impl std::fmt::Display) -> ValidationResult {
    ValidationResult::invalid(vec![format!("Failed to parse specification: {}", message)])
}

fn summarize(root: &Map<String, Value>) -> ValidationResult {
    let paths = root.get("paths").and_then(Value::as_object);

    let endpoint_count = paths
        .map(|paths| {
            paths
                .values()
                .filter_map(Value::as_object)
                .map(|item| item.keys().filter(|key| is_http_method(key)).count())
                .sum()
        })
        .unwrap_or(0);

    let mut resource_types: Vec<String> = Vec::new();
    for path in paths.into_iter().flat_map(|paths| paths.keys()) {
        if let Some(segment) = path.split('/').find(|segment| !segment.is_empty()) {
            if !resource_types.iter().any(|known| known == segment) {
                resource_types.push(segment.to_string());
            }
        }
    }

    let has_security_schemes = root
        .get("components")
        .and_then(|components| components.get("securitySchemes"))
        .and_then(Value::as_object)
        .is_some_and(|schemes| !schemes.is_empty());
    let has_security_requirements = root
        .get("security")
        .and_then(Value::as_array)
        .is_some_and(|requirements| !requirements.is_empty());
    let has_authentication = has_security_schemes || has_security_requirements;

    let mut warnings = Vec::new();
    if endpoint_count == 0 {
        warnings.push(NO_ENDPOINTS_WARNING.to_string());
    }
    if !has_authentication {
        warnings.push(NO_AUTH_WARNING.to_string());
    }

    ValidationResult {
        is_valid: true,
        errors: Vec::new(),
        warnings,
        endpoint_count,
        resource_types,
        has_authentication,
    }
}

// ================================= RULES ======================================== //

#[derive(Default)]
struct Issues(Vec<String>);

impl Issues {
    fn push(&mut self, path: &[&str], message: impl Into<String>) {
        self.0.push(format!("{}: {}", path.join("."), message.into()));
    }

    fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

fn check_root(root: &Map<String, Value>, issues: &mut Issues) {
    match root.get("openapi") {
        None => issues.push(&["openapi"], "Required"),
        Some(Value::String(version)) => {
            if !OPENAPI_VERSION.is_match(version) {
                issues.push(&["openapi"], "Invalid");
            }
        }
        Some(other) => issues.push(&["openapi"], mismatch("string", other)),
    }

    match root.get("info") {
        None => issues.push(&["info"], "Required"),
        Some(Value::Object(info)) => {
            required_string(info, &["info", "title"], issues);
            required_string(info, &["info", "version"], issues);
            optional_string(info, &["info", "description"], issues);
        }
        Some(other) => issues.push(&["info"], mismatch("object", other)),
    }

    match root.get("servers") {
        None => {}
        Some(Value::Array(servers)) => {
            for (index, server) in servers.iter().enumerate() {
                let index = index.to_string();
                match server {
                    Value::Object(server) => {
                        let path = ["servers", index.as_str()];
                        match server.get("url") {
                            None => issues.push(&child(&path, "url"), "Required"),
                            Some(Value::String(_)) => {}
                            Some(other) => issues
                                .push(&child(&path, "url"), mismatch("string", other)),
                        }
                    }
                    other => issues.push(&["servers", index.as_str()], mismatch("object", other)),
                }
            }
        }
        Some(other) => issues.push(&["servers"], mismatch("array", other)),
    }

    match root.get("paths") {
        None => issues.push(&["paths"], "Required"),
        Some(Value::Object(paths)) => {
            for (path, item) in paths {
                check_path_item(path, item, issues);
            }
        }
        Some(other) => issues.push(&["paths"], mismatch("object", other)),
    }

    match root.get("components") {
        None => {}
        Some(Value::Object(components)) => {
            for section in ["schemas", "parameters", "responses", "securitySchemes"] {
                match components.get(section) {
                    None | Some(Value::Object(_)) => {}
                    Some(other) => issues.push(&["components", section], mismatch("object", other)),
                }
            }
        }
        Some(other) => issues.push(&["components"], mismatch("object", other)),
    }
}

fn check_path_item(path: &str, item: &Value, issues: &mut Issues) {
    let Some(item) = item.as_object() else {
        issues.push(&["paths", path], mismatch("object", item));
        return;
    };

    for (method, operation) in item {
        if !is_http_method(method) {
            continue;
        }
        let at = ["paths", path, method.as_str()];
        let Some(operation) = operation.as_object() else {
            issues.push(&at, mismatch("object", operation));
            continue;
        };

        optional_string(operation, &child(&at, "summary"), issues);
        optional_string(operation, &child(&at, "description"), issues);
        optional_string(operation, &child(&at, "operationId"), issues);

        match operation.get("tags") {
            None => {}
            Some(Value::Array(tags)) => {
                for (index, tag) in tags.iter().enumerate() {
                    if !tag.is_string() {
                        let index = index.to_string();
                        let tags_at = child(&at, "tags");
                        issues.push(&child(&tags_at, index.as_str()), mismatch("string", tag));
                    }
                }
            }
            Some(other) => issues.push(&child(&at, "tags"), mismatch("array", other)),
        }

        match operation.get("parameters") {
            None | Some(Value::Array(_)) => {}
            Some(other) => {
                issues.push(&child(&at, "parameters"), mismatch("array", other))
            }
        }

        match operation.get("responses") {
            None => issues.push(&child(&at, "responses"), "Required"),
            Some(Value::Object(_)) => {}
            Some(other) => {
                issues.push(&child(&at, "responses"), mismatch("object", other))
            }
        }
    }
}

fn child<'a>(base: &[&'a str], key: &'a str) -> Vec<&'a str> {
    let mut path = base.to_vec();
    path.push(key);
    path
}

fn required_string(obj: &Map<String, Value>, path: &[&str], issues: &mut Issues) {
    let key = path[path.len() - 1];
    match obj.get(key) {
        None => issues.push(path, "Required"),
        Some(Value::String(value)) if value.is_empty() => {
            issues.push(path, "String must contain at least 1 character(s)")
        }
        Some(Value::String(_)) => {}
        Some(other) => issues.push(path, mismatch("string", other)),
    }
}

fn optional_string(obj: &Map<String, Value>, path: &[&str], issues: &mut Issues) {
    let key = path[path.len() - 1];
    match obj.get(key) {
        None | Some(Value::String(_)) => {}
        Some(other) => issues.push(path, mismatch("string", other)),
    }
}

fn mismatch(expected: &str, received: &Value) -> String {
    format!("Expected {}, received {}", expected, kind_of(received))
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
