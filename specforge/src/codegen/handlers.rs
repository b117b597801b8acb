//! Mock route handlers

use std::sync::LazyLock;

use askama::Template;
use platform_models::Endpoint;
use regex::Regex;
use serde_json::{json, Map, Value};

use crate::codegen::escape::{js_single_quoted, line_comment};
use crate::codegen::templates::HandlerTemplate;
use crate::codegen::CodegenError;

static PATH_PARAM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([^}]+)\}").expect("path parameter pattern is valid"));

/// Translate `{param}` segments to Express `:param` segments
pub fn express_route(path: &str) -> String {
    PATH_PARAM.replace_all(path, ":$1").into_owned()
}

/// Comment line naming the handler
pub fn describe(endpoint: &Endpoint) -> String {
    endpoint
        .summary
        .as_deref()
        .or(endpoint.operation_id.as_deref())
        .map(str::to_string)
        .unwrap_or_else(|| format!("{} {}", endpoint.method.to_uppercase(), endpoint.path))
}

/// Mock payload of an endpoint
///
/// The declared JSON example of the success response wins; otherwise a
/// generic shape keyed on the method, stamped with `generated_at`.
pub fn mock_payload(doc: &Value, endpoint: &Endpoint, generated_at: &str) -> Value {
    if let Some(example) = declared_example(doc, endpoint) {
        return example.clone();
    }

    match endpoint.method.as_str() {
        "get" => json!({
            "data": [],
            "message": "Mock response - implement actual logic",
            "timestamp": generated_at,
        }),
        "post" => json!({
            "id": "generated-id",
            "message": "Resource created successfully",
            "timestamp": generated_at,
        }),
        _ => json!({
            "message": "Operation completed successfully",
            "timestamp": generated_at,
        }),
    }
}

/// Render the route for one endpoint
pub fn render_handler(
    doc: &Value,
    endpoint: &Endpoint,
    generated_at: &str,
) -> Result<String, CodegenError> {
    let payload = serde_json::to_string_pretty(&mock_payload(doc, endpoint, generated_at))?;
    // continuation lines sit inside the handler's try block
    let payload = payload.replace('\n', "\n    ");

    let comment = line_comment(&describe(endpoint));
    let route = js_single_quoted(&express_route(&endpoint.path));

    let fragment = HandlerTemplate {
        comment: &comment,
        method: &endpoint.method,
        route: &route,
        payload: &payload,
    }
    .render()?;
    Ok(fragment)
}

fn declared_example<'a>(doc: &'a Value, endpoint: &Endpoint) -> Option<&'a Value> {
    let responses = find_operation(doc, endpoint)?
        .get("responses")
        .and_then(Value::as_object)?;

    let success = responses
        .get("200")
        .or_else(|| responses.get("201"))
        .or_else(|| responses.values().next())?;

    success
        .get("content")
        .and_then(|content| content.get("application/json"))
        .and_then(|media| media.get("example"))
}

fn find_operation<'a>(doc: &'a Value, endpoint: &Endpoint) -> Option<&'a Map<String, Value>> {
    let item = doc
        .get("paths")
        .and_then(|paths| paths.get(&endpoint.path))
        .and_then(Value::as_object)?;

    item.iter()
        .find(|(method, _)| method.eq_ignore_ascii_case(&endpoint.method))
        .and_then(|(_, operation)| operation.as_object())
}
