//! Endpoint extraction

use platform_models::Endpoint;
use serde_json::Value;

/// Path item keys that declare operations
pub const HTTP_METHODS: [&str; 8] = [
    "get", "put", "post", "delete", "options", "head", "patch", "trace",
];

/// Whether a path item key names an HTTP operation
pub fn is_http_method(key: &str) -> bool {
    HTTP_METHODS
        .iter()
        .any(|method| method.eq_ignore_ascii_case(key))
}

/// Extract every (path, method) pair in document order
///
/// Keys such as `parameters`, `summary` or `x-*` extensions are skipped, as
/// are operations that are not objects.
pub fn extract_endpoints(doc: &Value) -> Vec<Endpoint> {
    let Some(paths) = doc.get("paths").and_then(Value::as_object) else {
        return Vec::new();
    };

    let mut endpoints = Vec::new();
    for (path, item) in paths {
        let Some(item) = item.as_object() else {
            continue;
        };
        for (method, operation) in item {
            if !is_http_method(method) {
                continue;
            }
            let Some(operation) = operation.as_object() else {
                continue;
            };
            endpoints.push(Endpoint {
                path: path.clone(),
                method: method.to_ascii_lowercase(),
                operation_id: string_field(operation.get("operationId")),
                summary: string_field(operation.get("summary")),
                tags: operation.get("tags").and_then(Value::as_array).map(|tags| {
                    tags.iter()
                        .filter_map(Value::as_str)
                        .map(str::to_string)
                        .collect()
                }),
            });
        }
    }
    endpoints
}

fn string_field(value: Option<&Value>) -> Option<String> {
    value.and_then(Value::as_str).map(str::to_string)
}
