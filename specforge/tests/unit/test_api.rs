//! HTTP API tests

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use platform_models::{NewServer, ServerStatus};
use serde_json::{json, Value};
use specforge::app::state::AppState;
use specforge::deploy::{ProvisionSettings, SimulatedProvisioner};
use specforge::health::ScriptedProbe;
use specforge::server::serve::router;
use specforge::server::state::ServerState;
use specforge::store::{MemoryStore, ServerPatch, ServerStore};
use tower::ServiceExt;

fn app() -> (Router, Arc<dyn ServerStore>) {
    let store: Arc<dyn ServerStore> = Arc::new(MemoryStore::new());
    let state = AppState::with_parts(
        "0.1.0-test".to_string(),
        store.clone(),
        Arc::new(SimulatedProvisioner::new(ProvisionSettings { delay_scale: 0.0 })),
        Arc::new(ScriptedProbe::new(Vec::new())),
    );
    let server_state = ServerState::new(state.service.clone(), state.version.clone());
    (router(Arc::new(server_state)), store)
}

fn spec() -> Value {
    json!({
        "openapi": "3.0.1",
        "info": {"title": "Books", "version": "1.0.0"},
        "paths": {
            "/books": {"get": {"responses": {"200": {"description": "ok"}}}}
        }
    })
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_platform_health() {
    let (app, _) = app();
    let (status, body) = send(&app, get("/api/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], "0.1.0-test");
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn test_validate_json_and_yaml() {
    let (app, _) = app();

    let (status, body) = send(&app, post_json("/api/validate-openapi", &spec())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["isValid"], true);
    assert_eq!(body["endpointCount"], 1);
    assert_eq!(body["spec"], spec());

    let yaml = "openapi: 3.0.1\ninfo:\n  title: Books\n  version: '1'\npaths: {}\n";
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/validate-openapi")
        .header(header::CONTENT_TYPE, "application/yaml")
        .body(Body::from(yaml))
        .unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["isValid"], true);
    assert_eq!(body["warnings"][0], "No endpoints found in the specification");

    let (status, body) = send(&app, post_json("/api/validate-openapi", &json!({"paths": {}}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["isValid"], false);
    assert!(body.get("spec").is_none());
}

#[tokio::test]
async fn test_validate_rejects_unparseable_body() {
    let (app, _) = app();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/validate-openapi")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().starts_with("Invalid file format"));
}

#[tokio::test]
async fn test_create_and_fetch_server() {
    let (app, store) = app();
    let payload = json!({
        "name": "Books API",
        "environment": "staging",
        "authentication": "bearer_token",
        "rateLimit": 50,
        "openApiSpec": spec()
    });

    let (status, created) = send(&app, post_json("/api/servers", &payload)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["name"], "Books API");
    assert_eq!(created["environment"], "staging");
    assert_eq!(created["rateLimit"], 50);
    let id = created["id"].as_str().unwrap().to_string();

    let (status, fetched) = send(&app, get(&format!("/api/servers/{}", id))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["id"], id.as_str());

    let (status, listed) = send(&app, get("/api/servers")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed.as_array().unwrap().len(), 1);

    let events = store.list_events(Some(&id)).await.unwrap();
    assert!(events.len() >= 2);

    let (status, body) = send(&app, get(&format!("/api/servers/{}/events", id))).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.as_array().unwrap().len() >= 2);
}

#[tokio::test]
async fn test_create_rejects_bad_input() {
    let (app, store) = app();

    let mut bad_spec = spec();
    bad_spec.as_object_mut().unwrap().remove("info");
    let (status, body) = send(
        &app,
        post_json("/api/servers", &json!({"name": "Books", "openApiSpec": bad_spec})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid OpenAPI specification");
    assert_eq!(body["details"], json!(["info: Required"]));

    let (status, body) = send(&app, post_json("/api/servers", &json!({"openApiSpec": spec()}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid server configuration");

    let (status, body) = send(
        &app,
        post_json("/api/servers", &json!({"name": "Books", "rateLimit": 0, "openApiSpec": spec()})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid server configuration");

    assert!(store.list_servers(None).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_missing_server_is_404() {
    let (app, _) = app();
    let (status, body) = send(&app, get("/api/servers/nope")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"error": "Server not found"}));

    let request = Request::builder()
        .method(Method::DELETE)
        .uri("/api/servers/nope")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_events_and_stats() {
    let (app, _) = app();
    let (_, created) = send(
        &app,
        post_json("/api/servers", &json!({"name": "Books", "openApiSpec": spec()})),
    )
    .await;
    let id = created["id"].as_str().unwrap().to_string();

    let (status, stats) = send(&app, get("/api/stats")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["totalServers"], 1);

    let request = Request::builder()
        .method(Method::DELETE)
        .uri(format!("/api/servers/{}", id))
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_null());

    let (status, recent) = send(&app, get("/api/events?limit=1")).await;
    assert_eq!(status, StatusCode::OK);
    let recent = recent.as_array().unwrap();
    assert_eq!(recent.len(), 1);

    let (_, all) = send(&app, get("/api/events?limit=oops")).await;
    assert!(all.as_array().unwrap().len() <= 10);
    assert!(all
        .as_array()
        .unwrap()
        .iter()
        .any(|e| e["message"] == "Server deleted successfully"));

    let (_, stats) = send(&app, get("/api/stats")).await;
    assert_eq!(stats["totalServers"], 0);
    assert_eq!(stats["avgUptime"], "0%");
}

fn patch_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(Method::PATCH)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn stored_with_status(store: &Arc<dyn ServerStore>, status: ServerStatus) -> String {
    let server = store
        .create_server(NewServer::new("Books", spec()))
        .await
        .unwrap();
    store
        .update_server(&server.id, ServerPatch::new().status(status))
        .await
        .unwrap();
    server.id
}

#[tokio::test]
async fn test_create_rejects_malformed_json() {
    let (app, _) = app();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/servers")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"name\": "))
        .unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid server configuration");
    assert_eq!(body["details"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_patch_stops_active_server() {
    let (app, store) = app();
    let id = stored_with_status(&store, ServerStatus::Active).await;
    let uri = format!("/api/servers/{}", id);

    let (status, body) = send(&app, patch_json(&uri, &json!({"status": "stopped"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "stopped");

    let events = store.list_events(Some(&id)).await.unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].message, "Server stopped");
    assert_eq!(events[0].details["previousStatus"], "active");

    // stopped is final
    let (status, body) = send(&app, patch_json(&uri, &json!({"status": "stopped"}))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().starts_with("Invalid transition"));
}

#[tokio::test]
async fn test_patch_edits_fields_and_rejects_the_rest() {
    let (app, store) = app();
    let id = stored_with_status(&store, ServerStatus::Active).await;
    let uri = format!("/api/servers/{}", id);

    let (status, body) = send(
        &app,
        patch_json(&uri, &json!({"name": "Library", "rateLimit": 5})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Library");
    assert_eq!(body["rateLimit"], 5);
    assert_eq!(body["status"], "active");
    assert!(store.list_events(Some(&id)).await.unwrap().is_empty());

    let (status, body) = send(&app, patch_json(&uri, &json!({"generatedCode": "x"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid server update");

    let (status, body) = send(&app, patch_json(&uri, &json!({"rateLimit": 0}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["details"],
        json!(["rateLimit: Number must be greater than or equal to 1"])
    );

    let (status, body) = send(&app, patch_json(&uri, &json!({"status": "active"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Status cannot be set to active");

    let (status, body) = send(
        &app,
        patch_json("/api/servers/nope", &json!({"status": "stopped"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"error": "Server not found"}));
}

#[tokio::test]
async fn test_patch_retries_failed_server() {
    let (app, store) = app();
    let id = stored_with_status(&store, ServerStatus::Failed).await;
    let uri = format!("/api/servers/{}", id);

    let (status, body) = send(&app, patch_json(&uri, &json!({"status": "pending"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "pending");

    let mut status = ServerStatus::Pending;
    for _ in 0..200 {
        status = store.get_server(&id).await.unwrap().unwrap().status;
        if status == ServerStatus::Active {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    assert_eq!(status, ServerStatus::Active);

    let events = store.list_events(Some(&id)).await.unwrap();
    assert!(events
        .iter()
        .any(|e| e.message == "Deployment retry requested"));

    // retry applies only to failed servers
    let (status, _) = send(&app, patch_json(&uri, &json!({"status": "pending"}))).await;
    assert_eq!(status, StatusCode::CONFLICT);
}
