//! HTTP request handlers

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{SecondsFormat, Utc};
use platform_models::{ApiError, HealthResponse, NewServer, ServerUpdate};
use serde::Deserialize;
use tracing::error;

use crate::service::{validate_document, CreateServerError, UpdateServerError};
use crate::server::state::ServerState;
use crate::spec::{parse_document, DocumentFormat};
use crate::store::StoreError;

pub const DEFAULT_EVENT_LIMIT: usize = 10;

/// Error response of a handler
#[derive(Debug)]
pub enum ApiFailure {
    NotFound,
    BadRequest(ApiError),
    Conflict(ApiError),
    Internal(String),
}

impl ApiFailure {
    fn internal(context: &str, err: impl std::fmt::Display) -> Self {
        error!("{}: {}", context, err);
        ApiFailure::Internal(context.to_string())
    }

    fn bad_request(error: &str, details: Vec<String>) -> Self {
        ApiFailure::BadRequest(ApiError::new(error).with_details(details.into()))
    }
}

impl IntoResponse for ApiFailure {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiFailure::NotFound => (StatusCode::NOT_FOUND, ApiError::new("Server not found")),
            ApiFailure::BadRequest(body) => (StatusCode::BAD_REQUEST, body),
            ApiFailure::Conflict(body) => (StatusCode::CONFLICT, body),
            ApiFailure::Internal(message) => {
                (StatusCode::INTERNAL_SERVER_ERROR, ApiError::new(message))
            }
        };
        (status, Json(body)).into_response()
    }
}

/// Platform health handler
pub async fn health_handler(State(state): State<Arc<ServerState>>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        version: state.version.clone(),
    })
}

/// Validate a raw JSON or YAML document
pub async fn validate_handler(
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, ApiFailure> {
    let format = match headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
    {
        Some(content_type) if content_type.contains("yaml") => DocumentFormat::Yaml,
        _ => DocumentFormat::Json,
    };

    let doc = std::str::from_utf8(&body)
        .ok()
        .and_then(|text| parse_document(text, format).ok())
        .ok_or_else(|| {
            ApiFailure::BadRequest(ApiError::new(
                "Invalid file format. Please upload a valid JSON or YAML file.",
            ))
        })?;

    Ok(Json(validate_document(doc)))
}

pub async fn list_servers_handler(
    State(state): State<Arc<ServerState>>,
) -> Result<impl IntoResponse, ApiFailure> {
    let servers = state
        .store
        .list_servers(None)
        .await
        .map_err(|e| ApiFailure::internal("Failed to fetch servers", e))?;
    Ok(Json(servers))
}

pub async fn get_server_handler(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiFailure> {
    let server = state
        .store
        .get_server(&id)
        .await
        .map_err(|e| ApiFailure::internal("Failed to fetch server", e))?
        .ok_or(ApiFailure::NotFound)?;
    Ok(Json(server))
}

/// Create a server and start its deployment
pub async fn create_server_handler(
    State(state): State<Arc<ServerState>>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiFailure> {
    let config: NewServer = serde_json::from_slice(&body).map_err(|e| {
        ApiFailure::bad_request("Invalid server configuration", vec![e.to_string()])
    })?;

    match state.service.create_server(config).await {
        // the deployment keeps running detached
        Ok(created) => Ok((StatusCode::CREATED, Json(created.record))),
        Err(e @ (CreateServerError::InvalidConfig(_) | CreateServerError::InvalidSpec(_))) => {
            let details = e.details().map(|d| d.to_vec()).unwrap_or_default();
            Err(ApiFailure::bad_request(&e.to_string(), details))
        }
        Err(CreateServerError::GenerationFailed(message)) => Err(ApiFailure::Internal(message)),
        Err(CreateServerError::Store(e)) => Err(ApiFailure::internal("Failed to create server", e)),
    }
}

/// Administrative update of name, rate limit or status
pub async fn update_server_handler(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiFailure> {
    let update: ServerUpdate = serde_json::from_slice(&body)
        .map_err(|e| ApiFailure::bad_request("Invalid server update", vec![e.to_string()]))?;

    match state.service.update_server(&id, update).await {
        Ok(Some(updated)) => Ok(Json(updated.record)),
        Ok(None) => Err(ApiFailure::NotFound),
        Err(UpdateServerError::Invalid(details)) => {
            Err(ApiFailure::bad_request("Invalid server update", details))
        }
        Err(e @ UpdateServerError::UnsupportedStatus(_)) => {
            Err(ApiFailure::BadRequest(ApiError::new(e.to_string())))
        }
        Err(e @ UpdateServerError::Transition(_))
        | Err(e @ UpdateServerError::Store(StoreError::StatusConflict { .. })) => {
            Err(ApiFailure::Conflict(ApiError::new(e.to_string())))
        }
        Err(UpdateServerError::Store(e)) => Err(ApiFailure::internal("Failed to update server", e)),
    }
}

pub async fn delete_server_handler(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiFailure> {
    let deleted = state
        .service
        .delete_server(&id)
        .await
        .map_err(|e| ApiFailure::internal("Failed to delete server", e))?;
    if !deleted {
        return Err(ApiFailure::NotFound);
    }
    Ok(StatusCode::NO_CONTENT)
}

pub async fn server_events_handler(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiFailure> {
    let events = state
        .store
        .list_events(Some(&id))
        .await
        .map_err(fetch_events_failed)?;
    Ok(Json(events))
}

#[derive(Debug, Deserialize)]
pub struct EventsQuery {
    pub limit: Option<String>,
}

impl EventsQuery {
    /// Requested limit, falling back to the default when absent or unusable
    pub fn limit(&self) -> usize {
        self.limit
            .as_deref()
            .and_then(|raw| raw.trim().parse::<usize>().ok())
            .filter(|limit| *limit > 0)
            .unwrap_or(DEFAULT_EVENT_LIMIT)
    }
}

pub async fn recent_events_handler(
    State(state): State<Arc<ServerState>>,
    Query(query): Query<EventsQuery>,
) -> Result<impl IntoResponse, ApiFailure> {
    let events = state
        .store
        .list_recent_events(query.limit())
        .await
        .map_err(fetch_events_failed)?;
    Ok(Json(events))
}

pub async fn stats_handler(
    State(state): State<Arc<ServerState>>,
) -> Result<impl IntoResponse, ApiFailure> {
    let stats = state
        .service
        .stats()
        .await
        .map_err(|e| ApiFailure::internal("Failed to fetch stats", e))?;
    Ok(Json(stats))
}

fn fetch_events_failed(e: StoreError) -> ApiFailure {
    ApiFailure::internal("Failed to fetch deployment events", e)
}
