//! HTTP server setup

use std::future::Future;
use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::app::options::ServerOptions;
use crate::errors::PlatformError;
use crate::server::handlers::{
    create_server_handler, delete_server_handler, get_server_handler, health_handler,
    list_servers_handler, recent_events_handler, server_events_handler, stats_handler,
    update_server_handler, validate_handler,
};
use crate::server::state::ServerState;

/// Build the API router
pub fn router(state: Arc<ServerState>) -> Router {
    Router::new()
        // Platform
        .route("/api/health", get(health_handler))
        .route("/api/stats", get(stats_handler))
        // Documents
        .route("/api/validate-openapi", post(validate_handler))
        // Servers
        .route(
            "/api/servers",
            get(list_servers_handler).post(create_server_handler),
        )
        .route(
            "/api/servers/{id}",
            get(get_server_handler)
                .patch(update_server_handler)
                .delete(delete_server_handler),
        )
        // Events
        .route("/api/servers/{id}/events", get(server_events_handler))
        .route("/api/events", get(recent_events_handler))
        // State and middleware
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Start the HTTP server
pub async fn serve(
    options: &ServerOptions,
    state: Arc<ServerState>,
    shutdown_signal: impl Future<Output = ()> + Send + 'static,
) -> Result<JoinHandle<Result<(), PlatformError>>, PlatformError> {
    let app = router(state);

    let addr = format!("{}:{}", options.host, options.port);
    info!("Starting HTTP server on {}", addr);

    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| PlatformError::ServerError(e.to_string()))?;

    let handle = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal)
            .await
            .map_err(|e| PlatformError::ServerError(e.to_string()))
    });

    Ok(handle)
}
