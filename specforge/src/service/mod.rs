//! Server creation flow and dashboard queries

use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use platform_models::{
    DeploymentResult, EventStatus, EventType, NewEvent, NewServer, ServerRecord, ServerStats,
    ServerStatus, ServerUpdate, ValidateResponse,
};
use serde_json::{json, Value};
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::codegen::generate_server;
use crate::deploy::fsm::{LifecycleEvent, ServerFsm, TransitionError};
use crate::deploy::Orchestrator;
use crate::spec::validate_spec;
use crate::store::{ServerFilter, ServerPatch, ServerStore, StoreError};

/// Errors of the create flow
#[derive(Error, Debug)]
pub enum CreateServerError {
    #[error("Invalid server configuration")]
    InvalidConfig(Vec<String>),

    #[error("Invalid OpenAPI specification")]
    InvalidSpec(Vec<String>),

    #[error("{0}")]
    GenerationFailed(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl CreateServerError {
    pub fn details(&self) -> Option<&[String]> {
        match self {
            CreateServerError::InvalidConfig(details) | CreateServerError::InvalidSpec(details) => {
                Some(details)
            }
            _ => None,
        }
    }
}

/// Errors of an administrative update
#[derive(Error, Debug)]
pub enum UpdateServerError {
    #[error("Invalid server update")]
    Invalid(Vec<String>),

    #[error("Status cannot be set to {0}")]
    UnsupportedStatus(ServerStatus),

    #[error(transparent)]
    Transition(#[from] TransitionError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// An updated server, with the deployment a retry started
#[derive(Debug)]
pub struct UpdatedServer {
    pub record: ServerRecord,
    pub deployment: Option<JoinHandle<DeploymentResult>>,
}

/// A created server and its background deployment
#[derive(Debug)]
pub struct CreatedServer {
    pub record: ServerRecord,
    pub deployment: JoinHandle<DeploymentResult>,
}

/// Check a creation config before anything is stored
pub fn validate_config(config: &NewServer) -> Result<(), Vec<String>> {
    config_errors(Some(&config.name), Some(config.rate_limit))
}

/// Check the editable fields of an update
pub fn validate_update(update: &ServerUpdate) -> Result<(), Vec<String>> {
    config_errors(update.name.as_deref(), update.rate_limit)
}

fn config_errors(name: Option<&str>, rate_limit: Option<u32>) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();
    if name.is_some_and(|name| name.trim().is_empty()) {
        errors.push("name: String must contain at least 1 character(s)".to_string());
    }
    if rate_limit.is_some_and(|limit| limit < 1) {
        errors.push("rateLimit: Number must be greater than or equal to 1".to_string());
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validate a document, echoing it back when it is valid
pub fn validate_document(doc: Value) -> ValidateResponse {
    let validation = validate_spec(&doc);
    let spec = validation.is_valid.then_some(doc);
    ValidateResponse { validation, spec }
}

pub struct ServerService {
    store: Arc<dyn ServerStore>,
    orchestrator: Arc<Orchestrator>,
}

impl ServerService {
    pub fn new(store: Arc<dyn ServerStore>, orchestrator: Arc<Orchestrator>) -> Self {
        Self {
            store,
            orchestrator,
        }
    }

    pub fn store(&self) -> &Arc<dyn ServerStore> {
        &self.store
    }

    /// Validate, store and generate a server, then deploy it in the background
    ///
    /// The deployment is spawned and not awaited; its progress shows up only
    /// on the record and in the event log.
    pub async fn create_server(&self, config: NewServer) -> Result<CreatedServer, CreateServerError> {
        validate_config(&config).map_err(CreateServerError::InvalidConfig)?;

        let validation = validate_spec(&config.open_api_spec);
        if !validation.is_valid {
            return Err(CreateServerError::InvalidSpec(validation.errors));
        }

        let server = self.store.create_server(config).await?;
        info!(server_id = %server.id, name = %server.name, "Server created");

        self.store
            .append_event(
                NewEvent::new(
                    &server.id,
                    EventType::Upload,
                    EventStatus::Success,
                    "OpenAPI specification uploaded and validated",
                )
                .with_details(json!({
                    "endpointCount": validation.endpoint_count,
                    "resourceTypes": validation.resource_types,
                })),
            )
            .await?;

        let generation = generate_server(&server);
        let code = match (generation.success, generation.code) {
            (true, Some(code)) => code,
            _ => {
                let message = generation
                    .error
                    .unwrap_or_else(|| "Unknown generation error".to_string());
                self.record_generation_failure(&server, &message).await?;
                return Err(CreateServerError::GenerationFailed(message));
            }
        };

        let code_length = code.len();
        let record = self
            .store
            .update_server(&server.id, ServerPatch::new().generated_code(code))
            .await?
            .unwrap_or(server);
        self.store
            .append_event(
                NewEvent::new(
                    &record.id,
                    EventType::Generation,
                    EventStatus::Success,
                    "MCP server code generated successfully",
                )
                .with_details(json!({ "codeLength": code_length })),
            )
            .await?;

        let deployment = self.spawn_deployment(&record.id);
        Ok(CreatedServer { record, deployment })
    }

    fn spawn_deployment(&self, id: &str) -> JoinHandle<DeploymentResult> {
        let orchestrator = self.orchestrator.clone();
        let id = id.to_string();
        tokio::spawn(async move {
            let result = orchestrator.deploy_server(&id).await;
            if let Some(err) = &result.error {
                error!(server_id = %id, "Background deployment failed: {}", err);
            }
            result
        })
    }

    /// Apply an administrative update, returning `None` for an unknown id
    ///
    /// Status changes go through the lifecycle FSM: `stopped` stops a
    /// pending, active or failed server and `pending` resets a failed one
    /// and deploys it again in the background.
    pub async fn update_server(
        &self,
        id: &str,
        update: ServerUpdate,
    ) -> Result<Option<UpdatedServer>, UpdateServerError> {
        validate_update(&update).map_err(UpdateServerError::Invalid)?;

        let Some(server) = self.store.get_server(id).await? else {
            return Ok(None);
        };

        let transition = match update.status {
            None => None,
            Some(ServerStatus::Stopped) => Some(LifecycleEvent::Stop),
            Some(ServerStatus::Pending) => Some(LifecycleEvent::Retry),
            Some(other) => return Err(UpdateServerError::UnsupportedStatus(other)),
        };

        let mut patch = ServerPatch::new();
        if let Some(name) = update.name {
            patch = patch.name(name);
        }
        if let Some(rate_limit) = update.rate_limit {
            patch = patch.rate_limit(rate_limit);
        }
        if let Some(event) = &transition {
            let status = ServerFsm::from_status(server.status).process(event.clone())?;
            patch = patch.status(status).expect_status(server.status);
        }

        let Some(record) = self.store.update_server(id, patch).await? else {
            return Ok(None);
        };
        info!(server_id = %id, status = %record.status, "Server updated");

        let message = match transition {
            Some(LifecycleEvent::Stop) => "Server stopped",
            Some(LifecycleEvent::Retry) => "Deployment retry requested",
            _ => return Ok(Some(UpdatedServer { record, deployment: None })),
        };
        self.store
            .append_event(
                NewEvent::new(id, EventType::Deployment, EventStatus::Success, message)
                    .with_details(json!({ "previousStatus": server.status })),
            )
            .await?;

        let deployment = (record.status == ServerStatus::Pending)
            .then(|| self.spawn_deployment(id));
        Ok(Some(UpdatedServer { record, deployment }))
    }

    async fn record_generation_failure(
        &self,
        server: &ServerRecord,
        message: &str,
    ) -> Result<(), StoreError> {
        warn!(server_id = %server.id, "Code generation failed: {}", message);

        let mut fsm = ServerFsm::from_status(server.status);
        match fsm.process(LifecycleEvent::GenerationFailed(message.to_string())) {
            Ok(status) => {
                let patch = ServerPatch::new().status(status).expect_status(server.status);
                if let Err(e) = self.store.update_server(&server.id, patch).await {
                    warn!(server_id = %server.id, "Could not mark server failed: {}", e);
                }
            }
            Err(e) => warn!(server_id = %server.id, "{}", e),
        }

        self.store
            .append_event(
                NewEvent::new(
                    &server.id,
                    EventType::Generation,
                    EventStatus::Error,
                    format!("Code generation failed: {}", message),
                )
                .with_details(json!({ "error": message })),
            )
            .await?;
        Ok(())
    }

    /// Delete a server, returning whether it existed
    pub async fn delete_server(&self, id: &str) -> Result<bool, StoreError> {
        if !self.store.delete_server(id).await? {
            return Ok(false);
        }
        info!(server_id = %id, "Server deleted");

        let deleted_at = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        self.store
            .append_event(
                NewEvent::new(
                    id,
                    EventType::Deployment,
                    EventStatus::Success,
                    "Server deleted successfully",
                )
                .with_details(json!({ "deletedAt": deleted_at })),
            )
            .await?;
        Ok(true)
    }

    /// Dashboard statistics over every server
    pub async fn stats(&self) -> Result<ServerStats, StoreError> {
        let servers = self.store.list_servers(None).await?;
        let active_servers = self
            .store
            .list_servers(Some(ServerFilter::status(ServerStatus::Active)))
            .await?
            .len();
        Ok(summarize(&servers, active_servers))
    }
}

fn summarize(servers: &[ServerRecord], active_servers: usize) -> ServerStats {
    let total_requests = servers.iter().map(|s| s.request_count).sum();
    let avg_uptime = if servers.is_empty() {
        "0%".to_string()
    } else {
        let sum: f64 = servers.iter().map(|s| uptime_percent(&s.uptime)).sum();
        format!("{}%", (sum / servers.len() as f64).round())
    };

    ServerStats {
        total_servers: servers.len(),
        active_servers,
        total_requests,
        avg_uptime,
    }
}

fn uptime_percent(uptime: &str) -> f64 {
    uptime.trim().trim_end_matches('%').parse().unwrap_or(0.0)
}
