//! Deployment runs

use std::sync::Arc;

use platform_models::{
    DeploymentResult, EventStatus, EventType, NewEvent, ServerRecord, ServerStatus,
};
use serde_json::json;
use thiserror::Error;
use tokio::time::Instant;
use tracing::{error, info, instrument, warn};

use crate::codegen::derive_endpoint;
use crate::deploy::fsm::{LifecycleEvent, ServerFsm, TransitionError};
use crate::deploy::provision::{ProvisionError, ProvisionPhase, Provisioner};
use crate::store::{ServerPatch, ServerStore, StoreError};

pub const SERVER_NOT_FOUND: &str = "Server not found";

#[derive(Error, Debug)]
enum DeployError {
    #[error("Server not found")]
    NotFound,

    #[error(transparent)]
    Transition(#[from] TransitionError),

    #[error(transparent)]
    Provision(#[from] ProvisionError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Drives a `pending` server through provisioning
pub struct Orchestrator {
    store: Arc<dyn ServerStore>,
    provisioner: Arc<dyn Provisioner>,
}

impl Orchestrator {
    pub fn new(store: Arc<dyn ServerStore>, provisioner: Arc<dyn Provisioner>) -> Self {
        Self { store, provisioner }
    }

    /// Run a full deployment of a server
    ///
    /// Progress is persisted on the record and as audit events; the
    /// returned result mirrors what was persisted. Never fails outright.
    #[instrument(skip_all, fields(server_id = %id))]
    pub async fn deploy_server(&self, id: &str) -> DeploymentResult {
        let mut logs = Vec::new();

        let server = match self.store.get_server(id).await {
            Ok(Some(server)) => server,
            Ok(None) => return rejected(logs, SERVER_NOT_FOUND),
            Err(e) => return rejected(logs, e.to_string()),
        };

        // a run that cannot start leaves no trace
        let mut fsm = ServerFsm::from_status(server.status);
        if let Err(e) = fsm.process(LifecycleEvent::StartDeploy) {
            warn!("Deployment refused: {}", e);
            return rejected(logs, e.to_string());
        }

        let started = Instant::now();
        logs.push("Starting deployment process...".to_string());

        let claim = ServerPatch::new()
            .status(ServerStatus::Deploying)
            .expect_status(server.status);
        match self.store.update_server(id, claim).await {
            Ok(Some(_)) => {}
            Ok(None) => return rejected(logs, SERVER_NOT_FOUND),
            Err(e @ StoreError::StatusConflict { .. }) => {
                warn!("Deployment refused: {}", e);
                return rejected(logs, e.to_string());
            }
            Err(e) => return self.fail(id, &mut fsm, logs, e.into()).await,
        }
        info!("Deployment started");

        match self.run(id, &server, &mut fsm, &mut logs, started).await {
            Ok(endpoint) => DeploymentResult {
                success: true,
                endpoint: Some(endpoint),
                logs,
                error: None,
            },
            Err(e) => self.fail(id, &mut fsm, logs, e).await,
        }
    }

    async fn run(
        &self,
        id: &str,
        server: &ServerRecord,
        fsm: &mut ServerFsm,
        logs: &mut Vec<String>,
        started: Instant,
    ) -> Result<String, DeployError> {
        self.store
            .append_event(
                NewEvent::new(
                    id,
                    EventType::Deployment,
                    EventStatus::Success,
                    "Deployment started",
                )
                .with_details(json!({ "step": "initialization" })),
            )
            .await?;

        for phase in ProvisionPhase::ALL {
            self.provisioner.run_phase(server, phase).await?;
            logs.push(phase.log_line().to_string());
        }

        let server = self
            .store
            .get_server(id)
            .await?
            .ok_or(DeployError::NotFound)?;
        let endpoint = derive_endpoint(&server.name, server.environment);

        fsm.process(LifecycleEvent::DeploySucceeded)?;
        let patch = ServerPatch::new()
            .status(ServerStatus::Active)
            .endpoint(endpoint.clone())
            .deployment_logs(logs.join("\n"))
            .uptime("100%")
            .last_health_check(chrono::Utc::now())
            .expect_status(ServerStatus::Deploying);
        self.store
            .update_server(id, patch)
            .await?
            .ok_or(DeployError::NotFound)?;

        let deployment_time = started.elapsed().as_millis() as u64;
        self.store
            .append_event(
                NewEvent::new(
                    id,
                    EventType::Deployment,
                    EventStatus::Success,
                    "Server deployed successfully",
                )
                .with_details(json!({
                    "endpoint": endpoint,
                    "deploymentTime": deployment_time,
                })),
            )
            .await?;

        logs.push(format!(
            "Deployment complete! Server available at {}",
            endpoint
        ));
        info!(%endpoint, deployment_time, "Server deployed successfully");
        Ok(endpoint)
    }

    async fn fail(
        &self,
        id: &str,
        fsm: &mut ServerFsm,
        mut logs: Vec<String>,
        err: DeployError,
    ) -> DeploymentResult {
        let message = err.to_string();
        error!("Deployment failed: {}", message);
        logs.push(format!("Deployment failed: {}", message));

        if let Err(e) = fsm.process(LifecycleEvent::DeployFailed(message.clone())) {
            warn!("{}", e);
        }

        let patch = ServerPatch::new()
            .status(ServerStatus::Failed)
            .deployment_logs(logs.join("\n"))
            .expect_status(ServerStatus::Deploying);
        let still_exists = match self.store.update_server(id, patch).await {
            Ok(updated) => updated.is_some(),
            Err(e) => {
                warn!("Could not record deployment failure: {}", e);
                true
            }
        };

        if still_exists {
            let event = NewEvent::new(
                id,
                EventType::Deployment,
                EventStatus::Error,
                format!("Deployment failed: {}", message),
            )
            .with_details(json!({ "error": message }));
            if let Err(e) = self.store.append_event(event).await {
                warn!("Could not append failure event: {}", e);
            }
        }

        DeploymentResult {
            success: false,
            endpoint: None,
            logs,
            error: Some(message),
        }
    }
}

fn rejected(logs: Vec<String>, error: impl Into<String>) -> DeploymentResult {
    DeploymentResult {
        success: false,
        endpoint: None,
        logs,
        error: Some(error.into()),
    }
}
