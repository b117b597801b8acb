//! Health checks of active servers

use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use futures::future::join_all;
use platform_models::{EventStatus, EventType, NewEvent, ServerStatus};
use serde_json::json;
use tracing::{debug, warn};

use crate::health::probe::{HealthProbe, ProbeOutcome};
use crate::store::{ServerFilter, ServerPatch, ServerStore, StoreError};

pub const HEALTHY_UPTIME: &str = "99.8%";

/// What a single health check did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckOutcome {
    /// Record missing, not active, or changed status mid-check
    Skipped,

    Passed { requests_served: u64 },

    Degraded { response_time: String },
}

pub struct HealthChecker {
    store: Arc<dyn ServerStore>,
    probe: Arc<dyn HealthProbe>,
}

impl HealthChecker {
    pub fn new(store: Arc<dyn ServerStore>, probe: Arc<dyn HealthProbe>) -> Self {
        Self { store, probe }
    }

    /// Probe one server and record the result
    ///
    /// Only `active` servers are probed. A passing probe updates the record
    /// under an `active` guard; a degraded probe only appends a warning.
    pub async fn health_check(&self, id: &str) -> Result<CheckOutcome, StoreError> {
        let Some(server) = self.store.get_server(id).await? else {
            return Ok(CheckOutcome::Skipped);
        };
        if server.status != ServerStatus::Active {
            return Ok(CheckOutcome::Skipped);
        }

        let now = Utc::now();
        let timestamp = now.to_rfc3339_opts(SecondsFormat::Millis, true);

        match self.probe.probe(&server).await {
            ProbeOutcome::Healthy { requests_served } => {
                let patch = ServerPatch::new()
                    .last_health_check(now)
                    .uptime(HEALTHY_UPTIME)
                    .add_requests(requests_served)
                    .expect_status(ServerStatus::Active);
                match self.store.update_server(id, patch).await {
                    Ok(Some(_)) => {}
                    Ok(None) => return Ok(CheckOutcome::Skipped),
                    Err(StoreError::StatusConflict { actual, .. }) => {
                        debug!(server_id = %id, %actual, "Status changed during health check");
                        return Ok(CheckOutcome::Skipped);
                    }
                    Err(e) => return Err(e),
                }

                self.store
                    .append_event(
                        NewEvent::new(
                            id,
                            EventType::HealthCheck,
                            EventStatus::Success,
                            "Health check passed",
                        )
                        .with_details(json!({ "timestamp": timestamp })),
                    )
                    .await?;
                debug!(server_id = %id, requests_served, "Health check passed");
                Ok(CheckOutcome::Passed { requests_served })
            }
            ProbeOutcome::Degraded { response_time } => {
                self.store
                    .append_event(
                        NewEvent::new(
                            id,
                            EventType::HealthCheck,
                            EventStatus::Warning,
                            "Health check warning - high response time",
                        )
                        .with_details(json!({
                            "timestamp": timestamp,
                            "responseTime": response_time,
                        })),
                    )
                    .await?;
                warn!(server_id = %id, %response_time, "Health check warning - high response time");
                Ok(CheckOutcome::Degraded { response_time })
            }
        }
    }

    /// Check every active server concurrently
    pub async fn check_all_active(&self) -> Result<Vec<CheckOutcome>, StoreError> {
        let servers = self
            .store
            .list_servers(Some(ServerFilter::status(ServerStatus::Active)))
            .await?;
        debug!("Checking {} active server(s)", servers.len());

        let checks = servers.iter().map(|server| self.health_check(&server.id));
        let mut outcomes = Vec::with_capacity(servers.len());
        for (server, result) in servers.iter().zip(join_all(checks).await) {
            match result {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => {
                    warn!(server_id = %server.id, "Health check failed: {}", e);
                    outcomes.push(CheckOutcome::Skipped);
                }
            }
        }
        Ok(outcomes)
    }
}
