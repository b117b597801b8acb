//! Persistence of server records and audit events

pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use platform_models::{DeploymentEvent, NewEvent, NewServer, ServerRecord, ServerStatus};
use thiserror::Error;

pub use memory::MemoryStore;

/// Storage errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("expected status {expected}, found {actual}")]
    StatusConflict {
        expected: ServerStatus,
        actual: ServerStatus,
    },

    #[error("{0}")]
    Backend(String),
}

/// Server listing filter
#[derive(Debug, Clone, Default)]
pub struct ServerFilter {
    pub status: Option<ServerStatus>,
}

impl ServerFilter {
    pub fn status(status: ServerStatus) -> Self {
        Self {
            status: Some(status),
        }
    }

    pub fn matches(&self, server: &ServerRecord) -> bool {
        self.status.is_none_or(|status| server.status == status)
    }
}

/// Partial update of a server record
///
/// A patch is applied atomically. When `expected_status` is set the patch is
/// rejected with [`StoreError::StatusConflict`] unless the stored record is
/// in that status, and `request_count_delta` is added to the stored counter
/// rather than overwriting it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServerPatch {
    pub name: Option<String>,
    pub rate_limit: Option<u32>,
    pub status: Option<ServerStatus>,
    pub endpoint: Option<String>,
    pub generated_code: Option<String>,
    pub deployment_logs: Option<String>,
    pub uptime: Option<String>,
    pub last_health_check: Option<DateTime<Utc>>,
    pub request_count_delta: u64,
    pub expected_status: Option<ServerStatus>,
}

impl ServerPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn rate_limit(mut self, rate_limit: u32) -> Self {
        self.rate_limit = Some(rate_limit);
        self
    }

    pub fn status(mut self, status: ServerStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn generated_code(mut self, code: impl Into<String>) -> Self {
        self.generated_code = Some(code.into());
        self
    }

    pub fn deployment_logs(mut self, logs: impl Into<String>) -> Self {
        self.deployment_logs = Some(logs.into());
        self
    }

    pub fn uptime(mut self, uptime: impl Into<String>) -> Self {
        self.uptime = Some(uptime.into());
        self
    }

    pub fn last_health_check(mut self, at: DateTime<Utc>) -> Self {
        self.last_health_check = Some(at);
        self
    }

    pub fn add_requests(mut self, delta: u64) -> Self {
        self.request_count_delta = delta;
        self
    }

    pub fn expect_status(mut self, status: ServerStatus) -> Self {
        self.expected_status = Some(status);
        self
    }

    /// Merge the patch into a record, bumping `updated_at`
    pub fn apply(self, record: &mut ServerRecord, now: DateTime<Utc>) -> Result<(), StoreError> {
        if let Some(expected) = self.expected_status {
            if record.status != expected {
                return Err(StoreError::StatusConflict {
                    expected,
                    actual: record.status,
                });
            }
        }

        if let Some(name) = self.name {
            record.name = name;
        }
        if let Some(rate_limit) = self.rate_limit {
            record.rate_limit = rate_limit;
        }
        if let Some(status) = self.status {
            record.status = status;
        }
        if let Some(endpoint) = self.endpoint {
            record.endpoint = Some(endpoint);
        }
        if let Some(code) = self.generated_code {
            record.generated_code = Some(code);
        }
        if let Some(logs) = self.deployment_logs {
            record.deployment_logs = Some(logs);
        }
        if let Some(uptime) = self.uptime {
            record.uptime = uptime;
        }
        if let Some(at) = self.last_health_check {
            record.last_health_check = Some(at);
        }
        record.request_count = record.request_count.saturating_add(self.request_count_delta);
        record.updated_at = now;
        Ok(())
    }
}

/// Persistence interface shared by the orchestrator, the health scheduler
/// and the API layer
#[async_trait]
pub trait ServerStore: Send + Sync {
    async fn get_server(&self, id: &str) -> Result<Option<ServerRecord>, StoreError>;

    /// Servers newest first
    async fn list_servers(&self, filter: Option<ServerFilter>)
        -> Result<Vec<ServerRecord>, StoreError>;

    /// Insert a `pending` record with a fresh id and timestamps
    async fn create_server(&self, config: NewServer) -> Result<ServerRecord, StoreError>;

    /// Apply a patch; `Ok(None)` when the record does not exist
    async fn update_server(
        &self,
        id: &str,
        patch: ServerPatch,
    ) -> Result<Option<ServerRecord>, StoreError>;

    async fn delete_server(&self, id: &str) -> Result<bool, StoreError>;

    async fn append_event(&self, event: NewEvent) -> Result<DeploymentEvent, StoreError>;

    /// Events newest first, optionally for one server
    async fn list_events(&self, server_id: Option<&str>)
        -> Result<Vec<DeploymentEvent>, StoreError>;

    async fn list_recent_events(&self, limit: usize) -> Result<Vec<DeploymentEvent>, StoreError>;
}
