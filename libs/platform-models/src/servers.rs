//! Server records

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle status of a server record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ServerStatus {
    /// Created, not yet deployed
    #[default]
    Pending,

    /// Provisioning in progress
    Deploying,

    /// Deployed and receiving health checks
    Active,

    /// Generation or deployment failed
    Failed,

    /// Stopped by an administrator
    Stopped,
}

impl ServerStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServerStatus::Pending => "pending",
            ServerStatus::Deploying => "deploying",
            ServerStatus::Active => "active",
            ServerStatus::Failed => "failed",
            ServerStatus::Stopped => "stopped",
        }
    }
}

impl fmt::Display for ServerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Target environment of a server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Environment {
    #[default]
    Production,
    Staging,
    Development,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Production => "production",
            Environment::Staging => "staging",
            Environment::Development => "development",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Authentication enforced by the synthesized service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AuthScheme {
    #[default]
    ApiKey,
    BearerToken,
    BasicAuth,
    None,
}

impl AuthScheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthScheme::ApiKey => "api_key",
            AuthScheme::BearerToken => "bearer_token",
            AuthScheme::BasicAuth => "basic_auth",
            AuthScheme::None => "none",
        }
    }
}

impl fmt::Display for AuthScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn default_rate_limit() -> u32 {
    100
}

/// Configuration submitted when creating a server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewServer {
    pub name: String,

    #[serde(default)]
    pub environment: Environment,

    #[serde(default)]
    pub authentication: AuthScheme,

    /// Requests per minute
    #[serde(default = "default_rate_limit")]
    pub rate_limit: u32,

    pub open_api_spec: serde_json::Value,
}

impl NewServer {
    pub fn new(name: impl Into<String>, open_api_spec: serde_json::Value) -> Self {
        Self {
            name: name.into(),
            environment: Environment::default(),
            authentication: AuthScheme::default(),
            rate_limit: default_rate_limit(),
            open_api_spec,
        }
    }
}

/// Administrative update of an existing server
///
/// Only these fields may be changed; anything else in the body is rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ServerUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate_limit: Option<u32>,

    /// `stopped` stops a server, `pending` retries a failed one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ServerStatus>,
}

/// A synthesized server and its deployment state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerRecord {
    pub id: String,
    pub name: String,
    pub status: ServerStatus,
    pub environment: Environment,
    pub authentication: AuthScheme,
    pub rate_limit: u32,
    pub endpoint: Option<String>,
    pub open_api_spec: serde_json::Value,
    pub generated_code: Option<String>,
    pub deployment_logs: Option<String>,
    pub request_count: u64,
    pub uptime: String,
    pub last_health_check: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ServerRecord {
    /// Build a fresh `pending` record with a random id
    pub fn from_new(config: NewServer, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: config.name,
            status: ServerStatus::Pending,
            environment: config.environment,
            authentication: config.authentication,
            rate_limit: config.rate_limit,
            endpoint: None,
            open_api_spec: config.open_api_spec,
            generated_code: None,
            deployment_logs: None,
            request_count: 0,
            uptime: "0%".to_string(),
            last_health_check: None,
            created_at: now,
            updated_at: now,
        }
    }
}
