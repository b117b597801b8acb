//! Deployment audit events

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Pipeline step that produced an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    Upload,
    Validation,
    Generation,
    Deployment,
    HealthCheck,
}

/// Outcome of the step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    Success,
    Warning,
    Error,
}

/// An event waiting to be appended
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEvent {
    pub server_id: String,
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub status: EventStatus,
    pub message: String,
    pub details: serde_json::Value,
}

impl NewEvent {
    pub fn new(
        server_id: impl Into<String>,
        event_type: EventType,
        status: EventStatus,
        message: impl Into<String>,
    ) -> Self {
        Self {
            server_id: server_id.into(),
            event_type,
            status,
            message: message.into(),
            details: serde_json::Value::Null,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = details;
        self
    }
}

/// Immutable audit record attached to a server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentEvent {
    pub id: String,
    pub server_id: String,
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub status: EventStatus,
    pub message: String,
    pub details: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl DeploymentEvent {
    pub fn from_new(event: NewEvent, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            server_id: event.server_id,
            event_type: event.event_type,
            status: event.status,
            message: event.message,
            details: event.details,
            created_at: now,
        }
    }

    /// True when the event matches the given type and status
    pub fn is(&self, event_type: EventType, status: EventStatus) -> bool {
        self.event_type == event_type && self.status == status
    }
}
