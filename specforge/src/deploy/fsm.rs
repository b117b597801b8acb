//! Finite State Machine for server lifecycle

use platform_models::ServerStatus;
use thiserror::Error;

/// Lifecycle event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// Start a deployment run
    StartDeploy,

    /// Provisioning finished
    DeploySucceeded,

    /// Provisioning failed
    DeployFailed(String),

    /// Code synthesis failed before any deployment
    GenerationFailed(String),

    /// Administrative stop
    Stop,

    /// Administrative reset of a failed server for another deployment
    Retry,
}

/// Rejected transition
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid transition: {from} -> {event:?}")]
pub struct TransitionError {
    pub from: ServerStatus,
    pub event: LifecycleEvent,
}

/// Server lifecycle FSM
#[derive(Debug, Clone)]
pub struct ServerFsm {
    state: ServerStatus,
    error: Option<String>,
}

impl ServerFsm {
    /// Create a new FSM in pending state
    pub fn new() -> Self {
        Self::from_status(ServerStatus::Pending)
    }

    /// Resume from a persisted status
    pub fn from_status(state: ServerStatus) -> Self {
        Self { state, error: None }
    }

    /// Get current state
    pub fn state(&self) -> ServerStatus {
        self.state
    }

    /// Get error message if any
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Whether `event` is accepted in the current state
    pub fn can(&self, event: &LifecycleEvent) -> bool {
        self.clone().process(event.clone()).is_ok()
    }

    /// Process an event and transition state
    pub fn process(&mut self, event: LifecycleEvent) -> Result<ServerStatus, TransitionError> {
        let new_state = match (self.state, &event) {
            // From Pending
            (ServerStatus::Pending, LifecycleEvent::StartDeploy) => {
                self.error = None;
                ServerStatus::Deploying
            }
            (ServerStatus::Pending, LifecycleEvent::GenerationFailed(err)) => {
                self.error = Some(err.clone());
                ServerStatus::Failed
            }

            // From Deploying
            (ServerStatus::Deploying, LifecycleEvent::DeploySucceeded) => ServerStatus::Active,
            (ServerStatus::Deploying, LifecycleEvent::DeployFailed(err)) => {
                self.error = Some(err.clone());
                ServerStatus::Failed
            }

            // From Failed
            (ServerStatus::Failed, LifecycleEvent::Retry) => {
                self.error = None;
                ServerStatus::Pending
            }

            (
                ServerStatus::Active | ServerStatus::Pending | ServerStatus::Failed,
                LifecycleEvent::Stop,
            ) => ServerStatus::Stopped,

            // Invalid transitions
            (from, _) => return Err(TransitionError { from, event }),
        };

        self.state = new_state;
        Ok(new_state)
    }
}

impl Default for ServerFsm {
    fn default() -> Self {
        Self::new()
    }
}
