//! Platform wire models
//!
//! Records, audit events and operation results shared between the
//! specforge service and anything that talks to its API.

pub mod events;
pub mod results;
pub mod servers;

pub use events::{DeploymentEvent, EventStatus, EventType, NewEvent};
pub use results::{
    ApiError, DeploymentResult, Endpoint, GenerationResult, HealthResponse, ServerStats,
    ValidateResponse, ValidationResult,
};
pub use servers::{AuthScheme, Environment, NewServer, ServerRecord, ServerStatus, ServerUpdate};
