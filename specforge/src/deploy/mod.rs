//! Deployment module

pub mod fsm;
pub mod orchestrator;
pub mod provision;

pub use orchestrator::{Orchestrator, SERVER_NOT_FOUND};
pub use provision::{
    ProvisionError, ProvisionPhase, ProvisionSettings, Provisioner, SimulatedProvisioner,
    MAX_PHASE_DELAY, MIN_PHASE_DELAY,
};
