//! Simulated provisioning pipeline

use std::time::Duration;

use async_trait::async_trait;
use platform_models::ServerRecord;
use thiserror::Error;
use tracing::debug;

/// Provisioning errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProvisionError {
    #[error("{phase} failed: {message}")]
    PhaseFailed {
        phase: ProvisionPhase,
        message: String,
    },
}

/// One step of the provisioning pipeline, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProvisionPhase {
    ValidateConfiguration,
    BuildImage,
    DeployInfrastructure,
    ConfigureLoadBalancer,
    HealthProbe,
}

impl ProvisionPhase {
    pub const ALL: [ProvisionPhase; 5] = [
        ProvisionPhase::ValidateConfiguration,
        ProvisionPhase::BuildImage,
        ProvisionPhase::DeployInfrastructure,
        ProvisionPhase::ConfigureLoadBalancer,
        ProvisionPhase::HealthProbe,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProvisionPhase::ValidateConfiguration => "validate_configuration",
            ProvisionPhase::BuildImage => "build_image",
            ProvisionPhase::DeployInfrastructure => "deploy_infrastructure",
            ProvisionPhase::ConfigureLoadBalancer => "configure_load_balancer",
            ProvisionPhase::HealthProbe => "health_probe",
        }
    }

    /// Deployment log line recorded once the phase completes
    pub fn log_line(&self) -> &'static str {
        match self {
            ProvisionPhase::ValidateConfiguration => "Validating server configuration...",
            ProvisionPhase::BuildImage => "Generating container image...",
            ProvisionPhase::DeployInfrastructure => "Deploying to infrastructure...",
            ProvisionPhase::ConfigureLoadBalancer => "Configuring load balancer...",
            ProvisionPhase::HealthProbe => "Running health checks...",
        }
    }

    pub fn default_delay(&self) -> Duration {
        match self {
            ProvisionPhase::ValidateConfiguration => Duration::from_millis(1000),
            ProvisionPhase::BuildImage => Duration::from_millis(1500),
            ProvisionPhase::DeployInfrastructure => Duration::from_millis(2000),
            ProvisionPhase::ConfigureLoadBalancer => Duration::from_millis(1000),
            ProvisionPhase::HealthProbe => Duration::from_millis(500),
        }
    }
}

impl std::fmt::Display for ProvisionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shortest delay a phase may take
pub const MIN_PHASE_DELAY: Duration = Duration::from_millis(1);

/// Longest delay a phase may take
pub const MAX_PHASE_DELAY: Duration = Duration::from_secs(3600);

/// Provisioning settings
#[derive(Debug, Clone)]
pub struct ProvisionSettings {
    /// Multiplier applied to every phase delay
    pub delay_scale: f64,
}

impl Default for ProvisionSettings {
    fn default() -> Self {
        Self { delay_scale: 1.0 }
    }
}

impl ProvisionSettings {
    /// Scaled delay of a phase, kept within [`MIN_PHASE_DELAY`, `MAX_PHASE_DELAY`]
    pub fn delay_for(&self, phase: ProvisionPhase) -> Duration {
        let secs = phase.default_delay().as_secs_f64() * self.delay_scale;
        match Duration::try_from_secs_f64(secs) {
            Ok(delay) => delay.clamp(MIN_PHASE_DELAY, MAX_PHASE_DELAY),
            Err(_) if secs > 0.0 => MAX_PHASE_DELAY,
            Err(_) => MIN_PHASE_DELAY,
        }
    }
}

/// Infrastructure that carries out provisioning phases
#[async_trait]
pub trait Provisioner: Send + Sync {
    /// Run a single phase for a server
    async fn run_phase(
        &self,
        server: &ServerRecord,
        phase: ProvisionPhase,
    ) -> Result<(), ProvisionError>;
}

/// Provisioner that only waits out each phase
#[derive(Debug, Clone, Default)]
pub struct SimulatedProvisioner {
    settings: ProvisionSettings,
}

impl SimulatedProvisioner {
    pub fn new(settings: ProvisionSettings) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl Provisioner for SimulatedProvisioner {
    async fn run_phase(
        &self,
        server: &ServerRecord,
        phase: ProvisionPhase,
    ) -> Result<(), ProvisionError> {
        let delay = self.settings.delay_for(phase);
        debug!(server_id = %server.id, %phase, ?delay, "Running provisioning phase");
        tokio::time::sleep(delay).await;
        Ok(())
    }
}
