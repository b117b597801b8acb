//! Application state management

use std::sync::Arc;

use tracing::info;

use crate::app::options::AppOptions;
use crate::deploy::{Orchestrator, Provisioner, SimulatedProvisioner};
use crate::health::{HealthChecker, HealthProbe, RandomProbe};
use crate::service::ServerService;
use crate::store::{MemoryStore, ServerStore};

/// Main application state
pub struct AppState {
    /// Server and event persistence
    pub store: Arc<dyn ServerStore>,

    /// Deployment runs
    pub orchestrator: Arc<Orchestrator>,

    /// Creation flow and dashboard queries
    pub service: Arc<ServerService>,

    /// Health checks of active servers
    pub checker: Arc<HealthChecker>,

    pub version: String,
}

impl AppState {
    /// Initialize application state with the simulated collaborators
    pub fn init(version: String, options: &AppOptions) -> Self {
        info!("Initializing application state...");

        let store: Arc<dyn ServerStore> = Arc::new(MemoryStore::new());
        let provisioner: Arc<dyn Provisioner> =
            Arc::new(SimulatedProvisioner::new(options.provision.clone()));
        let probe: Arc<dyn HealthProbe> = Arc::new(RandomProbe::new(options.health_pass_rate));

        Self::with_parts(version, store, provisioner, probe)
    }

    /// Assemble state around the given collaborators
    pub fn with_parts(
        version: String,
        store: Arc<dyn ServerStore>,
        provisioner: Arc<dyn Provisioner>,
        probe: Arc<dyn HealthProbe>,
    ) -> Self {
        let orchestrator = Arc::new(Orchestrator::new(store.clone(), provisioner));
        let service = Arc::new(ServerService::new(store.clone(), orchestrator.clone()));
        let checker = Arc::new(HealthChecker::new(store.clone(), probe));

        Self {
            store,
            orchestrator,
            service,
            checker,
            version,
        }
    }
}
