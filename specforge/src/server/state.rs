//! Server state

use std::sync::Arc;

use crate::service::ServerService;
use crate::store::ServerStore;

/// Server state shared across handlers
pub struct ServerState {
    pub service: Arc<ServerService>,
    pub store: Arc<dyn ServerStore>,
    pub version: String,
}

impl ServerState {
    pub fn new(service: Arc<ServerService>, version: String) -> Self {
        Self {
            store: service.store().clone(),
            service,
            version,
        }
    }
}
