//! In-memory store

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use platform_models::{DeploymentEvent, NewEvent, NewServer, ServerRecord};
use tokio::sync::RwLock;
use tracing::debug;

use crate::store::{ServerFilter, ServerPatch, ServerStore, StoreError};

#[derive(Default)]
struct Inner {
    servers: HashMap<String, ServerRecord>,
    /// Server ids in creation order
    order: Vec<String>,
    /// Append-only, oldest first
    events: Vec<DeploymentEvent>,
}

/// Store holding everything behind one lock
///
/// Every write takes the lock for its whole read-modify-write, so patches
/// from concurrent deployments and health checks never interleave.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ServerStore for MemoryStore {
    async fn get_server(&self, id: &str) -> Result<Option<ServerRecord>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.servers.get(id).cloned())
    }

    async fn list_servers(
        &self,
        filter: Option<ServerFilter>,
    ) -> Result<Vec<ServerRecord>, StoreError> {
        let filter = filter.unwrap_or_default();
        let inner = self.inner.read().await;
        Ok(inner
            .order
            .iter()
            .rev()
            .filter_map(|id| inner.servers.get(id))
            .filter(|server| filter.matches(server))
            .cloned()
            .collect())
    }

    async fn create_server(&self, config: NewServer) -> Result<ServerRecord, StoreError> {
        let record = ServerRecord::from_new(config, Utc::now());
        let mut inner = self.inner.write().await;
        inner.order.push(record.id.clone());
        inner.servers.insert(record.id.clone(), record.clone());
        debug!(server_id = %record.id, "Created server record");
        Ok(record)
    }

    async fn update_server(
        &self,
        id: &str,
        patch: ServerPatch,
    ) -> Result<Option<ServerRecord>, StoreError> {
        let mut inner = self.inner.write().await;
        let Some(record) = inner.servers.get_mut(id) else {
            return Ok(None);
        };
        patch.apply(record, Utc::now())?;
        Ok(Some(record.clone()))
    }

    async fn delete_server(&self, id: &str) -> Result<bool, StoreError> {
        let mut inner = self.inner.write().await;
        if inner.servers.remove(id).is_none() {
            return Ok(false);
        }
        inner.order.retain(|known| known != id);
        Ok(true)
    }

    async fn append_event(&self, event: NewEvent) -> Result<DeploymentEvent, StoreError> {
        let event = DeploymentEvent::from_new(event, Utc::now());
        let mut inner = self.inner.write().await;
        inner.events.push(event.clone());
        Ok(event)
    }

    async fn list_events(
        &self,
        server_id: Option<&str>,
    ) -> Result<Vec<DeploymentEvent>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .events
            .iter()
            .rev()
            .filter(|event| server_id.is_none_or(|id| event.server_id == id))
            .cloned()
            .collect())
    }

    async fn list_recent_events(&self, limit: usize) -> Result<Vec<DeploymentEvent>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.events.iter().rev().take(limit).cloned().collect())
    }
}
