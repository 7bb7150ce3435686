//! State store trait and in-memory implementation.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use chainwright_core::{Address, DeployedArtifact, Result};

/// Per-network mapping of artifact name to deployed address.
pub type NetworkState = BTreeMap<String, Address>;

/// Durable mapping of deployed artifact addresses, namespaced per network.
///
/// The idempotence contract: if [`has`](StateStore::has) returns true the
/// orchestrator skips re-deployment and reuses the stored address. A
/// successful [`record_success`](StateStore::record_success) guarantees the
/// artifact is durably recorded before the orchestrator proceeds.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Load the full mapping for a network. Unknown networks yield an
    /// empty mapping, never an error.
    async fn load(&self, network: &str) -> Result<NetworkState>;

    /// Durably record a successful deployment (atomic append-and-flush).
    async fn record_success(&self, network: &str, artifact: &DeployedArtifact) -> Result<()>;

    /// Whether an address is recorded for (network, name).
    async fn has(&self, network: &str, name: &str) -> Result<bool>;

    /// The recorded address for (network, name), if any.
    async fn get(&self, network: &str, name: &str) -> Result<Option<Address>>;
}

/// In-memory implementation of [`StateStore`], for tests and dry runs.
#[derive(Debug, Default)]
pub struct InMemoryStateStore {
    state: RwLock<BTreeMap<String, NetworkState>>,
}

impl InMemoryStateStore {
    /// Create a new empty in-memory state store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StateStore for InMemoryStateStore {
    async fn load(&self, network: &str) -> Result<NetworkState> {
        let state = self.state.read().await;
        Ok(state.get(network).cloned().unwrap_or_default())
    }

    async fn record_success(&self, network: &str, artifact: &DeployedArtifact) -> Result<()> {
        let mut state = self.state.write().await;
        state
            .entry(network.to_string())
            .or_default()
            .insert(artifact.name.clone(), artifact.address);
        Ok(())
    }

    async fn has(&self, network: &str, name: &str) -> Result<bool> {
        Ok(self.get(network, name).await?.is_some())
    }

    async fn get(&self, network: &str, name: &str) -> Result<Option<Address>> {
        let state = self.state.read().await;
        Ok(state
            .get(network)
            .and_then(|entries| entries.get(name))
            .copied())
    }
}
