//! The chain-client capability seam.
//!
//! The orchestrator treats on-chain submission as an opaque capability:
//! given a contract name and resolved constructor arguments it either
//! returns a deployed address or fails with a transport or revert error.
//! Real integrations (RPC nodes, test harnesses) implement [`ChainClient`];
//! the bundled [`StubChainClient`] simulates deployments for dry runs and
//! tests.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use tracing::info;

use chainwright_core::{Address, ResolvedArg, Result};

/// External capability for submitting deployments and contract calls.
///
/// Errors should be [`DeployError::Transport`](chainwright_core::DeployError::Transport)
/// for transient failures (retried by the executor) or
/// [`DeployError::Revert`](chainwright_core::DeployError::Revert) for
/// on-chain rejections (never retried).
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Deploy the named contract with the given constructor arguments,
    /// returning its address once confirmed.
    async fn submit(&self, name: &str, args: &[ResolvedArg]) -> Result<Address>;

    /// Invoke a method on an already-deployed contract (post-deploy
    /// wiring such as permission grants).
    async fn call(&self, target: Address, method: &str, args: &[ResolvedArg]) -> Result<()>;
}

/// Simulated chain client: hands out sequential deterministic addresses
/// (`0x…01`, `0x…02`, …) and records every submission and call.
#[derive(Debug, Default)]
pub struct StubChainClient {
    next: AtomicU64,
    submissions: Mutex<Vec<(String, Vec<ResolvedArg>)>>,
    calls: Mutex<Vec<(Address, String, Vec<ResolvedArg>)>>,
}

impl StubChainClient {
    /// Create a stub whose first deployment gets address `0x…01`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of deployments submitted so far.
    pub fn submit_count(&self) -> usize {
        self.submissions.lock().expect("lock poisoned").len()
    }

    /// All submissions seen so far, in order.
    pub fn submissions(&self) -> Vec<(String, Vec<ResolvedArg>)> {
        self.submissions.lock().expect("lock poisoned").clone()
    }

    /// All contract calls seen so far, in order.
    pub fn calls(&self) -> Vec<(Address, String, Vec<ResolvedArg>)> {
        self.calls.lock().expect("lock poisoned").clone()
    }
}

#[async_trait]
impl ChainClient for StubChainClient {
    async fn submit(&self, name: &str, args: &[ResolvedArg]) -> Result<Address> {
        let address = Address::from_low_u64(self.next.fetch_add(1, Ordering::SeqCst) + 1);
        self.submissions
            .lock()
            .expect("lock poisoned")
            .push((name.to_string(), args.to_vec()));
        info!(contract = name, %address, "simulated deployment");
        Ok(address)
    }

    async fn call(&self, target: Address, method: &str, args: &[ResolvedArg]) -> Result<()> {
        self.calls
            .lock()
            .expect("lock poisoned")
            .push((target, method.to_string(), args.to_vec()));
        info!(%target, method, "simulated contract call");
        Ok(())
    }
}
