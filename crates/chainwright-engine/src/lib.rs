//! Deployment engine for Chainwright.
//!
//! Ties the pieces together: the [`ChainClient`] seam for submitting
//! deployments, the [`Executor`] that retries transient failures, and
//! the [`Orchestrator`] that walks a manifest in dependency order,
//! records successes, and runs post-deploy hooks.

pub mod client;
pub mod executor;
pub mod orchestrator;

pub use client::{ChainClient, StubChainClient};
pub use executor::{Executor, RetryPolicy};
pub use orchestrator::{Orchestrator, OrchestratorConfig};
