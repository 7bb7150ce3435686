//! Command-line deployment runner.
//!
//! Loads a manifest, resolves dependency order, deploys whatever the
//! state file does not already have for the target network, and runs
//! post-deploy hooks. Exits non-zero unless every artifact is recorded
//! and every hook succeeded.

use std::process::ExitCode;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use chainwright_core::Manifest;
use chainwright_engine::{
    Orchestrator, OrchestratorConfig, RetryPolicy, StubChainClient,
};
use chainwright_state::{InMemoryStateStore, JsonFileStateStore, StateStore};

mod arguments;

use arguments::Arguments;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Arguments::parse();
    info!("running deployment with arguments:\n{}", args);

    let manifest = Manifest::from_path(&args.manifest)
        .with_context(|| format!("failed to load manifest {}", args.manifest.display()))?;
    let manifest = if args.only.is_empty() {
        manifest
    } else {
        manifest
            .subset(&args.only)
            .context("failed to select requested artifacts")?
    };

    let store: Arc<dyn StateStore> = if args.dry_run {
        warn!("dry run, state file will not be written");
        Arc::new(InMemoryStateStore::new())
    } else {
        Arc::new(JsonFileStateStore::open(&args.state_file).with_context(|| {
            format!("failed to open state file {}", args.state_file.display())
        })?)
    };

    let config = OrchestratorConfig {
        continue_on_error: args.continue_on_error,
        force_redeploy: args.force,
        retry: RetryPolicy {
            max_attempts: args.max_attempts,
            ..Default::default()
        },
    };
    // No RPC integration ships with the binary; real chains plug in
    // through the ChainClient trait.
    let client = Arc::new(StubChainClient::new());
    if !args.dry_run {
        warn!(
            "chain client is a simulator; recorded addresses are deterministic \
             stand-ins, not on-chain deployments"
        );
    }
    let orchestrator = Orchestrator::with_config(client, store, config);

    let cancel = orchestrator.cancel_flag();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, finishing current artifact then stopping");
            cancel.store(true, Ordering::SeqCst);
        }
    });

    let report = orchestrator.run(&manifest, &args.network).await?;
    println!("{}", report.summary());

    // Return instead of exiting so the state store drops and releases
    // its lock file.
    if report.is_success() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}
