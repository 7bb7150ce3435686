//! Drives a full deployment run: resolve order, deploy in sequence,
//! record state, then run post-deploy hooks.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Utc;
use tracing::{error, info, warn};

use chainwright_core::{
    Address, ArtifactStatus, DeployError, DeploymentReport, HookResult, HookSpec, Manifest,
    ResolvedArg, Result,
};
use chainwright_resolver::execution_order;
use chainwright_state::StateStore;

use crate::client::ChainClient;
use crate::executor::{Executor, RetryPolicy};

/// Run-level knobs for the orchestrator.
#[derive(Debug, Clone, Default)]
pub struct OrchestratorConfig {
    /// Keep deploying independent artifacts after a failure instead of
    /// halting at the first one. Dependents of a failed artifact still
    /// fail when their references cannot resolve.
    pub continue_on_error: bool,

    /// Redeploy artifacts even when the state store already has an
    /// address for them. The new address overwrites the recorded one.
    pub force_redeploy: bool,

    /// Retry behavior handed to the executor.
    pub retry: RetryPolicy,
}

/// Sequential deployment driver over a chain client and a state store.
pub struct Orchestrator {
    executor: Executor,
    store: Arc<dyn StateStore>,
    config: OrchestratorConfig,
    cancel: Arc<AtomicBool>,
}

impl Orchestrator {
    /// Build an orchestrator with default configuration.
    pub fn new(client: Arc<dyn ChainClient>, store: Arc<dyn StateStore>) -> Self {
        Self::with_config(client, store, OrchestratorConfig::default())
    }

    /// Build an orchestrator with explicit configuration.
    pub fn with_config(
        client: Arc<dyn ChainClient>,
        store: Arc<dyn StateStore>,
        config: OrchestratorConfig,
    ) -> Self {
        let executor = Executor::new(client, config.retry.clone());
        Self {
            executor,
            store,
            config,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Shared cancellation flag. Setting it stops the run at the next
    /// artifact boundary; the in-flight deployment always completes and
    /// is recorded.
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    /// Execute the manifest against a network.
    ///
    /// Artifacts deploy strictly in dependency order. Ones already in
    /// the state store are reused without resubmission unless
    /// `force_redeploy` is set. Hooks run only after every artifact is
    /// recorded, and hook failures do not fail the run.
    pub async fn run(&self, manifest: &Manifest, network: &str) -> Result<DeploymentReport> {
        manifest.validate()?;
        let order = execution_order(manifest)?;

        let mut report = DeploymentReport::new(
            network,
            manifest.fingerprint()?,
            order.iter().map(|spec| spec.name.clone()),
        );

        info!(
            run_id = %report.run_id,
            network,
            artifacts = order.len(),
            "starting deployment run"
        );

        let mut addresses: BTreeMap<String, Address> = self.store.load(network).await?;
        let mut halted = false;

        for spec in &order {
            if self.cancel.load(Ordering::SeqCst) {
                warn!(network, "cancellation requested, stopping run");
                report.cancelled = true;
                break;
            }
            if halted {
                break;
            }

            if !self.config.force_redeploy {
                if let Some(address) = self.store.get(network, &spec.name).await? {
                    info!(artifact = %spec.name, %address, "already deployed, reusing");
                    addresses.insert(spec.name.clone(), address);
                    report.artifacts.insert(spec.name.clone(), address);
                    report.set_status(&spec.name, ArtifactStatus::Recorded);
                    continue;
                }
            }

            report.set_status(&spec.name, ArtifactStatus::Resolving);
            let args = match resolve_args(&spec.constructor_args, &addresses) {
                Ok(args) => args,
                Err(err) => {
                    error!(artifact = %spec.name, error = %err, "argument resolution failed");
                    report.set_status(&spec.name, ArtifactStatus::Failed);
                    if self.config.continue_on_error {
                        continue;
                    }
                    halted = true;
                    continue;
                }
            };

            report.set_status(&spec.name, ArtifactStatus::Deploying);
            match self.executor.deploy(spec, &args, network).await {
                Ok(artifact) => {
                    self.store.record_success(network, &artifact).await?;
                    addresses.insert(spec.name.clone(), artifact.address);
                    report.artifacts.insert(spec.name.clone(), artifact.address);
                    report.set_status(&spec.name, ArtifactStatus::Recorded);
                }
                Err(err) => {
                    error!(artifact = %spec.name, error = %err, "deployment failed");
                    report.set_status(&spec.name, ArtifactStatus::Failed);
                    if !self.config.continue_on_error {
                        halted = true;
                    }
                }
            }
        }

        if report.all_recorded() && !report.cancelled {
            for hook in &manifest.hooks {
                let result = self.run_hook(hook, &addresses).await;
                if let Some(error) = &result.error {
                    warn!(hook = %hook.name, error, "hook failed");
                }
                report.hook_results.push(result);
            }
        }

        report.finished_at = Some(Utc::now());
        info!(run_id = %report.run_id, success = report.is_success(), "run finished");
        Ok(report)
    }

    async fn run_hook(&self, hook: &HookSpec, addresses: &BTreeMap<String, Address>) -> HookResult {
        let target = match addresses.get(&hook.target) {
            Some(address) => *address,
            None => {
                return HookResult::failed(
                    &hook.name,
                    DeployError::UnresolvedReference {
                        name: hook.target.clone(),
                    }
                    .to_string(),
                )
            }
        };
        let args = match resolve_args(&hook.args, addresses) {
            Ok(args) => args,
            Err(err) => return HookResult::failed(&hook.name, err.to_string()),
        };
        match self.executor.call_hook(hook, target, &args).await {
            Ok(()) => {
                info!(hook = %hook.name, method = %hook.method, "hook completed");
                HookResult::ok(&hook.name)
            }
            Err(err) => HookResult::failed(&hook.name, err.to_string()),
        }
    }
}

fn resolve_args(
    args: &[chainwright_core::ArgValue],
    addresses: &BTreeMap<String, Address>,
) -> Result<Vec<ResolvedArg>> {
    args.iter().map(|arg| arg.resolve(addresses)).collect()
}
