//! Deployment outcomes: recorded artifacts and the per-run report.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::address::Address;
use crate::types::ArtifactStatus;

/// A successfully deployed artifact. Created exactly once per
/// (name, network) pair; immutable unless a re-deploy is forced.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeployedArtifact {
    /// The artifact's manifest name.
    pub name: String,

    /// Deployed address, scoped to `network`.
    pub address: Address,

    /// Network the artifact was deployed to.
    pub network: String,

    /// When the deployment was confirmed.
    pub deployed_at: DateTime<Utc>,
}

impl DeployedArtifact {
    /// Record a deployment confirmed just now.
    pub fn new(name: impl Into<String>, address: Address, network: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address,
            network: network.into(),
            deployed_at: Utc::now(),
        }
    }
}

/// Outcome of one post-deploy hook.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HookResult {
    /// Hook name from the manifest.
    pub name: String,

    /// Error message if the hook failed; `None` on success.
    pub error: Option<String>,
}

impl HookResult {
    /// A hook that completed successfully.
    pub fn ok(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            error: None,
        }
    }

    /// A hook that failed. The failure never rolls back recorded
    /// deployments.
    pub fn failed(name: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            error: Some(error.into()),
        }
    }

    /// Returns true if the hook succeeded.
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Final result of a deployment run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentReport {
    /// Unique identifier for this run.
    pub run_id: Uuid,

    /// Target network.
    pub network: String,

    /// Content hash of the manifest that was executed.
    pub manifest_fingerprint: String,

    /// Final name → address mapping for every recorded artifact,
    /// including artifacts reused from a previous run.
    pub artifacts: BTreeMap<String, Address>,

    /// Per-artifact status in execution order.
    pub statuses: Vec<(String, ArtifactStatus)>,

    /// Outcome of each hook, in manifest order. Empty if the run did not
    /// reach the hook phase.
    pub hook_results: Vec<HookResult>,

    /// True if the run was cancelled between artifacts.
    pub cancelled: bool,

    /// When the run started.
    pub started_at: DateTime<Utc>,

    /// When the run finished.
    pub finished_at: Option<DateTime<Utc>>,
}

impl DeploymentReport {
    /// Start a report for a run over artifacts in execution order.
    pub fn new(
        network: impl Into<String>,
        manifest_fingerprint: impl Into<String>,
        ordered_names: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            network: network.into(),
            manifest_fingerprint: manifest_fingerprint.into(),
            artifacts: BTreeMap::new(),
            statuses: ordered_names
                .into_iter()
                .map(|name| (name, ArtifactStatus::Pending))
                .collect(),
            hook_results: Vec::new(),
            cancelled: false,
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    /// Update an artifact's status.
    pub fn set_status(&mut self, name: &str, status: ArtifactStatus) {
        if let Some(entry) = self.statuses.iter_mut().find(|(n, _)| n == name) {
            entry.1 = status;
        }
    }

    /// Current status of an artifact.
    pub fn status_of(&self, name: &str) -> Option<ArtifactStatus> {
        self.statuses
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, status)| *status)
    }

    /// Names of artifacts that never reached a terminal state.
    pub fn pending(&self) -> Vec<&str> {
        self.statuses
            .iter()
            .filter(|(_, status)| !status.is_terminal())
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// Names of artifacts that failed.
    pub fn failed(&self) -> Vec<&str> {
        self.statuses
            .iter()
            .filter(|(_, status)| matches!(status, ArtifactStatus::Failed))
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// True once every artifact is recorded.
    pub fn all_recorded(&self) -> bool {
        self.statuses
            .iter()
            .all(|(_, status)| status.is_recorded())
    }

    /// Full success: every artifact recorded, every hook ok, not cancelled.
    pub fn is_success(&self) -> bool {
        !self.cancelled
            && self.all_recorded()
            && self.hook_results.iter().all(HookResult::is_ok)
    }

    /// Human-readable per-artifact summary, one line each, with the
    /// precise point of failure and remaining pending artifacts.
    pub fn summary(&self) -> String {
        let mut lines = Vec::with_capacity(self.statuses.len() + self.hook_results.len());
        for (name, status) in &self.statuses {
            let line = match (status, self.artifacts.get(name)) {
                (ArtifactStatus::Recorded, Some(address)) => {
                    format!("{name}: recorded at {address}")
                }
                (status, _) => {
                    format!("{name}: {}", format!("{status:?}").to_lowercase())
                }
            };
            lines.push(line);
        }
        for hook in &self.hook_results {
            match &hook.error {
                None => lines.push(format!("hook {}: ok", hook.name)),
                Some(error) => lines.push(format!("hook {}: failed ({error})", hook.name)),
            }
        }
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report() -> DeploymentReport {
        DeploymentReport::new(
            "localhost",
            "fingerprint",
            ["AccessManager".to_string(), "TokenManager".to_string()],
        )
    }

    #[test]
    fn test_statuses_start_pending() {
        let report = report();
        assert_eq!(
            report.status_of("AccessManager"),
            Some(ArtifactStatus::Pending)
        );
        assert_eq!(report.pending(), vec!["AccessManager", "TokenManager"]);
        assert!(!report.is_success());
    }

    #[test]
    fn test_success_requires_all_recorded_and_hooks_ok() {
        let mut report = report();
        report.set_status("AccessManager", ArtifactStatus::Recorded);
        report.set_status("TokenManager", ArtifactStatus::Recorded);
        assert!(report.is_success());

        report.hook_results.push(HookResult::failed("grant", "revert"));
        assert!(!report.is_success());
    }

    #[test]
    fn test_failure_reporting() {
        let mut report = report();
        report.set_status("AccessManager", ArtifactStatus::Recorded);
        report.set_status("TokenManager", ArtifactStatus::Failed);

        assert_eq!(report.failed(), vec!["TokenManager"]);
        assert!(report.pending().is_empty());
        assert!(!report.is_success());
    }

    #[test]
    fn test_cancelled_run_is_not_success() {
        let mut report = report();
        report.set_status("AccessManager", ArtifactStatus::Recorded);
        report.set_status("TokenManager", ArtifactStatus::Recorded);
        report.cancelled = true;
        assert!(!report.is_success());
    }

    #[test]
    fn test_summary_names_recorded_addresses() {
        let mut report = report();
        report.set_status("AccessManager", ArtifactStatus::Recorded);
        report
            .artifacts
            .insert("AccessManager".to_string(), Address::from_low_u64(1));

        let summary = report.summary();
        assert!(summary.contains("AccessManager: recorded at 0x"));
        assert!(summary.contains("TokenManager: pending"));
    }
}
