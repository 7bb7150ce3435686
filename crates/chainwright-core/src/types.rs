//! Common types used across Chainwright.

use serde::{Deserialize, Serialize};

/// Status of one artifact within a deployment run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactStatus {
    /// Not yet reached in the execution order.
    Pending,
    /// Constructor arguments are being resolved against recorded state.
    Resolving,
    /// Submission is in flight (possibly retrying).
    Deploying,
    /// Durably recorded in the state store (terminal success). Also used
    /// for artifacts skipped because a prior run already recorded them.
    Recorded,
    /// Deployment failed terminally.
    Failed,
}

impl ArtifactStatus {
    /// Returns true if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ArtifactStatus::Recorded | ArtifactStatus::Failed)
    }

    /// Returns true if the artifact ended up recorded.
    pub fn is_recorded(&self) -> bool {
        matches!(self, ArtifactStatus::Recorded)
    }
}
