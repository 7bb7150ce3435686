//! Error types for Chainwright deployments.

use thiserror::Error;

/// Main error type for deployment operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeployError {
    /// The dependency graph contains a cycle.
    #[error("dependency cycle detected: {}", cycle.join(" -> "))]
    CyclicDependency { cycle: Vec<String> },

    /// A dependency or reference points at a name not present in the manifest.
    #[error("unknown artifact: {name}")]
    UnknownArtifact { name: String },

    /// Two artifacts in the manifest share a name.
    #[error("duplicate artifact name: {name}")]
    DuplicateArtifact { name: String },

    /// A constructor argument referenced an artifact with no recorded address.
    /// Given a correct execution order this cannot happen; it is fatal.
    #[error("unresolved reference to {name}")]
    UnresolvedReference { name: String },

    /// Transient transport failure talking to the chain client (retried).
    #[error("transport error: {message}")]
    Transport { message: String },

    /// The chain rejected the submission (not retried).
    #[error("submission reverted: {message}")]
    Revert { message: String },

    /// Deployment of an artifact failed terminally.
    #[error("deployment of {name} failed: {cause}")]
    DeploymentFailed { name: String, cause: String },

    /// A post-deploy hook failed. Recorded deployments are never rolled back.
    #[error("hook {hook} failed: {message}")]
    HookFailed { hook: String, message: String },

    /// The run was cancelled between artifacts.
    #[error("deployment run cancelled")]
    Cancelled,

    /// State store error.
    #[error("state store error: {message}")]
    State { message: String },

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// A string could not be parsed as a 20-byte hex address.
    #[error("invalid address: {value}")]
    InvalidAddress { value: String },
}

impl DeployError {
    /// Returns true if this error is transient and worth retrying.
    pub fn is_retryable(&self) -> bool {
        matches!(self, DeployError::Transport { .. })
    }

    /// Returns the artifact name this error concerns, if any.
    pub fn artifact_name(&self) -> Option<&str> {
        match self {
            DeployError::UnknownArtifact { name }
            | DeployError::DuplicateArtifact { name }
            | DeployError::UnresolvedReference { name }
            | DeployError::DeploymentFailed { name, .. } => Some(name),
            _ => None,
        }
    }
}

/// Convenience Result type for deployment operations.
pub type Result<T> = std::result::Result<T, DeployError>;

impl From<serde_json::Error> for DeployError {
    fn from(err: serde_json::Error) -> Self {
        DeployError::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for DeployError {
    fn from(err: std::io::Error) -> Self {
        DeployError::State {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        let transport = DeployError::Transport {
            message: "timeout".to_string(),
        };
        assert!(transport.is_retryable());

        let revert = DeployError::Revert {
            message: "constructor reverted".to_string(),
        };
        assert!(!revert.is_retryable());

        assert!(!DeployError::Cancelled.is_retryable());
    }

    #[test]
    fn test_cycle_message_lists_names() {
        let err = DeployError::CyclicDependency {
            cycle: vec!["X".to_string(), "Y".to_string()],
        };
        assert_eq!(err.to_string(), "dependency cycle detected: X -> Y");
    }

    #[test]
    fn test_artifact_name() {
        let err = DeployError::DeploymentFailed {
            name: "TokenManager".to_string(),
            cause: "out of gas".to_string(),
        };
        assert_eq!(err.artifact_name(), Some("TokenManager"));
        assert_eq!(DeployError::Cancelled.artifact_name(), None);
    }
}
