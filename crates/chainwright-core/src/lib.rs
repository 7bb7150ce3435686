//! # Chainwright Core
//!
//! Core primitives and types for dependency-ordered contract deployment.
//!
//! This crate provides the fundamental building blocks:
//! - [`Manifest`] - Declarative registry of deployable artifacts
//! - [`ArtifactSpec`] - One deployable unit with constructor arguments
//! - [`DeployedArtifact`] - A recorded deployment
//! - [`DeploymentReport`] - Per-run outcome
//! - [`DeployError`] - Deployment error taxonomy

pub mod address;
pub mod artifact;
pub mod error;
pub mod manifest;
pub mod types;

// Re-exports for convenience
pub use address::Address;
pub use artifact::{DeployedArtifact, DeploymentReport, HookResult};
pub use error::{DeployError, Result};
pub use manifest::{ArgValue, ArtifactSpec, ArtifactSpecBuilder, HookSpec, Manifest, ResolvedArg};
pub use types::ArtifactStatus;

/// Prelude module for common imports
pub mod prelude {
    pub use crate::address::Address;
    pub use crate::artifact::{DeployedArtifact, DeploymentReport, HookResult};
    pub use crate::error::{DeployError, Result};
    pub use crate::manifest::{
        ArgValue, ArtifactSpec, ArtifactSpecBuilder, HookSpec, Manifest, ResolvedArg,
    };
    pub use crate::types::ArtifactStatus;
}
