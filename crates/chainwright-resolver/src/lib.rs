//! # Chainwright Resolver
//!
//! Dependency graph construction and deterministic topological ordering
//! of a deployment manifest. Validation failures (cycles, unknown or
//! duplicate names) are reported before any on-chain action happens.

pub mod resolver;

pub use resolver::{execution_order, DependencyGraph};
