//! # Chainwright State
//!
//! Durable deployment state, namespaced per network. The state store owns
//! the persisted name → address mapping; the orchestrator reads and writes
//! only through it. Recording is atomic and flushed after every successful
//! deploy, which is what makes interrupted runs resumable.

pub mod file;
pub mod store;

pub use file::JsonFileStateStore;
pub use store::{InMemoryStateStore, NetworkState, StateStore};
