//! JSON-file backed state store.
//!
//! The file is a JSON object keyed by network name; each value maps
//! artifact name to hex address string:
//!
//! ```json
//! {
//!   "localhost": {
//!     "AccessManager": "0x0000000000000000000000000000000000000001"
//!   }
//! }
//! ```
//!
//! Writes are atomic: the new document is written to a temporary file in
//! the same directory and renamed over the target, so a crash mid-write
//! never corrupts previously recorded deployments. An advisory lock file
//! next to the state file prevents concurrent runs against the same state.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, info};

use chainwright_core::{Address, DeployError, DeployedArtifact, Result};

use crate::store::{NetworkState, StateStore};

/// Advisory lock file guarding exclusive write access for the run.
/// Released (removed) on drop.
#[derive(Debug)]
struct LockFile {
    path: PathBuf,
}

impl LockFile {
    fn acquire(path: PathBuf) -> Result<Self> {
        match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
        {
            Ok(mut file) => {
                // Record the owner pid to help diagnose stale locks.
                let _ = write!(file, "{}", std::process::id());
                Ok(Self { path })
            }
            Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists => {
                Err(DeployError::State {
                    message: format!(
                        "state file is locked by another run ({}); \
                         remove the lock file if no other run is active",
                        path.display()
                    ),
                })
            }
            Err(err) => Err(err.into()),
        }
    }
}

impl Drop for LockFile {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}

/// [`StateStore`] persisted to a single JSON file.
#[derive(Debug)]
pub struct JsonFileStateStore {
    path: PathBuf,
    _lock: LockFile,
    state: RwLock<BTreeMap<String, NetworkState>>,
}

impl JsonFileStateStore {
    /// Open (or create) a state file, acquiring its advisory lock for the
    /// lifetime of the store.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let lock = LockFile::acquire(lock_path(&path))?;
        let state = if path.exists() {
            let json = fs::read_to_string(&path)?;
            if json.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&json)?
            }
        } else {
            BTreeMap::new()
        };

        info!(
            path = %path.display(),
            networks = state.len(),
            "opened deployment state file"
        );
        Ok(Self {
            path,
            _lock: lock,
            state: RwLock::new(state),
        })
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the full document to a temp file and rename it into place.
    fn flush(&self, state: &BTreeMap<String, NetworkState>) -> Result<()> {
        let parent = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let json = serde_json::to_string_pretty(state)?;

        let mut tmp = tempfile::NamedTempFile::new_in(parent)?;
        tmp.write_all(json.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|err| DeployError::State {
            message: format!("failed to persist state file: {err}"),
        })?;

        debug!(path = %self.path.display(), "flushed deployment state");
        Ok(())
    }
}

fn lock_path(path: &Path) -> PathBuf {
    let mut os = path.as_os_str().to_owned();
    os.push(".lock");
    PathBuf::from(os)
}

#[async_trait]
impl StateStore for JsonFileStateStore {
    async fn load(&self, network: &str) -> Result<NetworkState> {
        let state = self.state.read().await;
        Ok(state.get(network).cloned().unwrap_or_default())
    }

    async fn record_success(&self, network: &str, artifact: &DeployedArtifact) -> Result<()> {
        let mut state = self.state.write().await;
        state
            .entry(network.to_string())
            .or_default()
            .insert(artifact.name.clone(), artifact.address);
        // Durable before the orchestrator may proceed.
        self.flush(&state)
    }

    async fn has(&self, network: &str, name: &str) -> Result<bool> {
        Ok(self.get(network, name).await?.is_some())
    }

    async fn get(&self, network: &str, name: &str) -> Result<Option<Address>> {
        let state = self.state.read().await;
        Ok(state
            .get(network)
            .and_then(|entries| entries.get(name))
            .copied())
    }
}
