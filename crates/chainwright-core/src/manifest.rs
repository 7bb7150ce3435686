//! Deployment manifest: the declarative registry of deployable artifacts.
//!
//! A [`Manifest`] describes *what* to deploy as data, not code: each
//! [`ArtifactSpec`] names a contract, its constructor arguments, and its
//! dependencies. Arguments may reference other artifacts by name; the
//! reference is substituted with the recorded address at deploy time.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::address::Address;
use crate::error::{DeployError, Result};

/// A constructor argument value, either a literal or a reference to
/// another artifact's deployed address.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ArgValue {
    /// Literal string (names, symbols, pre-known addresses).
    String { value: String },

    /// Literal integer (prices, limits, chain parameters).
    Number { value: i64 },

    /// Literal byte string, hex-encoded in JSON.
    Bytes {
        #[serde(with = "hex_bytes")]
        value: Vec<u8>,
    },

    /// Resolved at deploy time to the named artifact's address.
    Reference { name: String },
}

impl ArgValue {
    /// Literal string argument.
    pub fn string(value: impl Into<String>) -> Self {
        ArgValue::String {
            value: value.into(),
        }
    }

    /// Literal number argument.
    pub fn number(value: i64) -> Self {
        ArgValue::Number { value }
    }

    /// Literal bytes argument.
    pub fn bytes(value: Vec<u8>) -> Self {
        ArgValue::Bytes { value }
    }

    /// Reference to another artifact's address.
    pub fn reference(name: impl Into<String>) -> Self {
        ArgValue::Reference { name: name.into() }
    }

    /// The referenced artifact name, if this is a reference.
    pub fn reference_name(&self) -> Option<&str> {
        match self {
            ArgValue::Reference { name } => Some(name),
            _ => None,
        }
    }

    /// Substitute references using the given address mapping.
    pub fn resolve(&self, addresses: &BTreeMap<String, Address>) -> Result<ResolvedArg> {
        Ok(match self {
            ArgValue::String { value } => ResolvedArg::String {
                value: value.clone(),
            },
            ArgValue::Number { value } => ResolvedArg::Number { value: *value },
            ArgValue::Bytes { value } => ResolvedArg::Bytes {
                value: value.clone(),
            },
            ArgValue::Reference { name } => {
                let address =
                    addresses
                        .get(name)
                        .copied()
                        .ok_or_else(|| DeployError::UnresolvedReference {
                            name: name.clone(),
                        })?;
                ResolvedArg::Address { value: address }
            }
        })
    }
}

/// A constructor argument after reference substitution. This is what the
/// chain client actually receives.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResolvedArg {
    String { value: String },
    Number { value: i64 },
    Bytes {
        #[serde(with = "hex_bytes")]
        value: Vec<u8>,
    },
    Address { value: Address },
}

/// Static description of one deployable unit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ArtifactSpec {
    /// Unique name within the manifest (e.g. "AccessManager").
    pub name: String,

    /// Ordered constructor arguments; references are substituted at
    /// deploy time.
    #[serde(default)]
    pub constructor_args: Vec<ArgValue>,

    /// Explicit dependencies in addition to argument references.
    #[serde(default)]
    pub depends_on: Vec<String>,
}

impl ArtifactSpec {
    /// Create a builder for an artifact with the given name.
    pub fn builder(name: impl Into<String>) -> ArtifactSpecBuilder {
        ArtifactSpecBuilder {
            name: name.into(),
            constructor_args: Vec::new(),
            depends_on: Vec::new(),
        }
    }

    /// Names referenced from constructor arguments, in argument order.
    pub fn references(&self) -> impl Iterator<Item = &str> {
        self.constructor_args
            .iter()
            .filter_map(|arg| arg.reference_name())
    }

    /// Full dependency set: explicit `depends_on` followed by argument
    /// references, deduplicated, declaration order preserved.
    pub fn dependencies(&self) -> Vec<&str> {
        let mut seen = BTreeSet::new();
        self.depends_on
            .iter()
            .map(String::as_str)
            .chain(self.references())
            .filter(|name| seen.insert(*name))
            .collect()
    }
}

/// Builder for [`ArtifactSpec`] with a fluent API.
#[derive(Debug)]
pub struct ArtifactSpecBuilder {
    name: String,
    constructor_args: Vec<ArgValue>,
    depends_on: Vec<String>,
}

impl ArtifactSpecBuilder {
    /// Append a constructor argument.
    pub fn arg(mut self, arg: ArgValue) -> Self {
        self.constructor_args.push(arg);
        self
    }

    /// Append a literal string argument.
    pub fn string_arg(self, value: impl Into<String>) -> Self {
        self.arg(ArgValue::string(value))
    }

    /// Append a literal number argument.
    pub fn number_arg(self, value: i64) -> Self {
        self.arg(ArgValue::number(value))
    }

    /// Append a reference argument.
    pub fn reference_arg(self, name: impl Into<String>) -> Self {
        self.arg(ArgValue::reference(name))
    }

    /// Add an explicit dependency.
    pub fn depends_on(mut self, name: impl Into<String>) -> Self {
        self.depends_on.push(name.into());
        self
    }

    /// Build the spec.
    pub fn build(self) -> ArtifactSpec {
        ArtifactSpec {
            name: self.name,
            constructor_args: self.constructor_args,
            depends_on: self.depends_on,
        }
    }
}

/// A post-deploy wiring call between already-deployed artifacts
/// (e.g. granting one artifact permission to act on another).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HookSpec {
    /// Name of the hook, for reporting.
    pub name: String,

    /// The artifact whose contract receives the call.
    pub target: String,

    /// Method to invoke on the target.
    pub method: String,

    /// Call arguments; references are substituted like constructor args.
    #[serde(default)]
    pub args: Vec<ArgValue>,
}

/// The declarative registry: all artifacts to deploy plus post-deploy hooks.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Manifest {
    /// Artifacts in declaration order. Order is the tie-break for
    /// independent artifacts, so it is meaningful.
    #[serde(default)]
    pub artifacts: Vec<ArtifactSpec>,

    /// Hooks, run in order after every artifact is recorded.
    #[serde(default)]
    pub hooks: Vec<HookSpec>,
}

impl Manifest {
    /// Create a manifest from parts.
    pub fn new(artifacts: Vec<ArtifactSpec>, hooks: Vec<HookSpec>) -> Self {
        Self { artifacts, hooks }
    }

    /// Parse a manifest from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a manifest from a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Look up an artifact by name.
    pub fn get(&self, name: &str) -> Option<&ArtifactSpec> {
        self.artifacts.iter().find(|spec| spec.name == name)
    }

    /// Artifact names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.artifacts.iter().map(|spec| spec.name.as_str())
    }

    /// Validate name uniqueness and that every dependency, argument
    /// reference, and hook target resolves to a declared artifact.
    /// Cycle detection is the resolver's job.
    pub fn validate(&self) -> Result<()> {
        let mut names = BTreeSet::new();
        for spec in &self.artifacts {
            if !names.insert(spec.name.as_str()) {
                return Err(DeployError::DuplicateArtifact {
                    name: spec.name.clone(),
                });
            }
        }

        for spec in &self.artifacts {
            for dep in spec.dependencies() {
                if !names.contains(dep) {
                    return Err(DeployError::UnknownArtifact {
                        name: dep.to_string(),
                    });
                }
            }
        }

        for hook in &self.hooks {
            if !names.contains(hook.target.as_str()) {
                return Err(DeployError::UnknownArtifact {
                    name: hook.target.clone(),
                });
            }
            for reference in hook.args.iter().filter_map(|arg| arg.reference_name()) {
                if !names.contains(reference) {
                    return Err(DeployError::UnknownArtifact {
                        name: reference.to_string(),
                    });
                }
            }
        }

        Ok(())
    }

    /// Restrict the manifest to `selection` plus the transitive
    /// dependencies of the selection. Hooks are kept only when their
    /// target and every argument reference remain in the subset.
    pub fn subset(&self, selection: &[String]) -> Result<Manifest> {
        self.validate()?;

        let mut keep: BTreeSet<&str> = BTreeSet::new();
        let mut queue: VecDeque<&str> = VecDeque::new();
        for name in selection {
            let spec = self
                .get(name)
                .ok_or_else(|| DeployError::UnknownArtifact { name: name.clone() })?;
            queue.push_back(spec.name.as_str());
        }
        while let Some(name) = queue.pop_front() {
            if !keep.insert(name) {
                continue;
            }
            // validate() guarantees the lookup succeeds
            if let Some(spec) = self.get(name) {
                queue.extend(spec.dependencies());
            }
        }

        let artifacts = self
            .artifacts
            .iter()
            .filter(|spec| keep.contains(spec.name.as_str()))
            .cloned()
            .collect();
        let hooks = self
            .hooks
            .iter()
            .filter(|hook| {
                keep.contains(hook.target.as_str())
                    && hook
                        .args
                        .iter()
                        .filter_map(|arg| arg.reference_name())
                        .all(|name| keep.contains(name))
            })
            .cloned()
            .collect();

        Ok(Manifest { artifacts, hooks })
    }

    /// Content hash of the manifest, for reporting and log correlation.
    pub fn fingerprint(&self) -> Result<String> {
        let json = serde_json::to_string(self)?;
        let mut hasher = Sha256::new();
        hasher.update(json.as_bytes());
        Ok(hex::encode(hasher.finalize()))
    }
}

/// Hex string (de)serialization for byte arguments.
mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("0x{}", hex::encode(bytes)))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        hex::decode(s.strip_prefix("0x").unwrap_or(&s)).map_err(serde::de::Error::custom)
    }
}
