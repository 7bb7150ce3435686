//! Topological ordering of artifact specs.
//!
//! The resolver produces an execution order in which every dependency of an
//! artifact (explicit `depends_on` plus constructor-argument references)
//! appears strictly before the artifact itself. Artifacts with no ordering
//! constraint between them stay in manifest declaration order, so repeated
//! runs over the same manifest produce identical deployment logs.

use std::collections::HashMap;

use tracing::debug;

use chainwright_core::{ArtifactSpec, DeployError, Manifest, Result};

/// Dependency graph over a manifest's artifacts.
pub struct DependencyGraph<'a> {
    specs: Vec<&'a ArtifactSpec>,
    /// Dependencies of each artifact as indices into `specs`, in the
    /// spec's declared dependency order.
    edges: Vec<Vec<usize>>,
}

/// DFS bookkeeping per node.
#[derive(Clone, Copy, PartialEq)]
enum Mark {
    Unvisited,
    /// On the active recursion stack; reaching it again closes a cycle.
    OnStack,
    Done,
}

impl<'a> DependencyGraph<'a> {
    /// Build the graph, rejecting duplicate names and unknown references.
    pub fn from_manifest(manifest: &'a Manifest) -> Result<Self> {
        let mut index: HashMap<&str, usize> = HashMap::new();
        for (i, spec) in manifest.artifacts.iter().enumerate() {
            if index.insert(spec.name.as_str(), i).is_some() {
                return Err(DeployError::DuplicateArtifact {
                    name: spec.name.clone(),
                });
            }
        }

        let mut edges = Vec::with_capacity(manifest.artifacts.len());
        for spec in &manifest.artifacts {
            let deps = spec
                .dependencies()
                .into_iter()
                .map(|name| {
                    index
                        .get(name)
                        .copied()
                        .ok_or_else(|| DeployError::UnknownArtifact {
                            name: name.to_string(),
                        })
                })
                .collect::<Result<Vec<_>>>()?;
            edges.push(deps);
        }

        Ok(Self {
            specs: manifest.artifacts.iter().collect(),
            edges,
        })
    }

    /// Depth-first topological sort with recursion-stack cycle detection.
    ///
    /// Roots are visited in declaration order, and each node's dependencies
    /// in their declared order, which makes the output deterministic.
    pub fn execution_order(&self) -> Result<Vec<&'a ArtifactSpec>> {
        let mut marks = vec![Mark::Unvisited; self.specs.len()];
        let mut stack: Vec<usize> = Vec::new();
        let mut order: Vec<&'a ArtifactSpec> = Vec::with_capacity(self.specs.len());

        for root in 0..self.specs.len() {
            self.visit(root, &mut marks, &mut stack, &mut order)?;
        }

        debug!(
            order = ?order.iter().map(|spec| spec.name.as_str()).collect::<Vec<_>>(),
            "resolved execution order"
        );
        Ok(order)
    }

    fn visit(
        &self,
        node: usize,
        marks: &mut [Mark],
        stack: &mut Vec<usize>,
        order: &mut Vec<&'a ArtifactSpec>,
    ) -> Result<()> {
        match marks[node] {
            Mark::Done => return Ok(()),
            Mark::OnStack => {
                // The cycle is the active stack from the first occurrence
                // of `node` onward.
                let start = stack.iter().position(|&n| n == node).unwrap_or(0);
                let cycle = stack[start..]
                    .iter()
                    .map(|&n| self.specs[n].name.clone())
                    .collect();
                return Err(DeployError::CyclicDependency { cycle });
            }
            Mark::Unvisited => {}
        }

        marks[node] = Mark::OnStack;
        stack.push(node);
        for &dep in &self.edges[node] {
            self.visit(dep, marks, stack, order)?;
        }
        stack.pop();
        marks[node] = Mark::Done;
        order.push(self.specs[node]);
        Ok(())
    }
}

/// Compute the deterministic execution order for a manifest.
pub fn execution_order(manifest: &Manifest) -> Result<Vec<&ArtifactSpec>> {
    DependencyGraph::from_manifest(manifest)?.execution_order()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chainwright_core::{ArgValue, ArtifactSpec, Manifest};

    fn names<'a>(order: &'a [&'a ArtifactSpec]) -> Vec<&'a str> {
        order.iter().map(|spec| spec.name.as_str()).collect()
    }

    #[test]
    fn test_independent_artifacts_keep_declaration_order() {
        let manifest = Manifest::new(
            vec![
                ArtifactSpec::builder("A").build(),
                ArtifactSpec::builder("B").build(),
                ArtifactSpec::builder("C")
                    .depends_on("A")
                    .depends_on("B")
                    .build(),
            ],
            vec![],
        );

        let order = execution_order(&manifest).unwrap();
        assert_eq!(names(&order), vec!["A", "B", "C"]);
    }

    #[test]
    fn test_dependencies_come_first() {
        // Declared out of order: the dependent is listed before its deps.
        let manifest = Manifest::new(
            vec![
                ArtifactSpec::builder("ServiceManager")
                    .reference_arg("TokenManager")
                    .reference_arg("AccessManager")
                    .build(),
                ArtifactSpec::builder("TokenManager")
                    .reference_arg("AccessManager")
                    .build(),
                ArtifactSpec::builder("AccessManager").build(),
            ],
            vec![],
        );

        let order = execution_order(&manifest).unwrap();
        let position = |name: &str| names(&order).iter().position(|n| *n == name).unwrap();
        assert!(position("AccessManager") < position("TokenManager"));
        assert!(position("TokenManager") < position("ServiceManager"));
    }

    #[test]
    fn test_argument_references_are_dependencies() {
        // No explicit depends_on at all; ordering comes from references.
        let manifest = Manifest::new(
            vec![
                ArtifactSpec::builder("C")
                    .arg(ArgValue::reference("A"))
                    .build(),
                ArtifactSpec::builder("A").build(),
            ],
            vec![],
        );

        let order = execution_order(&manifest).unwrap();
        assert_eq!(names(&order), vec!["A", "C"]);
    }

    #[test]
    fn test_diamond() {
        let manifest = Manifest::new(
            vec![
                ArtifactSpec::builder("Root").build(),
                ArtifactSpec::builder("Left").depends_on("Root").build(),
                ArtifactSpec::builder("Right").depends_on("Root").build(),
                ArtifactSpec::builder("Top")
                    .depends_on("Left")
                    .depends_on("Right")
                    .build(),
            ],
            vec![],
        );

        let order = execution_order(&manifest).unwrap();
        assert_eq!(names(&order), vec!["Root", "Left", "Right", "Top"]);
    }

    #[test]
    fn test_two_node_cycle() {
        let manifest = Manifest::new(
            vec![
                ArtifactSpec::builder("X").depends_on("Y").build(),
                ArtifactSpec::builder("Y").depends_on("X").build(),
            ],
            vec![],
        );

        let err = execution_order(&manifest).unwrap_err();
        assert_eq!(
            err,
            DeployError::CyclicDependency {
                cycle: vec!["X".to_string(), "Y".to_string()]
            }
        );
    }

    #[test]
    fn test_self_cycle() {
        let manifest = Manifest::new(
            vec![ArtifactSpec::builder("X").depends_on("X").build()],
            vec![],
        );

        let err = execution_order(&manifest).unwrap_err();
        assert_eq!(
            err,
            DeployError::CyclicDependency {
                cycle: vec!["X".to_string()]
            }
        );
    }

    #[test]
    fn test_unknown_dependency() {
        let manifest = Manifest::new(
            vec![ArtifactSpec::builder("A").depends_on("Missing").build()],
            vec![],
        );

        let err = execution_order(&manifest).unwrap_err();
        assert_eq!(
            err,
            DeployError::UnknownArtifact {
                name: "Missing".to_string()
            }
        );
    }

    #[test]
    fn test_duplicate_name() {
        let manifest = Manifest::new(
            vec![
                ArtifactSpec::builder("A").build(),
                ArtifactSpec::builder("A").build(),
            ],
            vec![],
        );

        let err = execution_order(&manifest).unwrap_err();
        assert!(matches!(err, DeployError::DuplicateArtifact { .. }));
    }

    #[test]
    fn test_order_is_stable_across_runs() {
        let manifest = Manifest::new(
            vec![
                ArtifactSpec::builder("B").build(),
                ArtifactSpec::builder("A").build(),
                ArtifactSpec::builder("C").depends_on("A").build(),
            ],
            vec![],
        );

        let first = names(&execution_order(&manifest).unwrap())
            .into_iter()
            .map(String::from)
            .collect::<Vec<_>>();
        for _ in 0..10 {
            let next = execution_order(&manifest).unwrap();
            assert_eq!(names(&next), first);
        }
        // Declaration order is the tie-break.
        assert_eq!(first, vec!["B", "A", "C"]);
    }
}
