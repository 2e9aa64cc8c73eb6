//! Dependency resolution.
//!
//! Everything here is a pure function of its inputs. Node state is derived on
//! every query and never stored.
//!
//! Ordering of the rules matters:
//!
//! 1. a completed node is [`NodeState::Completed`] whatever its dependencies;
//! 2. the starting node is always [`NodeState::Available`];
//! 3. a node without required dependencies is available only while the tree
//!    has no starting node;
//! 4. otherwise the node is available iff every required id resolves to a
//!    completed node. Unresolvable ids count as unsatisfied.
//!
//! Recommended dependencies are never consulted.

mod graph;

pub use graph::RequirementGraph;

use crate::domain::{DependencyKind, NodeId, NodeState, SkillNode, SkillTree};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// Classify `node` against the other nodes of its tree.
#[must_use]
pub fn classify(
    node: &SkillNode,
    all_nodes: &[SkillNode],
    starting_node_id: Option<&NodeId>,
) -> NodeState {
    classify_with(node, starting_node_id, |id| {
        all_nodes.iter().find(|n| &n.id == id).map(|n| n.completed)
    })
}

/// Whether `node` may be marked completed right now.
#[must_use]
pub fn can_complete(
    node: &SkillNode,
    all_nodes: &[SkillNode],
    starting_node_id: Option<&NodeId>,
) -> bool {
    classify(node, all_nodes, starting_node_id) == NodeState::Available
}

/// Classify every node of `tree` in one pass.
#[must_use]
pub fn classify_all(tree: &SkillTree) -> BTreeMap<NodeId, NodeState> {
    let completed: HashMap<&NodeId, bool> =
        tree.nodes.iter().map(|n| (&n.id, n.completed)).collect();
    let start = tree.starting_node_id.as_ref();

    tree.nodes
        .iter()
        .map(|node| {
            let state = classify_with(node, start, |id| completed.get(id).copied());
            (node.id.clone(), state)
        })
        .collect()
}

fn classify_with<F>(node: &SkillNode, start: Option<&NodeId>, completed: F) -> NodeState
where
    F: Fn(&NodeId) -> Option<bool>,
{
    if node.completed {
        return NodeState::Completed;
    }
    if start == Some(&node.id) {
        return NodeState::Available;
    }
    if node.required_deps.is_empty() {
        return if start.is_none() {
            NodeState::Available
        } else {
            NodeState::Locked
        };
    }

    let satisfied = node
        .required_deps
        .iter()
        .all(|dep| completed(dep).unwrap_or(false));
    if satisfied {
        NodeState::Available
    } else {
        NodeState::Locked
    }
}

/// Completion counts for a tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Progress {
    /// Completed nodes
    pub completed: usize,
    /// All nodes
    pub total: usize,
}

impl Progress {
    /// Count completed nodes of `tree`
    #[must_use]
    pub fn of(tree: &SkillTree) -> Self {
        Self {
            completed: tree.nodes.iter().filter(|n| n.completed).count(),
            total: tree.nodes.len(),
        }
    }

    /// Whole-number percentage, 0 for an empty tree.
    #[must_use]
    pub fn percent(&self) -> usize {
        if self.total == 0 {
            0
        } else {
            self.completed * 100 / self.total
        }
    }
}

/// A renderable dependency edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EdgeView {
    /// The prerequisite
    pub dependency: NodeId,
    /// The node that depends on it
    pub dependent: NodeId,
    /// Required or recommended
    pub kind: DependencyKind,
    /// Both endpoints completed
    pub completed: bool,
}

/// All edges of `tree` whose endpoints both exist, in node order.
#[must_use]
pub fn edge_views(tree: &SkillTree) -> Vec<EdgeView> {
    let completed: HashMap<&NodeId, bool> =
        tree.nodes.iter().map(|n| (&n.id, n.completed)).collect();

    let mut edges = Vec::new();
    for node in &tree.nodes {
        for kind in [DependencyKind::Required, DependencyKind::Recommended] {
            for dep in node.deps(kind) {
                let Some(&dep_completed) = completed.get(dep) else {
                    continue;
                };
                edges.push(EdgeView {
                    dependency: dep.clone(),
                    dependent: node.id.clone(),
                    kind,
                    completed: dep_completed && node.completed,
                });
            }
        }
    }
    edges
}
