//! JSONL persistence for in-memory storage.
//!
//! One [`SkillTree`] per line, nodes nested. Loading never aborts on bad
//! data: broken lines and invalid trees are skipped, dangling starting nodes
//! are cleared, and orphaned dependency ids or requirement cycles are kept
//! but reported.

use super::inner::InMemoryStorageInner;
use crate::domain::{NodeId, SkillTree, TreeId};
use crate::error::Result;
use crate::resolver::RequirementGraph;
use crate::storage::TreeStorage;
use skilltree_jsonl::{Warning as JsonlWarning, read_jsonl_resilient, write_jsonl_atomic};
use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Non-fatal problems found while loading a JSONL file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadWarning {
    /// A line could not be parsed; it was skipped.
    MalformedJson {
        /// 1-based line in the file
        line_number: usize,
        /// Parser message
        error: String,
    },

    /// A tree parsed but failed validation; it was skipped.
    InvalidTreeData {
        /// Id of the rejected tree
        tree_id: TreeId,
        /// 1-based position among parsed records
        record_number: usize,
        /// Why it was rejected
        error: String,
    },

    /// A node references a dependency id that is not in its tree. Kept.
    OrphanedDependency {
        /// Tree containing the node
        tree_id: TreeId,
        /// Node with the dangling reference
        node_id: NodeId,
        /// The missing id
        missing: NodeId,
    },

    /// Required dependencies form a cycle. Kept; the nodes stay locked.
    CircularDependency {
        /// Tree containing the cycle
        tree_id: TreeId,
        /// Nodes on a cycle
        nodes: Vec<NodeId>,
    },

    /// The starting node was not among the tree's nodes and was cleared.
    DanglingStartingNode {
        /// Tree that was repaired
        tree_id: TreeId,
        /// The missing id
        node_id: NodeId,
    },
}

impl fmt::Display for LoadWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedJson { line_number, error } => {
                write!(f, "line {line_number}: {error}")
            }
            Self::InvalidTreeData {
                tree_id,
                record_number,
                error,
            } => write!(f, "record {record_number} ({tree_id}) skipped: {error}"),
            Self::OrphanedDependency {
                tree_id,
                node_id,
                missing,
            } => write!(f, "{tree_id}: {node_id} depends on missing node {missing}"),
            Self::CircularDependency { tree_id, nodes } => {
                let ids: Vec<&str> = nodes.iter().map(NodeId::as_str).collect();
                write!(f, "{tree_id}: circular requirement among {}", ids.join(", "))
            }
            Self::DanglingStartingNode { tree_id, node_id } => {
                write!(f, "{tree_id}: starting node {node_id} not found, cleared")
            }
        }
    }
}

/// Load trees from a JSONL file into a new in-memory store.
///
/// # Errors
///
/// Only fails if the file cannot be read at all. Content problems become
/// [`LoadWarning`]s.
pub async fn load_from_jsonl(
    path: &Path,
    prefix: String,
) -> Result<(Box<dyn TreeStorage>, Vec<LoadWarning>)> {
    let (parsed, jsonl_warnings) = read_jsonl_resilient::<SkillTree, _>(path).await?;

    let mut warnings: Vec<LoadWarning> = jsonl_warnings
        .into_iter()
        .map(|warning| match warning {
            JsonlWarning::MalformedJson { line_number, error } => {
                LoadWarning::MalformedJson { line_number, error }
            }
            JsonlWarning::SkippedLine {
                line_number,
                reason,
            } => LoadWarning::MalformedJson {
                line_number,
                error: reason,
            },
        })
        .collect();

    let mut inner = InMemoryStorageInner::new(prefix);
    for (index, mut tree) in parsed.into_iter().enumerate() {
        let record_number = index + 1;
        if let Err(error) = check_tree(&tree, &inner) {
            warnings.push(LoadWarning::InvalidTreeData {
                tree_id: tree.id.clone(),
                record_number,
                error,
            });
            continue;
        }
        repair_tree(&mut tree, &mut warnings);
        inner.insert_loaded(tree);
    }

    for warning in &warnings {
        tracing::debug!(%warning, "Load warning");
    }

    let storage: Box<dyn TreeStorage> = Box::new(Arc::new(Mutex::new(inner)));
    Ok((storage, warnings))
}

/// Reasons a parsed tree is dropped entirely.
fn check_tree(tree: &SkillTree, inner: &InMemoryStorageInner) -> std::result::Result<(), String> {
    if inner.trees.contains_key(&tree.id) {
        return Err("duplicate tree id".to_string());
    }
    tree.validate().map_err(|e| e.to_string())?;

    let mut seen = HashSet::with_capacity(tree.nodes.len());
    for node in &tree.nodes {
        if !seen.insert(&node.id) {
            return Err(format!("duplicate node id {}", node.id));
        }
    }
    Ok(())
}

fn repair_tree(tree: &mut SkillTree, warnings: &mut Vec<LoadWarning>) {
    if let Some(start) = &tree.starting_node_id
        && !tree.contains(start)
    {
        warnings.push(LoadWarning::DanglingStartingNode {
            tree_id: tree.id.clone(),
            node_id: start.clone(),
        });
        tree.starting_node_id = None;
    }

    for node in &tree.nodes {
        for dep in node.required_deps.iter().chain(&node.recommended_deps) {
            if !tree.contains(dep) {
                warnings.push(LoadWarning::OrphanedDependency {
                    tree_id: tree.id.clone(),
                    node_id: node.id.clone(),
                    missing: dep.clone(),
                });
            }
        }
    }

    let cyclic = RequirementGraph::build(tree).cyclic_nodes();
    if !cyclic.is_empty() {
        warnings.push(LoadWarning::CircularDependency {
            tree_id: tree.id.clone(),
            nodes: cyclic.into_iter().collect(),
        });
    }
}

/// Write every tree in `storage` to `path`, replacing it atomically.
///
/// # Errors
///
/// Returns an error if the trees cannot be listed or the file cannot be
/// written. The previous file survives a failed write.
pub async fn save_to_jsonl(storage: &dyn TreeStorage, path: &Path) -> Result<()> {
    let trees = storage.list_trees().await?;
    write_jsonl_atomic(path, &trees).await?;
    tracing::debug!(path = %path.display(), trees = trees.len(), "Saved skill trees");
    Ok(())
}
