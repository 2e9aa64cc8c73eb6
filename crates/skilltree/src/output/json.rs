//! JSON views for programmatic output.

use crate::domain::{NodeState, SkillNode, SkillTree};
use crate::resolver::{EdgeView, Progress};
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::{self, Write};

/// Tree metadata with completion counts, used by `list`.
#[derive(Debug, Serialize)]
pub(crate) struct TreeSummary<'a> {
    pub id: &'a str,
    pub name: &'a str,
    pub description: &'a str,
    pub starting_node_id: Option<&'a str>,
    pub progress: Progress,
    pub created_at: String,
    pub updated_at: String,
}

impl<'a> TreeSummary<'a> {
    pub(crate) fn of(tree: &'a SkillTree) -> Self {
        Self {
            id: tree.id.as_str(),
            name: &tree.name,
            description: &tree.description,
            starting_node_id: tree.starting_node_id.as_ref().map(|n| n.as_str()),
            progress: Progress::of(tree),
            created_at: tree.created_at.to_rfc3339(),
            updated_at: tree.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize)]
struct NodeView<'a> {
    #[serde(flatten)]
    node: &'a SkillNode,
    state: NodeState,
    is_start: bool,
}

#[derive(Debug, Serialize)]
struct TreeDetails<'a> {
    #[serde(flatten)]
    summary: TreeSummary<'a>,
    nodes: Vec<NodeView<'a>>,
    edges: &'a [EdgeView],
}

fn write_json<W: Write, T: Serialize + ?Sized>(w: &mut W, value: &T) -> io::Result<()> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    writeln!(w, "{json}")
}

pub(crate) fn print_trees_json<W: Write>(w: &mut W, trees: &[SkillTree]) -> io::Result<()> {
    let summaries: Vec<TreeSummary<'_>> = trees.iter().map(TreeSummary::of).collect();
    write_json(w, &summaries)
}

pub(crate) fn print_tree_details_json<W: Write>(
    w: &mut W,
    tree: &SkillTree,
    states: &BTreeMap<crate::domain::NodeId, NodeState>,
    edges: &[EdgeView],
) -> io::Result<()> {
    let nodes = tree
        .nodes
        .iter()
        .map(|node| NodeView {
            node,
            state: states.get(&node.id).copied().unwrap_or(NodeState::Locked),
            is_start: tree.is_start(&node.id),
        })
        .collect();

    write_json(
        w,
        &TreeDetails {
            summary: TreeSummary::of(tree),
            nodes,
            edges,
        },
    )
}

pub(crate) fn print_value_json<W: Write, T: Serialize + ?Sized>(
    w: &mut W,
    value: &T,
) -> io::Result<()> {
    write_json(w, value)
}
