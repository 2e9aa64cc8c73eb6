//! Requirement graph built with petgraph.
//!
//! Edges point from **dependent -> dependency**: a node that requires `A`
//! has an outgoing edge to `A`. Only required dependencies are graphed;
//! recommended ones never gate anything and may form cycles freely.

use crate::domain::{NodeId, SkillTree};
use petgraph::algo;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::{BTreeSet, HashMap};

/// Directed graph over the required dependencies of a tree.
#[derive(Debug)]
pub struct RequirementGraph {
    graph: DiGraph<NodeId, ()>,
    node_map: HashMap<NodeId, NodeIndex>,
}

impl RequirementGraph {
    /// Build the graph for `tree`.
    ///
    /// Required ids that do not resolve to a node of the tree are left out.
    #[must_use]
    pub fn build(tree: &SkillTree) -> Self {
        let mut graph = DiGraph::with_capacity(tree.nodes.len(), tree.nodes.len());
        let mut node_map = HashMap::with_capacity(tree.nodes.len());

        for node in &tree.nodes {
            let index = graph.add_node(node.id.clone());
            node_map.insert(node.id.clone(), index);
        }

        for node in &tree.nodes {
            let from = node_map[&node.id];
            for dep in &node.required_deps {
                if let Some(&to) = node_map.get(dep) {
                    graph.add_edge(from, to, ());
                }
            }
        }

        Self { graph, node_map }
    }

    /// Whether adding `dependent -> dependency` would close a cycle.
    ///
    /// A self edge always would. Unknown ids never do.
    #[must_use]
    pub fn would_create_cycle(&self, dependent: &NodeId, dependency: &NodeId) -> bool {
        if dependent == dependency {
            return true;
        }
        let (Some(&from), Some(&to)) = (self.node_map.get(dependent), self.node_map.get(dependency))
        else {
            return false;
        };

        // An existing path dependency ~> dependent plus the new edge is a cycle.
        algo::has_path_connecting(&self.graph, to, from, None)
    }

    /// Every node that sits on at least one requirement cycle.
    #[must_use]
    pub fn cyclic_nodes(&self) -> BTreeSet<NodeId> {
        let mut cyclic = BTreeSet::new();
        for component in algo::tarjan_scc(&self.graph) {
            let on_cycle = component.len() > 1
                || component
                    .first()
                    .is_some_and(|&n| self.graph.contains_edge(n, n));
            if on_cycle {
                cyclic.extend(component.into_iter().map(|n| self.graph[n].clone()));
            }
        }
        cyclic
    }

    /// Number of resolved required edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }
}
