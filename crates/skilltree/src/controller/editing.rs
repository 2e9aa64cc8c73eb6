//! Editing commands: nodes, edges, completion and layout.
//!
//! Every command validates first and only then touches the snapshot, so a
//! rejected command leaves both the tree and the write queue unchanged.

use super::{EditorMode, GraphController, Interaction, PendingWrite};
use crate::domain::{
    DependencyKind, NewNode, NodeId, NodeUpdate, Point, SkillNode, validate_description,
    validate_title,
};
use crate::error::{Result, ValidationError};
use crate::resolver::{self, RequirementGraph};
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

/// Result of an edge request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum EdgeChange {
    /// The dependency was added
    Added,
    /// The dependency already existed; nothing changed
    AlreadyPresent,
    /// No connection was waiting for a kind
    NoPendingChoice,
}

/// What a node click did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ClickOutcome {
    /// Edit mode: the node is now selected
    Selected,
    /// View mode: completion was toggled
    Toggled {
        /// New completion flag
        completed: bool,
    },
}

impl GraphController {
    // ========== Nodes ==========

    /// Open a node draft at `pointer` (canvas double-click).
    pub fn begin_node_draft(&mut self, pointer: Point) {
        if self.mode == EditorMode::Edit && self.interaction.is_idle() {
            self.node_draft = Some(pointer);
        }
    }

    /// Close the draft without creating anything.
    pub fn cancel_node_draft(&mut self) {
        self.node_draft = None;
    }

    /// Create a node at the draft position. Returns `None` without a draft.
    ///
    /// The draft stays open if validation fails.
    ///
    /// # Errors
    ///
    /// See [`add_node`](Self::add_node).
    pub fn confirm_node_draft(&mut self, title: &str, description: &str) -> Result<Option<NodeId>> {
        let Some(position) = self.node_draft else {
            return Ok(None);
        };
        let id = self.add_node(NewNode {
            title: title.to_string(),
            description: description.to_string(),
            position: Some(position),
        })?;
        self.node_draft = None;
        Ok(Some(id))
    }

    /// Append a node. The first node of a tree without a start becomes the
    /// starting node.
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` for an empty or overlong title or an
    /// overlong description.
    pub fn add_node(&mut self, new: NewNode) -> Result<NodeId> {
        validate_title("Title", &new.title)?;
        validate_description(&new.description)?;

        let id = NodeId::new(self.ids.generate(&new.title, &new.description)?);
        let position = new
            .position
            .unwrap_or(self.settings.default_position)
            .clamp_non_negative();
        let node = SkillNode::new(id.clone(), new.title, new.description, position);
        let mut write = node.clone();
        write.revision = 1;

        let tree = Arc::make_mut(&mut self.tree);
        tree.nodes.push(node);
        self.queue.push(PendingWrite::UpsertNode(write));

        if tree.starting_node_id.is_none() {
            tree.starting_node_id = Some(id.clone());
            self.queue
                .push(PendingWrite::SetStartingNode(Some(id.clone())));
        }

        debug!(node_id = %id, "Node created");
        Ok(id)
    }

    /// Change a node's title or description.
    ///
    /// # Errors
    ///
    /// `Error::NodeNotFound` or `Error::Validation`.
    pub fn update_node(&mut self, id: &NodeId, update: NodeUpdate) -> Result<()> {
        self.require_node(id)?;
        if let Some(title) = &update.title {
            validate_title("Title", title)?;
        }
        if let Some(description) = &update.description {
            validate_description(description)?;
        }

        self.mutate_node(id, |node| {
            if let Some(title) = update.title {
                node.title = title;
            }
            if let Some(description) = update.description {
                node.description = description;
            }
        });
        Ok(())
    }

    /// Delete a node and strip it from every dependency set.
    ///
    /// If it was the starting node the tree is left without one.
    ///
    /// # Errors
    ///
    /// `Error::NodeNotFound` if the node does not exist.
    pub fn delete_node(&mut self, id: &NodeId) -> Result<()> {
        self.require_node(id)?;

        let dependents: Vec<NodeId> = self
            .tree
            .nodes
            .iter()
            .filter(|n| n.depends_on(id))
            .map(|n| n.id.clone())
            .collect();
        for dependent in &dependents {
            self.mutate_node(dependent, |node| {
                node.forget_dependency(id);
            });
        }

        let tree = Arc::make_mut(&mut self.tree);
        tree.nodes.retain(|n| &n.id != id);
        let was_start = tree.is_start(id);
        if was_start {
            tree.starting_node_id = None;
        }
        self.queue.push(PendingWrite::DeleteNode(id.clone()));
        if was_start {
            self.queue.push(PendingWrite::SetStartingNode(None));
        }

        if self.selection.as_ref() == Some(id) {
            self.selection = None;
        }
        if self.interaction_involves(id) {
            self.transition(Interaction::Idle);
        }

        debug!(node_id = %id, cleaned = dependents.len(), was_start, "Node deleted");
        Ok(())
    }

    fn interaction_involves(&self, id: &NodeId) -> bool {
        match &self.interaction {
            Interaction::Idle => false,
            Interaction::DraggingNode { node_id, .. } => node_id == id,
            Interaction::DraggingConnection { source, .. } => source == id,
            Interaction::PendingEdgeKindChoice { source, target, .. } => {
                source == id || target == id
            }
        }
    }

    /// Make `id` the starting node.
    ///
    /// # Errors
    ///
    /// `Error::NodeNotFound` if the node does not exist.
    pub fn set_starting_node(&mut self, id: &NodeId) -> Result<()> {
        self.require_node(id)?;
        Arc::make_mut(&mut self.tree).starting_node_id = Some(id.clone());
        self.queue
            .push(PendingWrite::SetStartingNode(Some(id.clone())));
        Ok(())
    }

    /// Leave the tree without a starting node.
    pub fn clear_starting_node(&mut self) {
        if self.tree.starting_node_id.is_some() {
            Arc::make_mut(&mut self.tree).starting_node_id = None;
            self.queue.push(PendingWrite::SetStartingNode(None));
        }
    }

    // ========== Selection and completion ==========

    /// Select a node.
    ///
    /// # Errors
    ///
    /// `Error::NodeNotFound` if the node does not exist.
    pub fn select(&mut self, id: &NodeId) -> Result<()> {
        self.require_node(id)?;
        self.selection = Some(id.clone());
        Ok(())
    }

    /// Clear the selection.
    pub fn clear_selection(&mut self) {
        self.selection = None;
    }

    /// A click on a node: selects it in edit mode, toggles completion in
    /// view mode.
    ///
    /// # Errors
    ///
    /// See [`select`](Self::select) and
    /// [`toggle_completion`](Self::toggle_completion).
    pub fn click_node(&mut self, id: &NodeId) -> Result<ClickOutcome> {
        match self.mode {
            EditorMode::Edit => {
                self.select(id)?;
                Ok(ClickOutcome::Selected)
            }
            EditorMode::View => {
                let completed = self.toggle_completion(id)?;
                Ok(ClickOutcome::Toggled { completed })
            }
        }
    }

    /// Flip a node's completion flag and return the new value.
    ///
    /// Un-completing is always allowed; completing needs the node to be
    /// available.
    ///
    /// # Errors
    ///
    /// `Error::NodeNotFound`, or `ValidationError::NodeLocked` when the
    /// required dependencies are not all completed.
    pub fn toggle_completion(&mut self, id: &NodeId) -> Result<bool> {
        let node = self.require_node(id)?;
        let completed = !node.completed;
        if completed
            && !resolver::can_complete(node, &self.tree.nodes, self.tree.starting_node_id.as_ref())
        {
            return Err(ValidationError::NodeLocked(id.clone()).into());
        }

        if let Some(node) = Arc::make_mut(&mut self.tree).node_mut(id) {
            node.completed = completed;
        }
        self.queue
            .push(PendingWrite::SetCompleted(id.clone(), completed));
        debug!(node_id = %id, completed, "Completion toggled");
        Ok(completed)
    }

    // ========== Edges ==========

    /// Resolve a pending connection with the chosen kind. The source becomes
    /// a dependency of the target.
    ///
    /// The choice is consumed even when the edge is rejected.
    ///
    /// # Errors
    ///
    /// See [`add_edge`](Self::add_edge).
    pub fn choose_edge_kind(&mut self, kind: DependencyKind) -> Result<EdgeChange> {
        let (source, target) = match &self.interaction {
            Interaction::PendingEdgeKindChoice { source, target, .. } => {
                (source.clone(), target.clone())
            }
            _ => return Ok(EdgeChange::NoPendingChoice),
        };
        self.transition(Interaction::Idle);
        self.add_edge(&target, &source, kind)
    }

    /// Discard a pending connection.
    pub fn dismiss_edge_choice(&mut self) {
        if matches!(self.interaction, Interaction::PendingEdgeKindChoice { .. }) {
            self.transition(Interaction::Idle);
        }
    }

    /// Make `dependency` a `kind` dependency of `dependent`.
    ///
    /// # Errors
    ///
    /// - `Error::NodeNotFound` if `dependent` does not exist
    /// - `ValidationError::SelfDependency` for a node depending on itself
    /// - `ValidationError::UnknownNode` if `dependency` does not exist
    /// - `ValidationError::CircularDependency` if a required edge would
    ///   close a cycle
    pub fn add_edge(
        &mut self,
        dependent: &NodeId,
        dependency: &NodeId,
        kind: DependencyKind,
    ) -> Result<EdgeChange> {
        let node = self.require_node(dependent)?;
        if dependent == dependency {
            return Err(ValidationError::SelfDependency(dependent.clone()).into());
        }
        if !self.tree.contains(dependency) {
            return Err(ValidationError::UnknownNode(dependency.clone()).into());
        }
        if node.deps(kind).contains(dependency) {
            return Ok(EdgeChange::AlreadyPresent);
        }
        if kind == DependencyKind::Required
            && RequirementGraph::build(&self.tree).would_create_cycle(dependent, dependency)
        {
            return Err(ValidationError::CircularDependency {
                dependent: dependent.clone(),
                dependency: dependency.clone(),
            }
            .into());
        }

        self.mutate_node(dependent, |node| {
            node.deps_mut(kind).insert(dependency.clone());
        });
        debug!(%dependent, %dependency, %kind, "Edge added");
        Ok(EdgeChange::Added)
    }

    /// Remove a `kind` dependency. Returns `false` if it did not exist.
    ///
    /// # Errors
    ///
    /// `Error::NodeNotFound` if `dependent` does not exist.
    pub fn remove_edge(
        &mut self,
        dependent: &NodeId,
        dependency: &NodeId,
        kind: DependencyKind,
    ) -> Result<bool> {
        if !self.require_node(dependent)?.deps(kind).contains(dependency) {
            return Ok(false);
        }
        self.mutate_node(dependent, |node| {
            node.deps_mut(kind).remove(dependency);
        });
        Ok(true)
    }

    // ========== Layout ==========

    /// Arrange all nodes on the configured grid, in node order. Returns the
    /// number of nodes moved.
    pub fn auto_layout(&mut self) -> usize {
        let positions = self.settings.layout.positions(self.tree.nodes.len());
        let ids: Vec<NodeId> = self.tree.nodes.iter().map(|n| n.id.clone()).collect();
        for (id, position) in ids.iter().zip(positions) {
            self.mutate_node(id, |node| node.set_position(position));
        }
        debug!(nodes = ids.len(), "Auto-layout applied");
        ids.len()
    }
}
