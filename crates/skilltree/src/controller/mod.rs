//! Graph interaction controller.
//!
//! Turns pointer events into model mutations. Pointer handlers are
//! synchronous and never touch storage: they update an in-memory snapshot of
//! the tree and push writes onto a queue that [`GraphController::flush`]
//! delivers to a [`TreeStorage`].
//!
//! ```text
//!            pointer down on node              pointer move
//!   Idle ─────────────────────────▶ DraggingNode ◀──────┐
//!    ▲ ▲                                 │ └────────────┘
//!    │ └──── pointer up / leave (commit) ┘
//!    │
//!    │   handle down                      pointer up on another node
//!    ├─────────────▶ DraggingConnection ──────────────────▶ PendingEdgeKindChoice
//!    │ ◀── up on canvas / source, leave ─┘                          │
//!    └─────────────────────── choose kind / dismiss ◀───────────────┘
//! ```
//!
//! Events that do not apply to the current state or mode are ignored.
//! Toggling the mode resets to `Idle`; a node drag in flight is committed
//! first.
//!
//! Snapshot nodes carry the revision last accepted by the store. Queued
//! upserts carry that revision plus one, so a store refuses them once another
//! session has written the node; see [`FlushReport::conflicts`].

mod editing;
mod queue;
mod state;

pub use editing::{ClickOutcome, EdgeChange};
pub use queue::{FlushReport, PendingWrite};
pub use state::{EditorMode, Interaction};

use crate::domain::{NodeId, NodeState, Point, SkillNode, SkillTree, TreeId};
use crate::error::{Error, Result};
use crate::id_generation::{IdGenerator, NODE_PREFIX};
use crate::layout::GridLayout;
use crate::resolver::{self, EdgeView, Progress};
use crate::storage::TreeStorage;
use queue::WriteQueue;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// Tunables taken from configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControllerSettings {
    /// Grid used by auto-layout
    pub layout: GridLayout,
    /// Where nodes go when no position is given
    pub default_position: Point,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            layout: GridLayout::default(),
            default_position: Point::new(400.0, 300.0),
        }
    }
}

/// Editing session for one tree.
pub struct GraphController {
    tree: Arc<SkillTree>,
    mode: EditorMode,
    interaction: Interaction,
    selection: Option<NodeId>,
    node_draft: Option<Point>,
    queue: WriteQueue,
    ids: IdGenerator,
    settings: ControllerSettings,
}

impl GraphController {
    /// Start a session on an already loaded tree.
    #[must_use]
    pub fn new(tree: SkillTree, settings: ControllerSettings) -> Self {
        let ids = IdGenerator::with_existing(
            NODE_PREFIX,
            tree.nodes.iter().map(|n| n.id.as_str().to_string()),
        );
        Self {
            tree: Arc::new(tree),
            mode: EditorMode::default(),
            interaction: Interaction::Idle,
            selection: None,
            node_draft: None,
            queue: WriteQueue::default(),
            ids,
            settings,
        }
    }

    /// Load `tree_id` from `storage` and start a session on it.
    ///
    /// # Errors
    ///
    /// Returns `Error::TreeNotFound` if the store has no such tree.
    pub async fn load(
        storage: &dyn TreeStorage,
        tree_id: &TreeId,
        settings: ControllerSettings,
    ) -> Result<Self> {
        let tree = storage.load_tree(tree_id).await?;
        debug!(tree_id = %tree_id, nodes = tree.nodes.len(), "Loaded tree into controller");
        Ok(Self::new(tree, settings))
    }

    // ========== Queries ==========

    /// Current tree snapshot
    #[must_use]
    pub fn tree(&self) -> &SkillTree {
        &self.tree
    }

    /// Shared handle to the current snapshot; later edits do not affect it.
    #[must_use]
    pub fn snapshot(&self) -> Arc<SkillTree> {
        Arc::clone(&self.tree)
    }

    /// Current editor mode
    #[must_use]
    pub fn mode(&self) -> EditorMode {
        self.mode
    }

    /// Current pointer interaction
    #[must_use]
    pub fn interaction(&self) -> &Interaction {
        &self.interaction
    }

    /// Selected node, if any
    #[must_use]
    pub fn selection(&self) -> Option<&NodeId> {
        self.selection.as_ref()
    }

    /// Position of an open node draft
    #[must_use]
    pub fn node_draft(&self) -> Option<Point> {
        self.node_draft
    }

    /// The transient connection line, from the source node's centre to the
    /// pointer, while a connection is being dragged.
    #[must_use]
    pub fn drag_line(&self) -> Option<(Point, Point)> {
        match &self.interaction {
            Interaction::DraggingConnection { source, pointer } => self
                .tree
                .node(source)
                .map(|node| (node.position(), *pointer)),
            _ => None,
        }
    }

    /// Derived state of every node
    #[must_use]
    pub fn node_states(&self) -> BTreeMap<NodeId, NodeState> {
        resolver::classify_all(&self.tree)
    }

    /// Derived state of one node
    #[must_use]
    pub fn node_state(&self, id: &NodeId) -> Option<NodeState> {
        let node = self.tree.node(id)?;
        Some(resolver::classify(
            node,
            &self.tree.nodes,
            self.tree.starting_node_id.as_ref(),
        ))
    }

    /// Renderable edges
    #[must_use]
    pub fn edges(&self) -> Vec<EdgeView> {
        resolver::edge_views(&self.tree)
    }

    /// Completion counts
    #[must_use]
    pub fn progress(&self) -> Progress {
        Progress::of(&self.tree)
    }

    /// Writes not yet delivered
    #[must_use]
    pub fn pending_writes(&self) -> usize {
        self.queue.len()
    }

    /// Whether every write has been delivered
    #[must_use]
    pub fn is_synced(&self) -> bool {
        self.queue.is_empty()
    }

    /// Queued writes, oldest first
    pub fn queued_writes(&self) -> impl Iterator<Item = &PendingWrite> {
        self.queue.iter()
    }

    // ========== Pointer events ==========

    /// Pointer pressed on a node body. Starts a drag in edit mode.
    pub fn pointer_down_on_node(&mut self, node_id: &NodeId, pointer: Point) {
        if self.mode != EditorMode::Edit || !self.interaction.is_idle() {
            return;
        }
        let Some(node) = self.tree.node(node_id) else {
            return;
        };
        let offset = pointer.offset_from(node.position());
        self.transition(Interaction::DraggingNode {
            node_id: node_id.clone(),
            offset,
        });
    }

    /// Pointer pressed on a node's connection handle. Starts a connection in
    /// edit mode.
    pub fn connection_handle_down(&mut self, node_id: &NodeId, pointer: Point) {
        if self.mode != EditorMode::Edit || !self.interaction.is_idle() {
            return;
        }
        if !self.tree.contains(node_id) {
            return;
        }
        self.transition(Interaction::DraggingConnection {
            source: node_id.clone(),
            pointer,
        });
    }

    /// Pointer moved over the canvas.
    pub fn pointer_move(&mut self, pointer: Point) {
        match &mut self.interaction {
            Interaction::DraggingNode { node_id, offset } => {
                let position = pointer.offset_from(*offset).clamp_non_negative();
                let id = node_id.clone();
                // Live position only; the commit happens on release.
                if let Some(node) = Arc::make_mut(&mut self.tree).node_mut(&id) {
                    node.set_position(position);
                }
            }
            Interaction::DraggingConnection { pointer: end, .. } => *end = pointer,
            Interaction::Idle | Interaction::PendingEdgeKindChoice { .. } => {}
        }
    }

    /// Pointer released over a node.
    pub fn pointer_up_on_node(&mut self, node_id: &NodeId) {
        match &self.interaction {
            Interaction::DraggingNode { .. } => self.commit_drag(),
            Interaction::DraggingConnection { source, pointer } => {
                if source == node_id || !self.tree.contains(node_id) {
                    self.transition(Interaction::Idle);
                } else {
                    let next = Interaction::PendingEdgeKindChoice {
                        source: source.clone(),
                        target: node_id.clone(),
                        anchor: *pointer,
                    };
                    self.transition(next);
                }
            }
            Interaction::Idle | Interaction::PendingEdgeKindChoice { .. } => {}
        }
    }

    /// Pointer released over empty canvas.
    pub fn pointer_up_on_canvas(&mut self) {
        self.release_outside_target();
    }

    /// Pointer left the canvas.
    pub fn pointer_leave(&mut self) {
        self.release_outside_target();
    }

    fn release_outside_target(&mut self) {
        match &self.interaction {
            Interaction::DraggingNode { .. } => self.commit_drag(),
            Interaction::DraggingConnection { .. } => self.transition(Interaction::Idle),
            Interaction::Idle | Interaction::PendingEdgeKindChoice { .. } => {}
        }
    }

    /// Switch between edit and view mode.
    pub fn toggle_mode(&mut self) {
        self.set_mode(self.mode.toggled());
    }

    /// Enter `mode`, resetting transient state.
    pub fn set_mode(&mut self, mode: EditorMode) {
        if matches!(self.interaction, Interaction::DraggingNode { .. }) {
            self.commit_drag();
        }
        self.transition(Interaction::Idle);
        self.node_draft = None;
        self.selection = None;
        if self.mode != mode {
            debug!(from = %self.mode, to = %mode, "Editor mode changed");
            self.mode = mode;
        }
    }

    fn commit_drag(&mut self) {
        if let Interaction::DraggingNode { node_id, .. } =
            std::mem::take(&mut self.interaction)
        {
            debug!(node_id = %node_id, "Node drag committed");
            self.mutate_node(&node_id, |_| {});
        }
        self.transition(Interaction::Idle);
    }

    fn transition(&mut self, next: Interaction) {
        if self.interaction.name() != next.name() {
            debug!(from = self.interaction.name(), to = next.name(), "Interaction transition");
        }
        self.interaction = next;
    }

    // ========== Persistence ==========

    /// Deliver queued writes to `storage`, in order.
    ///
    /// Writes refused as revision conflicts are dropped and listed in the
    /// report; load the tree again to pick up the other session's changes.
    ///
    /// # Errors
    ///
    /// Returns the first failing write's error. That write and the ones
    /// after it stay queued for the next flush; the in-memory tree is kept.
    pub async fn flush(&mut self, storage: &mut dyn TreeStorage) -> Result<FlushReport> {
        let tree_id = self.tree.id.clone();
        let tree = &mut self.tree;
        self.queue
            .flush(storage, &tree_id, |write| record_stored_revision(tree, write))
            .await
    }

    /// Drop every queued write without delivering it.
    pub fn discard_pending(&mut self) {
        if !self.queue.is_empty() {
            debug!(count = self.queue.len(), "Discarding queued writes");
        }
        self.queue.clear();
    }

    // ========== Shared mutation helpers ==========

    /// Apply `f` to a node in the snapshot and queue an upsert based on its
    /// stored revision. Returns `false` if the node does not exist.
    fn mutate_node<F>(&mut self, id: &NodeId, f: F) -> bool
    where
        F: FnOnce(&mut SkillNode),
    {
        let Some(node) = Arc::make_mut(&mut self.tree).node_mut(id) else {
            return false;
        };
        f(node);
        let mut write = node.clone();
        write.revision += 1;
        self.queue.push(PendingWrite::UpsertNode(write));
        true
    }

    fn require_node(&self, id: &NodeId) -> Result<&SkillNode> {
        self.tree.node(id).ok_or_else(|| Error::NodeNotFound {
            tree_id: self.tree.id.clone(),
            node_id: id.clone(),
        })
    }
}

/// Mirror a write the store accepted into the snapshot's revisions.
fn record_stored_revision(tree: &mut Arc<SkillTree>, write: &PendingWrite) {
    let (id, revision) = match write {
        PendingWrite::UpsertNode(node) => (&node.id, node.revision),
        PendingWrite::SetCompleted(id, _) => match tree.node(id) {
            Some(node) => (id, node.revision + 1),
            None => return,
        },
        PendingWrite::DeleteNode(_) | PendingWrite::SetStartingNode(_) => return,
    };
    if let Some(node) = Arc::make_mut(tree).node_mut(id) {
        node.revision = revision;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controller_with(ids: &[(&str, f64, f64)]) -> GraphController {
        let mut tree = SkillTree::new(TreeId::new("skill-t"), "Cooking", "");
        for (id, x, y) in ids {
            tree.nodes.push(SkillNode::new(
                NodeId::new(*id),
                *id,
                "",
                Point::new(*x, *y),
            ));
        }
        GraphController::new(tree, ControllerSettings::default())
    }

    fn a() -> NodeId {
        NodeId::new("a")
    }

    fn b() -> NodeId {
        NodeId::new("b")
    }

    #[test]
    fn drag_moves_node_and_commits_once() {
        let mut c = controller_with(&[("a", 100.0, 100.0)]);

        c.pointer_down_on_node(&a(), Point::new(110.0, 95.0));
        assert_eq!(
            c.interaction(),
            &Interaction::DraggingNode {
                node_id: a(),
                offset: Point::new(10.0, -5.0),
            }
        );

        c.pointer_move(Point::new(210.0, 195.0));
        c.pointer_move(Point::new(310.0, 295.0));
        assert_eq!(c.tree().node(&a()).unwrap().position(), Point::new(300.0, 300.0));
        assert_eq!(c.pending_writes(), 0);

        c.pointer_up_on_canvas();
        assert!(c.interaction().is_idle());
        assert_eq!(c.pending_writes(), 1);
        assert!(matches!(
            c.queued_writes().next(),
            Some(PendingWrite::UpsertNode(node)) if node.revision == 1
        ));
        // The snapshot keeps the stored revision until the write lands.
        assert_eq!(c.tree().node(&a()).unwrap().revision, 0);
    }

    #[test]
    fn drag_clamps_at_canvas_origin() {
        let mut c = controller_with(&[("a", 20.0, 20.0)]);
        c.pointer_down_on_node(&a(), Point::new(20.0, 20.0));
        c.pointer_move(Point::new(-50.0, 5.0));
        assert_eq!(c.tree().node(&a()).unwrap().position(), Point::new(0.0, 5.0));
    }

    #[test]
    fn view_mode_ignores_pointer_down() {
        let mut c = controller_with(&[("a", 0.0, 0.0)]);
        c.set_mode(EditorMode::View);
        c.pointer_down_on_node(&a(), Point::default());
        c.connection_handle_down(&a(), Point::default());
        assert!(c.interaction().is_idle());
    }

    #[test]
    fn connection_dropped_on_other_node_awaits_kind() {
        let mut c = controller_with(&[("a", 0.0, 0.0), ("b", 300.0, 0.0)]);

        c.connection_handle_down(&a(), Point::new(0.0, 0.0));
        c.pointer_move(Point::new(290.0, 10.0));
        assert_eq!(
            c.drag_line(),
            Some((Point::new(0.0, 0.0), Point::new(290.0, 10.0)))
        );

        c.pointer_up_on_node(&b());
        assert_eq!(
            c.interaction(),
            &Interaction::PendingEdgeKindChoice {
                source: a(),
                target: b(),
                anchor: Point::new(290.0, 10.0),
            }
        );
        assert_eq!(c.drag_line(), None);
        // No edge until a kind is chosen.
        assert!(c.edges().is_empty());
        assert_eq!(c.pending_writes(), 0);
    }

    #[test]
    fn connection_dropped_on_source_or_canvas_cancels() {
        let mut c = controller_with(&[("a", 0.0, 0.0), ("b", 300.0, 0.0)]);

        c.connection_handle_down(&a(), Point::default());
        c.pointer_up_on_node(&a());
        assert!(c.interaction().is_idle());

        c.connection_handle_down(&a(), Point::default());
        c.pointer_leave();
        assert!(c.interaction().is_idle());
        assert_eq!(c.pending_writes(), 0);
    }

    #[test]
    fn connection_dropped_on_unknown_node_cancels() {
        let mut c = controller_with(&[("a", 0.0, 0.0), ("b", 300.0, 0.0)]);

        c.connection_handle_down(&a(), Point::default());
        c.pointer_move(Point::new(150.0, 0.0));
        c.pointer_up_on_node(&NodeId::new("ghost"));

        assert!(c.interaction().is_idle());
        assert_eq!(c.drag_line(), None);
        assert!(c.edges().is_empty());
        assert_eq!(c.pending_writes(), 0);
    }

    #[test]
    fn mode_toggle_commits_drag_in_flight() {
        let mut c = controller_with(&[("a", 0.0, 0.0)]);
        c.pointer_down_on_node(&a(), Point::default());
        c.pointer_move(Point::new(40.0, 40.0));

        c.toggle_mode();
        assert_eq!(c.mode(), EditorMode::View);
        assert!(c.interaction().is_idle());
        assert_eq!(c.pending_writes(), 1);
        assert_eq!(c.tree().node(&a()).unwrap().position(), Point::new(40.0, 40.0));
    }

    #[test]
    fn snapshots_are_isolated_from_later_edits() {
        let mut c = controller_with(&[("a", 0.0, 0.0)]);
        let before = c.snapshot();
        c.pointer_down_on_node(&a(), Point::default());
        c.pointer_move(Point::new(5.0, 5.0));
        c.pointer_up_on_node(&a());

        assert_eq!(before.node(&a()).unwrap().position(), Point::new(0.0, 0.0));
        assert_eq!(c.tree().node(&a()).unwrap().position(), Point::new(5.0, 5.0));
    }
}
