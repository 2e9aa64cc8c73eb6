//! Ordered, coalescing queue of writes waiting for the store.
//!
//! Coalescing rules, applied as writes are pushed:
//!
//! - an upsert replaces a queued upsert of the same node in place and drops
//!   queued completion writes for it. When the new version depends on a node
//!   whose upsert is queued later, it moves behind that upsert, taking along
//!   the queued writes between them that refer to it;
//! - a completion write folds into a queued upsert of the same node, or
//!   replaces an older completion write;
//! - a delete drops every queued write for the node, including a queued
//!   start designation of it;
//! - a start designation replaces any older one and moves to the back.
//!
//! Every write therefore follows the upserts of the nodes it refers to, so a
//! store that checks references never sees a dangling id. Dependency cycles
//! (possible through recommended edges) keep queue order.
//!
//! A write the store refuses as a revision conflict is dropped and reported;
//! retrying it could never succeed.

use crate::domain::{NodeId, SkillNode, TreeId};
use crate::error::Result;
use crate::storage::TreeStorage;
use serde::Serialize;
use std::collections::{BTreeSet, VecDeque};
use tracing::{debug, warn};

/// A write for the persistence collaborator.
#[derive(Debug, Clone, PartialEq)]
pub enum PendingWrite {
    /// Create or replace a node
    UpsertNode(SkillNode),
    /// Remove a node
    DeleteNode(NodeId),
    /// Designate or clear the starting node
    SetStartingNode(Option<NodeId>),
    /// Set a node's completion flag
    SetCompleted(NodeId, bool),
}

impl PendingWrite {
    fn node_id(&self) -> Option<&NodeId> {
        match self {
            Self::UpsertNode(node) => Some(&node.id),
            Self::DeleteNode(id) | Self::SetCompleted(id, _) => Some(id),
            Self::SetStartingNode(_) => None,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::UpsertNode(_) => "upsert-node",
            Self::DeleteNode(_) => "delete-node",
            Self::SetStartingNode(_) => "set-starting-node",
            Self::SetCompleted(..) => "set-completed",
        }
    }

    /// Whether this write must be delivered after an upsert of any of `ids`.
    fn refers_to_any(&self, ids: &BTreeSet<NodeId>) -> bool {
        match self {
            Self::UpsertNode(node) => ids.iter().any(|id| node.depends_on(id)),
            Self::SetStartingNode(Some(start)) => ids.contains(start),
            _ => false,
        }
    }

    async fn apply(&self, storage: &mut dyn TreeStorage, tree_id: &TreeId) -> Result<()> {
        match self {
            Self::UpsertNode(node) => storage.upsert_node(tree_id, node.clone()).await,
            Self::DeleteNode(id) => storage.delete_node(tree_id, id).await,
            Self::SetStartingNode(id) => storage.set_starting_node(tree_id, id.as_ref()).await,
            Self::SetCompleted(id, completed) => {
                storage.set_node_completed(tree_id, id, *completed).await
            }
        }
    }
}

/// Outcome of a successful flush.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct FlushReport {
    /// Writes delivered to the store
    pub applied: usize,
    /// Nodes whose write was refused because another session changed them
    /// first. The session's copy of these nodes is out of date.
    pub conflicts: Vec<NodeId>,
}

/// The controller's write queue.
#[derive(Debug, Default)]
pub(crate) struct WriteQueue {
    pending: VecDeque<PendingWrite>,
}

impl WriteQueue {
    pub(crate) fn len(&self) -> usize {
        self.pending.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &PendingWrite> {
        self.pending.iter()
    }

    pub(crate) fn clear(&mut self) {
        self.pending.clear();
    }

    pub(crate) fn push(&mut self, write: PendingWrite) {
        match write {
            PendingWrite::UpsertNode(node) => self.push_upsert(node),
            PendingWrite::SetCompleted(id, completed) => self.push_completed(id, completed),
            PendingWrite::DeleteNode(id) => {
                self.pending.retain(|w| match w {
                    PendingWrite::SetStartingNode(Some(start)) => start != &id,
                    other => other.node_id() != Some(&id),
                });
                self.pending.push_back(PendingWrite::DeleteNode(id));
            }
            PendingWrite::SetStartingNode(id) => {
                self.pending
                    .retain(|w| !matches!(w, PendingWrite::SetStartingNode(_)));
                self.pending.push_back(PendingWrite::SetStartingNode(id));
            }
        }
    }

    fn push_upsert(&mut self, node: SkillNode) {
        self.pending
            .retain(|w| !matches!(w, PendingWrite::SetCompleted(id, _) if id == &node.id));

        let Some(at) = self
            .pending
            .iter()
            .position(|w| matches!(w, PendingWrite::UpsertNode(queued) if queued.id == node.id))
        else {
            self.pending.push_back(PendingWrite::UpsertNode(node));
            return;
        };

        self.pending.remove(at);
        let tail: Vec<PendingWrite> = self.pending.drain(at..).collect();
        let last_dependency = tail.iter().rposition(
            |w| matches!(w, PendingWrite::UpsertNode(queued) if node.depends_on(&queued.id)),
        );
        let Some(last_dependency) = last_dependency else {
            self.pending.push_back(PendingWrite::UpsertNode(node));
            self.pending.extend(tail);
            return;
        };

        let mut moving = BTreeSet::from([node.id.clone()]);
        let mut followers = Vec::new();
        let mut rest = tail.into_iter();
        for write in rest.by_ref().take(last_dependency + 1) {
            if write.refers_to_any(&moving) {
                if let PendingWrite::UpsertNode(queued) = &write {
                    moving.insert(queued.id.clone());
                }
                followers.push(write);
            } else {
                self.pending.push_back(write);
            }
        }
        debug!(node_id = %node.id, followers = followers.len(), "Moved upsert behind its dependencies");
        self.pending.push_back(PendingWrite::UpsertNode(node));
        self.pending.extend(followers);
        self.pending.extend(rest);
    }

    fn push_completed(&mut self, id: NodeId, completed: bool) {
        let queued = self.pending.iter_mut().find_map(|w| match w {
            PendingWrite::UpsertNode(queued) if queued.id == id => Some(queued),
            _ => None,
        });
        if let Some(queued) = queued {
            queued.completed = completed;
            return;
        }

        self.pending
            .retain(|w| !matches!(w, PendingWrite::SetCompleted(queued, _) if queued == &id));
        self.pending
            .push_back(PendingWrite::SetCompleted(id, completed));
    }

    /// Deliver queued writes in order, stopping at the first failure.
    ///
    /// `on_applied` sees every write the store accepted. The failed write and
    /// everything after it stay queued; revision conflicts are dropped and
    /// listed in the report instead.
    pub(crate) async fn flush<F>(
        &mut self,
        storage: &mut dyn TreeStorage,
        tree_id: &TreeId,
        mut on_applied: F,
    ) -> Result<FlushReport>
    where
        F: FnMut(&PendingWrite),
    {
        let mut report = FlushReport::default();
        while let Some(write) = self.pending.front() {
            match write.apply(storage, tree_id).await {
                Ok(()) => {
                    on_applied(write);
                    report.applied += 1;
                }
                Err(e) if e.is_conflict() => {
                    warn!(
                        tree_id = %tree_id,
                        write = write.kind(),
                        error = %e,
                        "Write lost to a newer revision; dropping it"
                    );
                    if let Some(id) = write.node_id() {
                        report.conflicts.push(id.clone());
                    }
                }
                Err(e) => {
                    warn!(
                        tree_id = %tree_id,
                        write = write.kind(),
                        remaining = self.pending.len(),
                        error = %e,
                        "Write failed; keeping it queued"
                    );
                    return Err(e);
                }
            }
            self.pending.pop_front();
        }
        debug!(
            tree_id = %tree_id,
            applied = report.applied,
            conflicts = report.conflicts.len(),
            "Flushed write queue"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Point;

    fn node(id: &str, revision: u64) -> SkillNode {
        let mut n = SkillNode::new(NodeId::new(id), id, "", Point::default());
        n.revision = revision;
        n
    }

    fn queue(writes: impl IntoIterator<Item = PendingWrite>) -> WriteQueue {
        let mut q = WriteQueue::default();
        for w in writes {
            q.push(w);
        }
        q
    }

    #[test]
    fn newer_upsert_replaces_in_place() {
        let q = queue([
            PendingWrite::UpsertNode(node("a", 1)),
            PendingWrite::SetStartingNode(Some(NodeId::new("a"))),
            PendingWrite::UpsertNode(node("a", 2)),
        ]);
        let writes: Vec<_> = q.iter().cloned().collect();
        assert_eq!(
            writes,
            vec![
                PendingWrite::UpsertNode(node("a", 2)),
                PendingWrite::SetStartingNode(Some(NodeId::new("a"))),
            ]
        );
    }

    #[test]
    fn completion_folds_into_queued_upsert() {
        let q = queue([
            PendingWrite::UpsertNode(node("a", 1)),
            PendingWrite::SetCompleted(NodeId::new("a"), true),
        ]);
        let writes: Vec<_> = q.iter().cloned().collect();
        let mut expected = node("a", 1);
        expected.completed = true;
        assert_eq!(writes, vec![PendingWrite::UpsertNode(expected)]);
    }

    #[test]
    fn delete_supersedes_everything_for_the_node() {
        let q = queue([
            PendingWrite::UpsertNode(node("a", 1)),
            PendingWrite::UpsertNode(node("b", 1)),
            PendingWrite::SetStartingNode(Some(NodeId::new("a"))),
            PendingWrite::SetCompleted(NodeId::new("b"), true),
            PendingWrite::DeleteNode(NodeId::new("a")),
        ]);
        let kinds: Vec<_> = q.iter().map(PendingWrite::kind).collect();
        assert_eq!(kinds, vec!["upsert-node", "delete-node"]);
        assert_eq!(q.len(), 2);
    }

    #[test]
    fn latest_start_designation_wins() {
        let q = queue([
            PendingWrite::SetStartingNode(Some(NodeId::new("a"))),
            PendingWrite::SetCompleted(NodeId::new("b"), true),
            PendingWrite::SetStartingNode(None),
        ]);
        let writes: Vec<_> = q.iter().cloned().collect();
        assert_eq!(
            writes,
            vec![
                PendingWrite::SetCompleted(NodeId::new("b"), true),
                PendingWrite::SetStartingNode(None),
            ]
        );
    }

    fn requiring(id: &str, deps: &[&str]) -> SkillNode {
        let mut n = node(id, 1);
        n.required_deps = deps.iter().map(|d| NodeId::new(*d)).collect();
        n
    }

    fn order(q: &WriteQueue) -> Vec<String> {
        q.iter()
            .map(|w| match w {
                PendingWrite::UpsertNode(n) => format!("upsert {}", n.id),
                PendingWrite::DeleteNode(id) => format!("delete {id}"),
                PendingWrite::SetStartingNode(id) => format!(
                    "start {}",
                    id.as_ref().map_or("none", NodeId::as_str)
                ),
                PendingWrite::SetCompleted(id, done) => format!("completed {id} {done}"),
            })
            .collect()
    }

    #[test]
    fn replacing_upsert_moves_behind_new_dependency() {
        let q = queue([
            PendingWrite::UpsertNode(node("b", 1)),
            PendingWrite::SetStartingNode(Some(NodeId::new("b"))),
            PendingWrite::UpsertNode(node("d", 1)),
            PendingWrite::UpsertNode(requiring("b", &["d"])),
        ]);
        assert_eq!(order(&q), vec!["upsert d", "upsert b", "start b"]);
    }

    #[test]
    fn moved_upsert_takes_its_dependents_along() {
        let q = queue([
            PendingWrite::UpsertNode(node("a", 1)),
            PendingWrite::UpsertNode(requiring("c", &["a"])),
            PendingWrite::UpsertNode(node("x", 1)),
            PendingWrite::UpsertNode(node("b", 1)),
            PendingWrite::UpsertNode(requiring("a", &["b"])),
        ]);
        assert_eq!(order(&q), vec!["upsert x", "upsert b", "upsert a", "upsert c"]);
    }

    #[test]
    fn replacement_without_later_dependency_stays_in_place() {
        let q = queue([
            PendingWrite::UpsertNode(node("d", 1)),
            PendingWrite::UpsertNode(node("b", 1)),
            PendingWrite::UpsertNode(node("c", 1)),
            PendingWrite::UpsertNode(requiring("b", &["d"])),
        ]);
        assert_eq!(order(&q), vec!["upsert d", "upsert b", "upsert c"]);
    }

    #[tokio::test]
    async fn revision_conflicts_are_dropped_and_reported() {
        use crate::storage::in_memory::new_in_memory_storage;

        let mut storage = new_in_memory_storage("skill".into());
        let tree = storage.create_tree("Cooking", "").await.unwrap();
        storage.upsert_node(&tree.id, node("a", 1)).await.unwrap();

        let mut stale = node("a", 1);
        stale.title = "Stale".into();
        let mut q = queue([
            PendingWrite::UpsertNode(stale),
            PendingWrite::UpsertNode(node("b", 1)),
        ]);

        let mut seen = Vec::new();
        let report = q
            .flush(storage.as_mut(), &tree.id, |w| seen.push(w.kind()))
            .await
            .unwrap();
        assert_eq!(report.applied, 1);
        assert_eq!(report.conflicts, vec![NodeId::new("a")]);
        assert_eq!(seen, vec!["upsert-node"]);
        assert!(q.is_empty());
        assert_eq!(storage.load_tree(&tree.id).await.unwrap().nodes.len(), 2);
    }
}
