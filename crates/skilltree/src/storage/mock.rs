//! Recording storage for tests.

use super::TreeStorage;
use super::in_memory::new_in_memory_storage;
use crate::domain::{NodeId, SkillNode, SkillTree, TreeId, TreeUpdate};
use crate::error::{Result, StorageError};
use async_trait::async_trait;
use std::sync::Mutex;

/// One call received by [`MockStorage`].
#[derive(Debug, Clone, PartialEq)]
pub enum MockCall {
    /// `list_trees`
    ListTrees,
    /// `create_tree(name)`
    CreateTree(String),
    /// `update_tree(id)`
    UpdateTree(TreeId),
    /// `delete_tree(id)`
    DeleteTree(TreeId),
    /// `load_tree(id)`
    LoadTree(TreeId),
    /// `upsert_node(tree, node)`; the node id and revision
    UpsertNode(NodeId, u64),
    /// `delete_node(tree, node)`
    DeleteNode(NodeId),
    /// `set_starting_node(tree, node)`
    SetStartingNode(Option<NodeId>),
    /// `set_node_completed(tree, node, completed)`
    SetNodeCompleted(NodeId, bool),
    /// `save`
    Save,
    /// `reload`
    Reload,
}

/// In-memory storage that records every call and can refuse writes.
///
/// Reads and writes go to a real in-memory store, so a `MockStorage` behaves
/// like one until [`fail_writes`](Self::fail_writes) is switched on. Failed
/// writes are still recorded.
pub struct MockStorage {
    inner: Box<dyn TreeStorage>,
    calls: Mutex<Vec<MockCall>>,
    fail_writes: bool,
}

impl MockStorage {
    /// Create an empty mock
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: new_in_memory_storage("mock".to_string()),
            calls: Mutex::new(Vec::new()),
            fail_writes: false,
        }
    }

    /// Make every subsequent write fail with [`StorageError::WriteFailed`].
    pub fn fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }

    /// Calls received so far, oldest first
    #[must_use]
    pub fn calls(&self) -> Vec<MockCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Forget recorded calls
    pub fn clear_calls(&mut self) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.clear();
        }
    }

    fn record(&self, call: MockCall) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }

    fn record_write(&self, call: MockCall) -> Result<()> {
        self.record(call);
        if self.fail_writes {
            return Err(StorageError::WriteFailed("mock storage is failing writes".into()).into());
        }
        Ok(())
    }
}

impl Default for MockStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TreeStorage for MockStorage {
    async fn list_trees(&self) -> Result<Vec<SkillTree>> {
        self.record(MockCall::ListTrees);
        self.inner.list_trees().await
    }

    async fn create_tree(&mut self, name: &str, description: &str) -> Result<SkillTree> {
        self.record_write(MockCall::CreateTree(name.to_string()))?;
        self.inner.create_tree(name, description).await
    }

    async fn update_tree(&mut self, id: &TreeId, update: TreeUpdate) -> Result<SkillTree> {
        self.record_write(MockCall::UpdateTree(id.clone()))?;
        self.inner.update_tree(id, update).await
    }

    async fn delete_tree(&mut self, id: &TreeId) -> Result<()> {
        self.record_write(MockCall::DeleteTree(id.clone()))?;
        self.inner.delete_tree(id).await
    }

    async fn load_tree(&self, id: &TreeId) -> Result<SkillTree> {
        self.record(MockCall::LoadTree(id.clone()));
        self.inner.load_tree(id).await
    }

    async fn upsert_node(&mut self, tree_id: &TreeId, node: SkillNode) -> Result<()> {
        self.record_write(MockCall::UpsertNode(node.id.clone(), node.revision))?;
        self.inner.upsert_node(tree_id, node).await
    }

    async fn delete_node(&mut self, tree_id: &TreeId, node_id: &NodeId) -> Result<()> {
        self.record_write(MockCall::DeleteNode(node_id.clone()))?;
        self.inner.delete_node(tree_id, node_id).await
    }

    async fn set_starting_node(
        &mut self,
        tree_id: &TreeId,
        node_id: Option<&NodeId>,
    ) -> Result<()> {
        self.record_write(MockCall::SetStartingNode(node_id.cloned()))?;
        self.inner.set_starting_node(tree_id, node_id).await
    }

    async fn set_node_completed(
        &mut self,
        tree_id: &TreeId,
        node_id: &NodeId,
        completed: bool,
    ) -> Result<()> {
        self.record_write(MockCall::SetNodeCompleted(node_id.clone(), completed))?;
        self.inner
            .set_node_completed(tree_id, node_id, completed)
            .await
    }

    async fn save(&self) -> Result<()> {
        self.record(MockCall::Save);
        Ok(())
    }

    async fn reload(&mut self) -> Result<()> {
        self.record(MockCall::Reload);
        Ok(())
    }
}
