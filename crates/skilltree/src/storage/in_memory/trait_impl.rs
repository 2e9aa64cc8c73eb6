//! TreeStorage trait implementation for in-memory storage.

use super::InMemoryStorage;
use super::inner::InMemoryStorageInner;
use crate::domain::{
    NodeId, SkillNode, SkillTree, TreeId, TreeUpdate, validate_description, validate_title,
};
use crate::error::{Error, Result, StorageError};
use crate::storage::TreeStorage;
use async_trait::async_trait;
use chrono::Utc;
use tracing::debug;

#[async_trait]
impl TreeStorage for InMemoryStorage {
    async fn list_trees(&self) -> Result<Vec<SkillTree>> {
        let inner = self.lock().await;
        let mut trees: Vec<SkillTree> = inner.trees.values().cloned().collect();
        trees.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(trees)
    }

    async fn create_tree(&mut self, name: &str, description: &str) -> Result<SkillTree> {
        validate_title("Name", name)?;
        validate_description(description)?;

        let mut inner = self.lock().await;
        let id = inner.generate_id(name, description)?;
        let tree = SkillTree::new(id.clone(), name, description);
        inner.trees.insert(id, tree.clone());
        Ok(tree)
    }

    async fn update_tree(&mut self, id: &TreeId, update: TreeUpdate) -> Result<SkillTree> {
        if let Some(name) = &update.name {
            validate_title("Name", name)?;
        }
        if let Some(description) = &update.description {
            validate_description(description)?;
        }

        let mut inner = self.lock().await;
        let tree = inner.tree_mut(id)?;
        if let Some(name) = update.name {
            tree.name = name;
        }
        if let Some(description) = update.description {
            tree.description = description;
        }
        tree.updated_at = Utc::now();
        Ok(tree.clone())
    }

    async fn delete_tree(&mut self, id: &TreeId) -> Result<()> {
        let mut inner = self.lock().await;
        inner
            .trees
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| Error::TreeNotFound(id.clone()))
    }

    async fn load_tree(&self, id: &TreeId) -> Result<SkillTree> {
        let inner = self.lock().await;
        inner.tree(id).cloned()
    }

    async fn upsert_node(&mut self, tree_id: &TreeId, node: SkillNode) -> Result<()> {
        node.validate()?;

        let mut inner = self.lock().await;
        let tree = inner.tree_mut(tree_id)?;
        let stored = tree.node(&node.id).map_or(0, |n| n.revision);
        if node.revision != stored + 1 {
            if tree.node(&node.id) == Some(&node) {
                debug!(tree_id = %tree_id, node_id = %node.id, "Node write already applied");
                return Ok(());
            }
            debug!(
                tree_id = %tree_id,
                node_id = %node.id,
                stored,
                incoming = node.revision,
                "Rejecting stale node write"
            );
            return Err(StorageError::RevisionConflict {
                node_id: node.id,
                stored,
                incoming: node.revision,
            }
            .into());
        }
        match tree.node_mut(&node.id) {
            Some(existing) => *existing = node,
            None => tree.nodes.push(node),
        }
        tree.updated_at = Utc::now();
        Ok(())
    }

    async fn delete_node(&mut self, tree_id: &TreeId, node_id: &NodeId) -> Result<()> {
        let mut inner = self.lock().await;
        let tree = inner.tree_mut(tree_id)?;

        let before = tree.nodes.len();
        tree.nodes.retain(|n| &n.id != node_id);
        if tree.nodes.len() == before {
            debug!(tree_id = %tree_id, node_id = %node_id, "Node already absent");
            return Ok(());
        }
        if tree.is_start(node_id) {
            tree.starting_node_id = None;
        }
        tree.updated_at = Utc::now();
        Ok(())
    }

    async fn set_starting_node(
        &mut self,
        tree_id: &TreeId,
        node_id: Option<&NodeId>,
    ) -> Result<()> {
        let mut inner = self.lock().await;
        let tree = inner.tree_mut(tree_id)?;
        if let Some(id) = node_id
            && !tree.contains(id)
        {
            return Err(Error::NodeNotFound {
                tree_id: tree_id.clone(),
                node_id: id.clone(),
            });
        }
        tree.starting_node_id = node_id.cloned();
        tree.updated_at = Utc::now();
        Ok(())
    }

    async fn set_node_completed(
        &mut self,
        tree_id: &TreeId,
        node_id: &NodeId,
        completed: bool,
    ) -> Result<()> {
        let mut inner = self.lock().await;
        let tree = inner.tree_mut(tree_id)?;
        let node = InMemoryStorageInner::node_mut(tree, node_id)?;
        node.completed = completed;
        node.revision += 1;
        tree.updated_at = Utc::now();
        Ok(())
    }

    async fn save(&self) -> Result<()> {
        // Nothing backs a bare in-memory store.
        Ok(())
    }

    async fn reload(&mut self) -> Result<()> {
        Ok(())
    }
}
