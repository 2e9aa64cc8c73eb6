//! Storage abstraction layer.
//!
//! [`TreeStorage`] is the persistence collaborator of the
//! [`GraphController`](crate::controller::GraphController). It is an
//! object-safe async trait, so callers hold a `Box<dyn TreeStorage>` and pick
//! the backend at runtime:
//!
//! - **In-memory**: trees held in a `HashMap` behind `Arc<Mutex<_>>`
//! - **JSONL**: the in-memory store, loaded from and saved to a JSON Lines
//!   file with one tree per line
//!
//! Stores do not maintain dependency integrity between nodes. That is the
//! controller's job; a store only keeps `starting_node_id` pointing at an
//! existing node.
//!
//! # Test Utilities
//!
//! [`MockStorage`] records every call and can be switched to fail writes.
//! Enable the `test-util` feature to use it from another crate.
//!
//! # Example
//!
//! ```no_run
//! use skilltree::storage::{StorageBackend, create_storage};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> anyhow::Result<()> {
//!     let mut storage = create_storage(StorageBackend::InMemory, "skill".to_string()).await?;
//!     let tree = storage.create_tree("Cooking", "From knife skills to sauces").await?;
//!     println!("Created tree: {}", tree.id);
//!     Ok(())
//! }
//! ```

use crate::domain::{NodeId, SkillNode, SkillTree, TreeId, TreeUpdate};
use crate::error::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

pub mod in_memory;

#[cfg(any(test, feature = "test-util"))]
mod mock;

#[cfg(any(test, feature = "test-util"))]
pub use mock::{MockCall, MockStorage};

/// Persistence contract for skill trees.
///
/// Mutating methods take `&mut self`; the in-memory implementation still
/// locks internally so clones of the handle observe the same data.
///
/// # Errors
///
/// - `Error::TreeNotFound` when the tree id is unknown
/// - `Error::NodeNotFound` when a node id is required but missing
/// - `Error::Validation` when names or titles break the length rules
/// - `Error::Persistence` for backend failures
#[async_trait]
pub trait TreeStorage: Send + Sync {
    // ========== Trees ==========

    /// All trees, ordered by creation time then id.
    async fn list_trees(&self) -> Result<Vec<SkillTree>>;

    /// Create an empty tree with a fresh id and timestamps.
    async fn create_tree(&mut self, name: &str, description: &str) -> Result<SkillTree>;

    /// Change a tree's name or description.
    async fn update_tree(&mut self, id: &TreeId, update: TreeUpdate) -> Result<SkillTree>;

    /// Delete a tree together with its nodes.
    async fn delete_tree(&mut self, id: &TreeId) -> Result<()>;

    /// Fetch a tree with all of its nodes.
    async fn load_tree(&self, id: &TreeId) -> Result<SkillTree>;

    // ========== Nodes ==========

    /// Create or replace a node by id.
    ///
    /// The write must carry the stored revision plus one (1 for a node the
    /// tree does not hold). Other revisions fail with
    /// `StorageError::RevisionConflict`; replaying the stored node succeeds.
    async fn upsert_node(&mut self, tree_id: &TreeId, node: SkillNode) -> Result<()>;

    /// Remove a node. Deleting a node that does not exist succeeds.
    ///
    /// Other nodes' dependency sets are left untouched; the starting node is
    /// cleared if it was this node.
    async fn delete_node(&mut self, tree_id: &TreeId, node_id: &NodeId) -> Result<()>;

    /// Designate (or clear) the starting node.
    async fn set_starting_node(&mut self, tree_id: &TreeId, node_id: Option<&NodeId>)
    -> Result<()>;

    /// Set a node's completion flag, bumping its revision.
    async fn set_node_completed(
        &mut self,
        tree_id: &TreeId,
        node_id: &NodeId,
        completed: bool,
    ) -> Result<()>;

    // ========== Persistence ==========

    /// Persist to the backing store. A no-op for pure in-memory storage.
    async fn save(&self) -> Result<()>;

    /// Discard unsaved state and reload from the backing store.
    async fn reload(&mut self) -> Result<()>;
}

/// Storage backend selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageBackend {
    /// Ephemeral in-memory storage
    InMemory,

    /// In-memory storage persisted to a JSONL file
    Jsonl(PathBuf),
}

impl StorageBackend {
    /// Path of the backing file, if any
    #[must_use]
    pub fn data_path(&self) -> Option<&Path> {
        match self {
            StorageBackend::Jsonl(path) => Some(path),
            StorageBackend::InMemory => None,
        }
    }
}

/// In-memory storage whose `save` and `reload` go to a JSONL file.
struct JsonlBackedStorage {
    inner: Box<dyn TreeStorage>,
    path: PathBuf,
    prefix: String,
}

#[async_trait]
impl TreeStorage for JsonlBackedStorage {
    async fn list_trees(&self) -> Result<Vec<SkillTree>> {
        self.inner.list_trees().await
    }

    async fn create_tree(&mut self, name: &str, description: &str) -> Result<SkillTree> {
        self.inner.create_tree(name, description).await
    }

    async fn update_tree(&mut self, id: &TreeId, update: TreeUpdate) -> Result<SkillTree> {
        self.inner.update_tree(id, update).await
    }

    async fn delete_tree(&mut self, id: &TreeId) -> Result<()> {
        self.inner.delete_tree(id).await
    }

    async fn load_tree(&self, id: &TreeId) -> Result<SkillTree> {
        self.inner.load_tree(id).await
    }

    async fn upsert_node(&mut self, tree_id: &TreeId, node: SkillNode) -> Result<()> {
        self.inner.upsert_node(tree_id, node).await
    }

    async fn delete_node(&mut self, tree_id: &TreeId, node_id: &NodeId) -> Result<()> {
        self.inner.delete_node(tree_id, node_id).await
    }

    async fn set_starting_node(
        &mut self,
        tree_id: &TreeId,
        node_id: Option<&NodeId>,
    ) -> Result<()> {
        self.inner.set_starting_node(tree_id, node_id).await
    }

    async fn set_node_completed(
        &mut self,
        tree_id: &TreeId,
        node_id: &NodeId,
        completed: bool,
    ) -> Result<()> {
        self.inner
            .set_node_completed(tree_id, node_id, completed)
            .await
    }

    async fn save(&self) -> Result<()> {
        in_memory::save_to_jsonl(self.inner.as_ref(), &self.path).await
    }

    async fn reload(&mut self) -> Result<()> {
        self.inner = load_or_empty(&self.path, &self.prefix).await?;
        Ok(())
    }
}

async fn load_or_empty(path: &Path, prefix: &str) -> Result<Box<dyn TreeStorage>> {
    if !path.exists() {
        // First run: nothing saved yet.
        return Ok(in_memory::new_in_memory_storage(prefix.to_string()));
    }

    let (storage, warnings) = in_memory::load_from_jsonl(path, prefix.to_string()).await?;
    for warning in &warnings {
        tracing::warn!(%warning, "JSONL load warning");
    }
    Ok(storage)
}

/// Create a storage backend. `prefix` is used for generated tree ids.
///
/// # Errors
///
/// Returns an error if the JSONL file exists but cannot be read.
pub async fn create_storage(backend: StorageBackend, prefix: String) -> Result<Box<dyn TreeStorage>> {
    match backend {
        StorageBackend::InMemory => Ok(in_memory::new_in_memory_storage(prefix)),
        StorageBackend::Jsonl(path) => {
            let inner = load_or_empty(&path, &prefix).await?;
            Ok(Box::new(JsonlBackedStorage {
                inner,
                path,
                prefix,
            }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Point;

    #[test]
    fn data_path_only_for_jsonl() {
        assert_eq!(StorageBackend::InMemory.data_path(), None);
        let backend = StorageBackend::Jsonl(PathBuf::from("trees.jsonl"));
        assert_eq!(backend.data_path(), Some(Path::new("trees.jsonl")));
    }

    #[tokio::test]
    async fn jsonl_backend_saves_and_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trees.jsonl");

        let mut storage = create_storage(StorageBackend::Jsonl(path.clone()), "skill".into())
            .await
            .unwrap();
        let tree = storage.create_tree("Cooking", "").await.unwrap();
        let mut node = SkillNode::new(NodeId::new("node-a"), "Knife skills", "", Point::new(1.0, 2.0));
        node.revision = 1;
        storage.upsert_node(&tree.id, node).await.unwrap();
        storage.save().await.unwrap();

        // Unsaved change is discarded by reload.
        storage.delete_tree(&tree.id).await.unwrap();
        storage.reload().await.unwrap();

        let loaded = storage.load_tree(&tree.id).await.unwrap();
        assert_eq!(loaded.nodes.len(), 1);
        assert_eq!(loaded.nodes[0].title, "Knife skills");
    }

    #[tokio::test]
    async fn missing_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let storage = create_storage(
            StorageBackend::Jsonl(dir.path().join("absent.jsonl")),
            "skill".into(),
        )
        .await
        .unwrap();
        assert!(storage.list_trees().await.unwrap().is_empty());
    }
}
