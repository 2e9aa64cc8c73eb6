//! Data held behind the in-memory store's lock.

use crate::domain::{NodeId, SkillNode, SkillTree, TreeId};
use crate::error::{Error, Result};
use crate::id_generation::IdGenerator;
use std::collections::HashMap;

pub(crate) struct InMemoryStorageInner {
    pub(super) trees: HashMap<TreeId, SkillTree>,

    pub(super) id_generator: IdGenerator,
}

impl InMemoryStorageInner {
    pub(crate) fn new(prefix: String) -> Self {
        Self {
            trees: HashMap::new(),
            id_generator: IdGenerator::new(prefix),
        }
    }

    /// Insert a tree loaded from disk, reserving its id.
    pub(super) fn insert_loaded(&mut self, tree: SkillTree) {
        self.id_generator.register_id(tree.id.as_str());
        self.trees.insert(tree.id.clone(), tree);
    }

    pub(super) fn generate_id(&mut self, name: &str, description: &str) -> Result<TreeId> {
        let id = self.id_generator.generate(name, description)?;
        Ok(TreeId::new(id))
    }

    pub(super) fn tree(&self, id: &TreeId) -> Result<&SkillTree> {
        self.trees
            .get(id)
            .ok_or_else(|| Error::TreeNotFound(id.clone()))
    }

    pub(super) fn tree_mut(&mut self, id: &TreeId) -> Result<&mut SkillTree> {
        self.trees
            .get_mut(id)
            .ok_or_else(|| Error::TreeNotFound(id.clone()))
    }

    pub(super) fn node_mut<'a>(
        tree: &'a mut SkillTree,
        node_id: &NodeId,
    ) -> Result<&'a mut SkillNode> {
        let tree_id = tree.id.clone();
        tree.node_mut(node_id).ok_or_else(|| Error::NodeNotFound {
            tree_id,
            node_id: node_id.clone(),
        })
    }
}
