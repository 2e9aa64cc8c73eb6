//! In-memory storage backend.
//!
//! All trees are held in RAM and **lost when the process exits** unless
//! written out with [`save_to_jsonl`]. [`load_from_jsonl`] builds a store from
//! a previously saved file, reporting problems as [`LoadWarning`]s instead of
//! failing.
//!
//! # Thread Safety
//!
//! The store is an `Arc<Mutex<InMemoryStorageInner>>`. Every operation takes
//! the lock, so clones of the handle share one set of trees.
//!
//! # Conflict handling
//!
//! Node upserts are compare-and-set on [`SkillNode::revision`]: a write must
//! carry the stored revision plus one, counting an absent node as revision 0.
//! Anything else is refused with `StorageError::RevisionConflict`, except a
//! replay of the exact node already stored, which succeeds. A node deleted by
//! one session therefore cannot be recreated by an older one.
//!
//! [`SkillNode::revision`]: crate::domain::SkillNode::revision

mod inner;
mod jsonl;
mod trait_impl;

use crate::storage::TreeStorage;
use inner::InMemoryStorageInner;
use std::sync::Arc;
use tokio::sync::Mutex;

pub use jsonl::{LoadWarning, load_from_jsonl, save_to_jsonl};

/// Shared handle to in-memory trees
pub(crate) type InMemoryStorage = Arc<Mutex<InMemoryStorageInner>>;

/// Create an empty in-memory store; `prefix` is used for tree ids.
#[must_use]
pub fn new_in_memory_storage(prefix: String) -> Box<dyn TreeStorage> {
    Box::new(Arc::new(Mutex::new(InMemoryStorageInner::new(prefix))))
}
