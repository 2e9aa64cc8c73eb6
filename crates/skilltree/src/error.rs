//! Error types for skilltree operations.
//!
//! Three families matter to callers: not-found ([`Error::TreeNotFound`],
//! [`Error::NodeNotFound`]), [`Error::Validation`] (raised before any state
//! is touched) and [`Error::Persistence`] (the store could not complete a
//! write). None of them are fatal; the action can simply be repeated.

use crate::domain::{NodeId, TreeId};
use crate::id_generation::IdGenerationError;
use std::io;
use thiserror::Error;

/// The error type for skilltree operations.
#[derive(Debug, Error)]
pub enum Error {
    /// IO error occurred.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// No unique ID could be generated.
    #[error(transparent)]
    IdGeneration(#[from] IdGenerationError),

    /// The tree does not exist (or is not visible to the caller).
    #[error("Skill tree not found: {0}")]
    TreeNotFound(TreeId),

    /// The node does not exist in the given tree.
    #[error("Node {node_id} not found in skill tree {tree_id}")]
    NodeNotFound {
        /// Tree that was searched.
        tree_id: TreeId,
        /// Missing node.
        node_id: NodeId,
    },

    /// Input was rejected before any mutation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The store failed to complete an operation.
    #[error(transparent)]
    Persistence(#[from] StorageError),
}

impl Error {
    /// Returns `true` for the not-found family.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::TreeNotFound(_) | Self::NodeNotFound { .. })
    }

    /// Returns `true` when a node write lost to a newer stored revision.
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Persistence(StorageError::RevisionConflict { .. }))
    }
}

/// Reasons an edit is refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Titles and names must contain something besides whitespace.
    #[error("{field} cannot be empty")]
    Empty {
        /// Which field was empty ("Title", "Name").
        field: &'static str,
    },

    /// A text field exceeds its maximum length.
    #[error("{field} cannot exceed {max} characters (got {actual})")]
    TooLong {
        /// Which field was too long.
        field: &'static str,
        /// Maximum allowed characters.
        max: usize,
        /// Characters supplied.
        actual: usize,
    },

    /// A node cannot depend on itself.
    #[error("Node {0} cannot depend on itself")]
    SelfDependency(NodeId),

    /// The dependency target is not a node of this tree.
    #[error("Cannot connect to unknown node {0}")]
    UnknownNode(NodeId),

    /// The required edge would close a cycle of requirements.
    #[error("Requiring {dependency} from {dependent} would create a circular requirement")]
    CircularDependency {
        /// The node that would gain the requirement.
        dependent: NodeId,
        /// The node that would become required.
        dependency: NodeId,
    },

    /// The node's required dependencies are not all completed.
    #[error("Node {0} is locked; complete its required dependencies first")]
    NodeLocked(NodeId),
}

/// Failures reported by a storage backend.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backing data is not in the expected format.
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// A record could not be serialized for writing.
    #[error("Serialization failed: {0}")]
    Serialization(#[source] serde_json::Error),

    /// The backend is unreachable.
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    /// The backend accepted the call but the write did not happen.
    #[error("Write failed: {0}")]
    WriteFailed(String),

    /// A node write was based on a revision the store no longer holds.
    #[error("Node {node_id} changed elsewhere (stored revision {stored}, write carries {incoming})")]
    RevisionConflict {
        /// Node that was written.
        node_id: NodeId,
        /// Revision held by the store; 0 when the node is absent.
        stored: u64,
        /// Revision carried by the rejected write.
        incoming: u64,
    },
}

impl From<skilltree_jsonl::Error> for Error {
    fn from(err: skilltree_jsonl::Error) -> Self {
        match err {
            skilltree_jsonl::Error::Io(io_err) => Self::Io(io_err),
            skilltree_jsonl::Error::Json(json_err) => {
                StorageError::Serialization(json_err).into()
            }
            skilltree_jsonl::Error::Parse {
                line_number,
                source,
            } => StorageError::InvalidFormat(format!("line {line_number}: {source}")).into(),
            skilltree_jsonl::Error::InvalidFormat(msg) => StorageError::InvalidFormat(msg).into(),
        }
    }
}

/// A specialized Result type for skilltree operations.
pub type Result<T> = std::result::Result<T, Error>;
