//! Editor mode and transient interaction state.

use crate::domain::{NodeId, Point};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Whether the canvas edits structure or records progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditorMode {
    /// Nodes can be dragged and connected
    #[default]
    Edit,
    /// Clicking a node toggles its completion
    View,
}

impl EditorMode {
    /// The other mode
    #[must_use]
    pub fn toggled(self) -> Self {
        match self {
            Self::Edit => Self::View,
            Self::View => Self::Edit,
        }
    }
}

impl fmt::Display for EditorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Edit => "edit",
            Self::View => "view",
        })
    }
}

/// Pointer interaction in progress.
///
/// At most one interaction is active at a time.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Interaction {
    /// Nothing in progress
    #[default]
    Idle,

    /// A node follows the pointer
    DraggingNode {
        /// The node being moved
        node_id: NodeId,
        /// Pointer position minus node centre at grab time
        offset: Point,
    },

    /// A connection line follows the pointer
    DraggingConnection {
        /// Node the line starts at
        source: NodeId,
        /// Current end of the line
        pointer: Point,
    },

    /// A connection was dropped on a node; waiting for the edge kind
    PendingEdgeKindChoice {
        /// Prospective dependency
        source: NodeId,
        /// Prospective dependent
        target: NodeId,
        /// Where to show the choice
        anchor: Point,
    },
}

impl Interaction {
    /// Short name for logs
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::DraggingNode { .. } => "dragging-node",
            Self::DraggingConnection { .. } => "dragging-connection",
            Self::PendingEdgeKindChoice { .. } => "pending-edge-kind-choice",
        }
    }

    /// Whether nothing is in progress
    #[must_use]
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }
}
