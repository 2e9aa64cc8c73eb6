//! Domain types for skill trees.
//!
//! A [`SkillTree`] owns its [`SkillNode`]s. Each node carries two dependency
//! sets: required dependencies gate availability, recommended ones are purely
//! advisory. Node state ([`NodeState`]) is derived by the
//! [`resolver`](crate::resolver) and never stored.

use crate::error::ValidationError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Maximum length of a tree name or node title.
pub const MAX_TITLE_LENGTH: usize = 200;

/// Maximum length of a description.
pub const MAX_DESCRIPTION_LENGTH: usize = 10_000;

/// Unique identifier for a skill tree
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TreeId(pub String);

impl TreeId {
    /// Create a new tree ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TreeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TreeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Unique identifier for a node within its tree
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub String);

impl NodeId {
    /// Create a new node ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A position on the canvas. Node coordinates refer to the node's centre.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal coordinate
    pub x: f64,
    /// Vertical coordinate
    pub y: f64,
}

impl Point {
    /// Create a point
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Component-wise difference `self - other`.
    #[must_use]
    pub fn offset_from(self, other: Point) -> Point {
        Point::new(self.x - other.x, self.y - other.y)
    }

    /// Clamp both coordinates to be non-negative.
    #[must_use]
    pub fn clamp_non_negative(self) -> Point {
        Point::new(self.x.max(0.0), self.y.max(0.0))
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Derived classification of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeState {
    /// The node has been completed (sticky).
    Completed,

    /// The node can be completed now.
    Available,

    /// Required dependencies are not yet completed.
    Locked,
}

impl fmt::Display for NodeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Completed => "completed",
            Self::Available => "available",
            Self::Locked => "locked",
        })
    }
}

/// Kind of prerequisite edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DependencyKind {
    /// Must be completed before the dependent becomes available
    Required,

    /// Advisory only - never gates availability
    Recommended,
}

impl fmt::Display for DependencyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Required => "required",
            Self::Recommended => "recommended",
        })
    }
}

/// A single skill on the canvas
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillNode {
    /// Unique identifier within the tree
    pub id: NodeId,

    /// Short name shown on the node
    pub title: String,

    /// Longer explanation
    #[serde(default)]
    pub description: String,

    /// Horizontal centre position
    pub x: f64,

    /// Vertical centre position
    pub y: f64,

    /// Nodes that must be completed first
    #[serde(default)]
    pub required_deps: BTreeSet<NodeId>,

    /// Nodes suggested before this one
    #[serde(default)]
    pub recommended_deps: BTreeSet<NodeId>,

    /// Whether the user has completed this skill
    #[serde(default)]
    pub completed: bool,

    /// Number of writes the store has accepted for this node.
    ///
    /// A write carries the revision it was based on plus one.
    #[serde(default)]
    pub revision: u64,
}

impl SkillNode {
    /// Create an incomplete node without dependencies at `position`.
    pub fn new(
        id: NodeId,
        title: impl Into<String>,
        description: impl Into<String>,
        position: Point,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            description: description.into(),
            x: position.x,
            y: position.y,
            required_deps: BTreeSet::new(),
            recommended_deps: BTreeSet::new(),
            completed: false,
            revision: 0,
        }
    }

    /// Current centre position
    #[must_use]
    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Move the node
    pub fn set_position(&mut self, position: Point) {
        self.x = position.x;
        self.y = position.y;
    }

    /// The dependency set for `kind`
    #[must_use]
    pub fn deps(&self, kind: DependencyKind) -> &BTreeSet<NodeId> {
        match kind {
            DependencyKind::Required => &self.required_deps,
            DependencyKind::Recommended => &self.recommended_deps,
        }
    }

    /// Mutable access to the dependency set for `kind`
    pub fn deps_mut(&mut self, kind: DependencyKind) -> &mut BTreeSet<NodeId> {
        match kind {
            DependencyKind::Required => &mut self.required_deps,
            DependencyKind::Recommended => &mut self.recommended_deps,
        }
    }

    /// Whether `other` appears in either dependency set
    #[must_use]
    pub fn depends_on(&self, other: &NodeId) -> bool {
        self.required_deps.contains(other) || self.recommended_deps.contains(other)
    }

    /// Remove `other` from both dependency sets. Returns `true` if anything changed.
    pub fn forget_dependency(&mut self, other: &NodeId) -> bool {
        let required = self.required_deps.remove(other);
        let recommended = self.recommended_deps.remove(other);
        required || recommended
    }

    /// Validate node data.
    ///
    /// # Errors
    ///
    /// Returns the first violated rule: empty or overlong title, overlong
    /// description, or a dependency on itself.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_title("Title", &self.title)?;
        validate_description(&self.description)?;
        if self.depends_on(&self.id) {
            return Err(ValidationError::SelfDependency(self.id.clone()));
        }
        Ok(())
    }
}

/// A skill tree: metadata plus exclusively owned nodes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillTree {
    /// Unique identifier
    pub id: TreeId,

    /// Display name
    pub name: String,

    /// Free-form description
    #[serde(default)]
    pub description: String,

    /// Entry point of the tree; always available
    #[serde(default)]
    pub starting_node_id: Option<NodeId>,

    /// Nodes in creation order
    #[serde(default)]
    pub nodes: Vec<SkillNode>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last modification timestamp
    pub updated_at: DateTime<Utc>,
}

impl SkillTree {
    /// Create an empty tree
    pub fn new(id: TreeId, name: impl Into<String>, description: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id,
            name: name.into(),
            description: description.into(),
            starting_node_id: None,
            nodes: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Look up a node by id
    #[must_use]
    pub fn node(&self, id: &NodeId) -> Option<&SkillNode> {
        self.nodes.iter().find(|n| &n.id == id)
    }

    /// Mutable lookup by id
    pub fn node_mut(&mut self, id: &NodeId) -> Option<&mut SkillNode> {
        self.nodes.iter_mut().find(|n| &n.id == id)
    }

    /// Whether the tree has a node with this id
    #[must_use]
    pub fn contains(&self, id: &NodeId) -> bool {
        self.node(id).is_some()
    }

    /// Whether `id` is the designated starting node
    #[must_use]
    pub fn is_start(&self, id: &NodeId) -> bool {
        self.starting_node_id.as_ref() == Some(id)
    }

    /// Validate tree metadata and every node.
    ///
    /// # Errors
    ///
    /// Returns the first violated rule.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_title("Name", &self.name)?;
        validate_description(&self.description)?;
        for node in &self.nodes {
            node.validate()?;
        }
        Ok(())
    }
}

/// Data for creating a node
#[derive(Debug, Clone, Default)]
pub struct NewNode {
    /// Node title (required)
    pub title: String,

    /// Node description
    pub description: String,

    /// Where to place the node; `None` uses the configured default
    pub position: Option<Point>,
}

/// Data for updating a node's text
#[derive(Debug, Clone, Default)]
pub struct NodeUpdate {
    /// New title (if updating)
    pub title: Option<String>,

    /// New description (if updating)
    pub description: Option<String>,
}

/// Data for updating a tree's metadata
#[derive(Debug, Clone, Default)]
pub struct TreeUpdate {
    /// New name (if updating)
    pub name: Option<String>,

    /// New description (if updating)
    pub description: Option<String>,
}

/// Check a title-like field: non-blank and at most [`MAX_TITLE_LENGTH`] characters.
///
/// # Errors
///
/// Returns [`ValidationError::Empty`] or [`ValidationError::TooLong`].
pub fn validate_title(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Empty { field });
    }
    let len = value.chars().count();
    if len > MAX_TITLE_LENGTH {
        return Err(ValidationError::TooLong {
            field,
            max: MAX_TITLE_LENGTH,
            actual: len,
        });
    }
    Ok(())
}

/// Check a description: at most [`MAX_DESCRIPTION_LENGTH`] characters.
///
/// # Errors
///
/// Returns [`ValidationError::TooLong`].
pub fn validate_description(value: &str) -> Result<(), ValidationError> {
    let len = value.chars().count();
    if len > MAX_DESCRIPTION_LENGTH {
        return Err(ValidationError::TooLong {
            field: "Description",
            max: MAX_DESCRIPTION_LENGTH,
            actual: len,
        });
    }
    Ok(())
}
