//! CLI argument structs for all commands.

use clap::{Parser, Subcommand};

use super::validators::{
    parse_point, validate_description, validate_id, validate_prefix, validate_title,
};
use crate::domain::{DependencyKind, Point};

/// Arguments for the `init` command
#[derive(Parser, Debug, Clone)]
pub struct InitArgs {
    /// Tree ID prefix (e.g., "skill" for "skill-a3f8")
    ///
    /// Must be 2-20 alphanumeric characters.
    #[arg(short, long, value_parser = validate_prefix)]
    pub prefix: Option<String>,

    /// Suppress output messages
    #[arg(short, long)]
    pub quiet: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug, Clone, Default)]
pub struct InfoArgs {}

/// Arguments for the `list` command
#[derive(Parser, Debug, Clone, Default)]
pub struct ListArgs {}

/// Arguments for the `create` command
#[derive(Parser, Debug, Clone)]
pub struct CreateArgs {
    /// Tree name
    #[arg(short, long, value_parser = validate_title)]
    pub name: String,

    /// Tree description
    #[arg(short = 'D', long, value_parser = validate_description, default_value = "")]
    pub description: String,
}

/// Arguments taking only a tree
#[derive(Parser, Debug, Clone)]
pub struct TreeArgs {
    /// Tree ID
    #[arg(value_parser = validate_id)]
    pub tree: String,
}

/// Arguments for the `rename` command
#[derive(Parser, Debug, Clone)]
pub struct RenameArgs {
    /// Tree ID
    #[arg(value_parser = validate_id)]
    pub tree: String,

    /// New name
    #[arg(short, long, value_parser = validate_title)]
    pub name: Option<String>,

    /// New description
    #[arg(short = 'D', long, value_parser = validate_description)]
    pub description: Option<String>,
}

/// Arguments for the `node` command
#[derive(Parser, Debug, Clone)]
pub struct NodeArgs {
    /// Node action to perform
    #[command(subcommand)]
    pub action: NodeAction,
}

/// Node actions
#[derive(Subcommand, Debug, Clone)]
pub enum NodeAction {
    /// Add a node; the first node becomes the starting node
    Add {
        /// Tree ID
        #[arg(value_parser = validate_id)]
        tree: String,

        /// Node title
        #[arg(short, long, value_parser = validate_title)]
        title: String,

        /// Node description
        #[arg(short = 'D', long, value_parser = validate_description, default_value = "")]
        description: String,

        /// Canvas position as X,Y (defaults to the configured canvas position)
        #[arg(long, value_parser = parse_point, allow_hyphen_values = true)]
        at: Option<Point>,
    },

    /// Edit a node's title or description
    Edit {
        /// Tree ID
        #[arg(value_parser = validate_id)]
        tree: String,

        /// Node ID
        #[arg(value_parser = validate_id)]
        node: String,

        /// New title
        #[arg(short, long, value_parser = validate_title)]
        title: Option<String>,

        /// New description
        #[arg(short = 'D', long, value_parser = validate_description)]
        description: Option<String>,
    },

    /// Delete a node and remove it from every dependency list
    Rm {
        /// Tree ID
        #[arg(value_parser = validate_id)]
        tree: String,

        /// Node ID
        #[arg(value_parser = validate_id)]
        node: String,
    },

    /// Move a node on the canvas
    Move {
        /// Tree ID
        #[arg(value_parser = validate_id)]
        tree: String,

        /// Node ID
        #[arg(value_parser = validate_id)]
        node: String,

        /// Target position as X,Y; negative coordinates clamp to 0
        #[arg(long, value_parser = parse_point, allow_hyphen_values = true)]
        to: Point,
    },

    /// Make a node the starting node
    Start {
        /// Tree ID
        #[arg(value_parser = validate_id)]
        tree: String,

        /// Node ID
        #[arg(value_parser = validate_id)]
        node: String,
    },
}

/// Arguments for the `toggle` command
#[derive(Parser, Debug, Clone)]
pub struct ToggleArgs {
    /// Tree ID
    #[arg(value_parser = validate_id)]
    pub tree: String,

    /// Node ID
    #[arg(value_parser = validate_id)]
    pub node: String,
}

/// Arguments for the `link` and `unlink` commands
#[derive(Parser, Debug, Clone)]
pub struct LinkArgs {
    /// Tree ID
    #[arg(value_parser = validate_id)]
    pub tree: String,

    /// The prerequisite node
    #[arg(value_parser = validate_id)]
    pub from: String,

    /// The node that depends on it
    #[arg(value_parser = validate_id)]
    pub to: String,

    /// Recommended instead of required
    #[arg(short, long)]
    pub recommended: bool,
}

impl LinkArgs {
    /// Edge kind selected by the flags
    #[must_use]
    pub fn kind(&self) -> DependencyKind {
        if self.recommended {
            DependencyKind::Recommended
        } else {
            DependencyKind::Required
        }
    }
}
