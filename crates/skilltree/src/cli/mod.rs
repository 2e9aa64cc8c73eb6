//! CLI argument parsing and command dispatch.
//!
//! This module provides the command-line interface for skilltree using clap's
//! derive API. Editing commands drive a [`GraphController`] the same way a
//! canvas would: `node move` is a drag, `link` is a connection drag followed
//! by a kind choice, `toggle` is a click in progress mode.
//!
//! # Global Flags
//!
//! - `--json`: Output in JSON format (applies to all commands)
//!
//! # Example
//!
//! ```bash
//! skilltree create --name "Cooking"
//! skilltree node add skill-a3f8 --title "Knife skills"
//! skilltree link skill-a3f8 node-k1f3 node-s0up
//! skilltree toggle skill-a3f8 node-k1f3
//! ```
//!
//! [`GraphController`]: crate::controller::GraphController

mod args;
mod execute;
mod validators;

use anyhow::Result;
use clap::{Parser, Subcommand};

pub use args::{
    CreateArgs, InfoArgs, InitArgs, LinkArgs, ListArgs, NodeAction, NodeArgs, RenameArgs,
    ToggleArgs, TreeArgs,
};

pub use validators::{parse_point, validate_description, validate_id, validate_prefix, validate_title};

/// Skilltree - build and track skill trees
///
/// Trees are stored in `.skilltree/trees.jsonl`, one tree per line.
#[derive(Parser, Debug)]
#[command(name = "skilltree")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output in JSON format for programmatic use
    #[arg(long, global = true)]
    pub json: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Initialize a new skilltree workspace
    ///
    /// Creates the `.skilltree/` directory with configuration and an empty
    /// tree database.
    Init(InitArgs),

    /// Show workspace information
    Info(InfoArgs),

    /// List trees with their progress
    List(ListArgs),

    /// Create a new, empty tree
    Create(CreateArgs),

    /// Delete a tree and all of its nodes
    Delete(TreeArgs),

    /// Show a tree's nodes, their state and the edges between them
    Show(TreeArgs),

    /// Change a tree's name or description
    Rename(RenameArgs),

    /// Add, edit, remove, move or promote nodes
    Node(NodeArgs),

    /// Toggle a node's completion
    ///
    /// Only available nodes can be completed; completed nodes can always be
    /// reset.
    Toggle(ToggleArgs),

    /// Make FROM a prerequisite of TO
    Link(LinkArgs),

    /// Remove the edge between FROM and TO
    Unlink(LinkArgs),

    /// Arrange all nodes on a grid
    Layout(TreeArgs),
}

impl Cli {
    /// Parse CLI arguments from command line
    pub fn parse_args() -> Self {
        <Self as Parser>::parse()
    }

    /// Parse CLI arguments from an iterator (for testing)
    pub fn try_parse_from<I, T>(iter: I) -> std::result::Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        <Self as Parser>::try_parse_from(iter)
    }

    /// Execute the CLI command
    pub async fn execute(&self) -> Result<()> {
        use crate::app::App;
        use crate::output::OutputMode;

        let output_mode = if self.json {
            OutputMode::Json
        } else {
            OutputMode::Text
        };

        match &self.command {
            Some(Commands::Init(args)) => execute::execute_init(args).await,
            Some(Commands::Info(args)) => {
                let app = App::from_directory(&std::env::current_dir()?).await?;
                execute::execute_info(&app, args, output_mode).await
            }
            Some(Commands::List(args)) => {
                let app = App::from_directory(&std::env::current_dir()?).await?;
                execute::execute_list(&app, args, output_mode).await
            }
            Some(Commands::Create(args)) => {
                let mut app = App::from_directory(&std::env::current_dir()?).await?;
                execute::execute_create(&mut app, args, output_mode).await
            }
            Some(Commands::Delete(args)) => {
                let mut app = App::from_directory(&std::env::current_dir()?).await?;
                execute::execute_delete(&mut app, args, output_mode).await
            }
            Some(Commands::Show(args)) => {
                let app = App::from_directory(&std::env::current_dir()?).await?;
                execute::execute_show(&app, args, output_mode).await
            }
            Some(Commands::Rename(args)) => {
                let mut app = App::from_directory(&std::env::current_dir()?).await?;
                execute::execute_rename(&mut app, args, output_mode).await
            }
            Some(Commands::Node(args)) => {
                let mut app = App::from_directory(&std::env::current_dir()?).await?;
                execute::execute_node(&mut app, args, output_mode).await
            }
            Some(Commands::Toggle(args)) => {
                let mut app = App::from_directory(&std::env::current_dir()?).await?;
                execute::execute_toggle(&mut app, args, output_mode).await
            }
            Some(Commands::Link(args)) => {
                let mut app = App::from_directory(&std::env::current_dir()?).await?;
                execute::execute_link(&mut app, args, output_mode).await
            }
            Some(Commands::Unlink(args)) => {
                let mut app = App::from_directory(&std::env::current_dir()?).await?;
                execute::execute_unlink(&mut app, args, output_mode).await
            }
            Some(Commands::Layout(args)) => {
                let mut app = App::from_directory(&std::env::current_dir()?).await?;
                execute::execute_layout(&mut app, args, output_mode).await
            }
            None => {
                println!("Skilltree skill tree editor");
                println!("Use --help for more information");
                Ok(())
            }
        }
    }
}
