//! Output formatting for CLI commands.
//!
//! This module provides utilities for formatting command output in both
//! human-readable text format and JSON format for programmatic use.
//!
//! Submodules:
//! - [`color`]: Color and styling helpers (semantic colors, state icons)
//! - `json`: JSON serialization for programmatic output

pub mod color;
mod json;

use crate::domain::{NodeId, NodeState, SkillTree};
use crate::resolver::{EdgeView, Progress, classify_all, edge_views};
use colored::Colorize;
use serde::Serialize;
use std::collections::BTreeMap;
use std::env;
use std::io::{self, Write};

pub use color::{error, info, success, warning};

use color::{bold, colored_state_icon, colorize_id, colorize_state, dimmed, edge_arrow, start_marker};
use json::{print_tree_details_json, print_trees_json, print_value_json};

// ============================================================================
// Output Configuration
// ============================================================================

const DEFAULT_TERMINAL_WIDTH: u16 = 80;
const DEFAULT_MAX_CONTENT_WIDTH: usize = 80;

/// Configuration for output formatting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputConfig {
    /// Maximum content width for text wrapping.
    pub max_width: usize,
    /// Whether to use ASCII-only icons instead of Unicode.
    pub use_ascii: bool,
    /// Whether to use colors in output.
    pub use_colors: bool,
}

impl OutputConfig {
    /// Create a new OutputConfig with explicit values.
    pub fn new(max_width: usize, use_ascii: bool, use_colors: bool) -> Self {
        Self {
            max_width,
            use_ascii,
            use_colors,
        }
    }

    /// Create an OutputConfig by reading from environment variables.
    ///
    /// Reads:
    /// - `SKILLTREE_MAX_WIDTH`: Maximum content width (default: 80)
    /// - `SKILLTREE_ASCII`: Set to "1" or "true" for ASCII-only icons (default: false)
    /// - `NO_COLOR`: Standard env var to disable colors (any value disables colors)
    /// - `SKILLTREE_COLOR`: Set to "0" or "false" to disable colors (default: true)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with a custom variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let max_width = match lookup("SKILLTREE_MAX_WIDTH") {
            Some(s) if !s.is_empty() => match s.parse() {
                Ok(width) => width,
                Err(_) => {
                    tracing::warn!(
                        env_var = "SKILLTREE_MAX_WIDTH",
                        value = %s,
                        default = DEFAULT_MAX_CONTENT_WIDTH,
                        "Invalid value, using default"
                    );
                    DEFAULT_MAX_CONTENT_WIDTH
                }
            },
            _ => DEFAULT_MAX_CONTENT_WIDTH,
        };

        let use_ascii = match lookup("SKILLTREE_ASCII") {
            Some(v) if v == "1" || v.eq_ignore_ascii_case("true") => true,
            Some(v) if v == "0" || v.eq_ignore_ascii_case("false") || v.is_empty() => false,
            Some(v) => {
                tracing::warn!(
                    env_var = "SKILLTREE_ASCII",
                    value = %v,
                    "Invalid value (expected '1', 'true', '0', or 'false'), using default"
                );
                false
            }
            None => false,
        };

        // https://no-color.org/
        let use_colors = lookup("NO_COLOR").is_none()
            && lookup("SKILLTREE_COLOR")
                .map(|v| v != "0" && !v.eq_ignore_ascii_case("false"))
                .unwrap_or(true);

        Self {
            max_width,
            use_ascii,
            use_colors,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            max_width: DEFAULT_MAX_CONTENT_WIDTH,
            use_ascii: false,
            use_colors: true,
        }
    }
}

/// Get the current terminal width, falling back to default if detection fails.
fn get_terminal_width() -> usize {
    terminal_size::terminal_size()
        .map(|(w, _)| w.0 as usize)
        .unwrap_or(DEFAULT_TERMINAL_WIDTH as usize)
}

/// Print a text section with a bold title and wrapped, indented content.
fn print_text_section<W: Write>(
    w: &mut W,
    title: &str,
    content: &str,
    width: usize,
    config: &OutputConfig,
) -> io::Result<()> {
    if content.is_empty() {
        return Ok(());
    }
    writeln!(w)?;
    if config.use_colors {
        writeln!(w, "{}:", title.bold())?;
    } else {
        writeln!(w, "{title}:")?;
    }
    for line in wrap_text(content, width.saturating_sub(2)) {
        writeln!(w, "  {line}")?;
    }
    Ok(())
}

fn wrap_text(text: &str, max_width: usize) -> Vec<String> {
    text.lines()
        .flat_map(|line| {
            if line.trim().is_empty() {
                vec![String::new()]
            } else {
                textwrap::wrap(line, max_width)
                    .into_iter()
                    .map(|s| s.into_owned())
                    .collect()
            }
        })
        .collect()
}

/// Output format mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-readable text format
    Text,
    /// JSON format for programmatic use
    Json,
}

// ============================================================================
// Public Dispatch Functions
// ============================================================================

/// Print a list of trees with their progress
pub fn print_trees(trees: &[SkillTree], mode: OutputMode) -> io::Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    let config = OutputConfig::from_env();

    match mode {
        OutputMode::Text => print_trees_text(&mut handle, trees, &config),
        OutputMode::Json => print_trees_json(&mut handle, trees),
    }
}

/// Print a tree with its classified nodes and edges (for show command)
pub fn print_tree_details(tree: &SkillTree, mode: OutputMode) -> io::Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    let config = OutputConfig::from_env();
    let states = classify_all(tree);
    let edges = edge_views(tree);

    match mode {
        OutputMode::Text => print_tree_details_text(&mut handle, tree, &states, &edges, &config),
        OutputMode::Json => print_tree_details_json(&mut handle, tree, &states, &edges),
    }
}

/// Print a simple message
pub fn print_message(msg: &str) -> io::Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    writeln!(handle, "{msg}")
}

/// Print a JSON-formatted result for any serializable value
pub fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    print_value_json(&mut handle, value)
}

// ============================================================================
// Text Formatting
// ============================================================================

fn progress_text(progress: Progress) -> String {
    format!(
        "{}/{} ({}%)",
        progress.completed,
        progress.total,
        progress.percent()
    )
}

fn print_trees_text<W: Write>(
    w: &mut W,
    trees: &[SkillTree],
    config: &OutputConfig,
) -> io::Result<()> {
    if trees.is_empty() {
        writeln!(w, "No trees found.")?;
        return Ok(());
    }

    writeln!(w, "Found {} tree(s):", trees.len())?;
    writeln!(w)?;

    for tree in trees {
        writeln!(
            w,
            "{}  {}  {}",
            colorize_id(tree.id.as_str(), config),
            dimmed(&progress_text(Progress::of(tree)), config),
            tree.name
        )?;
    }

    Ok(())
}

fn print_tree_details_text<W: Write>(
    w: &mut W,
    tree: &SkillTree,
    states: &BTreeMap<NodeId, NodeState>,
    edges: &[EdgeView],
    config: &OutputConfig,
) -> io::Result<()> {
    let content_width = get_terminal_width().min(config.max_width);

    writeln!(
        w,
        "{}: {}",
        colorize_id(tree.id.as_str(), config),
        bold(&tree.name, config)
    )?;

    let start = tree
        .starting_node_id
        .as_ref()
        .map_or_else(|| "none".to_string(), |id| colorize_id(id.as_str(), config));
    writeln!(
        w,
        "{} {}    {} {}",
        dimmed("Progress:", config),
        progress_text(Progress::of(tree)),
        dimmed("Start:", config),
        start
    )?;
    writeln!(
        w,
        "{} {}    {} {}",
        dimmed("Created:", config),
        tree.created_at.format("%Y-%m-%d %H:%M"),
        dimmed("Updated:", config),
        tree.updated_at.format("%Y-%m-%d %H:%M")
    )?;

    print_text_section(w, "Description", &tree.description, content_width, config)?;

    writeln!(w)?;
    if tree.nodes.is_empty() {
        writeln!(w, "No nodes yet.")?;
        return Ok(());
    }

    writeln!(w, "{} ({}):", bold("Nodes", config), tree.nodes.len())?;
    for node in &tree.nodes {
        let state = states.get(&node.id).copied().unwrap_or(NodeState::Locked);
        let marker = if tree.is_start(&node.id) {
            format!("  {}", start_marker(config))
        } else {
            String::new()
        };
        writeln!(
            w,
            "  {} {}  {}  {}{}",
            colored_state_icon(state, config),
            colorize_id(node.id.as_str(), config),
            node.title,
            dimmed(
                &format!("{} @ {}", colorize_state(state, config), node.position()),
                config
            ),
            marker
        )?;
    }

    if !edges.is_empty() {
        writeln!(w)?;
        writeln!(w, "{} ({}):", bold("Edges", config), edges.len())?;
        for edge in edges {
            writeln!(
                w,
                "  {} {} {} ({})",
                colorize_id(edge.dependency.as_str(), config),
                edge_arrow(edge.kind, config),
                colorize_id(edge.dependent.as_str(), config),
                edge.kind
            )?;
        }
    }

    Ok(())
}
