//! Color and styling helpers for CLI output.
//!
//! Semantic Color Theme:
//!   - Success/Completed: green   (completed nodes, finished actions)
//!   - Available:         yellow  (nodes ready to be completed)
//!   - Error/Locked:      red     (locked nodes, failures)
//!   - Info/Reference:    cyan    (tree and node IDs)
//!   - Accent:            magenta (starting node marker)
//!   - Muted:             dimmed  (field labels, recommended edges)
//!   - Emphasis:          bold    (section headers)

use crate::domain::{DependencyKind, NodeState};
use colored::Colorize;

use super::OutputConfig;

/// Apply semantic "success" color (green) to text.
pub fn success(text: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return text.to_string();
    }
    text.green().to_string()
}

/// Apply semantic "error" color (red) to text.
pub fn error(text: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return text.to_string();
    }
    text.red().to_string()
}

/// Apply semantic "warning" color (yellow) to text.
pub fn warning(text: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return text.to_string();
    }
    text.yellow().to_string()
}

/// Apply semantic "info" color (cyan) to text.
pub fn info(text: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return text.to_string();
    }
    text.cyan().to_string()
}

/// Apply color to a node state name.
pub(crate) fn colorize_state(state: NodeState, config: &OutputConfig) -> String {
    let text = state.to_string();
    if !config.use_colors {
        return text;
    }
    match state {
        NodeState::Completed => text.green().to_string(),
        NodeState::Available => text.yellow().to_string(),
        NodeState::Locked => text.red().to_string(),
    }
}

/// Uncolored state icon, with ASCII fallback.
pub(crate) fn state_icon(state: NodeState, config: &OutputConfig) -> &'static str {
    match (state, config.use_ascii) {
        (NodeState::Completed, true) => "+",
        (NodeState::Available, true) => "o",
        (NodeState::Locked, true) => "x",
        (NodeState::Completed, false) => "✓",
        (NodeState::Available, false) => "○",
        (NodeState::Locked, false) => "🔒",
    }
}

/// State icon in the state's color.
pub(crate) fn colored_state_icon(state: NodeState, config: &OutputConfig) -> String {
    let icon = state_icon(state, config);
    if !config.use_colors {
        return icon.to_string();
    }
    match state {
        NodeState::Completed => icon.green().to_string(),
        NodeState::Available => icon.yellow().to_string(),
        NodeState::Locked => icon.red().to_string(),
    }
}

/// Arrow drawn for an edge; recommended edges are dimmed.
pub(crate) fn edge_arrow(kind: DependencyKind, config: &OutputConfig) -> String {
    let arrow = match (kind, config.use_ascii) {
        (DependencyKind::Required, true) => "->",
        (DependencyKind::Recommended, true) => "~>",
        (DependencyKind::Required, false) => "→",
        (DependencyKind::Recommended, false) => "⇢",
    };
    if !config.use_colors {
        return arrow.to_string();
    }
    match kind {
        DependencyKind::Required => arrow.cyan().to_string(),
        DependencyKind::Recommended => arrow.dimmed().to_string(),
    }
}

/// Marker shown next to the starting node.
pub(crate) fn start_marker(config: &OutputConfig) -> String {
    let marker = if config.use_ascii { "[start]" } else { "★ start" };
    if !config.use_colors {
        return marker.to_string();
    }
    marker.magenta().to_string()
}

/// Colorize a tree or node ID (cyan).
pub(crate) fn colorize_id(id: &str, config: &OutputConfig) -> String {
    info(id, config)
}

/// Apply dimmed style to text (for labels/field names).
pub(crate) fn dimmed(text: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return text.to_string();
    }
    text.dimmed().to_string()
}

/// Apply bold style to text (for section headers).
pub(crate) fn bold(text: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return text.to_string();
    }
    text.bold().to_string()
}
