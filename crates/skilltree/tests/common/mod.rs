//! Common test utilities shared across integration tests.

#![allow(dead_code)]

use std::path::Path;
use std::process::{Command, Output};

/// Run the skilltree binary in `dir`
pub fn run_skilltree_in_dir(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_skilltree"))
        .args(args)
        .current_dir(dir)
        .env("NO_COLOR", "1")
        .env("SKILLTREE_ASCII", "1")
        .output()
        .expect("Failed to execute skilltree binary")
}

/// Run a command expected to succeed and parse its `--json` output
pub fn run_json(dir: &Path, args: &[&str]) -> serde_json::Value {
    let mut full = vec!["--json"];
    full.extend_from_slice(args);
    let output = run_skilltree_in_dir(dir, &full);
    assert!(
        output.status.success(),
        "skilltree {args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("Output should be valid JSON")
}

/// Create a tree and return its id
pub fn create_tree(dir: &Path, name: &str) -> String {
    let tree = run_json(dir, &["create", "--name", name]);
    tree["id"].as_str().expect("tree id").to_string()
}

/// Add a node to a tree and return its id
pub fn add_node(dir: &Path, tree: &str, title: &str) -> String {
    let node = run_json(dir, &["node", "add", tree, "--title", title]);
    node["id"].as_str().expect("node id").to_string()
}

/// Fetch a tree's details
pub fn show(dir: &Path, tree: &str) -> serde_json::Value {
    run_json(dir, &["show", tree])
}

/// Find a node in `show` output
pub fn node<'a>(details: &'a serde_json::Value, id: &str) -> &'a serde_json::Value {
    details["nodes"]
        .as_array()
        .expect("nodes array")
        .iter()
        .find(|n| n["id"] == id)
        .unwrap_or_else(|| panic!("node {id} not in tree"))
}
