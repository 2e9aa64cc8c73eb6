//! Integration tests for in-memory storage.
//!
//! These tests exercise the `TreeStorage` contract of the in-memory backend
//! and its resilient JSONL loading.

use skilltree::domain::{NodeId, Point, SkillNode, SkillTree, TreeId, TreeUpdate};
use skilltree::error::{Error, ValidationError};
use skilltree::storage::TreeStorage;
use skilltree::storage::in_memory::{
    LoadWarning, load_from_jsonl, new_in_memory_storage, save_to_jsonl,
};
use rstest::rstest;
use tempfile::tempdir;

fn storage() -> Box<dyn TreeStorage> {
    new_in_memory_storage("skill".to_string())
}

fn node(id: &str, revision: u64) -> SkillNode {
    let mut node = SkillNode::new(NodeId::new(id), id, "", Point::new(0.0, 0.0));
    node.revision = revision;
    node
}

fn tree_line(tree: &SkillTree) -> String {
    serde_json::to_string(tree).unwrap()
}

// ============================================================================
// Trees
// ============================================================================

#[tokio::test]
async fn test_create_assigns_prefixed_ids() {
    let mut storage = storage();
    let tree = storage.create_tree("Cooking", "Basics").await.unwrap();

    assert!(tree.id.as_str().starts_with("skill-"));
    assert!(tree.nodes.is_empty());
    assert!(tree.starting_node_id.is_none());
    assert_eq!(tree.created_at, tree.updated_at);
}

#[tokio::test]
async fn test_list_is_ordered_by_creation() {
    let mut storage = storage();
    let first = storage.create_tree("First", "").await.unwrap();
    let second = storage.create_tree("Second", "").await.unwrap();
    let third = storage.create_tree("Third", "").await.unwrap();

    let ids: Vec<TreeId> = storage
        .list_trees()
        .await
        .unwrap()
        .into_iter()
        .map(|t| t.id)
        .collect();
    assert_eq!(ids, vec![first.id, second.id, third.id]);
}

#[rstest]
#[case::blank_name("   ".to_string(), String::new())]
#[case::long_name("n".repeat(201), String::new())]
#[case::long_description("Cooking".to_string(), "d".repeat(10_001))]
#[tokio::test]
async fn test_create_rejects_invalid_metadata(#[case] name: String, #[case] description: String) {
    let mut storage = storage();
    let err = storage.create_tree(&name, &description).await.unwrap_err();
    assert!(matches!(err, Error::Validation(_)), "got {err:?}");
    assert!(storage.list_trees().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_update_tree_changes_only_given_fields() {
    let mut storage = storage();
    let tree = storage.create_tree("Cooking", "Basics").await.unwrap();

    let updated = storage
        .update_tree(
            &tree.id,
            TreeUpdate {
                name: Some("Baking".into()),
                description: None,
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.name, "Baking");
    assert_eq!(updated.description, "Basics");
    assert!(updated.updated_at >= tree.updated_at);
}

#[tokio::test]
async fn test_delete_tree_cascades_and_reports_missing() {
    let mut storage = storage();
    let tree = storage.create_tree("Cooking", "").await.unwrap();
    storage.upsert_node(&tree.id, node("node-aaaa", 1)).await.unwrap();

    storage.delete_tree(&tree.id).await.unwrap();
    assert!(storage.load_tree(&tree.id).await.unwrap_err().is_not_found());
    assert!(storage.delete_tree(&tree.id).await.unwrap_err().is_not_found());
}

// ============================================================================
// Nodes
// ============================================================================

#[tokio::test]
async fn test_upsert_creates_then_replaces() {
    let mut storage = storage();
    let tree = storage.create_tree("Cooking", "").await.unwrap();

    storage.upsert_node(&tree.id, node("node-aaaa", 1)).await.unwrap();
    let mut renamed = node("node-aaaa", 2);
    renamed.title = "Knife skills".into();
    storage.upsert_node(&tree.id, renamed).await.unwrap();

    let loaded = storage.load_tree(&tree.id).await.unwrap();
    assert_eq!(loaded.nodes.len(), 1);
    assert_eq!(loaded.nodes[0].title, "Knife skills");
}

#[rstest]
#[case::older(1)]
#[case::same_base(2)]
#[case::skipped_ahead(4)]
#[tokio::test]
async fn test_upsert_not_based_on_stored_revision_conflicts(#[case] revision: u64) {
    let mut storage = storage();
    let tree = storage.create_tree("Cooking", "").await.unwrap();
    storage.upsert_node(&tree.id, node("node-aaaa", 1)).await.unwrap();
    let mut newer = node("node-aaaa", 2);
    newer.title = "Newer".into();
    storage.upsert_node(&tree.id, newer).await.unwrap();

    let mut other = node("node-aaaa", revision);
    other.title = "Other session".into();
    let err = storage.upsert_node(&tree.id, other).await.unwrap_err();
    assert!(err.is_conflict(), "unexpected error: {err}");

    let loaded = storage.load_tree(&tree.id).await.unwrap();
    assert_eq!(loaded.nodes[0].title, "Newer");
    assert_eq!(loaded.nodes[0].revision, 2);
}

#[tokio::test]
async fn test_completion_bumps_revision_past_concurrent_edit() {
    let mut storage = storage();
    let tree = storage.create_tree("Cooking", "").await.unwrap();
    storage.upsert_node(&tree.id, node("node-aaaa", 1)).await.unwrap();

    storage
        .set_node_completed(&tree.id, &NodeId::new("node-aaaa"), true)
        .await
        .unwrap();
    let mut moved = node("node-aaaa", 2);
    moved.x = 450.0;
    assert!(storage.upsert_node(&tree.id, moved).await.unwrap_err().is_conflict());

    let loaded = storage.load_tree(&tree.id).await.unwrap();
    assert!(loaded.nodes[0].completed);
    assert_eq!(loaded.nodes[0].x, 0.0);
}

#[tokio::test]
async fn test_upsert_rejects_invalid_title() {
    let mut storage = storage();
    let tree = storage.create_tree("Cooking", "").await.unwrap();

    let mut bad = node("node-aaaa", 1);
    bad.title = String::new();
    let err = storage.upsert_node(&tree.id, bad).await.unwrap_err();
    assert!(matches!(
        err,
        Error::Validation(ValidationError::Empty { .. })
    ));
}

#[tokio::test]
async fn test_delete_node_clears_start_but_not_dependents() {
    let mut storage = storage();
    let tree = storage.create_tree("Cooking", "").await.unwrap();
    let a = node("node-aaaa", 1);
    let mut b = node("node-bbbb", 1);
    b.required_deps.insert(a.id.clone());
    storage.upsert_node(&tree.id, a.clone()).await.unwrap();
    storage.upsert_node(&tree.id, b).await.unwrap();
    storage
        .set_starting_node(&tree.id, Some(&a.id))
        .await
        .unwrap();

    storage.delete_node(&tree.id, &a.id).await.unwrap();
    storage.delete_node(&tree.id, &a.id).await.unwrap();

    let loaded = storage.load_tree(&tree.id).await.unwrap();
    assert!(loaded.starting_node_id.is_none());
    assert!(loaded.nodes[0].required_deps.contains(&a.id));
}

#[tokio::test]
async fn test_set_starting_node_requires_existing_node() {
    let mut storage = storage();
    let tree = storage.create_tree("Cooking", "").await.unwrap();

    let err = storage
        .set_starting_node(&tree.id, Some(&NodeId::new("node-none")))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NodeNotFound { .. }));

    storage.set_starting_node(&tree.id, None).await.unwrap();
}

#[tokio::test]
async fn test_set_node_completed() {
    let mut storage = storage();
    let tree = storage.create_tree("Cooking", "").await.unwrap();
    storage.upsert_node(&tree.id, node("node-aaaa", 1)).await.unwrap();

    storage
        .set_node_completed(&tree.id, &NodeId::new("node-aaaa"), true)
        .await
        .unwrap();
    assert!(storage.load_tree(&tree.id).await.unwrap().nodes[0].completed);

    let err = storage
        .set_node_completed(&tree.id, &NodeId::new("node-none"), true)
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_in_memory_save_keeps_trees() {
    let mut storage = storage();
    let tree = storage.create_tree("Cooking", "").await.unwrap();
    storage.save().await.unwrap();
    assert_eq!(storage.list_trees().await.unwrap().len(), 1);
    assert_eq!(storage.load_tree(&tree.id).await.unwrap().name, "Cooking");
}

// ============================================================================
// JSONL persistence
// ============================================================================

#[tokio::test]
async fn test_save_and_load_round_trip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("trees.jsonl");

    let mut storage = storage();
    let tree = storage.create_tree("Cooking", "").await.unwrap();
    let a = node("node-aaaa", 1);
    let mut b = node("node-bbbb", 1);
    b.required_deps.insert(a.id.clone());
    b.completed = true;
    storage.upsert_node(&tree.id, a).await.unwrap();
    storage.upsert_node(&tree.id, b).await.unwrap();
    save_to_jsonl(storage.as_ref(), &path).await.unwrap();

    let (loaded, warnings) = load_from_jsonl(&path, "skill".into()).await.unwrap();
    assert!(warnings.is_empty());
    assert_eq!(
        loaded.load_tree(&tree.id).await.unwrap(),
        storage.load_tree(&tree.id).await.unwrap()
    );

    let content = tokio::fs::read_to_string(&path).await.unwrap();
    assert_eq!(content.lines().count(), 1);
}

#[tokio::test]
async fn test_loaded_ids_are_not_reissued() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("trees.jsonl");

    let mut original = storage();
    let existing = original.create_tree("Cooking", "").await.unwrap();
    save_to_jsonl(original.as_ref(), &path).await.unwrap();

    let (mut loaded, _) = load_from_jsonl(&path, "skill".into()).await.unwrap();
    for _ in 0..20 {
        let created = loaded.create_tree("Another", "").await.unwrap();
        assert_ne!(created.id, existing.id);
    }
}

#[tokio::test]
async fn test_malformed_lines_are_skipped() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("trees.jsonl");

    let good = SkillTree::new(TreeId::new("skill-good"), "Good", "");
    let content = format!("{}\n{{not json\n\n", tree_line(&good));
    tokio::fs::write(&path, content).await.unwrap();

    let (loaded, warnings) = load_from_jsonl(&path, "skill".into()).await.unwrap();
    assert_eq!(loaded.list_trees().await.unwrap().len(), 1);
    assert!(matches!(
        warnings.as_slice(),
        [LoadWarning::MalformedJson { line_number: 2, .. }]
    ));
}

#[tokio::test]
async fn test_invalid_and_duplicate_trees_are_skipped() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("trees.jsonl");

    let good = SkillTree::new(TreeId::new("skill-good"), "Good", "");
    let nameless = SkillTree::new(TreeId::new("skill-bad0"), "", "");
    let mut twin_nodes = SkillTree::new(TreeId::new("skill-twin"), "Twins", "");
    twin_nodes.nodes = vec![node("node-aaaa", 1), node("node-aaaa", 2)];

    let content = [&good, &nameless, &good, &twin_nodes]
        .iter()
        .map(|t| tree_line(t))
        .collect::<Vec<_>>()
        .join("\n");
    tokio::fs::write(&path, content).await.unwrap();

    let (loaded, warnings) = load_from_jsonl(&path, "skill".into()).await.unwrap();
    assert_eq!(loaded.list_trees().await.unwrap().len(), 1);

    let skipped: Vec<(&str, usize)> = warnings
        .iter()
        .filter_map(|w| match w {
            LoadWarning::InvalidTreeData {
                tree_id,
                record_number,
                ..
            } => Some((tree_id.as_str(), *record_number)),
            _ => None,
        })
        .collect();
    assert_eq!(
        skipped,
        vec![("skill-bad0", 2), ("skill-good", 3), ("skill-twin", 4)]
    );
}

#[tokio::test]
async fn test_damaged_trees_are_repaired_and_reported() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("trees.jsonl");

    let mut tree = SkillTree::new(TreeId::new("skill-dmg0"), "Damaged", "");
    let mut a = node("node-aaaa", 1);
    let mut b = node("node-bbbb", 1);
    a.required_deps.insert(b.id.clone());
    b.required_deps.insert(a.id.clone());
    b.recommended_deps.insert(NodeId::new("node-gone"));
    tree.nodes = vec![a, b];
    tree.starting_node_id = Some(NodeId::new("node-lost"));
    tokio::fs::write(&path, tree_line(&tree)).await.unwrap();

    let (loaded, warnings) = load_from_jsonl(&path, "skill".into()).await.unwrap();
    let stored = loaded.load_tree(&tree.id).await.unwrap();
    assert!(stored.starting_node_id.is_none());
    assert!(stored.nodes[1].recommended_deps.contains(&NodeId::new("node-gone")));

    assert!(warnings.contains(&LoadWarning::DanglingStartingNode {
        tree_id: tree.id.clone(),
        node_id: NodeId::new("node-lost"),
    }));
    assert!(warnings.contains(&LoadWarning::OrphanedDependency {
        tree_id: tree.id.clone(),
        node_id: NodeId::new("node-bbbb"),
        missing: NodeId::new("node-gone"),
    }));
    assert!(warnings.contains(&LoadWarning::CircularDependency {
        tree_id: tree.id.clone(),
        nodes: vec![NodeId::new("node-aaaa"), NodeId::new("node-bbbb")],
    }));
}
