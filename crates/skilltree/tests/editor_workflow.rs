//! End-to-end editing sessions: a controller driven by pointer events and
//! commands, flushed into real storage backends.

use skilltree::controller::{
    ControllerSettings, EditorMode, GraphController, Interaction, PendingWrite,
};
use skilltree::domain::{DependencyKind, NewNode, NodeId, NodeState, NodeUpdate, Point, TreeId};
use skilltree::error::{Error, ValidationError};
use skilltree::storage::in_memory::load_from_jsonl;
use skilltree::storage::{StorageBackend, TreeStorage, create_storage};
use tempfile::TempDir;

async fn memory() -> Box<dyn TreeStorage> {
    create_storage(StorageBackend::InMemory, "skill".to_string())
        .await
        .unwrap()
}

async fn open(storage: &dyn TreeStorage, tree_id: &TreeId) -> GraphController {
    GraphController::load(storage, tree_id, ControllerSettings::default())
        .await
        .unwrap()
}

fn add(controller: &mut GraphController, title: &str) -> NodeId {
    controller
        .add_node(NewNode {
            title: title.to_string(),
            ..Default::default()
        })
        .unwrap()
}

#[tokio::test]
async fn progress_scenario_from_creation_to_deletion() {
    let mut storage = memory().await;
    let tree = storage.create_tree("Cooking", "Kitchen basics").await.unwrap();
    let mut controller = open(storage.as_ref(), &tree.id).await;

    let a = add(&mut controller, "Knife skills");
    assert_eq!(controller.tree().starting_node_id.as_ref(), Some(&a));
    assert_eq!(controller.node_state(&a), Some(NodeState::Available));

    let b = add(&mut controller, "Stock");
    controller
        .add_edge(&b, &a, DependencyKind::Required)
        .unwrap();
    assert_eq!(controller.node_state(&b), Some(NodeState::Locked));
    controller.flush(storage.as_mut()).await.unwrap();

    controller.set_mode(EditorMode::View);
    controller.click_node(&a).unwrap();
    assert_eq!(controller.node_state(&a), Some(NodeState::Completed));
    assert_eq!(controller.node_state(&b), Some(NodeState::Available));

    controller.click_node(&b).unwrap();
    assert_eq!(controller.progress().completed, 2);
    controller.flush(storage.as_mut()).await.unwrap();

    controller.delete_node(&a).unwrap();
    controller.flush(storage.as_mut()).await.unwrap();
    assert!(controller.is_synced());

    let stored = storage.load_tree(&tree.id).await.unwrap();
    assert_eq!(stored.nodes.len(), 1);
    let survivor = stored.node(&b).unwrap();
    assert!(survivor.completed);
    assert!(survivor.required_deps.is_empty());
    assert_eq!(stored.starting_node_id, None);
}

#[tokio::test]
async fn gestures_create_edges_and_move_nodes() {
    let mut storage = memory().await;
    let tree = storage.create_tree("Cooking", "").await.unwrap();
    let mut controller = open(storage.as_ref(), &tree.id).await;

    controller.begin_node_draft(Point::new(100.0, 100.0));
    let knives = controller
        .confirm_node_draft("Knife skills", "")
        .unwrap()
        .unwrap();
    controller.begin_node_draft(Point::new(400.0, 100.0));
    let sauces = controller.confirm_node_draft("Sauces", "").unwrap().unwrap();

    // Connect knives -> sauces and pick "recommended".
    controller.connection_handle_down(&knives, Point::new(110.0, 100.0));
    controller.pointer_move(Point::new(300.0, 100.0));
    assert!(controller.drag_line().is_some());
    controller.pointer_up_on_node(&sauces);
    assert!(matches!(
        controller.interaction(),
        Interaction::PendingEdgeKindChoice { .. }
    ));
    controller
        .choose_edge_kind(DependencyKind::Recommended)
        .unwrap();

    // Drag sauces down and to the left of the canvas edge.
    controller.pointer_down_on_node(&sauces, Point::new(410.0, 110.0));
    controller.pointer_move(Point::new(5.0, 310.0));
    controller.pointer_up_on_canvas();

    controller.flush(storage.as_mut()).await.unwrap();
    let stored = storage.load_tree(&tree.id).await.unwrap();
    let sauces_node = stored.node(&sauces).unwrap();
    assert!(sauces_node.recommended_deps.contains(&knives));
    assert_eq!(sauces_node.position(), Point::new(0.0, 300.0));
    assert_eq!(controller.node_state(&sauces), Some(NodeState::Available));
}

#[tokio::test]
async fn cycle_forming_edges_leave_the_tree_unchanged() {
    let mut storage = memory().await;
    let tree = storage.create_tree("Cooking", "").await.unwrap();
    let mut controller = open(storage.as_ref(), &tree.id).await;

    let a = add(&mut controller, "A");
    let b = add(&mut controller, "B");
    let c = add(&mut controller, "C");
    controller.add_edge(&b, &a, DependencyKind::Required).unwrap();
    controller.add_edge(&c, &b, DependencyKind::Required).unwrap();
    let before = controller.tree().clone();
    let queued = controller.pending_writes();

    let err = controller
        .add_edge(&a, &c, DependencyKind::Required)
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Validation(ValidationError::CircularDependency { .. })
    ));
    assert_eq!(controller.tree(), &before);
    assert_eq!(controller.pending_writes(), queued);
}

async fn tree_with_one_node(storage: &mut dyn TreeStorage) -> (TreeId, NodeId) {
    let tree = storage.create_tree("Cooking", "").await.unwrap();
    let mut first = open(storage, &tree.id).await;
    let node = add(&mut first, "Knife skills");
    first.flush(storage).await.unwrap();
    (tree.id, node)
}

#[tokio::test]
async fn equal_edits_from_a_stale_session_are_refused() {
    let mut storage = memory().await;
    let (tree_id, node) = tree_with_one_node(storage.as_mut()).await;

    let mut stale = open(storage.as_ref(), &tree_id).await;
    let mut fresh = open(storage.as_ref(), &tree_id).await;
    fresh
        .update_node(
            &node,
            NodeUpdate {
                title: Some("Knife work".into()),
                ..Default::default()
            },
        )
        .unwrap();
    let report = fresh.flush(storage.as_mut()).await.unwrap();
    assert!(report.conflicts.is_empty());

    stale
        .update_node(
            &node,
            NodeUpdate {
                description: Some("stale description".into()),
                ..Default::default()
            },
        )
        .unwrap();
    let report = stale.flush(storage.as_mut()).await.unwrap();
    assert_eq!(report.conflicts, vec![node.clone()]);
    assert!(stale.is_synced());

    let stored = storage.load_tree(&tree_id).await.unwrap();
    let stored = stored.node(&node).unwrap();
    assert_eq!(stored.title, "Knife work");
    assert_eq!(stored.description, "");
    assert_eq!(stored.revision, 2);
}

#[tokio::test]
async fn completion_survives_a_layout_from_an_older_session() {
    let mut storage = memory().await;
    let (tree_id, node) = tree_with_one_node(storage.as_mut()).await;

    let mut editor = open(storage.as_ref(), &tree_id).await;
    let mut progress = open(storage.as_ref(), &tree_id).await;
    progress.set_mode(EditorMode::View);
    progress.click_node(&node).unwrap();
    progress.flush(storage.as_mut()).await.unwrap();

    editor.auto_layout();
    let report = editor.flush(storage.as_mut()).await.unwrap();
    assert_eq!(report.conflicts, vec![node.clone()]);

    let stored = storage.load_tree(&tree_id).await.unwrap();
    assert!(stored.node(&node).unwrap().completed);

    // A session loaded after the completion can move the node.
    let mut reloaded = open(storage.as_ref(), &tree_id).await;
    reloaded.auto_layout();
    assert!(reloaded.flush(storage.as_mut()).await.unwrap().conflicts.is_empty());
    let stored = storage.load_tree(&tree_id).await.unwrap();
    let stored = stored.node(&node).unwrap();
    assert!(stored.completed);
    assert_eq!(stored.position(), Point::new(200.0, 200.0));
}

#[tokio::test]
async fn older_session_cannot_recreate_a_deleted_node() {
    let mut storage = memory().await;
    let (tree_id, node) = tree_with_one_node(storage.as_mut()).await;

    let mut stale = open(storage.as_ref(), &tree_id).await;
    let mut deleting = open(storage.as_ref(), &tree_id).await;
    deleting.delete_node(&node).unwrap();
    deleting.flush(storage.as_mut()).await.unwrap();

    stale.pointer_down_on_node(&node, Point::new(400.0, 300.0));
    stale.pointer_move(Point::new(500.0, 300.0));
    stale.pointer_up_on_canvas();
    let report = stale.flush(storage.as_mut()).await.unwrap();
    assert_eq!(report.conflicts, vec![node]);
    assert!(storage.load_tree(&tree_id).await.unwrap().nodes.is_empty());
}

#[tokio::test]
async fn one_session_keeps_writing_the_same_node() {
    let mut storage = memory().await;
    let (tree_id, node) = tree_with_one_node(storage.as_mut()).await;
    let mut controller = open(storage.as_ref(), &tree_id).await;

    controller.set_mode(EditorMode::View);
    controller.click_node(&node).unwrap();
    controller.flush(storage.as_mut()).await.unwrap();
    controller.set_mode(EditorMode::Edit);
    controller.auto_layout();
    controller.flush(storage.as_mut()).await.unwrap();
    controller
        .update_node(
            &node,
            NodeUpdate {
                title: Some("Knife work".into()),
                ..Default::default()
            },
        )
        .unwrap();
    let report = controller.flush(storage.as_mut()).await.unwrap();
    assert!(report.conflicts.is_empty());

    let stored = storage.load_tree(&tree_id).await.unwrap();
    let stored = stored.node(&node).unwrap();
    assert_eq!(stored.revision, 4);
    assert_eq!(stored.title, "Knife work");
    assert!(stored.completed);
    assert_eq!(controller.tree().node(&node).unwrap().revision, 4);
}

#[tokio::test]
async fn dependency_is_written_before_its_dependent() {
    let mut storage = memory().await;
    let tree = storage.create_tree("Cooking", "").await.unwrap();
    let mut controller = open(storage.as_ref(), &tree.id).await;

    let stock = add(&mut controller, "Stock");
    let knives = add(&mut controller, "Knife skills");
    controller
        .add_edge(&stock, &knives, DependencyKind::Required)
        .unwrap();

    let upserts: Vec<_> = controller
        .queued_writes()
        .filter_map(|w| match w {
            PendingWrite::UpsertNode(node) => Some(node.id.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(upserts, vec![knives.clone(), stock.clone()]);
    assert!(matches!(
        controller.queued_writes().last(),
        Some(PendingWrite::SetStartingNode(Some(start))) if start == &stock
    ));

    controller.flush(storage.as_mut()).await.unwrap();
    let stored = storage.load_tree(&tree.id).await.unwrap();
    assert!(stored.node(&stock).unwrap().required_deps.contains(&knives));
}

#[tokio::test]
async fn jsonl_backend_round_trips_a_session() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("trees.jsonl");

    let mut storage = create_storage(StorageBackend::Jsonl(path.clone()), "skill".into())
        .await
        .unwrap();
    let tree = storage.create_tree("Cooking", "").await.unwrap();
    let mut controller = open(storage.as_ref(), &tree.id).await;
    let a = add(&mut controller, "A");
    let b = add(&mut controller, "B");
    controller.add_edge(&b, &a, DependencyKind::Required).unwrap();
    controller.flush(storage.as_mut()).await.unwrap();
    storage.save().await.unwrap();

    let (reloaded, warnings) = load_from_jsonl(&path, "skill".into()).await.unwrap();
    assert!(warnings.is_empty(), "unexpected warnings: {warnings:?}");
    let stored = reloaded.load_tree(&tree.id).await.unwrap();
    assert_eq!(stored, storage.load_tree(&tree.id).await.unwrap());
    assert!(stored.node(&b).unwrap().required_deps.contains(&a));
}

#[tokio::test]
async fn reload_discards_unsaved_writes() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("trees.jsonl");

    let mut storage = create_storage(StorageBackend::Jsonl(path), "skill".into())
        .await
        .unwrap();
    let tree = storage.create_tree("Cooking", "").await.unwrap();
    storage.save().await.unwrap();

    let mut controller = open(storage.as_ref(), &tree.id).await;
    add(&mut controller, "Unsaved");
    controller.flush(storage.as_mut()).await.unwrap();
    assert_eq!(storage.load_tree(&tree.id).await.unwrap().nodes.len(), 1);

    storage.reload().await.unwrap();
    assert!(storage.load_tree(&tree.id).await.unwrap().nodes.is_empty());
}
