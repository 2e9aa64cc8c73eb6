//! Command execution logic.
//!
//! Tree-level commands call storage directly; node and edge commands open a
//! [`GraphController`] session, replay the equivalent canvas gestures, then
//! commit its write queue.

use anyhow::Result;

use super::args::{
    CreateArgs, InfoArgs, InitArgs, LinkArgs, ListArgs, NodeAction, NodeArgs, RenameArgs,
    ToggleArgs, TreeArgs,
};
use crate::app::App;
use crate::controller::{ClickOutcome, EdgeChange, EditorMode, GraphController};
use crate::domain::{NewNode, NodeId, NodeUpdate, Point, SkillNode, TreeId, TreeUpdate};
use crate::error::{Error, ValidationError};
use crate::output::{self, OutputMode};

/// Execute the init command
pub async fn execute_init(args: &InitArgs) -> Result<()> {
    use crate::commands::init;

    let current_dir = std::env::current_dir()?;

    if !args.quiet {
        println!(
            "Initializing skilltree workspace{}...",
            args.prefix
                .as_ref()
                .map(|p| format!(" with prefix '{p}'"))
                .unwrap_or_default()
        );
    }

    let result = init::init(&current_dir, args.prefix.as_deref()).await?;

    if !args.quiet {
        println!("Initialized skilltree in {}", result.skilltree_dir.display());
        println!("  Config: {}", result.config_file.display());
        println!("  Trees:  {}", result.trees_file.display());
        println!("  Tree prefix: {}", result.prefix);
    }

    Ok(())
}

/// Execute the info command
pub async fn execute_info(app: &App, _args: &InfoArgs, output_mode: OutputMode) -> Result<()> {
    let data_path = app
        .data_path()
        .map_or_else(|| "(ephemeral)".to_string(), |p| p.display().to_string());
    let trees = app.storage().list_trees().await?;
    let nodes: usize = trees.iter().map(|t| t.nodes.len()).sum();
    let completed: usize = trees
        .iter()
        .flat_map(|t| &t.nodes)
        .filter(|n| n.completed)
        .count();

    match output_mode {
        OutputMode::Json => {
            output::print_json(&serde_json::json!({
                "data_path": data_path,
                "tree_prefix": app.prefix(),
                "trees": trees.len(),
                "nodes": {
                    "total": nodes,
                    "completed": completed
                }
            }))?;
        }
        OutputMode::Text => {
            println!("Skilltree Workspace Information");
            println!("===============================");
            println!();
            println!("Data file:   {data_path}");
            println!("Tree prefix: {}", app.prefix());
            println!();
            println!(
                "Trees: {} ({} nodes, {} completed)",
                trees.len(),
                nodes,
                completed
            );
        }
    }

    Ok(())
}

/// Execute the list command
pub async fn execute_list(app: &App, _args: &ListArgs, output_mode: OutputMode) -> Result<()> {
    let trees = app.storage().list_trees().await?;
    output::print_trees(&trees, output_mode)?;
    Ok(())
}

/// Execute the create command
pub async fn execute_create(app: &mut App, args: &CreateArgs, output_mode: OutputMode) -> Result<()> {
    let tree = app
        .storage_mut()
        .create_tree(&args.name, &args.description)
        .await?;
    app.save().await?;

    match output_mode {
        OutputMode::Json => output::print_json(&tree)?,
        OutputMode::Text => println!("Created tree: {}", tree.id),
    }

    Ok(())
}

/// Execute the delete command
pub async fn execute_delete(app: &mut App, args: &TreeArgs, output_mode: OutputMode) -> Result<()> {
    let tree_id = TreeId::new(&args.tree);
    app.storage_mut().delete_tree(&tree_id).await?;
    app.save().await?;

    match output_mode {
        OutputMode::Json => output::print_json(&serde_json::json!({ "deleted": tree_id }))?,
        OutputMode::Text => println!("Deleted tree: {tree_id}"),
    }

    Ok(())
}

/// Execute the show command
pub async fn execute_show(app: &App, args: &TreeArgs, output_mode: OutputMode) -> Result<()> {
    let tree = app.storage().load_tree(&TreeId::new(&args.tree)).await?;
    output::print_tree_details(&tree, output_mode)?;
    Ok(())
}

/// Execute the rename command
pub async fn execute_rename(app: &mut App, args: &RenameArgs, output_mode: OutputMode) -> Result<()> {
    if args.name.is_none() && args.description.is_none() {
        anyhow::bail!("Nothing to update: pass --name and/or --description");
    }

    let update = TreeUpdate {
        name: args.name.clone(),
        description: args.description.clone(),
    };
    let tree = app
        .storage_mut()
        .update_tree(&TreeId::new(&args.tree), update)
        .await?;
    app.save().await?;

    match output_mode {
        OutputMode::Json => output::print_json(&tree)?,
        OutputMode::Text => println!("Updated tree: {}", tree.id),
    }

    Ok(())
}

/// Execute a `node` subcommand
pub async fn execute_node(app: &mut App, args: &NodeArgs, output_mode: OutputMode) -> Result<()> {
    match &args.action {
        NodeAction::Add {
            tree,
            title,
            description,
            at,
        } => {
            let mut controller = app.open_tree(&TreeId::new(tree)).await?;
            let id = controller.add_node(NewNode {
                title: title.clone(),
                description: description.clone(),
                position: *at,
            })?;
            app.commit(&mut controller).await?;

            let node = existing_node(&controller, &id)?.clone();
            match output_mode {
                OutputMode::Json => output::print_json(&node)?,
                OutputMode::Text => {
                    let start = if controller.tree().is_start(&id) {
                        " (starting node)"
                    } else {
                        ""
                    };
                    println!("Added node: {id} at {}{start}", node.position());
                }
            }
        }
        NodeAction::Edit {
            tree,
            node,
            title,
            description,
        } => {
            if title.is_none() && description.is_none() {
                anyhow::bail!("Nothing to update: pass --title and/or --description");
            }

            let id = NodeId::new(node);
            let mut controller = app.open_tree(&TreeId::new(tree)).await?;
            controller.update_node(
                &id,
                NodeUpdate {
                    title: title.clone(),
                    description: description.clone(),
                },
            )?;
            app.commit(&mut controller).await?;

            print_node(&controller, &id, output_mode, "Updated node")?;
        }
        NodeAction::Rm { tree, node } => {
            let id = NodeId::new(node);
            let mut controller = app.open_tree(&TreeId::new(tree)).await?;
            controller.delete_node(&id)?;
            app.commit(&mut controller).await?;

            match output_mode {
                OutputMode::Json => output::print_json(&serde_json::json!({ "deleted": id }))?,
                OutputMode::Text => println!("Deleted node: {id}"),
            }
        }
        NodeAction::Move { tree, node, to } => {
            let id = NodeId::new(node);
            let mut controller = app.open_tree(&TreeId::new(tree)).await?;
            drag_node(&mut controller, &id, *to)?;
            app.commit(&mut controller).await?;

            match output_mode {
                OutputMode::Json => output::print_json(existing_node(&controller, &id)?)?,
                OutputMode::Text => println!(
                    "Moved node {id} to {}",
                    existing_node(&controller, &id)?.position()
                ),
            }
        }
        NodeAction::Start { tree, node } => {
            let id = NodeId::new(node);
            let mut controller = app.open_tree(&TreeId::new(tree)).await?;
            controller.set_starting_node(&id)?;
            app.commit(&mut controller).await?;

            match output_mode {
                OutputMode::Json => {
                    output::print_json(&serde_json::json!({ "starting_node_id": id }))?
                }
                OutputMode::Text => println!("Starting node: {id}"),
            }
        }
    }

    Ok(())
}

/// Execute the toggle command
pub async fn execute_toggle(app: &mut App, args: &ToggleArgs, output_mode: OutputMode) -> Result<()> {
    let id = NodeId::new(&args.node);
    let mut controller = app.open_tree(&TreeId::new(&args.tree)).await?;
    controller.set_mode(EditorMode::View);

    let completed = match controller.click_node(&id)? {
        ClickOutcome::Toggled { completed } => completed,
        ClickOutcome::Selected => anyhow::bail!("Node {id} was selected instead of toggled"),
    };
    app.commit(&mut controller).await?;

    let state = controller.node_state(&id);
    match output_mode {
        OutputMode::Json => output::print_json(&serde_json::json!({
            "node_id": id,
            "completed": completed,
            "state": state,
            "progress": controller.progress(),
        }))?,
        OutputMode::Text => {
            let progress = controller.progress();
            let verb = if completed { "Completed" } else { "Reset" };
            println!(
                "{verb} node: {id} ({}/{} completed)",
                progress.completed, progress.total
            );
        }
    }

    Ok(())
}

/// Execute the link command
pub async fn execute_link(app: &mut App, args: &LinkArgs, output_mode: OutputMode) -> Result<()> {
    let from = NodeId::new(&args.from);
    let to = NodeId::new(&args.to);
    let mut controller = app.open_tree(&TreeId::new(&args.tree)).await?;

    let source = existing_node(&controller, &from)?.position();
    let target = existing_node(&controller, &to)?.position();
    if from == to {
        return Err(ValidationError::SelfDependency(from).into());
    }

    controller.connection_handle_down(&from, source);
    controller.pointer_move(target);
    controller.pointer_up_on_node(&to);
    let change = controller.choose_edge_kind(args.kind())?;
    if change == EdgeChange::NoPendingChoice {
        anyhow::bail!("Could not connect {from} to {to}");
    }
    app.commit(&mut controller).await?;

    match output_mode {
        OutputMode::Json => output::print_json(&serde_json::json!({
            "dependency": from,
            "dependent": to,
            "kind": args.kind(),
            "change": change,
        }))?,
        OutputMode::Text => match change {
            EdgeChange::AlreadyPresent => {
                println!("{to} already has {from} as a {} dependency", args.kind())
            }
            _ => println!("Linked {from} -> {to} ({})", args.kind()),
        },
    }

    Ok(())
}

/// Execute the unlink command
pub async fn execute_unlink(app: &mut App, args: &LinkArgs, output_mode: OutputMode) -> Result<()> {
    let from = NodeId::new(&args.from);
    let to = NodeId::new(&args.to);
    let mut controller = app.open_tree(&TreeId::new(&args.tree)).await?;

    let removed = controller.remove_edge(&to, &from, args.kind())?;
    app.commit(&mut controller).await?;

    match output_mode {
        OutputMode::Json => output::print_json(&serde_json::json!({
            "dependency": from,
            "dependent": to,
            "kind": args.kind(),
            "removed": removed,
        }))?,
        OutputMode::Text if removed => println!("Unlinked {from} -> {to} ({})", args.kind()),
        OutputMode::Text => println!("No {} edge from {from} to {to}", args.kind()),
    }

    Ok(())
}

/// Execute the layout command
pub async fn execute_layout(app: &mut App, args: &TreeArgs, output_mode: OutputMode) -> Result<()> {
    let mut controller = app.open_tree(&TreeId::new(&args.tree)).await?;
    let moved = controller.auto_layout();
    app.commit(&mut controller).await?;

    match output_mode {
        OutputMode::Json => output::print_json(&serde_json::json!({ "moved": moved }))?,
        OutputMode::Text => println!("Arranged {moved} node(s)"),
    }

    Ok(())
}

// ============================================================================
// Helpers
// ============================================================================

fn existing_node<'a>(
    controller: &'a GraphController,
    id: &NodeId,
) -> crate::error::Result<&'a SkillNode> {
    controller
        .tree()
        .node(id)
        .ok_or_else(|| Error::NodeNotFound {
            tree_id: controller.tree().id.clone(),
            node_id: id.clone(),
        })
}

/// Press on the node's centre, move to `to`, release on the canvas.
fn drag_node(controller: &mut GraphController, id: &NodeId, to: Point) -> crate::error::Result<()> {
    let grab = existing_node(controller, id)?.position();
    controller.set_mode(EditorMode::Edit);
    controller.pointer_down_on_node(id, grab);
    controller.pointer_move(to);
    controller.pointer_up_on_canvas();
    Ok(())
}

fn print_node(
    controller: &GraphController,
    id: &NodeId,
    output_mode: OutputMode,
    verb: &str,
) -> Result<()> {
    let node = existing_node(controller, id)?;
    match output_mode {
        OutputMode::Json => output::print_json(node)?,
        OutputMode::Text => println!("{verb}: {id} ({})", node.title),
    }
    Ok(())
}
