//! Skilltree CLI binary.

use anyhow::Result;
use skilltree::cli::Cli;
use tracing_subscriber::EnvFilter;

/// Main entry point for the skilltree CLI.
///
/// Uses tokio's current_thread runtime: every command is a short sequence of
/// file operations.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Example: RUST_LOG=skilltree=debug,skilltree_jsonl=trace skilltree show skill-a3f8
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("skilltree=info,skilltree_jsonl=info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!("Starting skilltree CLI");

    let cli = Cli::parse_args();
    cli.execute().await?;

    tracing::debug!("Skilltree CLI completed successfully");
    Ok(())
}
