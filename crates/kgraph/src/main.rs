//! kgraph CLI binary.

use anyhow::Result;
use kgraph::cli::Cli;
use tracing_subscriber::EnvFilter;

/// Main entry point for the kgraph CLI.
///
/// Uses tokio's `current_thread` runtime: commands are short, sequential
/// and I/O-bound.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Controlled via RUST_LOG, e.g. RUST_LOG=kgraph=debug
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("kgraph=info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!("Starting kgraph CLI");

    let cli = Cli::parse_args();
    cli.execute().await?;

    tracing::debug!("kgraph CLI completed successfully");
    Ok(())
}
