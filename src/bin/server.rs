//! modgraph HTTP server. Serves the BSL module graph to the graph UI.
//!
//! Usage:
//!   modgraph-server [--root <dir>] [--config modgraph.toml] [--bind 127.0.0.1:8080]
//!
//! The graph is built once at startup; requests read the immutable snapshot.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use modgraph::cli::ServeArgs;
use modgraph::{build_graph, server, BslParser, QueryService};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing to stderr
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = ServeArgs::parse();
    let config = args.load_config();
    info!(root = %config.root.display(), "modgraph server starting");

    let build_config = config.clone();
    let snapshot = tokio::task::spawn_blocking(move || build_graph(&build_config, &BslParser))
        .await
        .context("graph build task failed")?
        .with_context(|| format!("cannot build graph from {}", config.root.display()))?;

    info!(report = %snapshot.report, "graph ready");

    let service = Arc::new(QueryService::new(
        Arc::new(snapshot),
        config.query.product.clone(),
    ));
    server::serve(&config.server.bind, service)
        .await
        .with_context(|| format!("server on {} failed", config.server.bind))
}
