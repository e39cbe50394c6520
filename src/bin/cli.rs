//! modgraph CLI - call graph of BSL modules.
//!
//! Usage:
//!   modgraph build                    # Parse the corpus, report files
//!   modgraph stats                    # Graph statistics
//!   modgraph unused [--exported]      # Functions nobody calls
//!   modgraph search <Module.Func>     # Exact-label search
//!   modgraph deps <Module.Func>       # Callees and callers
//!   modgraph query <command> [-p ..]  # Raw protocol command as JSON
//!   modgraph export3d                 # 3D projection as JSON

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use modgraph::cli::{Cli, Commands};
use modgraph::{build_graph, BslParser, QueryParams, QueryService};

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = cli.source.load_config();
    info!(root = %config.root.display(), "building graph");

    let snapshot = build_graph(&config, &BslParser)
        .with_context(|| format!("cannot build graph from {}", config.root.display()))?;
    let graph = &snapshot.graph;

    match cli.command {
        Commands::Build => {
            let stats = graph.stats();
            println!("✓ Graph built");
            println!("  {}", snapshot.report);
            println!("  Functions: {}", stats.node_count);
            println!("  Calls:     {}", stats.edge_count);
            if !snapshot.report.skipped.is_empty() {
                println!();
                println!("Skipped:");
                for path in &snapshot.report.skipped {
                    println!("  {}", path.display());
                }
            }
        }

        Commands::Stats => {
            let json = serde_json::to_string_pretty(&graph.stats())?;
            println!("{}", json);
        }

        Commands::Unused { exported } => {
            let unused: Vec<_> = graph
                .unused()
                .into_iter()
                .filter(|f| !exported || f.exported)
                .collect();

            if unused.is_empty() {
                println!("No unused functions");
                return Ok(());
            }
            for f in &unused {
                println!("  {} ({} statements)", f.qualified_name, f.statement_count);
            }
            println!();
            println!("{} unused of {}", unused.len(), graph.nodes().len());
        }

        Commands::Search { expr, limit } => {
            let found = modgraph::query::search(graph.nodes(), &expr, limit);
            if found.is_empty() {
                println!("No results for '{}'", expr);
                return Ok(());
            }
            for node in found {
                let unused = if node.is_unused() { " [unused]" } else { "" };
                println!("  #{} {} value={}{}", node.id, node.label, node.value, unused);
            }
        }

        Commands::Deps { label } => {
            let Some(function) = graph.find(&label) else {
                println!("No function '{}'", label);
                return Ok(());
            };

            println!("{} ({})", function.qualified_name, function.module_name);
            println!();
            println!("Calls:");
            for callee in graph.dependencies(&label) {
                println!("  → {}", callee.qualified_name);
            }
            let dangling = function
                .dependencies
                .iter()
                .filter(|d| graph.find(d).is_none())
                .count();
            if dangling > 0 {
                println!("  ({} unresolved)", dangling);
            }
            println!();
            println!("Called by:");
            for caller in graph.dependents(&label) {
                println!("  ← {}", caller.qualified_name);
            }
        }

        Commands::Query { command, params } => {
            let params = params
                .map(|p| QueryParams::from_body(p.as_bytes()))
                .unwrap_or_default();
            let service = QueryService::new(Arc::new(snapshot), config.query.product.clone());
            let response = service.dispatch(&command, &params)?;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }

        Commands::Export3d => {
            println!("{}", serde_json::to_string_pretty(&snapshot.projection)?);
        }
    }

    Ok(())
}
