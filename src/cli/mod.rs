//! CLI module for modgraph.
//!
//! Commands:
//! - Build: build, stats, unused
//! - Query: search, deps, query (raw protocol command)
//! - Export: export3d
//!
//! The `modgraph-server` binary shares the config flags through [`ServeArgs`].

use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};

use crate::config::GraphConfig;

/// Default config file, looked up in the working directory.
pub const DEFAULT_CONFIG: &str = "modgraph.toml";

#[derive(Parser, Debug)]
#[command(name = "modgraph")]
#[command(about = "Call graph of 1C:Enterprise (BSL) modules")]
pub struct Cli {
    #[command(flatten)]
    pub source: SourceArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Where the corpus and config come from.
#[derive(Args, Debug, Clone)]
pub struct SourceArgs {
    /// Source root (overrides `root` from the config file)
    #[arg(short, long)]
    pub root: Option<PathBuf>,

    /// Config file
    #[arg(short, long, default_value = DEFAULT_CONFIG)]
    pub config: PathBuf,
}

impl SourceArgs {
    /// Load the config file and apply command-line overrides.
    pub fn load_config(&self) -> GraphConfig {
        load_config(&self.config, self.root.as_deref())
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    // ─── Build ──────────────────────────────────────────────────
    /// Parse the corpus and report what was found
    Build,

    /// Show graph statistics
    Stats,

    /// List functions nobody calls
    Unused {
        /// Only exported functions
        #[arg(short, long)]
        exported: bool,
    },

    // ─── Query ──────────────────────────────────────────────────
    /// Find functions by exact qualified name
    Search {
        /// `Module.Function`
        expr: String,

        /// Max results
        #[arg(short, long, default_value = "20")]
        limit: i64,
    },

    /// Show what a function calls and who calls it
    Deps {
        /// `Module.Function`
        label: String,
    },

    /// Run a protocol command and print its JSON
    Query {
        /// init, loadgraph, search or getnodesinfo
        command: String,

        /// JSON parameters, e.g. '{"expr": "М.Ф", "limit": 5}'
        #[arg(short, long)]
        params: Option<String>,
    },

    // ─── Export ─────────────────────────────────────────────────
    /// Print the 3D projection as JSON
    Export3d,
}

/// Arguments of the `modgraph-server` binary.
#[derive(Parser, Debug)]
#[command(name = "modgraph-server")]
#[command(about = "Serve the BSL module graph over HTTP")]
pub struct ServeArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Listen address (overrides `server.bind`)
    #[arg(short, long)]
    pub bind: Option<String>,
}

impl ServeArgs {
    pub fn load_config(&self) -> GraphConfig {
        let mut config = self.source.load_config();
        if let Some(bind) = &self.bind {
            config.server.bind = bind.clone();
        }
        config
    }
}

/// Config from `path` (defaults when absent), with `root` taking precedence.
pub fn load_config(path: &Path, root: Option<&Path>) -> GraphConfig {
    let config = GraphConfig::load(path);
    match root {
        Some(root) => config.with_root(root),
        None => config,
    }
}
