//! # modgraph
//!
//! Cross-module call graph for 1C:Enterprise (BSL) sources.
//!
//! modgraph parses every module of a configuration dump, resolves which
//! function calls which, and serves the result to a graph visualization UI.
//!
//! ## Key Features
//!
//! - **Call resolution**: local calls, `Module.Method()` chains, builtins
//! - **Usage analysis**: functions nobody calls are tagged `notuse`
//! - **Two views**: 2D node/edge graph and a 3D projection
//! - **HTTP**: `init`, `loadgraph`, `search`, `getnodesinfo` commands
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use modgraph::{build_graph, BslParser, GraphConfig};
//!
//! let config = GraphConfig::default().with_root("src/cf");
//! let snapshot = build_graph(&config, &BslParser).unwrap();
//!
//! for function in snapshot.graph.unused() {
//!     println!("{}", function.qualified_name);
//! }
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod graph;
pub mod parser;
pub mod query;
pub mod server;

// Re-exports for convenience
pub use config::GraphConfig;
pub use error::{GraphError, Result};

// Graph re-exports
pub use graph::{
    build_graph, BuildReport, DependencyGraph, FunctionInfo, FunctionRegistry, Graph3D,
    GraphData, GraphSnapshot, GraphStats, Node,
};
pub use parser::{BslParser, ModuleParser, ModuleTree, ParseError};
pub use query::{Command, QueryError, QueryParams, QueryResponse, QueryService};
