//! Module graph, the structural backbone of modgraph.
//!
//! Provides the function registry, dependency resolution, the petgraph
//! engine, the 3D projection and directory scanning/building.

pub mod builder;
pub mod engine;
pub mod projector;
pub mod registry;
pub mod resolver;
pub mod types;

pub use builder::{build_graph, module_name_for, BuildReport, GraphSnapshot};
pub use engine::{DependencyGraph, GraphStats};
pub use projector::{module_hash, project};
pub use registry::{FunctionInfo, FunctionRegistry};
pub use resolver::{classify, flatten_call_chain, Dependency};
pub use types::{Edge, Edge3D, Graph3D, GraphData, Node, Node3D, CATEGORY_NOT_USED};
