//! The dependency graph engine.
//!
//! Uses petgraph to store resolved calls between functions. Node indexes
//! equal function ids, so the graph and the serialized [`GraphData`] always
//! agree on numbering.

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, trace};

use super::registry::{FunctionInfo, FunctionRegistry};
use super::types::{Edge, GraphData, Node, CATEGORY_NOT_USED};

/// Weight carried by each petgraph edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeData {
    /// Position of the edge in emission order.
    pub id: usize,
}

/// The built graph: finalized function records plus resolved calls.
pub struct DependencyGraph {
    /// Directed graph; node index == function id.
    graph: DiGraph<FunctionInfo, EdgeData>,
    /// Index: qualified name -> function id.
    by_name: HashMap<String, usize>,
    /// Serialized form handed to the UI.
    data: GraphData,
    /// Dependency strings that matched no known function.
    dangling: usize,
}

impl DependencyGraph {
    /// Resolve every dependency of every function and compute node weights.
    ///
    /// Functions are visited in id order, so node and edge order is stable
    /// for a given registry. Unresolved dependencies are dropped.
    pub fn build(registry: FunctionRegistry) -> Self {
        let (functions, by_name) = registry.into_parts();
        debug!(functions = functions.len(), "building dependency graph");

        let mut graph = DiGraph::with_capacity(functions.len(), functions.len());
        for info in functions {
            graph.add_node(info);
        }

        let mut nodes = Vec::with_capacity(graph.node_count());
        let mut edges = Vec::new();
        let mut dangling = 0;

        for idx in graph.node_indices() {
            let info = &graph[idx];
            nodes.push(Node {
                label: info.qualified_name.clone(),
                id: info.id,
                categories: Vec::new(),
                value: 0,
                group: info.module_name.clone(),
                image: None,
            });

            let mut targets = Vec::with_capacity(info.dependencies.len());
            for dependency in &info.dependencies {
                match by_name.get(dependency) {
                    Some(&to) => targets.push(to),
                    None => {
                        trace!(from = %info.qualified_name, dependency = %dependency, "unresolved dependency");
                        dangling += 1;
                    }
                }
            }

            let from = info.id;
            for to in targets {
                let id = edges.len();
                edges.push(Edge {
                    id,
                    label: String::new(),
                    from,
                    to,
                });
                let target_idx = NodeIndex::new(to);
                graph.add_edge(idx, target_idx, EdgeData { id });

                let target = &mut graph[target_idx];
                target.inbound_reference_count += 1;
                target.used = true;
            }
        }

        for node in &mut nodes {
            let info = &graph[NodeIndex::new(node.id)];
            node.value = node_weight(info);
            if info.inbound_reference_count == 0 {
                node.categories.push(CATEGORY_NOT_USED.to_string());
            }
        }

        info!(
            nodes = nodes.len(),
            edges = edges.len(),
            dangling,
            "dependency graph built"
        );

        Self {
            graph,
            by_name,
            data: GraphData { nodes, edges },
            dangling,
        }
    }

    /// Node/edge collection in UI form.
    pub fn data(&self) -> &GraphData {
        &self.data
    }

    pub fn nodes(&self) -> &[Node] {
        &self.data.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.data.edges
    }

    /// UI node for a function id.
    pub fn node(&self, id: usize) -> Option<&Node> {
        self.data.nodes.get(id)
    }

    /// Finalized record for a function id.
    pub fn function(&self, id: usize) -> Option<&FunctionInfo> {
        self.graph.node_weight(NodeIndex::new(id))
    }

    /// Finalized record for a qualified name.
    pub fn find(&self, qualified_name: &str) -> Option<&FunctionInfo> {
        self.by_name
            .get(qualified_name)
            .and_then(|&id| self.function(id))
    }

    /// Records of all functions in id order.
    pub fn functions(&self) -> impl Iterator<Item = &FunctionInfo> {
        self.graph.node_weights()
    }

    // ─── Query Operations ───────────────────────────────────────

    /// Functions that nobody calls, in id order.
    pub fn unused(&self) -> Vec<&FunctionInfo> {
        self.functions()
            .filter(|f| f.inbound_reference_count == 0)
            .collect()
    }

    /// Functions called by `qualified_name`, in edge order.
    pub fn dependencies(&self, qualified_name: &str) -> Vec<&FunctionInfo> {
        self.neighbours(qualified_name, Direction::Outgoing)
    }

    /// Functions calling `qualified_name`, in edge order.
    pub fn dependents(&self, qualified_name: &str) -> Vec<&FunctionInfo> {
        self.neighbours(qualified_name, Direction::Incoming)
    }

    fn neighbours(&self, qualified_name: &str, direction: Direction) -> Vec<&FunctionInfo> {
        let Some(&id) = self.by_name.get(qualified_name) else {
            return Vec::new();
        };

        let mut found: Vec<(usize, NodeIndex)> = self
            .graph
            .edges_directed(NodeIndex::new(id), direction)
            .map(|edge| {
                let other = match direction {
                    Direction::Outgoing => edge.target(),
                    Direction::Incoming => edge.source(),
                };
                (edge.weight().id, other)
            })
            .collect();
        found.sort_by_key(|(edge_id, _)| *edge_id);

        found
            .into_iter()
            .map(|(_, idx)| &self.graph[idx])
            .collect()
    }

    // ─── Stats ──────────────────────────────────────────────────

    pub fn stats(&self) -> GraphStats {
        let modules: HashSet<&str> = self
            .functions()
            .map(|f| f.module_name.as_str())
            .collect();

        GraphStats {
            node_count: self.graph.node_count(),
            edge_count: self.graph.edge_count(),
            module_count: modules.len(),
            unused_count: self.unused().len(),
            exported_count: self.functions().filter(|f| f.exported).count(),
            dangling_dependencies: self.dangling,
        }
    }
}

impl Default for DependencyGraph {
    fn default() -> Self {
        Self::build(FunctionRegistry::new())
    }
}

/// `statementCount`, scaled by the number of callers when there are any.
fn node_weight(info: &FunctionInfo) -> usize {
    if info.inbound_reference_count == 0 {
        info.statement_count
    } else {
        info.statement_count * info.inbound_reference_count
    }
}

/// Statistics about the graph.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GraphStats {
    pub node_count: usize,
    pub edge_count: usize,
    pub module_count: usize,
    pub unused_count: usize,
    pub exported_count: usize,
    pub dangling_dependencies: usize,
}
