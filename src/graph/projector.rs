//! 3D projection of the module graph.

use rustc_hash::FxHasher;
use std::hash::{Hash, Hasher};

use super::types::{Edge3D, Graph3D, GraphData, Node3D};

/// Project a 2D graph into the 3D view's shape.
///
/// Ids become decimal strings and nodes are grouped by a hash of their
/// module name. Link weights are always zero.
pub fn project(graph: &GraphData) -> Graph3D {
    let nodes = graph
        .nodes
        .iter()
        .map(|node| Node3D {
            id: node.id.to_string(),
            group: module_hash(&node.group),
            description: node.label.clone(),
            value: node.value,
        })
        .collect();

    let links = graph
        .edges
        .iter()
        .map(|edge| Edge3D {
            source: edge.from.to_string(),
            target: edge.to.to_string(),
            value: 0,
        })
        .collect();

    Graph3D { nodes, links }
}

/// Stable-within-process hash of a module name. Collisions only merge colors.
pub fn module_hash(module_name: &str) -> u64 {
    let mut hasher = FxHasher::default();
    module_name.hash(&mut hasher);
    hasher.finish()
}
