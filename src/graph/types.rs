//! Wire types for the module graph.
//!
//! Field names match what the graph UI consumes, so they are part of the
//! public contract: `label`, `id`, `categories`, `value`, `group`, `from`,
//! `to`, and for the 3D view `description`, `source`, `target`, `links`.

use serde::{Deserialize, Serialize};

/// Category attached to functions nobody calls.
pub const CATEGORY_NOT_USED: &str = "notuse";

/// A function in the 2D graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    /// Qualified name, `Module.Function`.
    pub label: String,
    pub id: usize,
    pub categories: Vec<String>,
    /// Display weight: statement count, multiplied by the number of callers
    /// when there are any.
    pub value: usize,
    /// Module name.
    pub group: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl Node {
    pub fn is_unused(&self) -> bool {
        self.categories.iter().any(|c| c == CATEGORY_NOT_USED)
    }
}

/// A resolved call from one function to another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub id: usize,
    #[serde(default)]
    pub label: String,
    pub from: usize,
    pub to: usize,
}

/// The full 2D graph, as returned by `loadgraph`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphData {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

// ─── 3D projection ──────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node3D {
    pub id: String,
    /// Hash of the module name; equal modules share a color.
    pub group: u64,
    pub description: String,
    pub value: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge3D {
    pub source: String,
    pub target: String,
    pub value: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Graph3D {
    pub nodes: Vec<Node3D>,
    pub links: Vec<Edge3D>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_serializes_wire_names() {
        let node = Node {
            label: "М.Ф".to_string(),
            id: 3,
            categories: vec![CATEGORY_NOT_USED.to_string()],
            value: 7,
            group: "М".to_string(),
            image: None,
        };
        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "label": "М.Ф",
                "id": 3,
                "categories": ["notuse"],
                "value": 7,
                "group": "М"
            })
        );
        assert!(node.is_unused());
    }

    #[test]
    fn test_edge_serializes_wire_names() {
        let edge = Edge {
            id: 0,
            label: String::new(),
            from: 1,
            to: 2,
        };
        let json = serde_json::to_value(&edge).unwrap();
        assert_eq!(json, serde_json::json!({"id": 0, "label": "", "from": 1, "to": 2}));
    }

    #[test]
    fn test_graph3d_uses_links() {
        let graph = Graph3D::default();
        let json = serde_json::to_value(&graph).unwrap();
        assert!(json.get("links").is_some());
        assert!(json.get("edges").is_none());
    }
}
