//! Request and response shapes of the query protocol.
//!
//! Field names are fixed by the graph front-end: `nodeIds`, `edgesCount`,
//! `nodesCount`, `backendType`, `infos`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

use crate::graph::types::{Edge, GraphData, Node};

/// Marker telling the front-end which backend flavour it talks to.
pub const BACKEND_TYPE: &str = "neo4j-gson";

/// Legend label for the unused-function category.
pub const NOT_USED_LEGEND: &str = "не используемые";

/// Optional parameters of a command. Every field defaults to its zero value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct QueryParams {
    pub node_ids: Vec<i64>,
    pub expr: String,
    pub limit: i64,
}

impl QueryParams {
    /// Decode a request body. Empty or malformed bodies give the zero value.
    pub fn from_body(body: &[u8]) -> Self {
        if body.is_empty() {
            return Self::default();
        }
        serde_json::from_slice(body).unwrap_or_else(|e| {
            debug!(error = %e, "malformed query params, using defaults");
            Self::default()
        })
    }
}

// ─── Responses ──────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InitResponse {
    pub edges_count: usize,
    pub nodes_count: usize,
    pub product: String,
    pub categories: BTreeMap<String, String>,
    pub backend_type: String,
}

/// Nodes picked by `search`. Edges are never included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeSelection<'a> {
    pub nodes: Vec<&'a Node>,
    pub edges: Vec<&'a Edge>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodesInfoResponse {
    pub infos: Vec<String>,
}

/// Any command result, serialized as its bare payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum QueryResponse<'a> {
    Init(InitResponse),
    Graph(&'a GraphData),
    Search(NodeSelection<'a>),
    NodesInfo(NodesInfoResponse),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_from_camel_case_body() {
        let params = QueryParams::from_body(r#"{"nodeIds": [1, 2], "expr": "А.Б", "limit": 5}"#.as_bytes());
        assert_eq!(
            params,
            QueryParams {
                node_ids: vec![1, 2],
                expr: "А.Б".to_string(),
                limit: 5,
            }
        );
    }

    #[test]
    fn test_params_partial_body() {
        let params = QueryParams::from_body(r#"{"expr": "М.Ф"}"#.as_bytes());
        assert_eq!(params.expr, "М.Ф");
        assert_eq!(params.limit, 0);
        assert!(params.node_ids.is_empty());
    }

    #[test]
    fn test_params_empty_or_malformed_body() {
        assert_eq!(QueryParams::from_body(b""), QueryParams::default());
        assert_eq!(QueryParams::from_body(b"{not json"), QueryParams::default());
        assert_eq!(QueryParams::from_body(br#"{"limit": "ten"}"#), QueryParams::default());
    }

    #[test]
    fn test_init_response_wire_names() {
        let response = InitResponse {
            edges_count: 1,
            nodes_count: 2,
            product: "P".to_string(),
            categories: BTreeMap::from([("notuse".to_string(), NOT_USED_LEGEND.to_string())]),
            backend_type: BACKEND_TYPE.to_string(),
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "edgesCount": 1,
                "nodesCount": 2,
                "product": "P",
                "categories": {"notuse": "не используемые"},
                "backendType": "neo4j-gson"
            })
        );
    }

    #[test]
    fn test_untagged_response_is_bare_payload() {
        let response = QueryResponse::NodesInfo(NodesInfoResponse {
            infos: vec!["x".to_string()],
        });
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            serde_json::json!({"infos": ["x"]})
        );
    }
}
