//! Query service: the closed command set served to the graph front-end.
//!
//! Commands are read-only views over one [`GraphSnapshot`] that is shared
//! for the lifetime of the process:
//!
//! - `init`: counts plus the fixed product/legend/backend markers
//! - `loadgraph`: every node and edge
//! - `search`: nodes whose label equals `expr`, at most `limit` of them
//! - `getnodesinfo`: an HTML snippet per node listed in `nodeIds`

pub mod types;

use std::collections::{BTreeMap, HashSet};
use std::str::FromStr;
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, warn};

use crate::graph::types::{Graph3D, Node, CATEGORY_NOT_USED};
use crate::graph::GraphSnapshot;

pub use types::{
    InitResponse, NodeSelection, NodesInfoResponse, QueryParams, QueryResponse, BACKEND_TYPE,
    NOT_USED_LEGEND,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("unknown command: {0}")]
    UnknownCommand(String),
}

/// A command understood by the query service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Init,
    LoadGraph,
    Search,
    GetNodesInfo,
}

impl Command {
    pub fn as_str(&self) -> &'static str {
        match self {
            Command::Init => "init",
            Command::LoadGraph => "loadgraph",
            Command::Search => "search",
            Command::GetNodesInfo => "getnodesinfo",
        }
    }
}

impl FromStr for Command {
    type Err = QueryError;

    /// Case-insensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "init" => Ok(Command::Init),
            "loadgraph" => Ok(Command::LoadGraph),
            "search" => Ok(Command::Search),
            "getnodesinfo" => Ok(Command::GetNodesInfo),
            _ => Err(QueryError::UnknownCommand(s.to_string())),
        }
    }
}

/// Dispatches commands against a shared snapshot.
#[derive(Clone)]
pub struct QueryService {
    snapshot: Arc<GraphSnapshot>,
    product: String,
}

impl QueryService {
    pub fn new(snapshot: Arc<GraphSnapshot>, product: impl Into<String>) -> Self {
        Self {
            snapshot,
            product: product.into(),
        }
    }

    pub fn snapshot(&self) -> &GraphSnapshot {
        &self.snapshot
    }

    /// The 3D view of the graph.
    pub fn projection(&self) -> &Graph3D {
        &self.snapshot.projection
    }

    /// Parse `name` and run it.
    pub fn dispatch(&self, name: &str, params: &QueryParams) -> Result<QueryResponse<'_>, QueryError> {
        let command = name.parse::<Command>().inspect_err(|_| {
            warn!(command = %name, "unknown command");
        })?;
        Ok(self.execute(command, params))
    }

    pub fn execute(&self, command: Command, params: &QueryParams) -> QueryResponse<'_> {
        debug!(command = command.as_str(), "executing query");
        let data = self.snapshot.graph.data();

        match command {
            Command::Init => QueryResponse::Init(InitResponse {
                edges_count: data.edges.len(),
                nodes_count: data.nodes.len(),
                product: self.product.clone(),
                categories: BTreeMap::from([(
                    CATEGORY_NOT_USED.to_string(),
                    NOT_USED_LEGEND.to_string(),
                )]),
                backend_type: BACKEND_TYPE.to_string(),
            }),
            Command::LoadGraph => QueryResponse::Graph(data),
            Command::Search => QueryResponse::Search(NodeSelection {
                nodes: search(&data.nodes, &params.expr, params.limit),
                edges: Vec::new(),
            }),
            Command::GetNodesInfo => QueryResponse::NodesInfo(NodesInfoResponse {
                infos: nodes_info(&data.nodes, &params.node_ids),
            }),
        }
    }
}

/// Nodes labelled exactly `expr`, at most `limit` of them. Non-positive
/// limits select nothing.
pub fn search<'a>(nodes: &'a [Node], expr: &str, limit: i64) -> Vec<&'a Node> {
    let limit = usize::try_from(limit).unwrap_or(0);
    nodes
        .iter()
        .filter(|node| node.label == expr)
        .take(limit)
        .collect()
}

/// One HTML snippet per node whose id is in `node_ids`, in node order.
pub fn nodes_info(nodes: &[Node], node_ids: &[i64]) -> Vec<String> {
    let wanted: HashSet<i64> = node_ids.iter().copied().collect();
    nodes
        .iter()
        .filter(|node| i64::try_from(node.id).is_ok_and(|id| wanted.contains(&id)))
        .map(|node| node_info(&node.label))
        .collect()
}

fn node_info(label: &str) -> String {
    format!(
        "<div style=\"word-wrap: break-word; padding: 10px;\"><p>{}</p></div>",
        label
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::registry::FunctionRegistry;
    use crate::parser::{BslParser, ModuleParser};

    fn node(id: usize, label: &str) -> Node {
        Node {
            label: label.to_string(),
            id,
            categories: vec![],
            value: 1,
            group: "М".to_string(),
            image: None,
        }
    }

    fn service(sources: &[(&str, &str)]) -> QueryService {
        let mut registry = FunctionRegistry::new();
        for (name, source) in sources {
            let mut module = BslParser.parse(source).unwrap();
            module.name = name.to_string();
            registry.ingest(&module);
        }
        QueryService::new(Arc::new(GraphSnapshot::from_registry(registry)), "Тест")
    }

    fn sample() -> QueryService {
        service(&[
            (
                "ModuleA",
                "Процедура Foo() Экспорт\n ModuleB.Bar();\nКонецПроцедуры\n",
            ),
            (
                "ModuleB",
                "Процедура Bar() Экспорт\n А = 1;\n Б = 2;\nКонецПроцедуры\n",
            ),
        ])
    }

    #[test]
    fn test_search_limit_below_matches() {
        let nodes: Vec<Node> = (0..5).map(|i| node(i, "М.Ф")).collect();
        assert_eq!(search(&nodes, "М.Ф", 2).len(), 2);
    }

    #[test]
    fn test_search_limit_clamped_to_matches() {
        let nodes: Vec<Node> = (0..3).map(|i| node(i, "М.Ф")).collect();
        assert_eq!(search(&nodes, "М.Ф", 10).len(), 3);
    }

    #[test]
    fn test_search_zero_and_negative_limit() {
        let nodes: Vec<Node> = (0..3).map(|i| node(i, "М.Ф")).collect();
        assert!(search(&nodes, "М.Ф", 0).is_empty());
        assert!(search(&nodes, "М.Ф", -4).is_empty());
    }

    #[test]
    fn test_search_exact_label_only() {
        let nodes = vec![node(0, "М.Ф"), node(1, "М.Фу"), node(2, "м.ф"), node(3, "М.Ф")];
        let found: Vec<usize> = search(&nodes, "М.Ф", 10).iter().map(|n| n.id).collect();
        assert_eq!(found, vec![0, 3]);
    }

    #[test]
    fn test_nodes_info_follows_node_order() {
        let nodes = vec![node(0, "А.Один"), node(1, "А.Два"), node(2, "Б.Три")];
        let infos = nodes_info(&nodes, &[2, 0, 99, -1]);
        assert_eq!(
            infos,
            vec![
                "<div style=\"word-wrap: break-word; padding: 10px;\"><p>А.Один</p></div>",
                "<div style=\"word-wrap: break-word; padding: 10px;\"><p>Б.Три</p></div>",
            ]
        );
    }

    #[test]
    fn test_init() {
        let service = sample();
        let QueryResponse::Init(init) = service.dispatch("init", &QueryParams::default()).unwrap()
        else {
            panic!("expected init response");
        };
        assert_eq!(init.nodes_count, 2);
        assert_eq!(init.edges_count, 1);
        assert_eq!(init.product, "Тест");
        assert_eq!(init.backend_type, "neo4j-gson");
        assert_eq!(init.categories.get("notuse").map(String::as_str), Some("не используемые"));
    }

    #[test]
    fn test_loadgraph_returns_whole_graph() {
        let service = sample();
        let response = service.dispatch("loadgraph", &QueryParams::default()).unwrap();
        assert_eq!(response, QueryResponse::Graph(service.snapshot().graph.data()));
    }

    #[test]
    fn test_dispatch_search() {
        let service = sample();
        let params = QueryParams {
            expr: "ModuleB.Bar".to_string(),
            limit: 5,
            ..QueryParams::default()
        };
        let json = serde_json::to_value(service.dispatch("search", &params).unwrap()).unwrap();
        assert_eq!(json["nodes"].as_array().unwrap().len(), 1);
        assert_eq!(json["nodes"][0]["label"], "ModuleB.Bar");
        assert_eq!(json["nodes"][0]["value"], 3);
        assert_eq!(json["edges"], serde_json::json!([]));
    }

    #[test]
    fn test_dispatch_getnodesinfo() {
        let service = sample();
        let params = QueryParams {
            node_ids: vec![0],
            ..QueryParams::default()
        };
        let json = serde_json::to_value(service.dispatch("getnodesinfo", &params).unwrap()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "infos": ["<div style=\"word-wrap: break-word; padding: 10px;\"><p>ModuleA.Foo</p></div>"]
            })
        );
    }

    #[test]
    fn test_command_names_case_insensitive() {
        assert_eq!("INIT".parse::<Command>().unwrap(), Command::Init);
        assert_eq!("LoadGraph".parse::<Command>().unwrap(), Command::LoadGraph);
        assert_eq!("GetNodesInfo".parse::<Command>().unwrap(), Command::GetNodesInfo);
        assert_eq!("search".parse::<Command>().unwrap(), Command::Search);
    }

    #[test]
    fn test_unknown_command() {
        let service = sample();
        let err = service
            .dispatch("dropgraph", &QueryParams::default())
            .unwrap_err();
        assert_eq!(err, QueryError::UnknownCommand("dropgraph".to_string()));
    }

    #[test]
    fn test_commands_do_not_mutate() {
        let service = sample();
        let before = service.snapshot().graph.data().clone();
        for name in ["init", "loadgraph", "search", "getnodesinfo"] {
            service.dispatch(name, &QueryParams::default()).unwrap();
        }
        assert_eq!(service.snapshot().graph.data(), &before);
    }
}
