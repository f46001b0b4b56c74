//! Node/edge view of the graph neighbourhood of a set of entities, for
//! display next to an answer.

use extract::{sanitize, GraphTriple};
use index::GraphStore;
use petgraph::dot::{Config, Dot};
use petgraph::graph::{DiGraph, EdgeReference, NodeIndex};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

const MATCHED_COLOR: &str = "#FF4B4B";
const RELATED_COLOR: &str = "#4BFF4B";
const EDGE_COLOR: &str = "#A0A0A0";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeRole {
    /// Source side of a matched edge
    Matched,
    Related,
}

impl NodeRole {
    pub fn size(&self) -> u32 {
        match self {
            Self::Matched => 25,
            Self::Related => 15,
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            Self::Matched => MATCHED_COLOR,
            Self::Related => RELATED_COLOR,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphNode {
    pub id: String,
    pub label: String,
    pub size: u32,
    pub color: String,
    pub role: NodeRole,
}

impl GraphNode {
    fn new(id: &str, role: NodeRole) -> Self {
        Self {
            id: id.to_string(),
            label: id.to_string(),
            size: role.size(),
            color: role.color().to_string(),
            role,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphEdge {
    pub source: String,
    pub target: String,
    pub label: String,
    pub color: String,
    pub directed: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GraphView {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
    #[serde(skip)]
    seen: HashSet<String>,
}

impl GraphView {
    /// Node ids are unique within a view; the first role seen for an id wins.
    fn add_node(&mut self, id: &str, role: NodeRole) {
        if self.seen.insert(id.to_string()) {
            self.nodes.push(GraphNode::new(id, role));
        }
    }

    fn add_triple(&mut self, triple: &GraphTriple) {
        self.add_node(&triple.source, NodeRole::Matched);
        self.add_node(&triple.target, NodeRole::Related);
        self.edges.push(GraphEdge {
            source: triple.source.clone(),
            target: triple.target.clone(),
            label: triple.relation.clone(),
            color: EDGE_COLOR.to_string(),
            directed: true,
        });
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Node weights are ids, edge weights are relation labels
    pub fn to_petgraph(&self) -> DiGraph<String, String> {
        let mut graph = DiGraph::with_capacity(self.nodes.len(), self.edges.len());
        let indices: HashMap<&str, NodeIndex> = self
            .nodes
            .iter()
            .map(|node| (node.id.as_str(), graph.add_node(node.id.clone())))
            .collect();

        for edge in &self.edges {
            if let (Some(&a), Some(&b)) = (
                indices.get(edge.source.as_str()),
                indices.get(edge.target.as_str()),
            ) {
                graph.add_edge(a, b, edge.label.clone());
            }
        }

        graph
    }

    /// Graphviz rendering of the view
    pub fn to_dot(&self) -> String {
        let graph = self.to_petgraph();
        let edge_attrs = |_, edge: EdgeReference<'_, String>| {
            format!("label = {:?} color = \"{}\"", edge.weight(), EDGE_COLOR)
        };
        let node_attrs = |_, (index, id): (NodeIndex, &String)| {
            let node = &self.nodes[index.index()];
            format!(
                "label = {:?} color = \"{}\" style = filled fillcolor = \"{}\"",
                id, node.color, node.color
            )
        };

        let dot = Dot::with_attr_getters(
            &graph,
            &[Config::EdgeNoLabel, Config::NodeNoLabel],
            &edge_attrs,
            &node_attrs,
        );
        dot.to_string()
    }
}

#[derive(Clone)]
pub struct GraphVisualizationAdapter {
    store: Arc<dyn GraphStore>,
    limit: usize,
}

impl GraphVisualizationAdapter {
    pub fn new(store: Arc<dyn GraphStore>, limit: usize) -> Self {
        Self { store, limit }
    }

    #[instrument(skip(self, entities), fields(entities = entities.len()))]
    pub async fn build_graph_view(&self, entities: &[String]) -> GraphView {
        let mut view = GraphView::default();

        for entity in entities {
            let term = sanitize(entity);
            if term.is_empty() {
                continue;
            }

            match self.store.match_triples(&term, self.limit).await {
                Ok(triples) => triples.iter().for_each(|triple| view.add_triple(triple)),
                Err(e) => warn!(entity = %entity, error = %e, "Graph view lookup failed"),
            }
        }

        debug!(nodes = view.nodes.len(), edges = view.edges.len(), "Built graph view");
        view
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct SharedHub;

    #[async_trait]
    impl GraphStore for SharedHub {
        async fn match_triples(&self, term: &str, _limit: usize) -> anyhow::Result<Vec<GraphTriple>> {
            match term {
                "Cyclosporine" => Ok(vec![GraphTriple::new("Cyclosporine", "TREATS", "GVHD")]),
                "Tacrolimus" => Ok(vec![GraphTriple::new("Tacrolimus", "TREATS", "GVHD")]),
                "GVHD" => Ok(vec![
                    GraphTriple::new("Cyclosporine", "TREATS", "GVHD"),
                    GraphTriple::new("Tacrolimus", "TREATS", "GVHD"),
                ]),
                _ => anyhow::bail!("unavailable"),
            }
        }
    }

    fn adapter() -> GraphVisualizationAdapter {
        GraphVisualizationAdapter::new(Arc::new(SharedHub), 20)
    }

    fn entities(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_shared_node_appears_once() {
        let view = adapter()
            .build_graph_view(&entities(&["Cyclosporine", "Tacrolimus"]))
            .await;

        let ids: Vec<_> = view.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["Cyclosporine", "GVHD", "Tacrolimus"]);
        assert_eq!(view.edges.len(), 2);
    }

    #[tokio::test]
    async fn test_roles_sizes_and_colors() {
        let view = adapter().build_graph_view(&entities(&["Cyclosporine"])).await;

        assert_eq!(view.nodes[0].role, NodeRole::Matched);
        assert_eq!(view.nodes[0].size, 25);
        assert_eq!(view.nodes[0].color, "#FF4B4B");
        assert_eq!(view.nodes[1].role, NodeRole::Related);
        assert_eq!(view.nodes[1].size, 15);
        assert_eq!(view.edges[0].label, "TREATS");
        assert!(view.edges[0].directed);
    }

    #[tokio::test]
    async fn test_edges_are_not_deduplicated() {
        let view = adapter()
            .build_graph_view(&entities(&["Cyclosporine", "GVHD"]))
            .await;

        assert_eq!(view.nodes.len(), 3);
        assert_eq!(view.edges.len(), 3);
    }

    #[tokio::test]
    async fn test_failures_are_swallowed() {
        let view = adapter()
            .build_graph_view(&entities(&["Unknown", "Cyclosporine"]))
            .await;
        assert_eq!(view.edges.len(), 1);
    }

    #[derive(Default)]
    struct CountingStore {
        lookups: std::sync::atomic::AtomicUsize,
    }

    #[async_trait]
    impl GraphStore for CountingStore {
        async fn match_triples(&self, _term: &str, _limit: usize) -> anyhow::Result<Vec<GraphTriple>> {
            self.lookups.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            Ok(vec![GraphTriple::new("A", "CAUSES", "B")])
        }
    }

    #[tokio::test]
    async fn test_blank_terms_never_reach_the_store() {
        let store = Arc::new(CountingStore::default());
        let adapter = GraphVisualizationAdapter::new(store.clone(), 20);

        let view = adapter.build_graph_view(&entities(&["", "  's "])).await;

        assert!(view.is_empty());
        assert!(view.edges.is_empty());
        assert_eq!(store.lookups.load(std::sync::atomic::Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_dot_output() {
        let view = adapter().build_graph_view(&entities(&["GVHD"])).await;
        let graph = view.to_petgraph();
        let dot = view.to_dot();

        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.edge_count(), 2);
        assert!(dot.starts_with("digraph"));
        assert!(dot.contains("label = \"TREATS\""));
    }
}
