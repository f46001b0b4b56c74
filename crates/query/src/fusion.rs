use serde::Serialize;

use crate::graph_context::{GraphContext, NO_GRAPH_CONNECTIONS};
use crate::vector_context::{VectorContext, NO_LITERATURE};

/// Both context blocks, ready for the answer prompt. Neither is ever empty.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FusedContext {
    pub vector: String,
    pub graph: String,
}

impl FusedContext {
    pub fn new(vector: impl Into<String>, graph: impl Into<String>) -> Self {
        Self {
            vector: or_sentinel(vector.into(), NO_LITERATURE),
            graph: or_sentinel(graph.into(), NO_GRAPH_CONNECTIONS),
        }
    }
}

pub fn fuse(vector: &VectorContext, graph: &GraphContext) -> FusedContext {
    FusedContext::new(vector.text(), graph.text())
}

fn or_sentinel(block: String, sentinel: &str) -> String {
    if block.trim().is_empty() {
        sentinel.to_string()
    } else {
        block
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_blocks_get_sentinels() {
        let fused = FusedContext::new("  \n", "");
        assert_eq!(fused.vector, NO_LITERATURE);
        assert_eq!(fused.graph, NO_GRAPH_CONNECTIONS);
    }

    #[test]
    fn test_fuse_keeps_both_blocks() {
        let graph = GraphContext {
            lines: vec!["Cyclosporine TREATS GVHD".to_string()],
            lookups: vec![],
        };
        let fused = fuse(&VectorContext::default(), &graph);

        assert_eq!(fused.vector, NO_LITERATURE);
        assert_eq!(fused.graph, "Cyclosporine TREATS GVHD");
    }
}
