pub mod embeddings;
pub mod graph_builder;
pub mod neo4j_index;
pub mod qdrant_index;
pub mod retry;
pub mod store;

pub use embeddings::EmbeddingClient;
pub use graph_builder::{BatchPolicy, BuildReport, GraphBuilder};
pub use neo4j_index::Neo4jGraphStore;
pub use qdrant_index::QdrantIndex;
pub use retry::{RateLimitRetry, RetryOutcome};
pub use store::{
    ChunkIndex, GraphInspector, GraphStats, GraphStore, GraphWriter, Passage, VectorIndex,
};

use anyhow::Result;
use std::sync::Arc;
use tracing::info;

/// Unified indexer over the literature index and the knowledge graph
#[derive(Clone)]
pub struct Indexer {
    chunks: Arc<dyn ChunkIndex>,
    graph: Arc<dyn GraphInspector>,
}

impl Indexer {
    pub fn new(chunks: Arc<dyn ChunkIndex>, graph: Arc<dyn GraphInspector>) -> Self {
        Self { chunks, graph }
    }

    /// Initialize both stores
    pub async fn init(&self) -> Result<()> {
        info!(collection = self.chunks.collection_name(), "Initializing vector collection");
        self.chunks.init().await?;

        info!("Initializing graph schema");
        self.graph.init_schema().await?;

        info!("Indexer initialized");
        Ok(())
    }

    /// Embed chunks into the semantic index
    pub async fn index_chunks(&self, chunks: &[ingest::Chunk]) -> Result<usize> {
        self.chunks.index_chunks(chunks).await
    }

    /// Get overall stats
    pub async fn get_stats(&self) -> Result<IndexStats> {
        let graph_stats = self.graph.get_stats().await?;

        Ok(IndexStats {
            collection: self.chunks.collection_name().to_string(),
            nodes: graph_stats.node_count,
            relations: graph_stats.relation_count,
        })
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct IndexStats {
    pub collection: String,
    pub nodes: usize,
    pub relations: usize,
}
