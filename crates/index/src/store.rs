//! Seams between the query core and the backing stores.

use anyhow::Result;
use async_trait::async_trait;
use extract::{GraphDocument, GraphTriple};
use serde::{Deserialize, Serialize};

/// One semantic-index hit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Passage {
    pub chunk_id: String,
    pub text: String,
    pub score: f32,
}

#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// At most `k` passages ranked by similarity to `query`, best first.
    async fn search(&self, query: &str, k: usize) -> Result<Vec<Passage>>;
}

#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Edges where either endpoint id contains `term`, case-insensitively,
    /// in store order and capped at `limit`.
    ///
    /// `term` must already be sanitized: implementations may embed it in a
    /// quoted query literal.
    async fn match_triples(&self, term: &str, limit: usize) -> Result<Vec<GraphTriple>>;
}

/// Write side used only by ingestion
#[async_trait]
pub trait GraphWriter: Send + Sync {
    async fn write_documents(&self, documents: &[GraphDocument]) -> Result<()>;
}

/// Write side of the literature index
#[async_trait]
pub trait ChunkIndex: Send + Sync {
    /// Create backing storage if it does not exist yet
    async fn init(&self) -> Result<()>;

    /// Embed and upsert chunks, returning how many were written
    async fn index_chunks(&self, chunks: &[ingest::Chunk]) -> Result<usize>;

    fn collection_name(&self) -> &str;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct GraphStats {
    pub node_count: usize,
    pub relation_count: usize,
}

/// Schema setup and read-only inspection of the knowledge graph
#[async_trait]
pub trait GraphInspector: Send + Sync {
    async fn init_schema(&self) -> Result<()>;

    async fn ping(&self) -> Result<()>;

    async fn sample_triples(&self, limit: usize) -> Result<Vec<GraphTriple>>;

    async fn get_stats(&self) -> Result<GraphStats>;
}
