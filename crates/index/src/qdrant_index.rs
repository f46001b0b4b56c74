use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info, instrument};

use crate::embeddings::EmbeddingClient;
use crate::store::{ChunkIndex, Passage, VectorIndex};

const UPSERT_BATCH: usize = 64;

pub struct QdrantIndex {
    base_url: String,
    client: reqwest::Client,
    embedding_client: EmbeddingClient,
    collection_name: String,
}

#[derive(Serialize)]
struct CreateCollection {
    vectors: VectorParams,
}

#[derive(Serialize)]
struct VectorParams {
    size: usize,
    distance: String,
}

#[derive(Serialize)]
struct UpsertPoints {
    points: Vec<Point>,
}

#[derive(Serialize)]
struct Point {
    id: u64,
    vector: Vec<f32>,
    payload: HashMap<String, serde_json::Value>,
}

#[derive(Deserialize)]
struct CollectionInfo {
    result: CollectionResult,
}

#[derive(Deserialize)]
struct CollectionResult {
    collections: Vec<Collection>,
}

#[derive(Deserialize)]
struct Collection {
    name: String,
}

#[derive(Serialize)]
struct SearchRequest<'a> {
    vector: &'a [f32],
    limit: usize,
    with_payload: bool,
}

#[derive(Deserialize)]
struct SearchResponse {
    result: Vec<ScoredPoint>,
}

#[derive(Deserialize)]
struct ScoredPoint {
    score: f32,
    #[serde(default)]
    payload: ChunkPayload,
}

#[derive(Deserialize, Default)]
struct ChunkPayload {
    #[serde(default)]
    chunk_id: String,
    #[serde(default)]
    text: String,
}

impl QdrantIndex {
    pub fn new(
        base_url: String,
        embedding_client: EmbeddingClient,
        collection_name: String,
    ) -> Self {
        Self {
            base_url,
            client: reqwest::Client::new(),
            embedding_client,
            collection_name,
        }
    }

    /// Create the collection sized to the embedding model, unless it exists
    pub async fn init_collection(&self) -> Result<()> {
        let url = format!("{}/collections", self.base_url);
        let response = self.client.get(&url).send().await
            .context("Failed to reach Qdrant")?;

        if !response.status().is_success() {
            anyhow::bail!("Failed to list collections: {}", response.status());
        }

        let info: CollectionInfo = response.json().await?;
        let exists = info.result.collections.iter()
            .any(|c| c.name == self.collection_name);

        if exists {
            info!(collection = %self.collection_name, "Collection already exists");
            return Ok(());
        }

        let dimension = self.embedding_client.get_dimension().await?;
        info!(collection = %self.collection_name, dimension, "Creating collection");

        let url = format!("{}/collections/{}", self.base_url, self.collection_name);
        let create_req = CreateCollection {
            vectors: VectorParams {
                size: dimension,
                distance: "Cosine".to_string(),
            },
        };

        let response = self.client
            .put(&url)
            .json(&create_req)
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = response.text().await?;
            anyhow::bail!("Failed to create collection: {}", error_text);
        }

        Ok(())
    }

    async fn build_point(&self, chunk: &ingest::Chunk) -> Result<Point> {
        let embedding = self.embedding_client
            .embed(&chunk.text)
            .await
            .context("Failed to generate embedding")?;

        let mut payload = HashMap::new();
        payload.insert("chunk_id".to_string(), serde_json::json!(chunk.chunk_id));
        payload.insert("doc_id".to_string(), serde_json::json!(chunk.doc_id));
        payload.insert("text".to_string(), serde_json::json!(chunk.text));
        payload.insert("source".to_string(), serde_json::json!(chunk.source));

        Ok(Point {
            id: point_id(&chunk.chunk_id),
            vector: embedding,
            payload,
        })
    }

    async fn upsert(&self, points: Vec<Point>) -> Result<()> {
        let url = format!(
            "{}/collections/{}/points?wait=true",
            self.base_url, self.collection_name
        );

        let response = self.client
            .put(&url)
            .json(&UpsertPoints { points })
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = response.text().await?;
            anyhow::bail!("Failed to upsert points: {}", error_text);
        }

        Ok(())
    }

}

#[async_trait]
impl ChunkIndex for QdrantIndex {
    async fn init(&self) -> Result<()> {
        self.init_collection().await
    }

    /// Embed and upsert chunks, returning how many were written
    async fn index_chunks(&self, chunks: &[ingest::Chunk]) -> Result<usize> {
        let mut written = 0;

        for batch in chunks.chunks(UPSERT_BATCH) {
            let mut points = Vec::with_capacity(batch.len());
            for chunk in batch {
                points.push(self.build_point(chunk).await?);
            }
            self.upsert(points).await?;
            written += batch.len();
            debug!(written, total = chunks.len(), "Upserted chunk batch");
        }

        Ok(written)
    }

    fn collection_name(&self) -> &str {
        &self.collection_name
    }
}

#[async_trait]
impl VectorIndex for QdrantIndex {
    #[instrument(skip(self))]
    async fn search(&self, query: &str, k: usize) -> Result<Vec<Passage>> {
        let query_embedding = self.embedding_client.embed(query).await
            .context("Failed to embed query")?;

        let url = format!(
            "{}/collections/{}/points/search",
            self.base_url, self.collection_name
        );

        let request = SearchRequest {
            vector: &query_embedding,
            limit: k,
            with_payload: true,
        };

        let response = self.client
            .post(&url)
            .json(&request)
            .send()
            .await
            .context("Failed to send search request to Qdrant")?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            anyhow::bail!("Qdrant search failed: {}", error_text);
        }

        let parsed: SearchResponse = response.json().await
            .context("Failed to parse Qdrant response")?;

        Ok(parsed.result
            .into_iter()
            .map(|point| Passage {
                chunk_id: point.payload.chunk_id,
                text: point.payload.text,
                score: point.score,
            })
            .collect())
    }
}

/// Chunk ids are hex digests; the first 64 bits make a stable point id
fn point_id(chunk_id: &str) -> u64 {
    chunk_id
        .get(..16)
        .and_then(|prefix| u64::from_str_radix(prefix, 16).ok())
        .unwrap_or_else(|| {
            use std::collections::hash_map::DefaultHasher;
            use std::hash::{Hash, Hasher};

            let mut hasher = DefaultHasher::new();
            chunk_id.hash(&mut hasher);
            hasher.finish()
        })
}
