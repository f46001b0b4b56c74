use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Sentence embeddings from an Ollama server (MiniLM-L6-v2 by default)
#[derive(Clone)]
pub struct EmbeddingClient {
    base_url: String,
    model: String,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    embedding: Vec<f32>,
}

impl EmbeddingClient {
    pub fn new(base_url: String, model: String) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
            client: reqwest::Client::new(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/api/embeddings", self.base_url)
    }

    pub async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let request = EmbeddingRequest {
            model: &self.model,
            prompt: text,
        };

        let response = self
            .client
            .post(self.endpoint())
            .json(&request)
            .send()
            .await
            .with_context(|| format!("Embedding service unreachable at {}", self.base_url))?;

        if !response.status().is_success() {
            anyhow::bail!("Embedding request failed: {}", response.status());
        }

        let body: EmbeddingResponse = response
            .json()
            .await
            .context("Failed to parse embedding response")?;

        if body.embedding.is_empty() {
            anyhow::bail!("Embedding model '{}' returned an empty vector", self.model);
        }

        Ok(body.embedding)
    }

    /// Vector size of the configured model, probed with one request
    pub async fn get_dimension(&self) -> Result<usize> {
        Ok(self.embed("dimension probe").await?.len())
    }
}
