use extract::{GroqClient, LanguageModel, OllamaClient};
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;
use std::sync::Arc;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub llm: LlmConfig,
    pub embedding: EmbeddingConfig,
    pub stores: StoreConfig,
    pub retrieval: RetrievalConfig,
    pub ingest: IngestConfig,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    Groq,   // Hosted, OpenAI-compatible, rate limited
    Ollama, // Local
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    pub provider: LlmProvider,
    pub base_url: String,
    pub model: String,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    pub base_url: String,
    pub model: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    pub qdrant_url: String,
    pub qdrant_collection: String,
    pub neo4j_uri: String,
    pub neo4j_username: String,
    #[serde(skip_serializing, default)]
    pub neo4j_password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Passages taken from the vector index per question
    pub vector_top_k: usize,
    /// Graph lines per entity in the answer context
    pub graph_context_limit: usize,
    /// Graph edges per entity in the visualization
    pub graph_view_limit: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    pub batch_size: usize,
    pub batch_pause_secs: u64,
    pub max_rate_limit_retries: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            llm: LlmConfig {
                provider: LlmProvider::Groq,
                base_url: GroqClient::DEFAULT_BASE_URL.to_string(),
                model: "llama-3.3-70b-versatile".to_string(),
                api_key: None,
            },
            embedding: EmbeddingConfig {
                base_url: "http://localhost:11434".to_string(),
                model: "all-minilm".to_string(),
            },
            stores: StoreConfig {
                qdrant_url: "http://localhost:6333".to_string(),
                qdrant_collection: "medical_papers".to_string(),
                neo4j_uri: "bolt://localhost:7687".to_string(),
                neo4j_username: "neo4j".to_string(),
                neo4j_password: "password".to_string(),
            },
            retrieval: RetrievalConfig {
                vector_top_k: 2,
                graph_context_limit: 10,
                graph_view_limit: 20,
            },
            ingest: IngestConfig {
                batch_size: 5,
                batch_pause_secs: 2,
                max_rate_limit_retries: 20,
            },
        }
    }
}

impl AppConfig {
    /// Small hosted model, lowest latency
    pub fn fast() -> Self {
        let mut config = Self::default();
        config.llm.model = "llama-3.1-8b-instant".to_string();
        config
    }

    /// Large hosted model
    pub fn accurate() -> Self {
        let mut config = Self::default();
        config.llm.model = "llama-3.3-70b-versatile".to_string();
        config
    }

    /// Defaults overlaid with whatever is set in the environment
    pub fn from_env() -> anyhow::Result<Self> {
        let mut config = Self::default();

        if let Some(provider) = var("LLM_PROVIDER") {
            config.llm.provider = match provider.to_lowercase().as_str() {
                "groq" => LlmProvider::Groq,
                "ollama" => {
                    config.llm.base_url = "http://localhost:11434".to_string();
                    config.llm.model = "llama3.1".to_string();
                    LlmProvider::Ollama
                }
                other => anyhow::bail!("Unknown LLM_PROVIDER '{}'", other),
            };
        }
        overlay(&mut config.llm.base_url, "LLM_BASE_URL");
        overlay(&mut config.llm.model, "LLM_MODEL");
        config.llm.api_key = var("GROQ_API_KEY");

        overlay(&mut config.embedding.base_url, "EMBEDDING_URL");
        overlay(&mut config.embedding.model, "EMBEDDING_MODEL");

        overlay(&mut config.stores.qdrant_url, "QDRANT_URL");
        overlay(&mut config.stores.qdrant_collection, "QDRANT_COLLECTION");
        overlay(&mut config.stores.neo4j_uri, "NEO4J_URI");
        overlay(&mut config.stores.neo4j_username, "NEO4J_USERNAME");
        overlay(&mut config.stores.neo4j_password, "NEO4J_PASSWORD");

        overlay_parsed(&mut config.retrieval.vector_top_k, "VECTOR_TOP_K")?;
        overlay_parsed(&mut config.retrieval.graph_context_limit, "GRAPH_CONTEXT_LIMIT")?;
        overlay_parsed(&mut config.retrieval.graph_view_limit, "GRAPH_VIEW_LIMIT")?;
        overlay_parsed(&mut config.ingest.batch_size, "INGEST_BATCH_SIZE")?;

        if config.llm.provider == LlmProvider::Groq && config.llm.api_key.is_none() {
            anyhow::bail!("GROQ_API_KEY must be set when LLM_PROVIDER is groq");
        }

        Ok(config)
    }
}

impl LlmConfig {
    /// Client for the configured provider
    pub fn build_client(&self) -> anyhow::Result<Arc<dyn LanguageModel>> {
        self.build(false)
    }

    /// Client for ingestion-time graph extraction; Ollama is put in JSON mode
    pub fn build_extraction_client(&self) -> anyhow::Result<Arc<dyn LanguageModel>> {
        self.build(true)
    }

    fn build(&self, json_output: bool) -> anyhow::Result<Arc<dyn LanguageModel>> {
        let client: Arc<dyn LanguageModel> = match self.provider {
            LlmProvider::Groq => {
                let api_key = self
                    .api_key
                    .clone()
                    .ok_or_else(|| anyhow::anyhow!("Groq needs an API key"))?;
                Arc::new(GroqClient::new(self.base_url.clone(), api_key, self.model.clone()))
            }
            LlmProvider::Ollama => {
                let client = OllamaClient::new(self.base_url.clone(), self.model.clone());
                if json_output {
                    Arc::new(client.with_json_output())
                } else {
                    Arc::new(client)
                }
            }
        };
        Ok(client)
    }
}

fn var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn overlay(field: &mut String, key: &str) {
    if let Some(value) = var(key) {
        *field = value;
    }
}

fn overlay_parsed<T>(field: &mut T, key: &str) -> anyhow::Result<()>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    if let Some(value) = var(key) {
        *field = value
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid {} '{}': {}", key, value, e))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_caps() {
        let config = AppConfig::default();
        assert_eq!(config.retrieval.vector_top_k, 2);
        assert_eq!(config.retrieval.graph_context_limit, 10);
        assert_eq!(config.retrieval.graph_view_limit, 20);
        assert_eq!(config.ingest.batch_size, 5);
    }

    #[test]
    fn test_presets_differ_only_in_model() {
        let fast = AppConfig::fast();
        let accurate = AppConfig::accurate();
        assert_eq!(fast.llm.model, "llama-3.1-8b-instant");
        assert_eq!(accurate.llm.model, "llama-3.3-70b-versatile");
        assert_eq!(fast.retrieval.vector_top_k, accurate.retrieval.vector_top_k);
    }

    #[test]
    fn test_groq_client_requires_key() {
        let config = AppConfig::default();
        assert!(config.llm.build_client().is_err());

        let mut local = AppConfig::default();
        local.llm.provider = LlmProvider::Ollama;
        let client = local.llm.build_client().unwrap();
        assert_eq!(client.model_name(), "llama-3.3-70b-versatile");
    }

    #[test]
    fn test_secrets_are_not_serialized() {
        let mut config = AppConfig::default();
        config.llm.api_key = Some("gsk_secret".to_string());

        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("gsk_secret"));
        assert!(!json.contains("password"));
    }
}
