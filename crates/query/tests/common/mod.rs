//! Stub model and stores shared by the pipeline integration tests.

use async_trait::async_trait;
use extract::{GraphTriple, LanguageModel, LlmError, LlmResult};
use index::{GraphStore, Passage, VectorIndex};
use std::sync::Mutex;

/// Answers the entity-extraction call (sent with a system instruction) and
/// the answer call (sent without) from fixed replies, and keeps every
/// prompt it was given.
pub struct StubModel {
    /// `None` makes the extraction call fail with a rate limit
    entity_reply: Option<String>,
    answer_reply: String,
    pub prompts: Mutex<Vec<String>>,
}

impl StubModel {
    pub fn new(entity_reply: &str, answer_reply: &str) -> Self {
        Self {
            entity_reply: Some(entity_reply.to_string()),
            answer_reply: answer_reply.to_string(),
            prompts: Mutex::new(Vec::new()),
        }
    }

    #[allow(dead_code)]
    pub fn rate_limited() -> Self {
        Self {
            entity_reply: None,
            answer_reply: String::new(),
            prompts: Mutex::new(Vec::new()),
        }
    }

    #[allow(dead_code)]
    pub fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl LanguageModel for StubModel {
    async fn generate(&self, system: Option<&str>, prompt: &str) -> LlmResult<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        match system {
            Some(_) => self
                .entity_reply
                .clone()
                .ok_or_else(|| LlmError::RateLimited("Please try again in 7s".to_string())),
            None => Ok(self.answer_reply.clone()),
        }
    }

    fn model_name(&self) -> &str {
        "stub"
    }
}

pub struct StubVectorIndex {
    pub passages: Vec<Passage>,
    pub fail: bool,
}

impl StubVectorIndex {
    pub fn with_texts(texts: &[&str]) -> Self {
        let passages = texts
            .iter()
            .enumerate()
            .map(|(i, text)| Passage {
                chunk_id: format!("chunk-{}", i),
                text: text.to_string(),
                score: 1.0 - i as f32 * 0.1,
            })
            .collect();
        Self { passages, fail: false }
    }

    #[allow(dead_code)]
    pub fn failing() -> Self {
        Self { passages: Vec::new(), fail: true }
    }
}

#[async_trait]
impl VectorIndex for StubVectorIndex {
    async fn search(&self, _query: &str, k: usize) -> anyhow::Result<Vec<Passage>> {
        if self.fail {
            anyhow::bail!("qdrant unreachable");
        }
        Ok(self.passages.iter().take(k).cloned().collect())
    }
}

/// Case-insensitive substring match over a fixed edge list, like the
/// Neo4j query does
pub struct StubGraphStore {
    pub edges: Vec<GraphTriple>,
}

impl StubGraphStore {
    pub fn new(edges: &[(&str, &str, &str)]) -> Self {
        Self {
            edges: edges
                .iter()
                .map(|(s, r, t)| GraphTriple::new(*s, *r, *t))
                .collect(),
        }
    }
}

#[async_trait]
impl GraphStore for StubGraphStore {
    async fn match_triples(&self, term: &str, limit: usize) -> anyhow::Result<Vec<GraphTriple>> {
        let needle = term.to_lowercase();
        Ok(self
            .edges
            .iter()
            .filter(|t| {
                t.source.to_lowercase().contains(&needle) || t.target.to_lowercase().contains(&needle)
            })
            .take(limit)
            .cloned()
            .collect())
    }
}
