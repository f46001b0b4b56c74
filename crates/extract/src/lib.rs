pub mod entities;
pub mod llm;
pub mod prompt;
pub mod rate_limit;
pub mod sanitize;
pub mod schema;

pub use entities::{parse_entity_list, EntityExtractor};
pub use llm::{GroqClient, LanguageModel, LlmError, LlmResult, OllamaClient};
pub use rate_limit::parse_wait_time;
pub use sanitize::sanitize;
pub use schema::{
    GraphDocument, GraphTriple, NodeKind, RawGraph, RelationKind, TypedNode, TypedRelation,
};

use std::sync::Arc;
use tracing::{debug, warn};

/// Converts free text into a typed medical sub-graph (ingestion side).
#[derive(Clone)]
pub struct GraphExtractor {
    llm: Arc<dyn LanguageModel>,
    max_json_attempts: usize,
}

impl GraphExtractor {
    pub fn new(llm: Arc<dyn LanguageModel>) -> Self {
        Self {
            llm,
            max_json_attempts: 3,
        }
    }

    pub fn with_max_json_attempts(mut self, attempts: usize) -> Self {
        self.max_json_attempts = attempts.max(1);
        self
    }

    /// Extract a graph document from one text. Model errors (including rate
    /// limits) are returned as-is so the caller can decide to wait or skip.
    pub async fn extract_graph(&self, text: &str) -> LlmResult<GraphDocument> {
        let request = prompt::build_graph_extraction_prompt(text);
        let json_str = self.generate_json_with_retry(&request).await?;

        let raw: RawGraph = serde_json::from_str(&json_str)
            .map_err(|e| LlmError::InvalidResponse(format!("extraction schema mismatch: {}", e)))?;
        let document = raw.into_document();

        debug!(
            nodes = document.nodes.len(),
            relations = document.relations.len(),
            "Extracted graph document"
        );
        Ok(document)
    }

    /// Extract every text of a batch, failing on the first error
    pub async fn extract_batch(&self, texts: &[String]) -> LlmResult<Vec<GraphDocument>> {
        let mut documents = Vec::with_capacity(texts.len());
        for text in texts {
            documents.push(self.extract_graph(text).await?);
        }
        Ok(documents)
    }

    /// Generate with retry for invalid JSON
    async fn generate_json_with_retry(&self, request: &str) -> LlmResult<String> {
        let mut response = self.llm.generate(None, request).await?;

        for attempt in 1..=self.max_json_attempts {
            let candidate = strip_code_fence(&response);
            if serde_json::from_str::<serde_json::Value>(candidate).is_ok() {
                return Ok(candidate.to_string());
            }

            if attempt == self.max_json_attempts {
                break;
            }

            warn!(attempt, "Model returned invalid JSON, asking for a correction");
            let retry_prompt = prompt::build_retry_prompt(candidate);
            response = self.llm.generate(None, &retry_prompt).await?;
        }

        Err(LlmError::InvalidResponse(format!(
            "no valid JSON after {} attempts",
            self.max_json_attempts
        )))
    }
}

/// Models like to wrap JSON in ```json fences even when told not to
fn strip_code_fence(response: &str) -> &str {
    let trimmed = response.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    inner.strip_suffix("```").unwrap_or(inner).trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    struct ScriptedModel {
        replies: Mutex<VecDeque<LlmResult<String>>>,
    }

    impl ScriptedModel {
        fn new(replies: Vec<LlmResult<String>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into()),
            })
        }
    }

    #[async_trait]
    impl LanguageModel for ScriptedModel {
        async fn generate(&self, _system: Option<&str>, _prompt: &str) -> LlmResult<String> {
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(LlmError::InvalidResponse("script exhausted".into())))
        }

        fn model_name(&self) -> &str {
            "scripted"
        }
    }

    const GVHD_JSON: &str = r#"{"nodes":[{"id":"Cyclosporine","type":"Drug"},{"id":"GVHD","type":"Disease"}],"relationships":[{"source":"Cyclosporine","target":"GVHD","type":"TREATS"}]}"#;

    #[test]
    fn test_strip_code_fence() {
        assert_eq!(strip_code_fence("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fence("  {\"a\":1} "), "{\"a\":1}");
    }

    #[tokio::test]
    async fn test_extract_graph_parses_typed_document() {
        let model = ScriptedModel::new(vec![Ok(format!("```json\n{}\n```", GVHD_JSON))]);
        let extractor = GraphExtractor::new(model);

        let doc = extractor.extract_graph("Cyclosporine treats GVHD.").await.unwrap();

        assert_eq!(doc.nodes.len(), 2);
        assert_eq!(doc.relations[0].kind, RelationKind::Treats);
    }

    #[tokio::test]
    async fn test_invalid_json_is_corrected() {
        let model = ScriptedModel::new(vec![
            Ok("{nodes: oops".to_string()),
            Ok(GVHD_JSON.to_string()),
        ]);
        let extractor = GraphExtractor::new(model);

        let doc = extractor.extract_graph("text").await.unwrap();
        assert_eq!(doc.relations.len(), 1);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let model = ScriptedModel::new(vec![
            Ok("nope".to_string()),
            Ok("still nope".to_string()),
        ]);
        let extractor = GraphExtractor::new(model).with_max_json_attempts(2);

        let err = extractor.extract_graph("text").await.unwrap_err();
        assert!(matches!(err, LlmError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_rate_limit_is_passed_through() {
        let model = ScriptedModel::new(vec![Err(LlmError::RateLimited(
            "try again in 1m5s".to_string(),
        ))]);
        let extractor = GraphExtractor::new(model);

        let err = extractor.extract_graph("text").await.unwrap_err();
        assert!(err.is_rate_limited());
    }
}
