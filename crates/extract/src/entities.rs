use std::sync::Arc;
use tracing::{debug, instrument};

use crate::llm::{LanguageModel, LlmResult};
use crate::prompt::ENTITY_EXTRACTION_PROMPT;

/// Single-shot entity extraction from a clinical question.
///
/// The model output is not validated: conversational filler or an empty
/// reply comes back as degenerate entities (e.g. `[""]`) and downstream
/// lookups are expected to tolerate them.
#[derive(Clone)]
pub struct EntityExtractor {
    llm: Arc<dyn LanguageModel>,
}

impl EntityExtractor {
    pub fn new(llm: Arc<dyn LanguageModel>) -> Self {
        Self { llm }
    }

    #[instrument(skip(self))]
    pub async fn extract(&self, question: &str) -> LlmResult<Vec<String>> {
        let raw = self
            .llm
            .generate(Some(ENTITY_EXTRACTION_PROMPT), question)
            .await?;

        let entities = parse_entity_list(&raw);
        debug!(?entities, "Extracted entities");

        Ok(entities)
    }
}

/// Split a comma-separated model reply. Order and duplicates are kept.
pub fn parse_entity_list(raw: &str) -> Vec<String> {
    raw.split(',').map(|e| e.trim().to_string()).collect()
}
