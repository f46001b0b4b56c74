use anyhow::Result;
use async_trait::async_trait;
use extract::LanguageModel;
use query::VectorContextFetcher;
use std::sync::Arc;

use crate::Answerer;

/// Vanilla RAG: just vector search + LLM, no graph
pub struct VectorOnlyBaseline {
    vector: VectorContextFetcher,
    llm: Arc<dyn LanguageModel>,
}

impl VectorOnlyBaseline {
    pub fn new(vector: VectorContextFetcher, llm: Arc<dyn LanguageModel>) -> Self {
        Self { vector, llm }
    }

    fn build_prompt(question: &str, passages: &[index::Passage]) -> String {
        let mut context = String::new();
        for (i, passage) in passages.iter().enumerate() {
            context.push_str(&format!("[Chunk {}] {}\n\n", i + 1, passage.text));
        }

        format!(
            r#"Answer the question based on the provided context.

CONTEXT:
{}
QUESTION: {}

ANSWER:"#,
            context, question
        )
    }
}

#[async_trait]
impl Answerer for VectorOnlyBaseline {
    fn name(&self) -> &str {
        "vector_only"
    }

    async fn answer(&self, question: &str) -> Result<String> {
        let context = self.vector.fetch(question).await?;
        let prompt = Self::build_prompt(question, &context.passages);
        Ok(self.llm.generate(None, &prompt).await?)
    }
}
