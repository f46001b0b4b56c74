use extract::{LanguageModel, LlmResult};
use std::sync::Arc;
use tracing::instrument;

use crate::fusion::FusedContext;

/// The answer prompt. Blocks are labelled by source so the model can weigh
/// literature against graph relationships.
pub fn render_prompt(question: &str, context: &FusedContext) -> String {
    format!(
        "You are an advanced AI Medical Assistant. Answer the question using the provided context.\n\
         \n\
         CONTEXT FROM VECTOR DB (Literature):\n\
         {vector}\n\
         \n\
         CONTEXT FROM KNOWLEDGE GRAPH (Relationships):\n\
         {graph}\n\
         \n\
         Question: {question}\n\
         Answer:",
        vector = context.vector,
        graph = context.graph,
        question = question,
    )
}

#[derive(Clone)]
pub struct AnswerGenerator {
    llm: Arc<dyn LanguageModel>,
}

impl AnswerGenerator {
    pub fn new(llm: Arc<dyn LanguageModel>) -> Self {
        Self { llm }
    }

    /// One model call; the reply is returned untouched.
    #[instrument(skip(self, question, context), fields(model = self.llm.model_name()))]
    pub async fn generate(&self, question: &str, context: &FusedContext) -> LlmResult<String> {
        let prompt = render_prompt(question, context);
        self.llm.generate(None, &prompt).await
    }
}
