pub mod baseline;
pub mod benchmark;
pub mod judge;
pub mod plots;
pub mod report;
pub mod test_set;

pub use baseline::VectorOnlyBaseline;
pub use benchmark::{AnswerRecord, EvaluationReport, EvaluationSummary, Evaluator};
pub use judge::{parse_score, Judge};
pub use plots::generate_plots;
pub use test_set::{load_test_set, medical_test_set, EvalCase};

use anyhow::Result;
use async_trait::async_trait;
use query::HybridSearchPipeline;

/// A question-answering system under evaluation
#[async_trait]
pub trait Answerer: Send + Sync {
    fn name(&self) -> &str;

    async fn answer(&self, question: &str) -> Result<String>;
}

#[async_trait]
impl Answerer for HybridSearchPipeline {
    fn name(&self) -> &str {
        "hybrid"
    }

    async fn answer(&self, question: &str) -> Result<String> {
        let answer = HybridSearchPipeline::answer(self, question).await?;
        Ok(answer.text)
    }
}
