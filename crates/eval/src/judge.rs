use extract::LanguageModel;
use std::sync::Arc;
use tracing::warn;

/// Used when the judge's reply is not a usable score
pub const NEUTRAL_SCORE: u8 = 3;

fn grading_prompt(question: &str, ground_truth: &str, answer: &str) -> String {
    format!(
        r#"You are an academic grader. Compare the ACTUAL ANSWER with the GROUND TRUTH.

Question: {question}
Ground Truth: {ground_truth}
Actual Answer: {answer}

Criteria:
- 5: Perfect fact retrieval + correct reasoning.
- 3: Partially correct but missed key link.
- 1: Wrong or Hallucinated.

Output ONLY the integer score (1-5)."#
    )
}

/// A bare integer from 1 to 5, surrounding whitespace allowed
pub fn parse_score(raw: &str) -> Option<u8> {
    raw.trim()
        .parse::<u8>()
        .ok()
        .filter(|score| (1..=5).contains(score))
}

/// LLM-as-judge grading against a reference answer.
#[derive(Clone)]
pub struct Judge {
    llm: Arc<dyn LanguageModel>,
}

impl Judge {
    pub fn new(llm: Arc<dyn LanguageModel>) -> Self {
        Self { llm }
    }

    /// Never fails: model errors and unparsable replies score neutral.
    pub async fn score(&self, question: &str, answer: &str, ground_truth: &str) -> u8 {
        let prompt = grading_prompt(question, ground_truth, answer);

        match self.llm.generate(None, &prompt).await {
            Ok(reply) => parse_score(&reply).unwrap_or_else(|| {
                warn!(reply = %reply, "Judge reply is not a score, using neutral");
                NEUTRAL_SCORE
            }),
            Err(e) => {
                warn!(error = %e, "Judge call failed, using neutral score");
                NEUTRAL_SCORE
            }
        }
    }
}
