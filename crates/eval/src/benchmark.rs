use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::info;

use crate::judge::Judge;
use crate::test_set::EvalCase;
use crate::Answerer;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnswerRecord {
    pub question: String,
    pub ground_truth: String,
    pub generated_answer: String,
    pub score: u8,
    /// Seconds, rounded to two decimals
    pub latency: f64,
}

impl AnswerRecord {
    pub fn is_error(&self) -> bool {
        self.generated_answer.starts_with("ERROR: ")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationSummary {
    pub system: String,
    pub total_questions: usize,
    pub errors: usize,
    pub avg_score: f64,
    pub median_score: f64,
    pub avg_latency: f64,
    pub p50_latency: f64,
    pub p95_latency: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub summary: EvaluationSummary,
    pub records: Vec<AnswerRecord>,
}

pub struct Evaluator {
    judge: Judge,
}

impl Evaluator {
    pub fn new(judge: Judge) -> Self {
        Self { judge }
    }

    /// Answer and grade every case in order. A failed answer is recorded
    /// as `ERROR: ...` and still graded, so one failure never stops the run.
    pub async fn run(&self, system: &dyn Answerer, cases: &[EvalCase]) -> EvaluationReport {
        info!(system = system.name(), questions = cases.len(), "Starting evaluation");
        let mut records = Vec::with_capacity(cases.len());

        for (i, case) in cases.iter().enumerate() {
            info!(question = i + 1, text = %case.question, "Running question");

            let start = Instant::now();
            let generated_answer = match system.answer(&case.question).await {
                Ok(answer) => answer,
                Err(e) => format!("ERROR: {:#}", e),
            };
            let latency = round2(start.elapsed().as_secs_f64());

            let score = self
                .judge
                .score(&case.question, &generated_answer, &case.ground_truth)
                .await;
            info!(score, latency, "Graded answer");

            records.push(AnswerRecord {
                question: case.question.clone(),
                ground_truth: case.ground_truth.clone(),
                generated_answer,
                score,
                latency,
            });
        }

        EvaluationReport {
            summary: summarize(system.name(), &records),
            records,
        }
    }
}

pub fn summarize(system: &str, records: &[AnswerRecord]) -> EvaluationSummary {
    let scores: Vec<f64> = records.iter().map(|r| r.score as f64).collect();
    let latencies: Vec<f64> = records.iter().map(|r| r.latency).collect();

    EvaluationSummary {
        system: system.to_string(),
        total_questions: records.len(),
        errors: records.iter().filter(|r| r.is_error()).count(),
        avg_score: mean(&scores),
        median_score: median(&scores),
        avg_latency: mean(&latencies),
        p50_latency: percentile(&latencies, 50.0),
        p95_latency: percentile(&latencies, 95.0),
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        statistical::mean(values)
    }
}

fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        statistical::median(values)
    }
}

/// Nearest-rank percentile
fn percentile(values: &[f64], p: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let rank = ((p / 100.0) * sorted.len() as f64).ceil() as usize;
    sorted[rank.clamp(1, sorted.len()) - 1]
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use async_trait::async_trait;
    use extract::{LanguageModel, LlmResult};
    use std::sync::Arc;

    struct FixedJudge;

    #[async_trait]
    impl LanguageModel for FixedJudge {
        async fn generate(&self, _system: Option<&str>, prompt: &str) -> LlmResult<String> {
            // Errors are graded as wrong
            Ok(if prompt.contains("Actual Answer: ERROR:") { "1" } else { "5" }.to_string())
        }

        fn model_name(&self) -> &str {
            "judge"
        }
    }

    struct FlakySystem;

    #[async_trait]
    impl Answerer for FlakySystem {
        fn name(&self) -> &str {
            "flaky"
        }

        async fn answer(&self, question: &str) -> Result<String> {
            if question.contains("fail") {
                anyhow::bail!("model unavailable");
            }
            Ok(format!("answer to {}", question))
        }
    }

    fn case(question: &str) -> EvalCase {
        EvalCase {
            question: question.to_string(),
            ground_truth: "truth".to_string(),
        }
    }

    fn record(score: u8, latency: f64) -> AnswerRecord {
        AnswerRecord {
            question: "q".into(),
            ground_truth: "t".into(),
            generated_answer: "a".into(),
            score,
            latency,
        }
    }

    #[tokio::test]
    async fn test_failed_answer_is_recorded_and_graded() {
        let evaluator = Evaluator::new(Judge::new(Arc::new(FixedJudge)));
        let report = evaluator
            .run(&FlakySystem, &[case("ok one"), case("please fail"), case("ok two")])
            .await;

        assert_eq!(report.records.len(), 3);
        assert_eq!(report.records[1].generated_answer, "ERROR: model unavailable");
        assert_eq!(report.records[1].score, 1);
        assert_eq!(report.summary.errors, 1);
        assert!((report.summary.avg_score - 11.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_summary_statistics() {
        let records = vec![
            record(5, 1.0),
            record(3, 2.0),
            record(1, 3.0),
            record(5, 10.0),
        ];
        let summary = summarize("hybrid", &records);

        assert_eq!(summary.avg_score, 3.5);
        assert_eq!(summary.median_score, 4.0);
        assert_eq!(summary.avg_latency, 4.0);
        assert_eq!(summary.p50_latency, 2.0);
        assert_eq!(summary.p95_latency, 10.0);
    }

    #[test]
    fn test_empty_summary() {
        let summary = summarize("hybrid", &[]);
        assert_eq!(summary.total_questions, 0);
        assert_eq!(summary.avg_score, 0.0);
        assert_eq!(summary.p95_latency, 0.0);
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(1.23456), 1.23);
        assert_eq!(round2(0.126), 0.13);
    }
}
