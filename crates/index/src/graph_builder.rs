use extract::GraphExtractor;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{error, info, instrument, warn};

use crate::retry::RateLimitRetry;
use crate::store::GraphWriter;

#[derive(Debug, Clone)]
pub struct BatchPolicy {
    pub batch_size: usize,
    pub batch_pause: Duration,
    pub max_rate_limit_retries: usize,
}

impl Default for BatchPolicy {
    fn default() -> Self {
        Self {
            batch_size: 5,
            batch_pause: Duration::from_secs(2),
            max_rate_limit_retries: 20,
        }
    }
}

#[derive(Debug, Default, Clone, Serialize)]
pub struct BuildReport {
    pub batches: usize,
    pub batches_written: usize,
    pub batches_skipped: usize,
    pub documents_written: usize,
    pub relations_written: usize,
    pub rate_limit_waits: usize,
}

/// Populates the knowledge graph from texts in small batches, waiting out
/// provider rate limits and skipping batches that fail for other reasons.
pub struct GraphBuilder {
    extractor: GraphExtractor,
    writer: Arc<dyn GraphWriter>,
    policy: BatchPolicy,
}

impl GraphBuilder {
    pub fn new(extractor: GraphExtractor, writer: Arc<dyn GraphWriter>) -> Self {
        Self {
            extractor,
            writer,
            policy: BatchPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: BatchPolicy) -> Self {
        self.policy = policy;
        self
    }

    #[instrument(skip(self, texts), fields(texts = texts.len()))]
    pub async fn build(&self, texts: &[String]) -> BuildReport {
        let mut report = BuildReport::default();
        let retry = RateLimitRetry::new(self.policy.max_rate_limit_retries);
        let batch_size = self.policy.batch_size.max(1);
        let total_batches = texts.len().div_ceil(batch_size);

        for (index, batch) in texts.chunks(batch_size).enumerate() {
            report.batches += 1;
            info!(batch = index + 1, total_batches, "Processing batch");

            let outcome = retry
                .run("graph_extraction", || self.extractor.extract_batch(batch))
                .await;
            report.rate_limit_waits += outcome.waits;

            match outcome.result {
                Ok(documents) => {
                    let relations: usize = documents.iter().map(|d| d.relations.len()).sum();
                    match self.writer.write_documents(&documents).await {
                        Ok(()) => {
                            report.batches_written += 1;
                            report.documents_written += documents.len();
                            report.relations_written += relations;
                        }
                        Err(e) => {
                            error!(batch = index + 1, error = %e, "Failed to write batch, skipping");
                            report.batches_skipped += 1;
                        }
                    }
                }
                Err(e) => {
                    warn!(batch = index + 1, error = %e, "Extraction failed, skipping batch");
                    report.batches_skipped += 1;
                }
            }

            if index + 1 < total_batches {
                sleep(self.policy.batch_pause).await;
            }
        }

        info!(
            written = report.batches_written,
            skipped = report.batches_skipped,
            relations = report.relations_written,
            "Graph build finished"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use async_trait::async_trait;
    use extract::{GraphDocument, LanguageModel, LlmError, LlmResult};
    use std::collections::VecDeque;
    use std::sync::Mutex;

    const DOC_JSON: &str = r#"{"nodes":[{"id":"Cyclosporine","type":"Drug"},{"id":"GVHD","type":"Disease"}],"relationships":[{"source":"Cyclosporine","target":"GVHD","type":"TREATS"}]}"#;

    struct ScriptedModel {
        replies: Mutex<VecDeque<LlmResult<String>>>,
    }

    #[async_trait]
    impl LanguageModel for ScriptedModel {
        async fn generate(&self, _system: Option<&str>, _prompt: &str) -> LlmResult<String> {
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(DOC_JSON.to_string()))
        }

        fn model_name(&self) -> &str {
            "scripted"
        }
    }

    #[derive(Default)]
    struct RecordingWriter {
        written: Mutex<Vec<GraphDocument>>,
    }

    #[async_trait]
    impl GraphWriter for RecordingWriter {
        async fn write_documents(&self, documents: &[GraphDocument]) -> Result<()> {
            self.written.lock().unwrap().extend_from_slice(documents);
            Ok(())
        }
    }

    fn builder(replies: Vec<LlmResult<String>>, writer: Arc<RecordingWriter>) -> GraphBuilder {
        let model = Arc::new(ScriptedModel {
            replies: Mutex::new(replies.into()),
        });
        GraphBuilder::new(GraphExtractor::new(model), writer)
    }

    fn texts(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("abstract {}", i)).collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_builds_all_batches() {
        let writer = Arc::new(RecordingWriter::default());
        let report = builder(vec![], writer.clone()).build(&texts(12)).await;

        assert_eq!(report.batches, 3);
        assert_eq!(report.batches_written, 3);
        assert_eq!(report.documents_written, 12);
        assert_eq!(report.relations_written, 12);
        assert_eq!(writer.written.lock().unwrap().len(), 12);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limited_batch_is_retried() {
        let writer = Arc::new(RecordingWriter::default());
        let replies = vec![Err(LlmError::RateLimited(
            "Rate limit reached. Please try again in 1m5s".to_string(),
        ))];
        let started = tokio::time::Instant::now();

        let report = builder(replies, writer.clone()).build(&texts(3)).await;

        assert_eq!(report.rate_limit_waits, 1);
        assert_eq!(report.batches_written, 1);
        assert_eq!(report.documents_written, 3);
        assert!(started.elapsed() >= Duration::from_secs(75));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_batch_is_skipped() {
        let writer = Arc::new(RecordingWriter::default());
        let replies = vec![Err(LlmError::Service {
            status: 500,
            body: "boom".to_string(),
        })];

        let report = builder(replies, writer.clone()).build(&texts(7)).await;

        assert_eq!(report.batches, 2);
        assert_eq!(report.batches_skipped, 1);
        assert_eq!(report.batches_written, 1);
        assert_eq!(writer.written.lock().unwrap().len(), 2);
    }
}
