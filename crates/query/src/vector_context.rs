use index::{Passage, VectorIndex};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Placed in the prompt when the vector index returned nothing
pub const NO_LITERATURE: &str = "No relevant literature found.";

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct VectorContext {
    pub passages: Vec<Passage>,
}

impl VectorContext {
    pub fn text(&self) -> String {
        if self.passages.is_empty() {
            return NO_LITERATURE.to_string();
        }
        self.passages
            .iter()
            .map(|p| p.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[derive(Clone)]
pub struct VectorContextFetcher {
    index: Arc<dyn VectorIndex>,
    k: usize,
}

impl VectorContextFetcher {
    pub fn new(index: Arc<dyn VectorIndex>, k: usize) -> Self {
        Self { index, k }
    }

    /// Top-k passages for the question in rank order. Errors propagate.
    #[instrument(skip(self, question), fields(k = self.k))]
    pub async fn fetch(&self, question: &str) -> anyhow::Result<VectorContext> {
        let mut passages = self.index.search(question, self.k).await?;
        passages.truncate(self.k);

        debug!(passages = passages.len(), "Vector context retrieved");
        Ok(VectorContext { passages })
    }
}
