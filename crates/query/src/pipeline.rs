use extract::{EntityExtractor, LanguageModel};
use index::{GraphStore, VectorIndex};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, instrument, warn};

use crate::config::RetrievalConfig;
use crate::error::{QueryError, QueryResult};
use crate::fusion::fuse;
use crate::generator::AnswerGenerator;
use crate::graph_context::{EntityLookup, GraphContextFetcher};
use crate::vector_context::VectorContextFetcher;

#[derive(Debug, Clone, Serialize)]
pub struct HybridAnswer {
    pub text: String,
    pub entities: Vec<String>,
    pub trace: AnswerTrace,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnswerTrace {
    pub lookups: Vec<EntityLookup>,
    pub passages: usize,
    pub graph_lines: usize,
    pub vector_context_size: usize,
    pub graph_context_size: usize,
    /// At least one graph lookup failed; the answer saw less graph context
    pub degraded: bool,
    pub elapsed_ms: u64,
}

/// Question in, grounded answer out. Holds only shared read-only handles,
/// so one instance serves every concurrent request.
#[derive(Clone)]
pub struct HybridSearchPipeline {
    extractor: EntityExtractor,
    graph: GraphContextFetcher,
    vector: VectorContextFetcher,
    generator: AnswerGenerator,
}

impl HybridSearchPipeline {
    pub fn new(
        llm: Arc<dyn LanguageModel>,
        vector_index: Arc<dyn VectorIndex>,
        graph_store: Arc<dyn GraphStore>,
        retrieval: &RetrievalConfig,
    ) -> Self {
        Self {
            extractor: EntityExtractor::new(llm.clone()),
            graph: GraphContextFetcher::new(graph_store, retrieval.graph_context_limit),
            vector: VectorContextFetcher::new(vector_index, retrieval.vector_top_k),
            generator: AnswerGenerator::new(llm),
        }
    }

    #[instrument(skip(self))]
    pub async fn answer(&self, question: &str) -> QueryResult<HybridAnswer> {
        if question.trim().is_empty() {
            return Err(QueryError::EmptyQuestion);
        }
        let started = Instant::now();

        let entities = self
            .extractor
            .extract(question)
            .await
            .map_err(QueryError::Extraction)?;
        info!(entities = ?entities, "Extracted entities");

        let (vector, graph) = tokio::join!(self.vector.fetch(question), self.graph.fetch(&entities));
        let vector = vector.map_err(QueryError::VectorRetrieval)?;

        let degraded = graph.is_degraded();
        if degraded {
            warn!("Graph context is incomplete, some entity lookups failed");
        }

        let fused = fuse(&vector, &graph);
        let text = self
            .generator
            .generate(question, &fused)
            .await
            .map_err(QueryError::Generation)?;

        let trace = AnswerTrace {
            passages: vector.passages.len(),
            graph_lines: graph.lines.len(),
            vector_context_size: fused.vector.len(),
            graph_context_size: fused.graph.len(),
            lookups: graph.lookups,
            degraded,
            elapsed_ms: started.elapsed().as_millis() as u64,
        };
        info!(
            passages = trace.passages,
            graph_lines = trace.graph_lines,
            elapsed_ms = trace.elapsed_ms,
            "Answer generated"
        );

        Ok(HybridAnswer {
            text,
            entities,
            trace,
        })
    }
}
