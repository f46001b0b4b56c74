//! End-to-end runs of the hybrid pipeline against stub model and stores.

mod common;

use common::{StubGraphStore, StubModel, StubVectorIndex};
use query::{
    AppConfig, GraphVisualizationAdapter, HybridSearchPipeline, LookupStatus, QueryError,
    NO_GRAPH_CONNECTIONS, NO_LITERATURE,
};
use std::sync::Arc;

fn gvhd_graph() -> Arc<StubGraphStore> {
    Arc::new(StubGraphStore::new(&[
        ("Cyclosporine", "TREATS", "GVHD"),
        ("Methotrexate", "PREVENTS", "GVHD"),
        ("Chloroquine", "AFFECTS", "Immune response"),
    ]))
}

fn pipeline(model: Arc<StubModel>, vector: StubVectorIndex) -> HybridSearchPipeline {
    let config = AppConfig::default();
    HybridSearchPipeline::new(model, Arc::new(vector), gvhd_graph(), &config.retrieval)
}

#[tokio::test]
async fn test_gvhd_question_with_empty_literature() {
    let model = Arc::new(StubModel::new("GVHD, Chloroquine", "Cyclosporine is used."));
    let pipeline = pipeline(model.clone(), StubVectorIndex::with_texts(&[]));

    let answer = pipeline
        .answer("Does chloroquine help prevent GVHD?")
        .await
        .unwrap();

    assert_eq!(answer.text, "Cyclosporine is used.");
    assert_eq!(answer.entities, vec!["GVHD", "Chloroquine"]);
    assert_eq!(answer.trace.passages, 0);
    assert_eq!(answer.trace.graph_lines, 3);
    assert!(!answer.trace.degraded);

    let prompt = model.last_prompt().unwrap();
    assert!(prompt.contains(
        "CONTEXT FROM KNOWLEDGE GRAPH (Relationships):\n\
         Cyclosporine TREATS GVHD\n\
         Methotrexate PREVENTS GVHD\n\
         Chloroquine AFFECTS Immune response\n"
    ));
    assert!(prompt.contains(&format!("CONTEXT FROM VECTOR DB (Literature):\n{}\n", NO_LITERATURE)));
    assert!(prompt.ends_with("Question: Does chloroquine help prevent GVHD?\nAnswer:"));
}

#[tokio::test]
async fn test_literature_is_capped_at_k() {
    let model = Arc::new(StubModel::new("Zebra", "answer"));
    let vector = StubVectorIndex::with_texts(&["first", "second", "third"]);

    let answer = pipeline(model.clone(), vector).answer("q").await.unwrap();
    let prompt = model.last_prompt().unwrap();

    assert_eq!(answer.trace.passages, 2);
    assert!(prompt.contains("first\nsecond\n"));
    assert!(!prompt.contains("third"));
    assert!(prompt.contains(NO_GRAPH_CONNECTIONS));
    assert_eq!(answer.trace.lookups[0].status, LookupStatus::NoMatch);
}

#[tokio::test]
async fn test_identical_stubs_give_identical_answers() {
    let run = || async {
        let model = Arc::new(StubModel::new("GVHD", "deterministic"));
        let pipeline = pipeline(model.clone(), StubVectorIndex::with_texts(&["passage"]));
        let answer = pipeline.answer("q").await.unwrap();
        (answer.text, answer.entities, answer.trace.lookups, model.last_prompt())
    };

    assert_eq!(run().await, run().await);
}

#[tokio::test]
async fn test_empty_question_is_rejected() {
    let model = Arc::new(StubModel::new("GVHD", "unused"));
    let err = pipeline(model.clone(), StubVectorIndex::with_texts(&[]))
        .answer("   ")
        .await
        .unwrap_err();

    assert!(matches!(err, QueryError::EmptyQuestion));
    assert!(model.prompts.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_blank_extraction_still_answers() {
    let model = Arc::new(StubModel::new("", "I am not sure."));
    let answer = pipeline(model.clone(), StubVectorIndex::with_texts(&["passage"]))
        .answer("hello?")
        .await
        .unwrap();

    assert_eq!(answer.entities, vec![""]);
    assert_eq!(answer.trace.lookups[0].status, LookupStatus::Skipped);
    assert!(model.last_prompt().unwrap().contains(NO_GRAPH_CONNECTIONS));
}

#[tokio::test]
async fn test_vector_failure_propagates() {
    let model = Arc::new(StubModel::new("GVHD", "unused"));
    let err = pipeline(model, StubVectorIndex::failing())
        .answer("q")
        .await
        .unwrap_err();

    assert!(matches!(err, QueryError::VectorRetrieval(_)));
}

#[tokio::test]
async fn test_rate_limited_extraction_propagates() {
    let model = Arc::new(StubModel::rate_limited());
    let err = pipeline(model, StubVectorIndex::with_texts(&[]))
        .answer("q")
        .await
        .unwrap_err();

    assert!(matches!(err, QueryError::Extraction(_)));
    assert!(err.is_rate_limited());
}

#[tokio::test]
async fn test_answer_entities_drive_the_graph_view() {
    let model = Arc::new(StubModel::new("Cyclosporine, Methotrexate", "answer"));
    let answer = pipeline(model, StubVectorIndex::with_texts(&[]))
        .answer("How is GVHD handled?")
        .await
        .unwrap();

    let adapter = GraphVisualizationAdapter::new(gvhd_graph(), 20);
    let view = adapter.build_graph_view(&answer.entities).await;

    let ids: Vec<_> = view.nodes.iter().map(|n| n.id.as_str()).collect();
    assert_eq!(ids, vec!["Cyclosporine", "GVHD", "Methotrexate"]);
    assert_eq!(view.edges.len(), 2);
}
