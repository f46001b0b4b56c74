use axum::{
    extract::{Query, State},
    http::{header, Method},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use extract::GraphTriple;
use index::{GraphBuilder, GraphInspector, IndexStats, Indexer};
use query::{AnswerTrace, GraphView, GraphVisualizationAdapter, HybridSearchPipeline};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::ApiError;
use crate::metrics::{Metrics, MetricsSnapshot, QueryOutcome, TimedOperation};

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<HybridSearchPipeline>,
    pub visualizer: Arc<GraphVisualizationAdapter>,
    pub graph_store: Arc<dyn GraphInspector>,
    pub indexer: Arc<Indexer>,
    pub graph_builder: Arc<GraphBuilder>,
    pub metrics: Arc<Metrics>,
    pub qdrant_url: String,
    pub model_name: String,
    pub graph_sample_limit: usize,
}

pub fn create_router(state: AppState, cors_enabled: bool) -> Router {
    let router = Router::new()
        .route("/health", get(health_check))
        .route("/query", post(answer_question))
        .route("/graph", post(graph_view))
        .route("/graph/dot", post(graph_dot))
        .route("/graph/sample", get(graph_sample))
        .route("/stats", get(get_stats))
        .route("/metrics", get(get_metrics))
        .route("/ingest", post(ingest_documents))
        .with_state(state);

    let router = if cors_enabled {
        router.layer(
            CorsLayer::new()
                .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                .allow_headers(Any)
                .allow_origin(Any),
        )
    } else {
        router
    };

    router.layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
}

#[derive(Serialize)]
struct HealthResponse {
    qdrant: String,
    neo4j: String,
    model: String,
}

async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let qdrant_status = match reqwest::get(&state.qdrant_url).await {
        Ok(resp) if resp.status().is_success() => "ok".to_string(),
        Ok(resp) => format!("error: status {}", resp.status()),
        Err(e) => format!("error: {}", e),
    };

    let neo4j_status = match state.graph_store.ping().await {
        Ok(()) => "ok".to_string(),
        Err(e) => format!("error: {:#}", e),
    };

    Json(HealthResponse {
        qdrant: qdrant_status,
        neo4j: neo4j_status,
        model: state.model_name.clone(),
    })
}

#[derive(Deserialize)]
struct QuestionRequest {
    question: String,
}

#[derive(Serialize)]
struct AnswerResponse {
    answer: String,
    entities: Vec<String>,
    trace: AnswerTrace,
}

async fn answer_question(
    State(state): State<AppState>,
    Json(req): Json<QuestionRequest>,
) -> Result<Json<AnswerResponse>, ApiError> {
    let timer = TimedOperation::start();
    let result = state.pipeline.answer(&req.question).await;

    let outcome = match &result {
        Ok(answer) => QueryOutcome::Answered {
            degraded: answer.trace.degraded,
        },
        Err(e) if e.is_rate_limited() => QueryOutcome::RateLimited,
        Err(_) => QueryOutcome::Failed,
    };
    state.metrics.record_query(timer.elapsed(), outcome);

    let answer = result?;
    Ok(Json(AnswerResponse {
        answer: answer.text,
        entities: answer.entities,
        trace: answer.trace,
    }))
}

#[derive(Deserialize)]
struct EntitiesRequest {
    entities: Vec<String>,
}

async fn graph_view(
    State(state): State<AppState>,
    Json(req): Json<EntitiesRequest>,
) -> Json<GraphView> {
    state.metrics.record_graph_view();
    Json(state.visualizer.build_graph_view(&req.entities).await)
}

async fn graph_dot(
    State(state): State<AppState>,
    Json(req): Json<EntitiesRequest>,
) -> impl IntoResponse {
    state.metrics.record_graph_view();
    let view = state.visualizer.build_graph_view(&req.entities).await;
    ([(header::CONTENT_TYPE, "text/vnd.graphviz")], view.to_dot())
}

#[derive(Deserialize)]
struct SampleParams {
    limit: Option<usize>,
}

async fn graph_sample(
    State(state): State<AppState>,
    Query(params): Query<SampleParams>,
) -> Result<Json<Vec<GraphTriple>>, ApiError> {
    let limit = params.limit.unwrap_or(state.graph_sample_limit);
    let triples = state.graph_store.sample_triples(limit).await?;
    Ok(Json(triples))
}

async fn get_stats(State(state): State<AppState>) -> Result<Json<IndexStats>, ApiError> {
    Ok(Json(state.indexer.get_stats().await?))
}

async fn get_metrics(State(state): State<AppState>) -> Json<MetricsSnapshot> {
    Json(state.metrics.snapshot())
}

#[derive(Deserialize)]
struct IngestRequest {
    path: String,
    #[serde(default = "default_build_graph")]
    build_graph: bool,
}

fn default_build_graph() -> bool {
    true
}

#[derive(Serialize)]
struct IngestResponse {
    job_id: Uuid,
    documents: usize,
    chunks_indexed: usize,
    graph_build_started: bool,
}

/// Chunks and embeds the documents under `path` right away. Graph
/// extraction is slow and rate limited, so it runs as a background job.
async fn ingest_documents(
    State(state): State<AppState>,
    Json(req): Json<IngestRequest>,
) -> Result<Json<IngestResponse>, ApiError> {
    let path = PathBuf::from(&req.path);
    if !path.exists() {
        return Err(ApiError::NotFound(format!("{} does not exist", req.path)));
    }

    let timer = TimedOperation::start();
    let documents = ingest::load_documents(&path).await?;
    if documents.is_empty() {
        return Err(ApiError::BadRequest(format!("no readable documents in {}", req.path)));
    }

    let document_count = documents.len();
    let chunks = ingest::chunk_documents(&documents, ingest::ChunkerConfig::default());
    let chunks_indexed = state.indexer.index_chunks(&chunks).await?;
    state.metrics.record_ingest(timer.elapsed(), chunks_indexed);

    let job_id = Uuid::new_v4();
    info!(%job_id, documents = document_count, chunks_indexed, "Indexed literature");

    if req.build_graph {
        let texts: Vec<String> = documents.into_iter().map(|d| d.text).collect();
        let builder = state.graph_builder.clone();
        let metrics = state.metrics.clone();

        tokio::spawn(async move {
            let report = builder.build(&texts).await;
            if report.batches_skipped > 0 {
                warn!(%job_id, skipped = report.batches_skipped, "Graph build skipped batches");
            }
            info!(%job_id, relations = report.relations_written, "Graph build job finished");
            metrics.record_graph_build(&report);
        });
    }

    Ok(Json(IngestResponse {
        job_id,
        documents: document_count,
        chunks_indexed,
        graph_build_started: req.build_graph,
    }))
}
