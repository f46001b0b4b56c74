mod config;
mod error;
mod metrics;
mod routes;

use anyhow::{Context, Result};
use extract::GraphExtractor;
use index::{BatchPolicy, EmbeddingClient, GraphBuilder, Indexer, Neo4jGraphStore, QdrantIndex};
use query::{GraphVisualizationAdapter, HybridSearchPipeline};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

use config::{LogFormat, ServerConfig};
use metrics::Metrics;
use routes::{create_router, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let config = ServerConfig::from_env()?;
    init_tracing(config.log_format);

    let app = &config.app;
    info!(
        provider = ?app.llm.provider,
        model = %app.llm.model,
        "Starting clinical QA service"
    );

    let llm = app.llm.build_client()?;

    let graph_store = Arc::new(
        Neo4jGraphStore::connect(
            &app.stores.neo4j_uri,
            &app.stores.neo4j_username,
            &app.stores.neo4j_password,
        )
        .await?,
    );

    let embedding_client = EmbeddingClient::new(
        app.embedding.base_url.clone(),
        app.embedding.model.clone(),
    );
    let vector_index = Arc::new(QdrantIndex::new(
        app.stores.qdrant_url.clone(),
        embedding_client,
        app.stores.qdrant_collection.clone(),
    ));

    let indexer = Arc::new(Indexer::new(vector_index.clone(), graph_store.clone()));
    indexer.init().await.context("Failed to initialize stores")?;

    let pipeline = HybridSearchPipeline::new(
        llm.clone(),
        vector_index,
        graph_store.clone(),
        &app.retrieval,
    );
    let visualizer =
        GraphVisualizationAdapter::new(graph_store.clone(), app.retrieval.graph_view_limit);

    let extraction_llm = app.llm.build_extraction_client()?;
    let graph_builder = GraphBuilder::new(GraphExtractor::new(extraction_llm), graph_store.clone())
        .with_policy(BatchPolicy {
            batch_size: app.ingest.batch_size,
            batch_pause: Duration::from_secs(app.ingest.batch_pause_secs),
            max_rate_limit_retries: app.ingest.max_rate_limit_retries,
        });

    let state = AppState {
        pipeline: Arc::new(pipeline),
        visualizer: Arc::new(visualizer),
        graph_store,
        indexer,
        graph_builder: Arc::new(graph_builder),
        metrics: Metrics::new(),
        qdrant_url: app.stores.qdrant_url.clone(),
        model_name: llm.model_name().to_string(),
        graph_sample_limit: config.graph_sample_limit,
    };

    let router = create_router(state, config.cors_enabled);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;

    info!("Server listening on http://{}", config.bind_addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            info!("Shutting down");
        })
        .await
        .context("HTTP server error")?;

    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
}
