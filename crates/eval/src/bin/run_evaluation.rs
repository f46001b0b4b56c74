use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use eval::report::{markdown_summary, write_csv, write_json};
use eval::{
    generate_plots, load_test_set, medical_test_set, Answerer, EvaluationReport, Evaluator, Judge,
    VectorOnlyBaseline,
};
use index::{EmbeddingClient, Neo4jGraphStore, QdrantIndex};
use query::{AppConfig, HybridSearchPipeline, LlmProvider, VectorContextFetcher};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

const JUDGE_MODEL: &str = "llama-3.3-70b-versatile";

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Preset {
    Fast,
    Accurate,
}

/// Grade the hybrid QA pipeline against a fixed clinical test set
#[derive(Debug, Parser)]
#[command(name = "run_evaluation")]
struct Args {
    /// Per-question results of the hybrid system
    #[arg(long, default_value = "research_results_scaled.csv")]
    output: PathBuf,

    /// Full report for every evaluated system
    #[arg(long)]
    json: Option<PathBuf>,

    /// Directory for score and latency charts
    #[arg(long)]
    plots: Option<PathBuf>,

    /// Also evaluate the vector-only baseline
    #[arg(long)]
    with_baseline: bool,

    /// Model preset for the answering LLM
    #[arg(long, value_enum)]
    preset: Option<Preset>,

    /// JSON test set; the built-in clinical set is used otherwise
    #[arg(long)]
    test_set: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args = Args::parse();

    let mut config = AppConfig::from_env()?;
    if config.llm.provider == LlmProvider::Groq {
        match args.preset {
            Some(Preset::Fast) => config.llm.model = AppConfig::fast().llm.model,
            Some(Preset::Accurate) => config.llm.model = AppConfig::accurate().llm.model,
            None => {}
        }
    }

    let cases = match &args.test_set {
        Some(path) => load_test_set(path)?,
        None => medical_test_set(),
    };
    info!(questions = cases.len(), model = %config.llm.model, "Loaded test set");

    let llm = config.llm.build_client()?;

    let mut judge_config = config.llm.clone();
    if judge_config.provider == LlmProvider::Groq {
        judge_config.model = JUDGE_MODEL.to_string();
    }
    let judge = Judge::new(judge_config.build_client()?);

    let graph_store = Arc::new(
        Neo4jGraphStore::connect(
            &config.stores.neo4j_uri,
            &config.stores.neo4j_username,
            &config.stores.neo4j_password,
        )
        .await
        .context("Failed to connect to Neo4j")?,
    );
    let vector_index = Arc::new(QdrantIndex::new(
        config.stores.qdrant_url.clone(),
        EmbeddingClient::new(config.embedding.base_url.clone(), config.embedding.model.clone()),
        config.stores.qdrant_collection.clone(),
    ));

    let pipeline = HybridSearchPipeline::new(
        llm.clone(),
        vector_index.clone(),
        graph_store,
        &config.retrieval,
    );

    let evaluator = Evaluator::new(judge);
    let mut reports: Vec<EvaluationReport> = Vec::new();

    reports.push(evaluator.run(&pipeline, &cases).await);

    if args.with_baseline {
        let baseline = VectorOnlyBaseline::new(
            VectorContextFetcher::new(vector_index, config.retrieval.vector_top_k),
            llm,
        );
        info!(system = baseline.name(), "Evaluating baseline");
        reports.push(evaluator.run(&baseline, &cases).await);
    }

    write_csv(&reports[0].records, &args.output)?;
    info!(path = %args.output.display(), "Saved results");

    if let Some(path) = &args.json {
        write_json(&reports, path)?;
        info!(path = %path.display(), "Saved JSON report");
    }

    if let Some(dir) = &args.plots {
        generate_plots(&reports, dir)?;
    }

    for report in &reports {
        let s = &report.summary;
        info!(
            system = %s.system,
            avg_score = s.avg_score,
            median_score = s.median_score,
            avg_latency = s.avg_latency,
            p95_latency = s.p95_latency,
            errors = s.errors,
            "Evaluation complete"
        );
    }
    println!("{}", markdown_summary(&reports));

    Ok(())
}
