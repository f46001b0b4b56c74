use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

#[derive(Default)]
pub struct Metrics {
    // Query counters
    total_queries: AtomicUsize,
    successful_queries: AtomicUsize,
    failed_queries: AtomicUsize,
    rate_limited_queries: AtomicUsize,
    degraded_answers: AtomicUsize,
    graph_views: AtomicUsize,

    // Timing (in microseconds)
    total_query_time_us: AtomicU64,
    total_ingest_time_us: AtomicU64,

    // Ingestion counts
    ingest_runs: AtomicUsize,
    total_chunks_indexed: AtomicUsize,
    total_relations_written: AtomicUsize,
    total_batches_skipped: AtomicUsize,
}

pub enum QueryOutcome {
    Answered { degraded: bool },
    RateLimited,
    Failed,
}

impl Metrics {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn record_query(&self, duration: Duration, outcome: QueryOutcome) {
        self.total_queries.fetch_add(1, Ordering::Relaxed);
        self.total_query_time_us.fetch_add(duration.as_micros() as u64, Ordering::Relaxed);

        match outcome {
            QueryOutcome::Answered { degraded } => {
                self.successful_queries.fetch_add(1, Ordering::Relaxed);
                if degraded {
                    self.degraded_answers.fetch_add(1, Ordering::Relaxed);
                }
            }
            QueryOutcome::RateLimited => {
                self.failed_queries.fetch_add(1, Ordering::Relaxed);
                self.rate_limited_queries.fetch_add(1, Ordering::Relaxed);
            }
            QueryOutcome::Failed => {
                self.failed_queries.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    pub fn record_graph_view(&self) {
        self.graph_views.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_ingest(&self, duration: Duration, chunks: usize) {
        self.ingest_runs.fetch_add(1, Ordering::Relaxed);
        self.total_ingest_time_us.fetch_add(duration.as_micros() as u64, Ordering::Relaxed);
        self.total_chunks_indexed.fetch_add(chunks, Ordering::Relaxed);
    }

    pub fn record_graph_build(&self, report: &index::BuildReport) {
        self.total_relations_written.fetch_add(report.relations_written, Ordering::Relaxed);
        self.total_batches_skipped.fetch_add(report.batches_skipped, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            total_queries: self.total_queries.load(Ordering::Relaxed),
            successful_queries: self.successful_queries.load(Ordering::Relaxed),
            failed_queries: self.failed_queries.load(Ordering::Relaxed),
            rate_limited_queries: self.rate_limited_queries.load(Ordering::Relaxed),
            degraded_answers: self.degraded_answers.load(Ordering::Relaxed),
            graph_views: self.graph_views.load(Ordering::Relaxed),
            avg_query_time_ms: avg_time_ms(&self.total_query_time_us, &self.total_queries),
            avg_ingest_time_ms: avg_time_ms(&self.total_ingest_time_us, &self.ingest_runs),
            total_chunks_indexed: self.total_chunks_indexed.load(Ordering::Relaxed),
            total_relations_written: self.total_relations_written.load(Ordering::Relaxed),
            total_batches_skipped: self.total_batches_skipped.load(Ordering::Relaxed),
        }
    }
}

fn avg_time_ms(total_us: &AtomicU64, count: &AtomicUsize) -> f64 {
    let total = total_us.load(Ordering::Relaxed) as f64;
    let cnt = count.load(Ordering::Relaxed) as f64;
    if cnt > 0.0 {
        total / cnt / 1000.0 // Convert to ms
    } else {
        0.0
    }
}

#[derive(Debug, Serialize)]
pub struct MetricsSnapshot {
    pub total_queries: usize,
    pub successful_queries: usize,
    pub failed_queries: usize,
    pub rate_limited_queries: usize,
    pub degraded_answers: usize,
    pub graph_views: usize,
    pub avg_query_time_ms: f64,
    pub avg_ingest_time_ms: f64,
    pub total_chunks_indexed: usize,
    pub total_relations_written: usize,
    pub total_batches_skipped: usize,
}

pub struct TimedOperation {
    start: Instant,
}

impl TimedOperation {
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}
