pub mod config;
pub mod error;
pub mod fusion;
pub mod generator;
pub mod graph_context;
pub mod pipeline;
pub mod vector_context;
pub mod visualization;

pub use config::{AppConfig, LlmProvider, RetrievalConfig};
pub use error::{QueryError, QueryResult};
pub use fusion::{fuse, FusedContext};
pub use generator::{render_prompt, AnswerGenerator};
pub use graph_context::{
    EntityLookup, GraphContext, GraphContextFetcher, LookupStatus, NO_GRAPH_CONNECTIONS,
};
pub use pipeline::{AnswerTrace, HybridAnswer, HybridSearchPipeline};
pub use vector_context::{VectorContext, VectorContextFetcher, NO_LITERATURE};
pub use visualization::{GraphEdge, GraphNode, GraphView, GraphVisualizationAdapter, NodeRole};
