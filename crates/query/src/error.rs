use extract::LlmError;
use thiserror::Error;

/// The cause of a failed call is carried as `source()`, not in the message;
/// format through `anyhow` with `{:#}` to get the whole chain.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("Question must not be empty")]
    EmptyQuestion,

    #[error("Entity extraction failed")]
    Extraction(#[source] LlmError),

    #[error("Vector retrieval failed")]
    VectorRetrieval(#[source] anyhow::Error),

    #[error("Answer generation failed")]
    Generation(#[source] LlmError),
}

impl QueryError {
    /// True when a model call was refused for rate limiting
    pub fn is_rate_limited(&self) -> bool {
        match self {
            Self::Extraction(e) | Self::Generation(e) => e.is_rate_limited(),
            _ => false,
        }
    }
}

pub type QueryResult<T> = Result<T, QueryError>;
