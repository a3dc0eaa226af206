//! Unified error handling for `vector-search`.

use thiserror::Error;

/// Errors raised while searching the vector store.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum SearchError {
    /// Embedding the query failed.
    #[error("[Vector Search] embedding failed: {0}")]
    Embedding(#[from] llm_service::LlmError),

    /// HTTP transport failure talking to Qdrant.
    #[error("[Vector Search] transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Qdrant answered with a non-success status.
    #[error("[Vector Search] HTTP {status} from {url}: {snippet}")]
    HttpStatus {
        status: reqwest::StatusCode,
        url: String,
        snippet: String,
    },

    /// The embeddings response carried no vector for the query.
    #[error("[Vector Search] embeddings response carried no vector")]
    MissingEmbedding,
}
