//! Retrieval seam.
//!
//! The engine depends on this trait only; the concrete vector-store client
//! lives in its own crate so the pipeline can be tested with stubs.

use async_trait::async_trait;
use thiserror::Error;

use crate::passage::Passage;

/// Retrieval failure, carrying the collaborator's own description.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct RetrieveError(pub String);

/// Scored-passage lookup over the tenant's stored documents.
#[async_trait]
pub trait Retriever: Send + Sync {
    /// Returns up to `top_k` passages relevant to `question`, scoped to
    /// `tenant_id` and optionally narrowed to specific documents.
    ///
    /// Scores are relevance values as reported by the store, higher is
    /// better. Ordering is the store's ranking and is preserved downstream.
    ///
    /// # Errors
    /// Returns [`RetrieveError`] when the store or the embedding backend
    /// is unavailable.
    async fn retrieve(
        &self,
        question: &str,
        top_k: usize,
        file_ids: Option<&[String]>,
        tenant_id: &str,
    ) -> Result<Vec<(Passage, f32)>, RetrieveError>;
}
