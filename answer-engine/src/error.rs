//! Unified error handling for `answer-engine`.

use thiserror::Error;

use crate::retriever::RetrieveError;

/// Top-level error for the answering pipeline.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum EngineError {
    /// The retrieval collaborator failed.
    #[error(transparent)]
    Retrieve(#[from] RetrieveError),

    /// The generation backend failed (after any fallback).
    #[error(transparent)]
    Llm(#[from] llm_service::LlmError),
}
