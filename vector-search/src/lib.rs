//! Qdrant-backed retrieval for the answering pipeline.
//!
//! Implements the engine's `Retriever` trait over the Qdrant REST API:
//! the question is embedded with the local Ollama embeddings endpoint,
//! then similarity-searched with tenant and document filters.

pub mod error;
pub mod qdrant;

pub use error::SearchError;
pub use qdrant::QdrantRetriever;
