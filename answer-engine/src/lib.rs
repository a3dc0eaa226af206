//! Core answering pipeline for the document Q&A backend.
//!
//! Retrieval results flow through the same four steps for both response
//! modes: context assembly ([`context`]), an evidence gate ([`guardrails`]),
//! citation extraction ([`citations`]), and prompt composition ([`prompt`]).
//! [`engine::AnswerEngine`] orchestrates them over a pluggable
//! [`retriever::Retriever`] and an `llm-service` generation backend.

pub mod citations;
pub mod context;
pub mod engine;
pub mod error;
pub mod events;
pub mod guardrails;
pub mod passage;
pub mod prompt;
pub mod retriever;

pub use citations::Citation;
pub use engine::{Answer, AnswerEngine, AnswerRequest};
pub use error::EngineError;
pub use events::AnswerEvent;
pub use passage::{Passage, PassageMeta};
pub use retriever::{RetrieveError, Retriever};
