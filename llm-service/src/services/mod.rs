//! Concrete generation backends.

pub mod gemini_service;
pub mod ollama_service;
