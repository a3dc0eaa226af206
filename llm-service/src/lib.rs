//! Shared LLM service for the document Q&A backend.
//!
//! Exposes two interchangeable generation backends behind one narrow
//! capability, [`GenerateBackend`]:
//! - [`services::ollama_service::OllamaService`] — local Ollama runtime
//! - [`services::gemini_service::GeminiService`] — hosted Gemini API
//!
//! Both support one-shot and incremental generation. When the configured
//! provider is Gemini, [`router::FallbackGenerator`] transparently re-issues
//! failed requests against the local backend; see `router` for the exact
//! semantics (incremental failures restart the whole generation).

pub mod config;
pub mod error_handler;
pub mod generate;
pub mod router;
pub mod services;

pub use config::default_config::{build_embedder_from_env, build_generator_from_env};
pub use config::llm_model_config::LlmModelConfig;
pub use config::llm_provider::LlmProvider;
pub use error_handler::{ConfigError, LlmError, ProviderError, Result};
pub use generate::{GenerateBackend, GenerationRequest, TokenStream};
pub use router::FallbackGenerator;
