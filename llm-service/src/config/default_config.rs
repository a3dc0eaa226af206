//! Environment-driven backend construction.
//!
//! Reads provider selection and endpoints from the environment once at
//! startup and assembles the generation backend the rest of the pipeline
//! uses. When the hosted provider is selected, the local runtime is wired
//! in as the failover standby.

use std::str::FromStr;
use std::sync::Arc;

use tracing::info;

use crate::config::llm_model_config::LlmModelConfig;
use crate::config::llm_provider::LlmProvider;
use crate::error_handler::{env_or, must_env, Result};
use crate::generate::GenerateBackend;
use crate::router::FallbackGenerator;
use crate::services::gemini_service::GeminiService;
use crate::services::ollama_service::OllamaService;

const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
const DEFAULT_OLLAMA_MODEL: &str = "phi3:mini";
const DEFAULT_GEMINI_URL: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";
const DEFAULT_EMBEDDING_MODEL: &str = "nomic-embed-text";

fn ollama_config_from_env() -> LlmModelConfig {
    LlmModelConfig {
        provider: LlmProvider::Ollama,
        model: env_or("OLLAMA_MODEL", DEFAULT_OLLAMA_MODEL),
        endpoint: env_or("OLLAMA_BASE_URL", DEFAULT_OLLAMA_URL),
        api_key: None,
    }
}

fn gemini_config_from_env() -> Result<LlmModelConfig> {
    Ok(LlmModelConfig {
        provider: LlmProvider::Gemini,
        model: env_or("GEMINI_MODEL", DEFAULT_GEMINI_MODEL),
        endpoint: env_or("GEMINI_BASE_URL", DEFAULT_GEMINI_URL),
        api_key: Some(must_env("GEMINI_API_KEY")?),
    })
}

/// Builds the generation backend selected by `LLM_PROVIDER`.
///
/// `ollama` (the default) yields the local backend alone. `gemini` yields
/// the hosted backend with the local one as failover standby.
///
/// # Errors
/// Returns an error for an unsupported provider name, a missing
/// `GEMINI_API_KEY` when Gemini is selected, or an invalid endpoint.
pub fn build_generator_from_env() -> Result<Arc<dyn GenerateBackend>> {
    let provider = LlmProvider::from_str(&env_or("LLM_PROVIDER", "ollama"))?;

    let backend: Arc<dyn GenerateBackend> = match provider {
        LlmProvider::Ollama => {
            let local = OllamaService::new(ollama_config_from_env())?;
            info!(provider = %provider, model = %local.model(), "generation backend ready");
            Arc::new(local)
        }
        LlmProvider::Gemini => {
            let hosted = GeminiService::new(gemini_config_from_env()?)?;
            let standby = OllamaService::new(ollama_config_from_env())?;
            info!(
                provider = %provider,
                model = %hosted.model(),
                standby_model = %standby.model(),
                "generation backend ready with local failover"
            );
            Arc::new(FallbackGenerator::new(Arc::new(hosted), Arc::new(standby)))
        }
    };
    Ok(backend)
}

/// Builds the embedding client (always local Ollama) and the embedding
/// model name from `EMBEDDING_MODEL`.
///
/// # Errors
/// Returns an error when the Ollama endpoint is invalid.
pub fn build_embedder_from_env() -> Result<(OllamaService, String)> {
    let service = OllamaService::new(ollama_config_from_env())?;
    let model = env_or("EMBEDDING_MODEL", DEFAULT_EMBEDDING_MODEL);
    Ok((service, model))
}
