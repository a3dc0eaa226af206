use std::collections::HashMap;
use std::sync::Arc;

use answer_engine::AnswerEngine;
use llm_service::error_handler::env_or;
use tracing::warn;
use vector_search::QdrantRetriever;

use crate::error_handler::AppResult;

const DEFAULT_API_KEYS: &str = r#"{"dev-key":"demo"}"#;

/// Shared state for all HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    /// The answering pipeline (retriever + generator).
    pub engine: Arc<AnswerEngine>,
    /// API key -> tenant id.
    pub api_keys: HashMap<String, String>,
    /// Provider name of the active generation backend.
    pub provider: String,
    /// Model name of the active generation backend.
    pub model: String,
}

impl AppState {
    /// Load shared state from environment variables.
    ///
    /// # Errors
    /// Returns an error when the generation or retrieval configuration is
    /// invalid.
    pub fn from_env() -> AppResult<Self> {
        let generator = llm_service::build_generator_from_env()?;
        let retriever = Arc::new(QdrantRetriever::from_env()?);
        let engine = Arc::new(AnswerEngine::new(retriever, generator));
        let provider = engine.provider();
        let model = engine.model();
        Ok(Self {
            engine,
            api_keys: parse_api_keys(&env_or("API_KEYS_JSON", DEFAULT_API_KEYS)),
            provider,
            model,
        })
    }

    /// Resolves the tenant for an API key, if the key is known.
    pub fn tenant_for(&self, api_key: &str) -> Option<&str> {
        if api_key.is_empty() {
            return None;
        }
        self.api_keys.get(api_key).map(String::as_str)
    }
}

/// Parses the `API_KEYS_JSON` mapping. Malformed input falls back to the
/// development default rather than failing startup.
fn parse_api_keys(raw: &str) -> HashMap<String, String> {
    match serde_json::from_str(raw) {
        Ok(map) => map,
        Err(e) => {
            warn!(error = %e, "API_KEYS_JSON is not a valid key->tenant map, using default");
            serde_json::from_str(DEFAULT_API_KEYS).unwrap_or_default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_key_tenant_map() {
        let map = parse_api_keys(r#"{"k1":"acme","k2":"globex"}"#);
        assert_eq!(map.get("k1").map(String::as_str), Some("acme"));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn malformed_map_falls_back_to_default() {
        let map = parse_api_keys("not json");
        assert_eq!(map.get("dev-key").map(String::as_str), Some("demo"));
    }
}
