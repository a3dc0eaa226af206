//! Fallback composition over two backends.
//!
//! [`FallbackGenerator`] wraps a primary backend and a standby. One-shot
//! requests that fail on the primary are retried once on the standby.
//! Incremental requests forward the primary's tokens; if the primary stream
//! fails at any point (including mid-stream), the whole generation restarts
//! on the standby, so consumers may observe an answer prefix twice and must
//! treat the standby's output as the authoritative sequence.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use crate::config::llm_provider::LlmProvider;
use crate::error_handler::Result;
use crate::generate::{GenerateBackend, GenerationRequest, TokenStream};

/// A backend pair with automatic failover from primary to standby.
pub struct FallbackGenerator {
    primary: Arc<dyn GenerateBackend>,
    standby: Arc<dyn GenerateBackend>,
}

impl FallbackGenerator {
    pub fn new(primary: Arc<dyn GenerateBackend>, standby: Arc<dyn GenerateBackend>) -> Self {
        Self { primary, standby }
    }
}

#[async_trait]
impl GenerateBackend for FallbackGenerator {
    async fn generate_once(&self, req: &GenerationRequest) -> Result<String> {
        match self.primary.generate_once(req).await {
            Ok(text) => Ok(text),
            Err(e) => {
                warn!(
                    primary = %self.primary.provider(),
                    standby = %self.standby.provider(),
                    error = %e,
                    "primary generation failed, retrying on standby"
                );
                self.standby.generate_once(req).await
            }
        }
    }

    fn generate_stream(&self, req: GenerationRequest) -> TokenStream {
        let (tx, stream) = TokenStream::channel();
        let primary = Arc::clone(&self.primary);
        let standby = Arc::clone(&self.standby);

        tokio::spawn(async move {
            let mut inner = primary.generate_stream(req.clone());
            while let Some(item) = inner.next().await {
                match item {
                    Ok(token) => {
                        if tx.send(Ok(token)).await.is_err() {
                            return;
                        }
                    }
                    Err(e) => {
                        warn!(
                            primary = %primary.provider(),
                            standby = %standby.provider(),
                            error = %e,
                            "primary stream failed, restarting on standby"
                        );
                        // Restart from scratch; already-forwarded tokens are
                        // superseded by the standby's full output.
                        let mut retry = standby.generate_stream(req);
                        while let Some(item) = retry.next().await {
                            if tx.send(item).await.is_err() {
                                return;
                            }
                        }
                        return;
                    }
                }
            }
        });

        stream
    }

    fn provider(&self) -> LlmProvider {
        self.primary.provider()
    }

    fn model(&self) -> &str {
        self.primary.model()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error_handler::ProviderError;

    /// Scripted backend: one-shot outcome plus a fixed stream item sequence.
    struct Scripted {
        provider: LlmProvider,
        once: std::result::Result<String, ()>,
        stream_items: Vec<std::result::Result<String, ()>>,
    }

    #[async_trait]
    impl GenerateBackend for Scripted {
        async fn generate_once(&self, _req: &GenerationRequest) -> Result<String> {
            self.once
                .clone()
                .map_err(|_| ProviderError::EmptyResponse.into())
        }

        fn generate_stream(&self, _req: GenerationRequest) -> TokenStream {
            let (tx, stream) = TokenStream::channel();
            let items = self.stream_items.clone();
            tokio::spawn(async move {
                for item in items {
                    let item = item.map_err(|_| ProviderError::EmptyResponse.into());
                    if tx.send(item).await.is_err() {
                        return;
                    }
                }
            });
            stream
        }

        fn provider(&self) -> LlmProvider {
            self.provider
        }

        fn model(&self) -> &str {
            "scripted"
        }
    }

    fn request() -> GenerationRequest {
        GenerationRequest {
            prompt: "q".to_string(),
            max_tokens: 64,
            temperature: 0.1,
        }
    }

    #[tokio::test]
    async fn one_shot_falls_back_to_standby() {
        let fallback = FallbackGenerator::new(
            Arc::new(Scripted {
                provider: LlmProvider::Gemini,
                once: Err(()),
                stream_items: vec![],
            }),
            Arc::new(Scripted {
                provider: LlmProvider::Ollama,
                once: Ok("OK".to_string()),
                stream_items: vec![],
            }),
        );
        assert_eq!(fallback.generate_once(&request()).await.unwrap(), "OK");
    }

    #[tokio::test]
    async fn one_shot_prefers_primary() {
        let fallback = FallbackGenerator::new(
            Arc::new(Scripted {
                provider: LlmProvider::Gemini,
                once: Ok("primary".to_string()),
                stream_items: vec![],
            }),
            Arc::new(Scripted {
                provider: LlmProvider::Ollama,
                once: Ok("standby".to_string()),
                stream_items: vec![],
            }),
        );
        assert_eq!(fallback.generate_once(&request()).await.unwrap(), "primary");
    }

    #[tokio::test]
    async fn mid_stream_failure_restarts_on_standby() {
        let fallback = FallbackGenerator::new(
            Arc::new(Scripted {
                provider: LlmProvider::Gemini,
                once: Err(()),
                stream_items: vec![Ok("x".to_string()), Err(())],
            }),
            Arc::new(Scripted {
                provider: LlmProvider::Ollama,
                once: Err(()),
                stream_items: vec![Ok("y1".to_string()), Ok("y2".to_string())],
            }),
        );

        let mut stream = fallback.generate_stream(request());
        let mut tokens = Vec::new();
        while let Some(item) = stream.next().await {
            tokens.push(item.unwrap());
        }
        // Primary prefix stays visible, then the standby's full run follows.
        assert_eq!(tokens, vec!["x", "y1", "y2"]);
    }

    #[tokio::test]
    async fn standby_errors_surface_to_consumer() {
        let fallback = FallbackGenerator::new(
            Arc::new(Scripted {
                provider: LlmProvider::Gemini,
                once: Err(()),
                stream_items: vec![Err(())],
            }),
            Arc::new(Scripted {
                provider: LlmProvider::Ollama,
                once: Err(()),
                stream_items: vec![Err(())],
            }),
        );

        let mut stream = fallback.generate_stream(request());
        assert!(stream.next().await.unwrap().is_err());
        assert!(stream.next().await.is_none());
    }
}
