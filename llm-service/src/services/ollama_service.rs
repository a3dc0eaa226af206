//! Local Ollama backend.
//!
//! Talks to the Ollama HTTP API: `/api/generate` for one-shot and
//! incremental generation (NDJSON stream), `/api/embed` for embeddings.

use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use tracing::{debug, warn};

use crate::config::llm_model_config::{CONNECT_TIMEOUT_SECS, LlmModelConfig, READ_TIMEOUT_SECS};
use crate::config::llm_provider::LlmProvider;
use crate::error_handler::{make_snippet, LlmError, ProviderError, Result};
use crate::generate::{GenerateBackend, GenerationRequest, TokenStream};

/// Client for a local Ollama runtime.
pub struct OllamaService {
    client: Client,
    config: LlmModelConfig,
}

impl OllamaService {
    /// Creates the service and its HTTP client.
    ///
    /// # Errors
    /// Returns an error when the endpoint is not a valid HTTP URL or the
    /// client cannot be constructed.
    pub fn new(config: LlmModelConfig) -> Result<Self> {
        if !config.endpoint.starts_with("http://") && !config.endpoint.starts_with("https://") {
            return Err(ProviderError::InvalidEndpoint(config.endpoint.clone()).into());
        }
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .timeout(Duration::from_secs(READ_TIMEOUT_SECS))
            .build()?;
        Ok(Self { client, config })
    }

    fn generate_url(&self) -> String {
        format!("{}/api/generate", self.config.endpoint.trim_end_matches('/'))
    }

    /// Computes embeddings for a batch of texts via `/api/embed`.
    ///
    /// # Errors
    /// Returns an error on transport failure, non-success status, or when
    /// the response carries no vectors.
    pub async fn embeddings(&self, model: &str, inputs: &[String]) -> Result<Vec<Vec<f32>>> {
        let url = format!("{}/api/embed", self.config.endpoint.trim_end_matches('/'));
        let resp = self
            .client
            .post(&url)
            .json(&EmbedRequest { model, input: inputs })
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ProviderError::HttpStatus {
                status,
                url,
                snippet: make_snippet(&body),
            }
            .into());
        }

        let parsed: EmbedResponse = resp.json().await?;
        let vectors = if !parsed.embeddings.is_empty() {
            parsed.embeddings
        } else if let Some(single) = parsed.embedding {
            vec![single]
        } else {
            return Err(ProviderError::EmptyResponse.into());
        };
        Ok(vectors)
    }
}

#[async_trait]
impl GenerateBackend for OllamaService {
    async fn generate_once(&self, req: &GenerationRequest) -> Result<String> {
        let url = self.generate_url();
        debug!(model = %self.config.model, url = %url, "ollama one-shot generate");

        let resp = self
            .client
            .post(&url)
            .json(&GenerateRequest {
                model: &self.config.model,
                prompt: &req.prompt,
                stream: false,
                options: GenerateOptions {
                    temperature: req.temperature,
                    num_predict: req.max_tokens,
                },
            })
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ProviderError::HttpStatus {
                status,
                url,
                snippet: make_snippet(&body),
            }
            .into());
        }

        // An empty completion is a valid (if useless) local answer; the
        // orchestrator's short-answer retry deals with it.
        let parsed: GenerateChunk = resp.json().await?;
        Ok(parsed.response.trim().to_string())
    }

    fn generate_stream(&self, req: GenerationRequest) -> TokenStream {
        let (tx, stream) = TokenStream::channel();
        let client = self.client.clone();
        let model = self.config.model.clone();
        let url = self.generate_url();

        tokio::spawn(async move {
            let result = client
                .post(&url)
                .json(&GenerateRequest {
                    model: &model,
                    prompt: &req.prompt,
                    stream: true,
                    options: GenerateOptions {
                        temperature: req.temperature,
                        num_predict: req.max_tokens,
                    },
                })
                .send()
                .await;

            let resp = match result {
                Ok(r) => r,
                Err(e) => {
                    let _ = tx.send(Err(LlmError::HttpTransport(e))).await;
                    return;
                }
            };

            let status = resp.status();
            if !status.is_success() {
                let body = resp.text().await.unwrap_or_default();
                let err = ProviderError::HttpStatus {
                    status,
                    url,
                    snippet: make_snippet(&body),
                };
                let _ = tx.send(Err(err.into())).await;
                return;
            }

            let mut body = resp.bytes_stream();
            let mut buf = String::new();
            while let Some(chunk) = body.next().await {
                let bytes = match chunk {
                    Ok(b) => b,
                    Err(e) => {
                        warn!(error = %e, "ollama stream interrupted");
                        let _ = tx.send(Err(LlmError::HttpTransport(e))).await;
                        return;
                    }
                };
                buf.push_str(&String::from_utf8_lossy(&bytes));

                while let Some(pos) = buf.find('\n') {
                    let line: String = buf.drain(..=pos).collect();
                    if let Some(chunk) = parse_stream_line(line.trim()) {
                        // The done frame terminates the stream; any text it
                        // carries is not part of the answer.
                        if chunk.done {
                            return;
                        }
                        if !chunk.response.is_empty()
                            && tx.send(Ok(chunk.response)).await.is_err()
                        {
                            return;
                        }
                    }
                }
            }

            // Flush a trailing line without a newline terminator.
            if let Some(chunk) = parse_stream_line(buf.trim()) {
                if !chunk.done && !chunk.response.is_empty() {
                    let _ = tx.send(Ok(chunk.response)).await;
                }
            }
        });

        stream
    }

    fn provider(&self) -> LlmProvider {
        LlmProvider::Ollama
    }

    fn model(&self) -> &str {
        &self.config.model
    }
}

/// Parses one NDJSON line from the generate stream. Blank and unparsable
/// lines yield `None` and are skipped.
fn parse_stream_line(line: &str) -> Option<GenerateChunk> {
    if line.is_empty() {
        return None;
    }
    serde_json::from_str(line).ok()
}

// ---------------------------------------------------------------------------
// HTTP payloads & options
// ---------------------------------------------------------------------------

#[derive(serde::Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(serde::Serialize)]
struct GenerateOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(serde::Deserialize)]
struct GenerateChunk {
    #[serde(default)]
    response: String,
    #[serde(default)]
    done: bool,
}

#[derive(serde::Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(serde::Deserialize)]
struct EmbedResponse {
    #[serde(default)]
    embedding: Option<Vec<f32>>,
    #[serde(default)]
    embeddings: Vec<Vec<f32>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(endpoint: &str) -> LlmModelConfig {
        LlmModelConfig {
            provider: LlmProvider::Ollama,
            model: "phi3:mini".to_string(),
            endpoint: endpoint.to_string(),
            api_key: None,
        }
    }

    #[test]
    fn rejects_non_http_endpoint() {
        assert!(OllamaService::new(config("localhost:11434")).is_err());
        assert!(OllamaService::new(config("http://localhost:11434")).is_ok());
    }

    #[test]
    fn generate_url_strips_trailing_slash() {
        let svc = OllamaService::new(config("http://localhost:11434/")).unwrap();
        assert_eq!(svc.generate_url(), "http://localhost:11434/api/generate");
    }

    #[test]
    fn parses_stream_lines() {
        let mid = parse_stream_line(r#"{"response":"Hel","done":false}"#).unwrap();
        assert_eq!(mid.response, "Hel");
        assert!(!mid.done);

        let last = parse_stream_line(r#"{"response":"","done":true}"#).unwrap();
        assert!(last.done);

        assert!(parse_stream_line("").is_none());
        assert!(parse_stream_line("not json").is_none());
    }

    fn request() -> GenerationRequest {
        GenerationRequest {
            prompt: "q".to_string(),
            max_tokens: 64,
            temperature: 0.1,
        }
    }

    /// Serves one canned HTTP response on an ephemeral port.
    async fn spawn_stub(body: &'static str) -> String {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut sock, _) = listener.accept().await.unwrap();
            let mut req = Vec::new();
            let mut buf = [0u8; 1024];
            loop {
                let n = sock.read(&mut buf).await.unwrap_or(0);
                if n == 0 {
                    break;
                }
                req.extend_from_slice(&buf[..n]);
                if request_complete(&req) {
                    break;
                }
            }
            let resp = format!(
                "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            let _ = sock.write_all(resp.as_bytes()).await;
            let _ = sock.shutdown().await;
        });
        format!("http://{addr}")
    }

    fn request_complete(req: &[u8]) -> bool {
        let Some(pos) = req.windows(4).position(|w| w == b"\r\n\r\n") else {
            return false;
        };
        let head = String::from_utf8_lossy(&req[..pos]);
        let mut len = 0;
        for line in head.lines() {
            if let Some((name, value)) = line.split_once(':') {
                if name.eq_ignore_ascii_case("content-length") {
                    len = value.trim().parse().unwrap_or(0);
                }
            }
        }
        req.len() >= pos + 4 + len
    }

    async fn collect_tokens(svc: &OllamaService) -> Vec<String> {
        let mut stream = svc.generate_stream(request());
        let mut tokens = Vec::new();
        while let Some(item) = stream.next().await {
            tokens.push(item.unwrap());
        }
        tokens
    }

    #[tokio::test]
    async fn empty_one_shot_completion_is_ok() {
        let base = spawn_stub(r#"{"response":"","done":true}"#).await;
        let svc = OllamaService::new(config(&base)).unwrap();
        // Empty text is returned as-is so callers can decide to retry.
        assert_eq!(svc.generate_once(&request()).await.unwrap(), "");
    }

    #[tokio::test]
    async fn done_frame_payload_is_discarded() {
        let base =
            spawn_stub("{\"response\":\"a\",\"done\":false}\n{\"response\":\"tail\",\"done\":true}\n")
                .await;
        let svc = OllamaService::new(config(&base)).unwrap();
        assert_eq!(collect_tokens(&svc).await, vec!["a"]);
    }

    #[tokio::test]
    async fn malformed_stream_lines_are_skipped() {
        let base = spawn_stub(
            "{\"response\":\"a\",\"done\":false}\nnot json\n{\"response\":\"b\",\"done\":false}\n",
        )
        .await;
        let svc = OllamaService::new(config(&base)).unwrap();
        assert_eq!(collect_tokens(&svc).await, vec!["a", "b"]);
    }
}
