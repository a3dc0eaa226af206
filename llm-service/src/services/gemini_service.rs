//! Hosted Gemini backend.
//!
//! Talks to the Generative Language API: `:generateContent` for one-shot
//! and `:streamGenerateContent?alt=sse` for incremental generation. The API
//! key travels in the query string and must never appear in logs.

use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use tracing::{debug, warn};

use crate::config::llm_model_config::{CONNECT_TIMEOUT_SECS, LlmModelConfig, READ_TIMEOUT_SECS};
use crate::config::llm_provider::LlmProvider;
use crate::error_handler::{make_snippet, ConfigError, LlmError, ProviderError, Result};
use crate::generate::{GenerateBackend, GenerationRequest, TokenStream};

/// Client for the hosted Gemini API.
pub struct GeminiService {
    client: Client,
    config: LlmModelConfig,
    api_key: String,
}

impl GeminiService {
    /// Creates the service and its HTTP client.
    ///
    /// # Errors
    /// Returns an error when no API key is configured, the endpoint is not
    /// a valid HTTP URL, or the client cannot be constructed.
    pub fn new(config: LlmModelConfig) -> Result<Self> {
        let api_key = match config.api_key.as_deref() {
            Some(k) if !k.trim().is_empty() => k.to_string(),
            _ => return Err(ConfigError::MissingApiKey.into()),
        };
        if !config.endpoint.starts_with("http://") && !config.endpoint.starts_with("https://") {
            return Err(ProviderError::InvalidEndpoint(config.endpoint.clone()).into());
        }
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .timeout(Duration::from_secs(READ_TIMEOUT_SECS))
            .build()?;
        Ok(Self { client, config, api_key })
    }

    fn model_url(&self, method: &str, query: &str) -> String {
        format!(
            "{}/v1beta/models/{}:{method}?{query}key={}",
            self.config.endpoint.trim_end_matches('/'),
            self.config.model,
            self.api_key,
        )
    }

    /// URL with the key stripped, safe to include in errors and logs.
    fn loggable_url(&self, method: &str) -> String {
        format!(
            "{}/v1beta/models/{}:{method}",
            self.config.endpoint.trim_end_matches('/'),
            self.config.model,
        )
    }

    fn request_body(req: &GenerationRequest) -> GeminiRequest<'_> {
        GeminiRequest {
            contents: vec![Content {
                parts: vec![Part { text: &req.prompt }],
            }],
            generation_config: GenerationConfig {
                max_output_tokens: req.max_tokens,
                temperature: req.temperature,
            },
        }
    }
}

#[async_trait]
impl GenerateBackend for GeminiService {
    async fn generate_once(&self, req: &GenerationRequest) -> Result<String> {
        let url = self.model_url("generateContent", "");
        debug!(model = %self.config.model, "gemini one-shot generate");

        let resp = self
            .client
            .post(&url)
            .json(&Self::request_body(req))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ProviderError::HttpStatus {
                status,
                url: self.loggable_url("generateContent"),
                snippet: make_snippet(&body),
            }
            .into());
        }

        let parsed: GeminiResponse = resp.json().await?;
        let text = extract_text(&parsed);
        if text.trim().is_empty() {
            return Err(ProviderError::EmptyResponse.into());
        }
        Ok(text.trim().to_string())
    }

    fn generate_stream(&self, req: GenerationRequest) -> TokenStream {
        let (tx, stream) = TokenStream::channel();
        let client = self.client.clone();
        let url = self.model_url("streamGenerateContent", "alt=sse&");
        let log_url = self.loggable_url("streamGenerateContent");
        let body = serde_json::to_value(Self::request_body(&req));

        tokio::spawn(async move {
            let body = match body {
                Ok(b) => b,
                Err(e) => {
                    let err = ProviderError::Decode(format!("request encode: {e}"));
                    let _ = tx.send(Err(err.into())).await;
                    return;
                }
            };

            let resp = match client.post(&url).json(&body).send().await {
                Ok(r) => r,
                Err(e) => {
                    let _ = tx.send(Err(LlmError::HttpTransport(e))).await;
                    return;
                }
            };

            let status = resp.status();
            if !status.is_success() {
                let text = resp.text().await.unwrap_or_default();
                let err = ProviderError::HttpStatus {
                    status,
                    url: log_url,
                    snippet: make_snippet(&text),
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
                        warn!(error = %e, "gemini stream interrupted");
                        let _ = tx.send(Err(LlmError::HttpTransport(e))).await;
                        return;
                    }
                };
                buf.push_str(&String::from_utf8_lossy(&bytes));

                while let Some(pos) = buf.find('\n') {
                    let line: String = buf.drain(..=pos).collect();
                    if let Some(text) = parse_sse_line(line.trim()) {
                        if !text.is_empty() && tx.send(Ok(text)).await.is_err() {
                            return;
                        }
                    }
                }
            }

            // SSE frames are newline-terminated; flush any trailing data.
            if let Some(text) = parse_sse_line(buf.trim()) {
                if !text.is_empty() {
                    let _ = tx.send(Ok(text)).await;
                }
            }
        });

        stream
    }

    fn provider(&self) -> LlmProvider {
        LlmProvider::Gemini
    }

    fn model(&self) -> &str {
        &self.config.model
    }
}

/// Concatenates the text parts of the first candidate.
fn extract_text(resp: &GeminiResponse) -> String {
    resp.candidates
        .first()
        .map(|c| {
            c.content
                .parts
                .iter()
                .filter_map(|p| p.text.as_deref())
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default()
}

/// Extracts the text payload from one SSE line, if it carries any.
fn parse_sse_line(line: &str) -> Option<String> {
    let data = line.strip_prefix("data:")?.trim();
    if data.is_empty() || data == "[DONE]" {
        return None;
    }
    let parsed: GeminiResponse = serde_json::from_str(data).ok()?;
    let text = extract_text(&parsed);
    if text.is_empty() { None } else { Some(text) }
}

// ---------------------------------------------------------------------------
// HTTP payloads & options
// ---------------------------------------------------------------------------

#[derive(serde::Serialize)]
struct GeminiRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(serde::Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(serde::Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(serde::Serialize)]
struct GenerationConfig {
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
    temperature: f32,
}

#[derive(serde::Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(serde::Deserialize)]
struct Candidate {
    #[serde(default)]
    content: CandidateContent,
}

#[derive(serde::Deserialize, Default)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(serde::Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(api_key: Option<&str>) -> LlmModelConfig {
        LlmModelConfig {
            provider: LlmProvider::Gemini,
            model: "gemini-1.5-flash".to_string(),
            endpoint: "https://generativelanguage.googleapis.com".to_string(),
            api_key: api_key.map(str::to_string),
        }
    }

    #[test]
    fn requires_api_key() {
        assert!(GeminiService::new(config(None)).is_err());
        assert!(GeminiService::new(config(Some("  "))).is_err());
        assert!(GeminiService::new(config(Some("k"))).is_ok());
    }

    #[test]
    fn loggable_url_omits_key() {
        let svc = GeminiService::new(config(Some("secret"))).unwrap();
        let url = svc.loggable_url("generateContent");
        assert!(!url.contains("secret"));
        assert!(url.ends_with("models/gemini-1.5-flash:generateContent"));
    }

    #[test]
    fn model_url_carries_query_and_key() {
        let svc = GeminiService::new(config(Some("k123"))).unwrap();
        let url = svc.model_url("streamGenerateContent", "alt=sse&");
        assert!(url.contains(":streamGenerateContent?alt=sse&key=k123"));
    }

    #[test]
    fn extracts_candidate_text() {
        let resp: GeminiResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":"Hello "},{"text":"world"}]}}]}"#,
        )
        .unwrap();
        assert_eq!(extract_text(&resp), "Hello world");
    }

    #[test]
    fn parses_sse_lines() {
        let line = r#"data: {"candidates":[{"content":{"parts":[{"text":"tok"}]}}]}"#;
        assert_eq!(parse_sse_line(line).unwrap(), "tok");
        assert!(parse_sse_line("data: [DONE]").is_none());
        assert!(parse_sse_line("").is_none());
        assert!(parse_sse_line(": keep-alive").is_none());
    }
}
