use crate::config::llm_provider::LlmProvider;

/// Connect timeout for provider HTTP clients, in seconds.
///
/// Deliberately short: an unreachable backend should fail fast so the
/// fallback can take over.
pub const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Read timeout for provider HTTP clients, in seconds.
///
/// Generation latency scales with the requested output length, so the full
/// response wait is generous.
pub const READ_TIMEOUT_SECS: u64 = 600;

/// Configuration for one generation backend.
///
/// Per-request knobs (prompt, max output tokens, temperature) live in
/// [`crate::generate::GenerationRequest`]; this struct only carries the
/// process-wide identity of a backend, read once at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct LlmModelConfig {
    /// The backend this config targets.
    pub provider: LlmProvider,

    /// Model identifier string (e.g. `"phi3:mini"`, `"gemini-1.5-flash"`).
    pub model: String,

    /// Inference endpoint (local server or remote API base URL).
    pub endpoint: String,

    /// Optional API key for providers that require authentication.
    pub api_key: Option<String>,
}
