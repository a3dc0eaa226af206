//! Generation capability shared by all backends.
//!
//! [`GenerateBackend`] is the one seam the answer pipeline depends on: a
//! one-shot call returning the full completion, and an incremental call
//! returning a [`TokenStream`]. Backends push increments into a bounded
//! channel from a spawned producer task; the consumer pulls them with
//! [`TokenStream::next`]. Dropping the stream closes the channel and the
//! producer stops on its next send.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::config::llm_provider::LlmProvider;
use crate::error_handler::Result;

/// Default capacity for token channels. Tokens are tiny; a small buffer
/// keeps the producer ahead of the consumer without unbounded growth.
pub const TOKEN_CHANNEL_CAPACITY: usize = 32;

/// A single generation request, provider-agnostic.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    /// Fully composed prompt text.
    pub prompt: String,
    /// Upper bound on generated tokens.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f32,
}

/// Pull-based sequence of text increments produced by a backend.
///
/// Each item is either a text increment or the error that ended the stream.
/// After an `Err` or `None`, the stream yields nothing further.
pub struct TokenStream {
    rx: mpsc::Receiver<Result<String>>,
}

impl TokenStream {
    /// Creates a stream together with the sender half its producer writes to.
    pub fn channel() -> (mpsc::Sender<Result<String>>, TokenStream) {
        let (tx, rx) = mpsc::channel(TOKEN_CHANNEL_CAPACITY);
        (tx, TokenStream { rx })
    }

    /// Pulls the next increment. `None` means the stream ended cleanly.
    pub async fn next(&mut self) -> Option<Result<String>> {
        self.rx.recv().await
    }
}

/// Narrow capability implemented by every generation backend.
#[async_trait]
pub trait GenerateBackend: Send + Sync {
    /// Runs a full generation and returns the complete text, which may be
    /// empty when the model produced nothing.
    ///
    /// # Errors
    /// Returns an error on transport failure or a non-success status.
    async fn generate_once(&self, req: &GenerationRequest) -> Result<String>;

    /// Starts an incremental generation.
    ///
    /// Transport or protocol failures surface as an `Err` item on the
    /// returned stream rather than from this call.
    fn generate_stream(&self, req: GenerationRequest) -> TokenStream;

    /// Which provider this backend talks to.
    fn provider(&self) -> LlmProvider;

    /// Model identifier used by this backend.
    fn model(&self) -> &str;
}
