//! Answer orchestration.
//!
//! Runs the retrieve → gate → context → prompt → generate pipeline in two
//! modes. One-shot returns a complete [`Answer`]; incremental pushes
//! [`AnswerEvent`]s into a channel as they happen. Both retry a too-short
//! first draft exactly once with an expand instruction.
//!
//! The two modes handle generation failures differently on purpose: the
//! one-shot path propagates them as errors for the HTTP layer to map, while
//! the incremental path converts them into `refused`/`final`/`done` events
//! because the response status is already committed once streaming starts.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{info, warn};

use llm_service::{GenerateBackend, GenerationRequest};

use crate::citations::{build_citations, Citation};
use crate::context::build_context;
use crate::error::EngineError;
use crate::events::AnswerEvent;
use crate::guardrails::has_sufficient_evidence;
use crate::passage::Passage;
use crate::prompt::{
    compose, effective_top_k, is_summary_question, with_expand_once, with_expand_stream, REFUSAL,
};
use crate::retriever::Retriever;

/// Sampling temperature for answer generation. Low on purpose: answers
/// must stay close to the retrieved evidence.
pub const TEMPERATURE: f32 = 0.1;

/// One-shot answers shorter than this trigger the single expand retry.
const MIN_ONCE_CHARS: usize = 120;

/// Incremental answers shorter than this trigger the single expand retry.
/// Higher than the one-shot threshold: streamed answers skew longer and a
/// terse stream usually means the model gave up early.
const MIN_STREAM_CHARS: usize = 160;

/// A question scoped to one tenant's documents.
#[derive(Debug, Clone)]
pub struct AnswerRequest {
    pub question: String,
    /// Restrict retrieval to these documents; `None` searches all.
    pub file_ids: Option<Vec<String>>,
    pub top_k: usize,
    pub max_tokens: u32,
    pub tenant_id: String,
}

/// A complete one-shot answer.
#[derive(Debug, Clone)]
pub struct Answer {
    pub text: String,
    pub refused: bool,
    pub citations: Vec<Citation>,
}

/// Orchestrates retrieval and generation behind the two answering modes.
pub struct AnswerEngine {
    retriever: Arc<dyn Retriever>,
    generator: Arc<dyn GenerateBackend>,
}

impl AnswerEngine {
    pub fn new(retriever: Arc<dyn Retriever>, generator: Arc<dyn GenerateBackend>) -> Self {
        Self { retriever, generator }
    }

    /// Provider name of the generation backend (for metadata endpoints).
    pub fn provider(&self) -> String {
        self.generator.provider().to_string()
    }

    /// Model name of the generation backend (for metadata endpoints).
    pub fn model(&self) -> String {
        self.generator.model().to_string()
    }

    /// Answers a question in one shot.
    ///
    /// Insufficient evidence yields a refusal answer with empty citations,
    /// not an error. A first draft shorter than the minimum is retried once
    /// with an expand instruction.
    ///
    /// # Errors
    /// Returns an error when retrieval or generation (after any fallback)
    /// fails.
    pub async fn answer_once(&self, req: &AnswerRequest) -> Result<Answer, EngineError> {
        let summary_mode = is_summary_question(&req.question);
        let top_k = effective_top_k(req.top_k, summary_mode);
        info!(
            tenant_id = %req.tenant_id,
            q_len = req.question.chars().count(),
            top_k,
            max_tokens = req.max_tokens,
            summary_mode,
            "answering (one-shot)"
        );

        let hits = self
            .retriever
            .retrieve(&req.question, top_k, req.file_ids.as_deref(), &req.tenant_id)
            .await?;
        let passages: Vec<Passage> = hits.iter().map(|(p, _)| p.clone()).collect();

        if !has_sufficient_evidence(&passages) {
            info!(hits = hits.len(), "insufficient evidence, refusing");
            return Ok(Answer {
                text: REFUSAL.to_string(),
                refused: true,
                citations: Vec::new(),
            });
        }

        let context = build_context(&passages);
        let prompt = compose(&context, &req.question, summary_mode);
        let gen_req = GenerationRequest {
            prompt,
            max_tokens: req.max_tokens,
            temperature: TEMPERATURE,
        };

        let mut answer = self.generator.generate_once(&gen_req).await?.trim().to_string();

        if answer.chars().count() < MIN_ONCE_CHARS && !context.trim().is_empty() {
            warn!(len = answer.chars().count(), "short answer, retrying with expand");
            let retry = GenerationRequest {
                prompt: with_expand_once(&gen_req.prompt),
                ..gen_req
            };
            answer = self.generator.generate_once(&retry).await?.trim().to_string();
        }

        Ok(Answer {
            text: answer,
            refused: false,
            citations: build_citations(&hits),
        })
    }

    /// Answers a question incrementally, pushing events into `tx`.
    ///
    /// Event order: one `meta`, then either `refused`+`final` or tokens
    /// followed by `final`, then `done`. Failures after the stream starts
    /// become `refused`/`final` events rather than errors. Tokens from the
    /// expand retry are accumulated but not re-emitted; `final` always
    /// carries the authoritative text.
    ///
    /// Stops early without error when the consumer drops the receiver.
    pub async fn answer_stream(&self, req: AnswerRequest, tx: mpsc::Sender<AnswerEvent>) {
        let summary_mode = is_summary_question(&req.question);
        let top_k = effective_top_k(req.top_k, summary_mode);
        info!(
            tenant_id = %req.tenant_id,
            provider = %self.provider(),
            model = %self.model(),
            q_len = req.question.chars().count(),
            top_k,
            max_tokens = req.max_tokens,
            summary_mode,
            "answering (incremental)"
        );

        let hits = match self
            .retriever
            .retrieve(&req.question, top_k, req.file_ids.as_deref(), &req.tenant_id)
            .await
        {
            Ok(hits) => hits,
            Err(e) => {
                // The stream is already committed; retrieval failures
                // become data like any later failure.
                warn!(error = %e, "retrieval failed on incremental path");
                let msg = format!("retrieval error: {e}");
                let _ = tx
                    .send(AnswerEvent::Meta {
                        citations: Vec::new(),
                        provider: self.provider(),
                        model: self.model(),
                    })
                    .await;
                let _ = tx.send(AnswerEvent::Refused { answer: msg.clone() }).await;
                let _ = tx.send(AnswerEvent::Final { answer: msg }).await;
                let _ = tx.send(AnswerEvent::Done).await;
                return;
            }
        };
        let passages: Vec<Passage> = hits.iter().map(|(p, _)| p.clone()).collect();

        // Citations ride on `meta` even when the gate refuses below.
        let meta = AnswerEvent::Meta {
            citations: build_citations(&hits),
            provider: self.provider(),
            model: self.model(),
        };
        if tx.send(meta).await.is_err() {
            return;
        }

        if !has_sufficient_evidence(&passages) {
            info!(hits = hits.len(), "insufficient evidence, refusing");
            let _ = tx
                .send(AnswerEvent::Refused { answer: REFUSAL.to_string() })
                .await;
            let _ = tx
                .send(AnswerEvent::Final { answer: REFUSAL.to_string() })
                .await;
            let _ = tx.send(AnswerEvent::Done).await;
            return;
        }

        let context = build_context(&passages);
        let prompt = compose(&context, &req.question, summary_mode);
        let gen_req = GenerationRequest {
            prompt,
            max_tokens: req.max_tokens,
            temperature: TEMPERATURE,
        };

        let mut full_answer = String::new();
        let mut emitted_any = false;
        let mut stream = self.generator.generate_stream(gen_req.clone());
        while let Some(item) = stream.next().await {
            match item {
                Ok(token) => {
                    emitted_any = true;
                    full_answer.push_str(&token);
                    if tx.send(AnswerEvent::Token { token }).await.is_err() {
                        return;
                    }
                }
                Err(e) => {
                    self.send_stream_failure(&tx, &e).await;
                    return;
                }
            }
        }

        if !emitted_any {
            // Clean stream with zero increments: treat as a refusal, but
            // keep the token/final contract intact for clients.
            full_answer = REFUSAL.to_string();
            if tx
                .send(AnswerEvent::Token { token: full_answer.clone() })
                .await
                .is_err()
            {
                return;
            }
        }

        if full_answer.trim().chars().count() < MIN_STREAM_CHARS && !context.trim().is_empty() {
            warn!(
                len = full_answer.trim().chars().count(),
                "short streamed answer, retrying with expand"
            );
            let retry = GenerationRequest {
                prompt: with_expand_stream(&gen_req.prompt),
                ..gen_req
            };
            full_answer.clear();
            let mut retry_stream = self.generator.generate_stream(retry);
            while let Some(item) = retry_stream.next().await {
                match item {
                    // Retry tokens are not re-emitted; clients keep the
                    // first pass on screen until `final` replaces it.
                    Ok(token) => full_answer.push_str(&token),
                    Err(e) => {
                        self.send_stream_failure(&tx, &e).await;
                        return;
                    }
                }
            }
        }

        let _ = tx
            .send(AnswerEvent::Final { answer: full_answer.trim().to_string() })
            .await;
        let _ = tx.send(AnswerEvent::Done).await;
    }

    async fn send_stream_failure(&self, tx: &mpsc::Sender<AnswerEvent>, e: &llm_service::LlmError) {
        warn!(error = %e, "generation failed on incremental path");
        let msg = format!("LLM error: {e}");
        let _ = tx.send(AnswerEvent::Refused { answer: msg.clone() }).await;
        let _ = tx.send(AnswerEvent::Final { answer: msg }).await;
        let _ = tx.send(AnswerEvent::Done).await;
    }
}
