//! POST /chat — one-shot answer over the tenant's documents.

use std::sync::Arc;

use axum::{Json, extract::State, http::HeaderMap};

use crate::{
    core::app_state::AppState,
    error_handler::AppResult,
    routes::chat::{
        chat_request::{ChatRequest, ChatResponse},
        require_tenant,
    },
};

/// Handler: POST /chat
///
/// # Example
/// ```bash
/// curl -X POST http://127.0.0.1:8080/chat \
///   -H 'content-type: application/json' \
///   -H 'X-API-Key: dev-key' \
///   -d '{"question":"What is the invoice total?","top_k":8}'
/// ```
pub async fn chat(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<ChatRequest>,
) -> AppResult<Json<ChatResponse>> {
    let tenant_id = require_tenant(&headers, &state.api_keys)?;
    body.validate()?;

    let answer = state
        .engine
        .answer_once(&body.into_answer_request(tenant_id))
        .await?;

    Ok(Json(ChatResponse {
        answer: answer.text,
        refused: answer.refused,
        citations: answer.citations,
    }))
}
