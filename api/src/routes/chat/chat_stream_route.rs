//! POST /chat/stream — incremental answer as NDJSON events.
//!
//! Each response line is one serialized `AnswerEvent`. The HTTP status is
//! committed before generation starts, so later failures arrive as
//! `refused`/`final` events inside the stream, not as error statuses.

use std::sync::Arc;

use axum::{
    Json,
    body::Body,
    extract::State,
    http::{HeaderMap, header},
    response::{IntoResponse, Response},
};
use tokio::sync::mpsc;

use answer_engine::AnswerEvent;

use crate::{
    core::app_state::AppState,
    error_handler::AppResult,
    routes::chat::{chat_request::ChatRequest, require_tenant},
};

const EVENT_CHANNEL_CAPACITY: usize = 16;

/// Handler: POST /chat/stream
pub async fn chat_stream(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<ChatRequest>,
) -> AppResult<Response> {
    let tenant_id = require_tenant(&headers, &state.api_keys)?;
    body.validate()?;
    let req = body.into_answer_request(tenant_id);

    let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
    let engine = Arc::clone(&state.engine);
    tokio::spawn(async move {
        engine.answer_stream(req, tx).await;
    });

    let lines = futures::stream::unfold(rx, |mut rx| async move {
        let event = rx.recv().await?;
        Some((Ok::<_, std::convert::Infallible>(encode_line(&event)), rx))
    });

    Ok((
        [(header::CONTENT_TYPE, "application/x-ndjson")],
        Body::from_stream(lines),
    )
        .into_response())
}

/// One event per line. Serialization of the event enum cannot fail; an
/// empty line on the impossible path beats panicking mid-response.
fn encode_line(event: &AnswerEvent) -> String {
    let mut line = serde_json::to_string(event).unwrap_or_default();
    line.push('\n');
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lines_are_newline_terminated_json() {
        let line = encode_line(&AnswerEvent::Token {
            token: "hi".to_string(),
        });
        assert_eq!(line, "{\"type\":\"token\",\"token\":\"hi\"}\n");
    }
}
