//! HTTP layer for the document Q&A backend.
//!
//! Routes:
//! - `POST /chat` — one-shot answer with citations
//! - `POST /chat/stream` — incremental NDJSON answer events
//! - `GET /health` — liveness probe
//! - `GET /whoami` — active provider/model
//!
//! `/chat` and `/chat/stream` resolve the tenant from the `X-API-Key`
//! header; the rest are open.

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tokio::signal;
use tracing::info;

pub mod core;
pub mod error_handler;
mod routes;

use crate::core::app_state::AppState;
use crate::error_handler::{AppError, AppResult};
use crate::routes::chat::chat_route::chat;
use crate::routes::chat::chat_stream_route::chat_stream;
use crate::routes::health_route::health;
use crate::routes::whoami_route::whoami;

/// Builds the application router over shared state.
pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/chat", post(chat))
        .route("/chat/stream", post(chat_stream))
        .route("/health", get(health))
        .route("/whoami", get(whoami))
        .with_state(state)
}

/// Wires state from the environment and serves until Ctrl+C.
///
/// # Errors
/// Returns an error when configuration is invalid, the listener cannot
/// bind, or the server fails.
pub async fn start() -> AppResult<()> {
    let state = Arc::new(AppState::from_env()?);
    let addr = llm_service::error_handler::env_or("API_ADDRESS", "0.0.0.0:8080");

    info!(addr = %addr, provider = %state.provider, model = %state.model, "starting server");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(AppError::Bind)?;

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(AppError::Server)?;

    Ok(())
}

/// Resolves when Ctrl+C is received.
async fn shutdown_signal() {
    if signal::ctrl_c().await.is_err() {
        tracing::error!("failed to install shutdown signal handler");
    }
}
