//! GET /whoami — which backend is answering.

use std::sync::Arc;

use axum::{Json, extract::State};
use serde_json::{Value, json};

use crate::core::app_state::AppState;

pub async fn whoami(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "llm_provider": state.provider,
        "model": state.model,
    }))
}
