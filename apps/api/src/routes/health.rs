use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET /health
/// Service version plus retrieval engine status.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    let index = match state.policy.index_stats().await {
        Some((version, chunks)) => json!({ "version": version, "chunks": chunks }),
        None => Value::Null,
    };

    let engine = if state.policy.is_initialized() {
        "initialized"
    } else {
        "not initialized"
    };

    let active_sessions = state.policy.sessions().len().await;

    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "hrdesk-api",
        "rag_engine": engine,
        "index": index,
        "active_sessions": active_sessions,
    }))
}
