pub mod format;
pub mod ollama;
pub mod translate;

use axum::{
    routing::{get, post},
    Router,
};

use crate::state::AppState;
use std::sync::Arc;

pub fn routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/tags", get(ollama::tags))
        .route("/api/generate", post(ollama::generate))
        .route("/api/chat", post(ollama::chat))
        .route("/api/version", get(ollama::version))
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}
