use anyhow::Result;
use axum::Router;
use llamashim_core::Config;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::api;
use crate::state::AppState;

/// Router with the Ollama routes, CORS and request tracing.
pub fn app(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    api::routes(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

pub async fn run_server(config: Config) -> Result<()> {
    let addr = config.bind_addr()?;
    tracing::info!(
        "Serving model {} from {:?}",
        config.model.id,
        config.model.path
    );

    let state = Arc::new(AppState::new(config));
    let app = app(state);

    tracing::info!("Starting daemon on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
