use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Failures surfaced by the Ollama endpoints.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ShimError {
    #[error("Model '{0}' not found")]
    NotFound(String),

    #[error("Failed to load model: {0}")]
    Load(String),

    #[error("Generation failed: {0}")]
    Generation(String),

    #[error("Chat failed: {0}")]
    Chat(String),
}

impl ShimError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ShimError::NotFound(_) => StatusCode::NOT_FOUND,
            ShimError::Load(_) | ShimError::Generation(_) | ShimError::Chat(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    detail: String,
}

impl IntoResponse for ShimError {
    fn into_response(self) -> Response {
        (
            self.status_code(),
            Json(ErrorBody {
                detail: self.to_string(),
            }),
        )
            .into_response()
    }
}
