//! Ollama-compatible API endpoints for drop-in replacement compatibility.
//!
//! Ollama API docs: https://github.com/ollama/ollama/blob/main/docs/api.md
//!
//! Streaming is not implemented: `stream: true` is accepted and answered with
//! the same single JSON object as `stream: false`.

use axum::{extract::State, Json};
use llamashim_core::{format_timestamp, ModelEntry};
use serde::{Deserialize, Serialize};
use std::{sync::Arc, time::Instant};

use super::format::{eval_count, millis};
use super::translate::{chat_prompt, generate_prompt, GenerationOptions, OllamaOptions};
use crate::error::ShimError;
use crate::state::AppState;

// ============================================================================
// POST /api/generate - Ollama generate endpoint
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct OllamaGenerateRequest {
    pub model: String,
    pub prompt: String,
    #[serde(default)]
    pub system: Option<String>,
    /// Accepted for compatibility; not applied
    #[serde(default)]
    pub template: Option<String>,
    /// Accepted for compatibility; not applied
    #[serde(default)]
    pub context: Option<Vec<i64>>,
    #[serde(default)]
    pub stream: Option<bool>,
    /// Accepted for compatibility; not applied
    #[serde(default)]
    pub raw: Option<bool>,
    /// Accepted for compatibility; not applied
    #[serde(default)]
    pub format: Option<serde_json::Value>,
    #[serde(default)]
    pub options: Option<OllamaOptions>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OllamaGenerateResponse {
    pub model: String,
    pub created_at: String,
    pub response: String,
    pub done: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<Vec<i64>>,
    pub total_duration: u64,
    pub load_duration: u64,
    pub prompt_eval_duration: u64,
    pub eval_count: u64,
    pub eval_duration: u64,
}

pub async fn generate(
    State(state): State<Arc<AppState>>,
    Json(request): Json<OllamaGenerateRequest>,
) -> Result<Json<OllamaGenerateResponse>, ShimError> {
    let options =
        GenerationOptions::resolve(request.options.as_ref(), &state.config.inference);

    let handle = state.registry.acquire(&request.model).await?;

    if request.stream.unwrap_or(false) {
        tracing::debug!("Streaming requested for {}; sending a single response", request.model);
    }

    let prompt = generate_prompt(request.system.as_deref(), &request.prompt);

    let start = Instant::now();
    let completion = handle
        .runtime()
        .complete(options.into_request(prompt.clone()))
        .await
        .map_err(|e| {
            tracing::error!("Error during generation: {:#}", e);
            ShimError::Generation(format!("{:#}", e))
        })?;
    let eval_duration = millis(start.elapsed());
    tracing::debug!(
        "Generated {} tokens from {} prompt tokens ({:?})",
        completion.completion_tokens,
        completion.prompt_tokens,
        completion.finish_reason
    );

    let generated = completion.text.trim().to_string();
    let total_duration = millis(start.elapsed());

    Ok(Json(OllamaGenerateResponse {
        model: request.model,
        created_at: format_timestamp(),
        eval_count: eval_count(&prompt, &generated),
        response: generated,
        done: true,
        context: None,
        total_duration,
        // the model is resident by the time we get here
        load_duration: 0,
        prompt_eval_duration: eval_duration,
        eval_duration,
    }))
}

// ============================================================================
// POST /api/chat - Ollama chat endpoint
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct OllamaChatRequest {
    pub model: String,
    pub messages: Vec<OllamaChatMessage>,
    #[serde(default)]
    pub stream: Option<bool>,
    #[serde(default)]
    pub options: Option<OllamaOptions>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OllamaChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OllamaChatResponse {
    pub model: String,
    pub created_at: String,
    pub message: OllamaChatMessage,
    pub done: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_duration: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub load_duration: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_eval_duration: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eval_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eval_duration: Option<u64>,
}

pub async fn chat(
    State(state): State<Arc<AppState>>,
    Json(request): Json<OllamaChatRequest>,
) -> Result<Json<OllamaChatResponse>, ShimError> {
    let options =
        GenerationOptions::resolve(request.options.as_ref(), &state.config.inference);

    let handle = state.registry.acquire(&request.model).await?;

    if request.stream.unwrap_or(false) {
        tracing::debug!("Streaming requested for {}; sending a single response", request.model);
    }

    let prompt = chat_prompt(
        request
            .messages
            .iter()
            .map(|m| (m.role.as_str(), m.content.as_str())),
    );

    let start = Instant::now();
    let completion = handle
        .runtime()
        .complete(options.into_request(prompt.clone()))
        .await
        .map_err(|e| {
            tracing::error!("Error during chat: {:#}", e);
            ShimError::Chat(format!("{:#}", e))
        })?;
    tracing::debug!(
        "Chat reply of {} tokens ({:?})",
        completion.completion_tokens,
        completion.finish_reason
    );

    let generated = completion.text.trim().to_string();
    let total_duration = millis(start.elapsed());

    Ok(Json(OllamaChatResponse {
        model: request.model,
        created_at: format_timestamp(),
        eval_count: Some(eval_count(&prompt, &generated)),
        message: OllamaChatMessage {
            role: "assistant".to_string(),
            content: generated,
        },
        done: true,
        total_duration: Some(total_duration),
        load_duration: None,
        prompt_eval_duration: None,
        eval_duration: None,
    }))
}

// ============================================================================
// GET /api/tags - List local models (Ollama format)
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct OllamaTagsResponse {
    pub models: Vec<ModelEntry>,
}

pub async fn tags(State(state): State<Arc<AppState>>) -> Json<OllamaTagsResponse> {
    let entry = ModelEntry::describe(state.registry.model_config(), chrono::Utc::now());
    Json(OllamaTagsResponse {
        models: vec![entry],
    })
}

// ============================================================================
// GET /api/version - Version info
// ============================================================================

/// Reported version; fixed, not derived from build metadata.
pub const OLLAMA_VERSION: &str = "0.1.0";
pub const OLLAMA_BUILD: &str = "emulation";

#[derive(Debug, Serialize, Deserialize)]
pub struct OllamaVersionResponse {
    pub version: String,
    pub build: String,
}

pub async fn version() -> Json<OllamaVersionResponse> {
    Json(OllamaVersionResponse {
        version: OLLAMA_VERSION.to_string(),
        build: OLLAMA_BUILD.to_string(),
    })
}
