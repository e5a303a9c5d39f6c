//! llamashim_runtime_api - Runtime API traits and types
//!
//! This crate defines the contract between the HTTP shim and the inference
//! engine. The daemon only talks to engines through [`Runtime`], so tests can
//! substitute a deterministic engine for llama.cpp.

mod stop;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub use stop::truncate_at_stop;

/// Runtime status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RuntimeStatus {
    Unloaded,
    Loading,
    Ready,
    Error,
}

/// Configuration for a runtime instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    pub model_path: PathBuf,
    /// Context window in tokens
    pub context_size: u32,
    /// Layers offloaded to the GPU; 0 keeps execution on the CPU
    pub gpu_layers: u32,
    pub cpu_threads: Option<u32>,
}

/// A single prompt completion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub prompt: String,
    /// Maximum tokens to generate; `None` runs until the context window fills
    pub max_tokens: Option<u32>,
    pub temperature: f32,
    /// Generation ends when any of these appears; the match is not returned
    #[serde(default)]
    pub stop: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    /// End-of-generation token or a stop sequence
    Stop,
    /// Token budget exhausted
    Length,
}

/// Response from a completion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionResponse {
    pub text: String,
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub finish_reason: FinishReason,
}

/// The main Runtime trait that all backends must implement
#[async_trait]
pub trait Runtime: Send + Sync {
    /// Get current status
    fn status(&self) -> RuntimeStatus;

    /// Load a model
    async fn load(&mut self, config: RuntimeConfig) -> Result<()>;

    /// Unload the current model
    async fn unload(&mut self) -> Result<()>;

    /// Run a completion to the end. Implementations must not block the
    /// calling async task while the engine runs.
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse>;
}
