//! llamashim_runtime_llamacpp - llama.cpp inference runtime
//!
//! Loads a GGUF file through `llama-cpp-2` and serves completions. Loading
//! and generation are blocking FFI calls, so both run on tokio's blocking
//! pool; completions against one model are serialized behind a mutex.

mod model;

use anyhow::Result;
use async_trait::async_trait;
use llamashim_runtime_api::{
    CompletionRequest, CompletionResponse, Runtime, RuntimeConfig, RuntimeStatus,
};
use std::sync::{Arc, Mutex};

use model::LoadedModel;

pub struct LlamaCppRuntime {
    status: RuntimeStatus,
    config: Option<RuntimeConfig>,
    model: Arc<Mutex<Option<LoadedModel>>>,
}

impl LlamaCppRuntime {
    pub fn new() -> Self {
        Self {
            status: RuntimeStatus::Unloaded,
            config: None,
            model: Arc::new(Mutex::new(None)),
        }
    }

    pub fn config(&self) -> Option<&RuntimeConfig> {
        self.config.as_ref()
    }
}

impl Default for LlamaCppRuntime {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Runtime for LlamaCppRuntime {
    fn status(&self) -> RuntimeStatus {
        self.status
    }

    async fn load(&mut self, config: RuntimeConfig) -> Result<()> {
        self.status = RuntimeStatus::Loading;
        tracing::info!(
            "Loading model from {:?} (n_ctx={}, gpu_layers={})",
            config.model_path,
            config.context_size,
            config.gpu_layers
        );

        let load_config = config.clone();
        let loaded = tokio::task::spawn_blocking(move || LoadedModel::load(&load_config)).await;

        let loaded = match loaded {
            Ok(Ok(loaded)) => loaded,
            Ok(Err(e)) => {
                self.status = RuntimeStatus::Error;
                return Err(e);
            }
            Err(e) => {
                self.status = RuntimeStatus::Error;
                return Err(e.into());
            }
        };

        *self
            .model
            .lock()
            .map_err(|_| anyhow::anyhow!("Model lock poisoned"))? = Some(loaded);
        self.config = Some(config);
        self.status = RuntimeStatus::Ready;

        Ok(())
    }

    async fn unload(&mut self) -> Result<()> {
        tracing::info!("Unloading model");
        let model = self.model.clone();
        tokio::task::spawn_blocking(move || {
            let mut guard = model
                .lock()
                .map_err(|_| anyhow::anyhow!("Model lock poisoned"))?;
            *guard = None;
            Ok::<_, anyhow::Error>(())
        })
        .await??;

        self.config = None;
        self.status = RuntimeStatus::Unloaded;
        Ok(())
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        if self.status != RuntimeStatus::Ready {
            anyhow::bail!("Model not loaded");
        }

        let model = self.model.clone();
        tokio::task::spawn_blocking(move || {
            let guard = model
                .lock()
                .map_err(|_| anyhow::anyhow!("Model lock poisoned"))?;
            let loaded = guard
                .as_ref()
                .ok_or_else(|| anyhow::anyhow!("Model not loaded"))?;
            loaded.generate(&request)
        })
        .await?
    }
}
