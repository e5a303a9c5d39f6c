//! Load-once cache from model identifier to a loaded engine.
//!
//! Only the configured model can be loaded. Each name maps to one shared load
//! future running on its own task, so concurrent cold requests share a single
//! load and a request that goes away mid-load does not abandon it.

use chrono::{DateTime, Utc};
use futures_util::future::{BoxFuture, FutureExt, Shared};
use llamashim_core::config::ModelConfig;
use llamashim_runtime_api::{Runtime, RuntimeConfig};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use crate::error::ShimError;

/// Builds an unloaded engine; the registry loads it on first use.
pub type RuntimeFactory = Arc<dyn Fn() -> Box<dyn Runtime> + Send + Sync>;

type LoadResult = Result<Arc<ModelHandle>, ShimError>;
type Slot = Shared<BoxFuture<'static, LoadResult>>;

pub struct ModelHandle {
    name: String,
    runtime: Box<dyn Runtime>,
    loaded_at: DateTime<Utc>,
    load_duration: Duration,
}

impl ModelHandle {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn runtime(&self) -> &dyn Runtime {
        self.runtime.as_ref()
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }

    pub fn load_duration(&self) -> Duration {
        self.load_duration
    }
}

pub struct ModelRegistry {
    model: ModelConfig,
    factory: RuntimeFactory,
    slots: RwLock<HashMap<String, Slot>>,
}

impl ModelRegistry {
    pub fn new(model: ModelConfig, factory: RuntimeFactory) -> Self {
        Self {
            model,
            factory,
            slots: RwLock::new(HashMap::new()),
        }
    }

    /// The model this registry is allowed to load.
    pub fn model_config(&self) -> &ModelConfig {
        &self.model
    }

    /// Return the resident handle for `name`, loading it on first use.
    pub async fn acquire(&self, name: &str) -> Result<Arc<ModelHandle>, ShimError> {
        if let Some(handle) = self.resident(name).await {
            return Ok(handle);
        }

        if name != self.model.id {
            return Err(ShimError::NotFound(name.to_string()));
        }

        self.slot(name).await.await
    }

    /// Handles that finished loading, in no particular order.
    pub async fn loaded_models(&self) -> Vec<Arc<ModelHandle>> {
        self.slots
            .read()
            .await
            .values()
            .filter_map(finished)
            .collect()
    }

    async fn resident(&self, name: &str) -> Option<Arc<ModelHandle>> {
        self.slots.read().await.get(name).and_then(finished)
    }

    /// The in-flight or finished load for `name`. A load that ended in an
    /// error is replaced so the caller retries.
    async fn slot(&self, name: &str) -> Slot {
        let mut slots = self.slots.write().await;
        if let Some(slot) = slots.get(name) {
            if !matches!(slot.peek(), Some(Err(_))) {
                return slot.clone();
            }
        }

        let task = tokio::spawn(load(
            name.to_string(),
            self.model.clone(),
            self.factory.clone(),
        ));
        let slot = async move {
            task.await
                .map_err(|e| ShimError::Load(format!("load task failed: {}", e)))?
        }
        .boxed()
        .shared();

        slots.insert(name.to_string(), slot.clone());
        slot
    }
}

fn finished(slot: &Slot) -> Option<Arc<ModelHandle>> {
    match slot.peek() {
        Some(Ok(handle)) => Some(handle.clone()),
        _ => None,
    }
}

async fn load(name: String, model: ModelConfig, factory: RuntimeFactory) -> LoadResult {
    tracing::info!("Loading model {} from {:?}...", name, model.path);
    let start = Instant::now();

    let mut runtime = factory();
    let config = RuntimeConfig {
        model_path: model.path,
        context_size: model.context_size,
        gpu_layers: model.gpu_layers,
        cpu_threads: model.threads,
    };

    if let Err(e) = runtime.load(config).await {
        tracing::error!("Failed to load model: {:#}", e);
        return Err(ShimError::Load(format!("{:#}", e)));
    }

    let load_duration = start.elapsed();
    tracing::info!(
        "Model {} loaded in {:.2}s",
        name,
        load_duration.as_secs_f64()
    );

    Ok(Arc::new(ModelHandle {
        name,
        runtime,
        loaded_at: Utc::now(),
        load_duration,
    }))
}
