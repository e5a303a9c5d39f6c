use llamashim_core::Config;
use llamashim_runtime_api::Runtime;
use llamashim_runtime_llamacpp::LlamaCppRuntime;
use std::sync::Arc;

use crate::registry::{ModelRegistry, RuntimeFactory};

pub struct AppState {
    pub config: Config,
    pub registry: ModelRegistry,
}

impl AppState {
    /// State backed by llama.cpp.
    pub fn new(config: Config) -> Self {
        Self::with_factory(config, llamacpp_factory())
    }

    pub fn with_factory(config: Config, factory: RuntimeFactory) -> Self {
        let registry = ModelRegistry::new(config.model.clone(), factory);
        Self { config, registry }
    }
}

pub fn llamacpp_factory() -> RuntimeFactory {
    Arc::new(|| Box::new(LlamaCppRuntime::new()) as Box<dyn Runtime>)
}
