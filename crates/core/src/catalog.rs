//! Catalog entry for the single served model.
//!
//! Ollama clients expect `/api/tags` to describe each model with a digest and
//! a details block. The values here are fixed placeholders: they do not come
//! from the GGUF file and callers must not depend on them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::config::ModelConfig;
use crate::time::format_timestamp_at;

/// Placeholder digest; not a hash of the model file.
pub const PLACEHOLDER_DIGEST: &str = "sha256:simulated_digest_value";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelDetails {
    pub license: String,
    pub modelfile: String,
    pub parameters: String,
    pub template: String,
    pub format: String,
    pub family: String,
    pub families: Vec<String>,
    pub parameter_size: String,
    pub quantization_level: String,
}

impl ModelDetails {
    /// The fixed details block reported for every model.
    pub fn placeholder() -> Self {
        Self {
            license: "llama3".to_string(),
            modelfile: "FROM llama3.2\n".to_string(),
            parameters: "llama 3.2".to_string(),
            template: "{{ .Prompt}}".to_string(),
            format: "gguf".to_string(),
            family: "llama".to_string(),
            families: vec!["llama".to_string()],
            parameter_size: "8B".to_string(),
            quantization_level: "Q4_0".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelEntry {
    pub name: String,
    pub modified_at: String,
    pub size: u64,
    pub digest: String,
    pub details: ModelDetails,
}

impl ModelEntry {
    /// Describe the configured model as of `now`.
    pub fn describe(model: &ModelConfig, now: DateTime<Utc>) -> Self {
        Self {
            name: model.id.clone(),
            modified_at: format_timestamp_at(now),
            size: file_size(&model.path),
            digest: PLACEHOLDER_DIGEST.to_string(),
            details: ModelDetails::placeholder(),
        }
    }
}

/// Size of the file at `path` in bytes, or 0 if it cannot be read.
pub fn file_size(path: &Path) -> u64 {
    match std::fs::metadata(path) {
        Ok(meta) => meta.len(),
        Err(e) => {
            tracing::debug!("Model file {:?} unavailable: {}", path, e);
            0
        }
    }
}
