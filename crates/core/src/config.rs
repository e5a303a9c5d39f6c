use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Daemon settings
    #[serde(default)]
    pub daemon: DaemonConfig,

    /// The single model this process serves
    #[serde(default)]
    pub model: ModelConfig,

    /// Inference defaults applied when a request omits an option
    #[serde(default)]
    pub inference: InferenceConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Host to bind to
    #[serde(default = "default_host")]
    pub host: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Identifier clients use in the `model` field
    #[serde(default = "default_model_id")]
    pub id: String,

    /// Path to the GGUF file backing the model
    #[serde(default = "default_model_path")]
    pub path: PathBuf,

    /// Context window in tokens
    #[serde(default = "default_context_size")]
    pub context_size: u32,

    /// Layers offloaded to the GPU (0 = CPU only)
    #[serde(default)]
    pub gpu_layers: u32,

    /// Inference threads (None = llama.cpp default)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threads: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferenceConfig {
    /// Default temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Default number of tokens to predict
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_port() -> u16 {
    11435
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_model_id() -> String {
    "llama3.2".to_string()
}

fn default_model_path() -> PathBuf {
    PathBuf::from("models/Llama-3.2-3B-Instruct-Q4_K_M.gguf")
}

fn default_context_size() -> u32 {
    2048
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> u32 {
    512
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            id: default_model_id(),
            path: default_model_path(),
            context_size: default_context_size(),
            gpu_layers: 0,
            threads: None,
        }
    }
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }
}

impl Config {
    /// Get the base directory: ~/.config/llamashim/
    pub fn base_dir() -> Result<PathBuf> {
        let home = std::env::var("HOME")
            .map(PathBuf::from)
            .or_else(|_| std::env::var("USERPROFILE").map(PathBuf::from))
            .map_err(|_| anyhow::anyhow!("Could not determine home directory"))?;
        Ok(home.join(".config").join("llamashim"))
    }

    /// Get the config file path: ~/.config/llamashim/config.toml
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::base_dir()?.join("config.toml"))
    }

    /// Load config from the default location
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load config from `path`, falling back to defaults when the file is absent
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("No config at {:?}, using defaults", path);
            return Ok(Config::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Invalid config {}", path.display()))?;
        Ok(config)
    }

    /// Save config to the default location
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Socket address the daemon binds to
    pub fn bind_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.daemon.host, self.daemon.port)
            .parse()
            .with_context(|| {
                format!(
                    "Invalid bind address {}:{}",
                    self.daemon.host, self.daemon.port
                )
            })
    }
}
