//! llamashim_daemon - HTTP server with an Ollama-compatible API
//!
//! This crate provides the daemon server that:
//! - Exposes Ollama's /api/tags, /api/generate, /api/chat and /api/version
//! - Loads the configured GGUF model once, on first use
//! - Runs inference off the async workers

pub mod api;
pub mod error;
pub mod registry;
pub mod server;
pub mod state;

pub use error::ShimError;
pub use registry::{ModelHandle, ModelRegistry, RuntimeFactory};
pub use server::{app, run_server};
pub use state::AppState;
