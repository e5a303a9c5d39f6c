//! llamashim_core - Core library shared by the daemon and CLI
//!
//! This crate provides:
//! - Process configuration loaded from TOML
//! - The static catalog entry describing the served model
//! - Ollama-style timestamp formatting

pub mod catalog;
pub mod config;
pub mod time;

pub use catalog::{ModelDetails, ModelEntry};
pub use config::Config;
pub use time::format_timestamp;
