use anyhow::Result;
use std::path::{Path, PathBuf};

pub async fn execute(
    config_path: Option<&Path>,
    host: Option<String>,
    port: Option<u16>,
    model_path: Option<PathBuf>,
) -> Result<()> {
    let mut config = super::load_config(config_path)?;
    if let Some(host) = host {
        config.daemon.host = host;
    }
    if let Some(port) = port {
        config.daemon.port = port;
    }
    if let Some(model_path) = model_path {
        config.model.path = model_path;
    }

    let addr = config.bind_addr()?;
    if !config.model.path.exists() {
        tracing::warn!(
            "Model file {:?} not found; requests will fail until it exists",
            config.model.path
        );
    }

    println!("Starting llamashim daemon...");
    println!("Listening on http://{}", addr);
    println!("Serving model '{}' from {}", config.model.id, config.model.path.display());
    println!("\nAPI endpoints:");
    println!("  GET  /api/tags     - List models");
    println!("  POST /api/generate - Generate a completion");
    println!("  POST /api/chat     - Chat completion");
    println!("  GET  /api/version  - Version info");
    println!("\nPress Ctrl+C to stop.\n");

    llamashim_daemon::run_server(config).await?;

    Ok(())
}
