use anyhow::Result;
use llamashim_daemon::api::ollama::{OllamaTagsResponse, OllamaVersionResponse};
use std::path::Path;
use std::time::Duration;

pub async fn execute(config_path: Option<&Path>) -> Result<()> {
    let config = super::load_config(config_path)?;
    let url = format!("http://{}", config.bind_addr()?);

    println!("llamashim status\n");

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(2))
        .build()?;

    if !check_health(&client, &url).await {
        println!("Daemon: not running ({})", url);
        println!("\nRun `llamashim serve` to start the daemon.");
        return Ok(());
    }

    println!("Daemon: running ({})", url);

    let version: OllamaVersionResponse = client
        .get(format!("{}/api/version", url))
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;
    println!("Version: {} ({})", version.version, version.build);

    let tags: OllamaTagsResponse = client
        .get(format!("{}/api/tags", url))
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    for model in tags.models {
        let size = format!("{:.2} GB", model.size as f64 / 1_073_741_824.0);
        println!("Model: {:<20} {}", model.name, size);
    }

    Ok(())
}

/// True when the daemon answers `/health` with a success status.
async fn check_health(client: &reqwest::Client, url: &str) -> bool {
    match client.get(format!("{}/health", url)).send().await {
        Ok(response) => response.status().is_success(),
        Err(e) => {
            tracing::debug!("Health check failed: {}", e);
            false
        }
    }
}
