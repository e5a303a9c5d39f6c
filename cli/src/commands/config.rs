use anyhow::Result;
use llamashim_core::Config;
use std::path::Path;

pub async fn execute(config_path: Option<&Path>, key: Option<&str>, value: Option<&str>) -> Result<()> {
    let path = super::config_file(config_path)?;
    let mut config = Config::load_from(&path)?;

    match (key, value) {
        // Show all config
        (None, None) => {
            println!("Configuration file: {:?}\n", path);
            println!("[daemon]");
            println!("  host = \"{}\"", config.daemon.host);
            println!("  port = {}", config.daemon.port);
            println!();
            println!("[model]");
            println!("  id = \"{}\"", config.model.id);
            println!("  path = {:?}", config.model.path.display().to_string());
            println!("  context_size = {}", config.model.context_size);
            println!("  gpu_layers = {}", config.model.gpu_layers);
            println!(
                "  threads = {}",
                config
                    .model
                    .threads
                    .map(|t| t.to_string())
                    .unwrap_or_else(|| "(default)".to_string())
            );
            println!();
            println!("[inference]");
            println!("  temperature = {}", config.inference.temperature);
            println!("  max_tokens = {}", config.inference.max_tokens);
        }

        // Get a specific key
        (Some(key), None) => {
            let value = get_config_value(&config, key)?;
            println!("{}", value);
        }

        // Set a specific key
        (Some(key), Some(value)) => {
            set_config_value(&mut config, key, value)?;
            config.save_to(&path)?;
            println!("Set {} = {}", key, value);
        }

        (None, Some(_)) => anyhow::bail!("A key is required to set a value"),
    }

    Ok(())
}

fn get_config_value(config: &Config, key: &str) -> Result<String> {
    match key {
        "daemon.host" => Ok(config.daemon.host.clone()),
        "daemon.port" => Ok(config.daemon.port.to_string()),
        "model.id" => Ok(config.model.id.clone()),
        "model.path" => Ok(config.model.path.display().to_string()),
        "model.context_size" => Ok(config.model.context_size.to_string()),
        "model.gpu_layers" => Ok(config.model.gpu_layers.to_string()),
        "model.threads" => Ok(config
            .model
            .threads
            .map(|t| t.to_string())
            .unwrap_or_default()),
        "inference.temperature" => Ok(config.inference.temperature.to_string()),
        "inference.max_tokens" => Ok(config.inference.max_tokens.to_string()),
        _ => anyhow::bail!("Unknown config key: {}", key),
    }
}

fn set_config_value(config: &mut Config, key: &str, value: &str) -> Result<()> {
    match key {
        "daemon.host" => config.daemon.host = value.to_string(),
        "daemon.port" => config.daemon.port = value.parse()?,
        "model.id" => config.model.id = value.to_string(),
        "model.path" => config.model.path = value.into(),
        "model.context_size" => config.model.context_size = value.parse()?,
        "model.gpu_layers" => config.model.gpu_layers = value.parse()?,
        "model.threads" => {
            config.model.threads = if value.is_empty() {
                None
            } else {
                Some(value.parse()?)
            }
        }
        "inference.temperature" => config.inference.temperature = value.parse()?,
        "inference.max_tokens" => config.inference.max_tokens = value.parse()?,
        _ => anyhow::bail!("Unknown config key: {}", key),
    }
    Ok(())
}
