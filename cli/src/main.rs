mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "llamashim")]
#[command(author, version, about = "Serve a local GGUF model behind an Ollama-compatible API", long_about = None)]
struct Cli {
    /// Config file (default: ~/.config/llamashim/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the daemon server
    Serve {
        /// Host to bind to
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,

        /// GGUF file backing the served model
        #[arg(short, long)]
        model_path: Option<PathBuf>,
    },

    /// View or set configuration
    Config {
        /// Config key (e.g., "daemon.port", "model.path")
        key: Option<String>,

        /// Value to set (if omitted, shows current value)
        value: Option<String>,
    },

    /// Show whether a daemon is answering on the configured address
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();
    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Serve {
            host,
            port,
            model_path,
        } => {
            commands::serve::execute(config_path, host, port, model_path).await?;
        }
        Commands::Config { key, value } => {
            commands::config::execute(config_path, key.as_deref(), value.as_deref()).await?;
        }
        Commands::Status => {
            commands::status::execute(config_path).await?;
        }
    }

    Ok(())
}
