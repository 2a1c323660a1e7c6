//! Diabeval - Main Entry Point
//!
//! Classifier evaluation service for the diabetes dataset with CLI and
//! server modes.

use clap::Parser;
use diabeval::cli::{cmd_evaluate, cmd_info, cmd_predict, cmd_serve, Cli, Commands};
use diabeval::server::ServerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "diabeval=info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Evaluate { data, method, models_dir }) => {
            cmd_evaluate(&data, &method, &models_dir)?;
        }
        Some(Commands::Predict { model, row, data, models_dir }) => {
            cmd_predict(&model, &row, &data, &models_dir)?;
        }
        Some(Commands::Info { data }) => {
            cmd_info(&data)?;
        }
        Some(Commands::Serve { port, host, data, models_dir }) => {
            cmd_serve(&host, port, &data, &models_dir).await?;
        }
        None => {
            // No subcommand runs the server with env-derived defaults.
            let config = ServerConfig::default();
            cmd_serve(&config.host, config.port, &config.data_path, &config.models_dir).await?;
        }
    }

    Ok(())
}
