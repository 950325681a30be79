//! dbagent - HTTP gateway in front of a MySQL database
//!
//! Loads `.env`, reads configuration from the environment and flags, creates
//! the connection pool and serves until Ctrl+C or SIGTERM.
//!
//! Exit codes: 0 after a signal-initiated shutdown, 1 if configuration is
//! invalid or the database cannot be reached at startup.

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use dbagent_server::{GatewayConfig, ServerError};
use tracing::error;

mod args;
mod tracing_setup;

use args::Cli;
use tracing_setup::TracingConfig;

fn load_env_file(cli: &Cli) -> Result<()> {
    match &cli.env_file {
        Some(path) => {
            dotenvy::from_path(path)
                .with_context(|| format!("Failed to load env file {}", path.display()))?;
        }
        None => {
            dotenvy::dotenv().ok(); // Optional in the working directory
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Before tracing, so RUST_LOG may come from the env file
    let env_loaded = load_env_file(&cli);
    tracing_setup::init(&TracingConfig { debug: cli.debug }).ok();

    if let Err(e) = env_loaded {
        error!("{:#}", e);
        return ExitCode::FAILURE;
    }

    let config = match GatewayConfig::from_env() {
        Ok(config) => cli.apply(config),
        Err(e) => {
            error!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match dbagent_server::run_server(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(ServerError::Database(e)) => {
            error!("Database connection error: {}", e);
            ExitCode::FAILURE
        }
        Err(e) => {
            error!("Failed to start server: {}", e);
            ExitCode::FAILURE
        }
    }
}
