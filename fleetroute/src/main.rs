mod config;
mod telemetry;

use clap::{Parser, Subcommand};
use config::{Config, ConfigError};
use optimization::CloudFleetRouting;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use telemetry::TelemetryError;

#[derive(Parser)]
#[command(version, about = "HTTP gateway for fleet routing optimization")]
struct Cli {
    /// Path to a YAML config file. Environment variables override its values.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<CliCommand>,
}

#[derive(Subcommand, Clone, Copy)]
enum CliCommand {
    /// Start the HTTP server (default)
    Serve,
    /// Load and validate the configuration, then exit
    CheckConfig,
}

#[derive(thiserror::Error, Debug)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),
    #[error("could not start runtime: {0}")]
    Runtime(#[from] std::io::Error),
    #[error(transparent)]
    Serve(#[from] api::ServeError),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("fleetroute: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), CliError> {
    let config = Config::load(cli.config.as_deref())?;

    match cli.command.unwrap_or(CliCommand::Serve) {
        CliCommand::CheckConfig => {
            println!("Configuration is valid");
            Ok(())
        }
        CliCommand::Serve => {
            let _telemetry = telemetry::init(&config.logging, config.metrics.as_ref())?;

            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()?;
            runtime.block_on(serve(config))
        }
    }
}

async fn serve(config: Config) -> Result<(), CliError> {
    let bucket = storage::connect(config.storage.as_ref()).await;
    let fleet_routing = Arc::new(CloudFleetRouting::new(&config.optimization));

    let state = api::AppState {
        bucket,
        fleet_routing,
    };

    api::serve(
        &config.listener.host,
        config.listener.port,
        state,
        &config.api,
    )
    .await?;

    tracing::info!("Server stopped");
    Ok(())
}
