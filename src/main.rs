//! Flight Delay - Main Entry Point

use clap::Parser;
use flight_delay::cli::{cmd_predict, cmd_serve, cmd_train, Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "flight_delay=info,tower_http=info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Train { data, target, output, test_size, seed, csv } => {
            cmd_train(&csv.loader()?, &data, &target, &output, test_size, seed)?;
        }
        Commands::Predict { model, data, output, csv } => {
            cmd_predict(&csv.loader()?, &model, &data, output.as_deref())?;
        }
        Commands::Serve { port, host, model } => {
            cmd_serve(host, port, model).await?;
        }
    }

    Ok(())
}
