// LeafScan Diagnosis Engine
// Main entry point for the leafscan binary

use clap::Parser;
use leafscan_engine::cli::{Cli, Command};
use leafscan_engine::config::Config;
use leafscan_engine::handlers::{
    handle_diagnose, handle_doctor, handle_plant_info, handle_tools, OutputFormat,
};
use leafscan_engine::telemetry::init_telemetry;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Determine output format
    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Text
    };

    // Load configuration (or use custom path if provided)
    let config = if let Some(config_path) = &cli.config {
        Config::load_from_path(config_path)?
    } else {
        Config::load_or_create()?
    };

    // The subscriber can only be installed once, so telemetry starts
    // after the level is fully resolved: --log beats the config file,
    // RUST_LOG beats both.
    let log_level = cli.log.as_deref().unwrap_or(&config.core.log_level);
    init_telemetry(log_level);

    match cli.command {
        Command::Diagnose { plant, image } => {
            tracing::info!(%plant, image = %image.display(), "Diagnosing leaf image");
            handle_diagnose(plant, &image, &config, format).await
        }

        Command::PlantInfo { plant } => {
            tracing::info!(%plant, "Fetching plant information");
            handle_plant_info(plant, &config, format).await
        }

        Command::Tools => handle_tools(format),

        Command::Doctor => handle_doctor(&config, format),
    }
}
