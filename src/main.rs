// Main entry point for parasuite

use anyhow::Result;
use clap::Parser;
use tracing::{info, warn};

use parasuite::cli::Cli;
use parasuite::commands::{handle_completion, init_config, run_tests, show_config};
use parasuite::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    parasuite::logging::init(cli.verbose);

    if cli.verbose {
        info!("Starting parasuite v{}", env!("CARGO_PKG_VERSION"));
    }

    // Handle completion flag
    if let Some(shell_type) = &cli.completion {
        return handle_completion(shell_type);
    }

    // Handle init_config flag
    if let Some(config_file) = &cli.init_config {
        return init_config(config_file);
    }

    let (config, source) = match &cli.config_file {
        Some(path) => (Config::load_from_file(path)?, Some(path.clone())),
        None => match Config::find() {
            Some(path) => (Config::load_from_file(&path)?, Some(path)),
            None => (Config::default(), None),
        },
    };
    if let Some(path) = &source {
        info!("Loaded configuration from {}", path.display());
    }

    if cli.config {
        return show_config(&cli, &config, source.as_deref());
    }

    if cli.paths.is_empty() {
        warn!("No test files provided. Use 'parasuite --help' for usage.");
        return Ok(());
    }

    if !run_tests(&cli, &config).await? {
        std::process::exit(1);
    }

    Ok(())
}
